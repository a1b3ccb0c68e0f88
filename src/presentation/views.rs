use askama::{Error as AskamaError, Template};
use thiserror::Error;

use crate::application::timeline::{TimelineEvent, TimelineView};

const ROOT_LIST_CLASS: &str = "relative ms-2 border-s border-emerald-700";
const NESTED_LIST_CLASS: &str = "relative ms-2 border-s border-emerald-700 mt-4 border-dashed";

#[derive(Debug, Error)]
#[error("failed to render template `{template}`")]
pub struct TemplateRenderError {
    pub(crate) template: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(template: &'static str, error: AskamaError) -> Self {
        Self { template, error }
    }
}

pub fn render_template<T: Template>(template: T) -> Result<String, TemplateRenderError> {
    template
        .render()
        .map_err(|err| TemplateRenderError::new(std::any::type_name::<T>(), err))
}

/// One step of a flattened timeline, shaped for the template.
pub struct TimelineToken<'a> {
    pub opens_list: bool,
    pub list_class: &'static str,
    pub list_marker: &'static str,
    pub opens_item: bool,
    pub key: &'a str,
    pub date: &'a str,
    pub title: &'a str,
    pub has_lines: bool,
    pub lines: &'a [String],
    pub closes_item: bool,
    pub closes_list: bool,
}

impl<'a> TimelineToken<'a> {
    fn blank() -> Self {
        Self {
            opens_list: false,
            list_class: "",
            list_marker: "",
            opens_item: false,
            key: "",
            date: "",
            title: "",
            has_lines: false,
            lines: &[],
            closes_item: false,
            closes_list: false,
        }
    }
}

impl<'a> From<TimelineEvent<'a>> for TimelineToken<'a> {
    fn from(event: TimelineEvent<'a>) -> Self {
        match event {
            TimelineEvent::StartList { nested } => Self {
                opens_list: true,
                list_class: if nested {
                    NESTED_LIST_CLASS
                } else {
                    ROOT_LIST_CLASS
                },
                list_marker: if nested { "nested" } else { "root" },
                ..Self::blank()
            },
            TimelineEvent::StartItem { key, date, title } => Self {
                opens_item: true,
                key,
                date,
                title,
                ..Self::blank()
            },
            TimelineEvent::Description { lines } => Self {
                has_lines: true,
                lines,
                ..Self::blank()
            },
            TimelineEvent::EndItem => Self {
                closes_item: true,
                ..Self::blank()
            },
            TimelineEvent::EndList => Self {
                closes_list: true,
                ..Self::blank()
            },
        }
    }
}

#[derive(Template)]
#[template(path = "partials/timeline.html")]
pub struct TimelineTemplate<'a> {
    pub tokens: Vec<TimelineToken<'a>>,
}

impl<'a> TimelineTemplate<'a> {
    pub fn new(view: &'a TimelineView) -> Self {
        Self {
            tokens: view.events().into_iter().map(TimelineToken::from).collect(),
        }
    }
}

/// Render a timeline view to its HTML fragment.
pub fn render_timeline_html(view: &TimelineView) -> Result<String, TemplateRenderError> {
    render_template(TimelineTemplate::new(view))
}

/// Post fragment data. Empty date strings are left out of the markup.
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub published: String,
    pub edited: String,
    pub body_html: String,
    pub contains_math: bool,
    pub contains_code: bool,
    pub contains_footnotes: bool,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub post: PostView,
}
