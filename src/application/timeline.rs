//! Career timeline rendering.
//!
//! [`render_timeline`] maps an [`Event`] tree onto a [`TimelineView`] that the
//! presentation layer turns into nested `<ol>` markup. Sibling order is kept
//! at every level and the input is never modified.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use slug::slugify;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::timeline::{
    Event, MAX_TIMELINE_DEPTH, RawDescription, RawEvent, split_sentences,
};
use crate::infra::{error::InfraError, output};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("timeline event `{title}` exceeds maximum depth {max_depth}")]
    DepthExceeded { title: String, max_depth: usize },
}

#[derive(Debug, Error)]
pub enum TimelineLoadError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("timeline data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One rendered list of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineView {
    pub nested: bool,
    pub items: Vec<TimelineItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineItemView {
    pub key: String,
    pub date: String,
    pub title: String,
    pub description: Vec<String>,
    pub sub_timeline: Option<TimelineView>,
}

/// Flat walk over a [`TimelineView`], suitable for templates that cannot
/// recurse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent<'a> {
    StartList { nested: bool },
    StartItem {
        key: &'a str,
        date: &'a str,
        title: &'a str,
    },
    Description { lines: &'a [String] },
    EndItem,
    EndList,
}

impl TimelineView {
    pub fn events(&self) -> Vec<TimelineEvent<'_>> {
        let mut events = Vec::new();
        self.push_events(&mut events);
        events
    }

    fn push_events<'a>(&'a self, events: &mut Vec<TimelineEvent<'a>>) {
        events.push(TimelineEvent::StartList {
            nested: self.nested,
        });
        for item in &self.items {
            events.push(TimelineEvent::StartItem {
                key: &item.key,
                date: &item.date,
                title: &item.title,
            });
            if !item.description.is_empty() {
                events.push(TimelineEvent::Description {
                    lines: &item.description,
                });
            }
            if let Some(sub) = &item.sub_timeline {
                sub.push_events(events);
            }
            events.push(TimelineEvent::EndItem);
        }
        events.push(TimelineEvent::EndList);
    }
}

/// Render `events` as a timeline. Top-level callers pass `nested = false`;
/// sub-timelines are rendered with `nested = true`.
pub fn render_timeline(events: &[Event], nested: bool) -> Result<TimelineView, TimelineError> {
    render_level(events, nested, "timeline", 0)
}

fn render_level(
    events: &[Event],
    nested: bool,
    key_prefix: &str,
    depth: usize,
) -> Result<TimelineView, TimelineError> {
    let mut seen = HashSet::with_capacity(events.len());
    let mut items = Vec::with_capacity(events.len());

    for event in events {
        if depth >= MAX_TIMELINE_DEPTH {
            return Err(TimelineError::DepthExceeded {
                title: event.title.clone(),
                max_depth: MAX_TIMELINE_DEPTH,
            });
        }
        if !seen.insert(event.title.as_str()) {
            warn!(
                target = "application::timeline",
                title = %event.title,
                "duplicate sibling title in timeline"
            );
        }

        let key = item_key(key_prefix, &event.title, items.len());
        let sub_timeline = if event.events.is_empty() {
            None
        } else {
            Some(render_level(&event.events, true, &key, depth + 1)?)
        };

        items.push(TimelineItemView {
            key,
            date: event.date.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            sub_timeline,
        });
    }

    Ok(TimelineView { nested, items })
}

fn item_key(prefix: &str, title: &str, index: usize) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{prefix}-{index}")
    } else {
        format!("{prefix}-{slug}")
    }
}

/// Parse timeline data, converting legacy paragraph descriptions into
/// lines.
pub fn parse_timeline(json: &str) -> Result<Vec<Event>, TimelineLoadError> {
    let raw: Vec<RawEvent> = serde_json::from_str(json)?;
    Ok(raw.into_iter().map(into_event).collect())
}

pub fn load_timeline(path: &Path) -> Result<Vec<Event>, TimelineLoadError> {
    let json = output::read_to_string(path)?;
    let events = parse_timeline(&json)?;
    debug!(
        target = "application::timeline",
        path = %path.display(),
        roots = events.len(),
        "timeline loaded"
    );
    Ok(events)
}

fn into_event(raw: RawEvent) -> Event {
    let description = match raw.description {
        RawDescription::Lines(lines) => lines,
        RawDescription::Paragraph(paragraph) => {
            warn!(
                target = "application::timeline",
                title = %raw.title,
                "paragraph descriptions are deprecated; store description lines instead"
            );
            split_sentences(&paragraph)
        }
    };

    Event {
        date: raw.date,
        title: raw.title,
        description,
        events: raw
            .events
            .unwrap_or_default()
            .into_iter()
            .map(into_event)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_order_is_preserved() {
        let events = vec![Event::new("2021", "B"), Event::new("2020", "A")];
        let view = render_timeline(&events, false).expect("render");

        let titles: Vec<_> = view.items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, ["B", "A"]);
        assert!(!view.nested);
    }

    #[test]
    fn empty_description_renders_no_lines() {
        let events = vec![Event::new("2020", "A")];
        let view = render_timeline(&events, false).expect("render");

        assert!(view.items[0].description.is_empty());
        assert!(
            !view
                .events()
                .iter()
                .any(|event| matches!(event, TimelineEvent::Description { .. }))
        );
    }

    #[test]
    fn nested_events_render_as_nested_sub_timeline() {
        let events = vec![
            Event::new("2020", "Job A").with_events(vec![Event::new("2021", "Promotion")]),
        ];
        let view = render_timeline(&events, false).expect("render");

        let sub = view.items[0].sub_timeline.as_ref().expect("sub-timeline");
        assert!(sub.nested);
        assert_eq!(sub.items.len(), 1);
        assert_eq!(sub.items[0].title, "Promotion");
        assert_eq!(sub.items[0].sub_timeline, None);
    }

    #[test]
    fn events_walk_is_balanced() {
        let events = vec![
            Event::new("2020", "Job A")
                .with_description(["Did X"])
                .with_events(vec![Event::new("2021", "Promotion")]),
            Event::new("2019", "Job B"),
        ];
        let view = render_timeline(&events, false).expect("render");
        let walk = view.events();

        assert_eq!(walk.first(), Some(&TimelineEvent::StartList { nested: false }));
        assert_eq!(walk.last(), Some(&TimelineEvent::EndList));
        let opened = walk
            .iter()
            .filter(|event| matches!(event, TimelineEvent::StartList { .. }))
            .count();
        let closed = walk
            .iter()
            .filter(|event| matches!(event, TimelineEvent::EndList))
            .count();
        assert_eq!(opened, 2);
        assert_eq!(closed, 2);
        assert!(walk.contains(&TimelineEvent::StartList { nested: true }));
    }

    #[test]
    fn keys_follow_the_nesting_path() {
        let events = vec![
            Event::new("2020", "Job A").with_events(vec![Event::new("2021", "Promotion")]),
            Event::new("2019", "???"),
        ];
        let view = render_timeline(&events, false).expect("render");

        assert_eq!(view.items[0].key, "timeline-job-a");
        let sub = view.items[0].sub_timeline.as_ref().expect("sub");
        assert_eq!(sub.items[0].key, "timeline-job-a-promotion");
        assert_eq!(view.items[1].key, "timeline-1");
    }

    #[test]
    fn child_may_reuse_an_ancestor_title() {
        let events = vec![Event::new("2018", "Microsoft").with_events(vec![
            Event::new("2019", "Software Engineer").with_events(vec![Event::new(
                "2021",
                "Software Engineer",
            )]),
        ])];

        let view = render_timeline(&events, false).expect("render");
        let role = &view.items[0].sub_timeline.as_ref().expect("roles").items[0];
        let promotion = &role.sub_timeline.as_ref().expect("promotion").items[0];

        assert_eq!(role.title, "Software Engineer");
        assert_eq!(promotion.title, "Software Engineer");
        assert_eq!(promotion.date, "2021");
        assert_eq!(
            promotion.key,
            "timeline-microsoft-software-engineer-software-engineer"
        );
    }

    #[test]
    fn same_title_in_separate_branches_is_allowed() {
        let events = vec![
            Event::new("2020", "A").with_events(vec![Event::new("2020", "Intern")]),
            Event::new("2021", "B").with_events(vec![Event::new("2021", "Intern")]),
        ];
        assert!(render_timeline(&events, false).is_ok());
    }

    #[test]
    fn overly_deep_timelines_are_rejected() {
        let mut event = Event::new("0", "level-0");
        for depth in 1..=MAX_TIMELINE_DEPTH {
            event = Event::new(depth.to_string(), format!("level-{depth}")).with_events(vec![event]);
        }

        let err = render_timeline(&[event], false).expect_err("too deep");
        assert_eq!(
            err,
            TimelineError::DepthExceeded {
                title: "level-0".into(),
                max_depth: MAX_TIMELINE_DEPTH,
            }
        );
    }

    #[test]
    fn maximum_depth_is_accepted() {
        let mut event = Event::new("0", "level-0");
        for depth in 1..MAX_TIMELINE_DEPTH {
            event = Event::new(depth.to_string(), format!("level-{depth}")).with_events(vec![event]);
        }

        assert!(render_timeline(&[event], false).is_ok());
    }

    #[test]
    fn legacy_paragraphs_are_split_on_load() {
        let events = parse_timeline(
            r#"[{"date":"2020","title":"A","description":"Led the team. Shipped v2","events":[{"date":"2021","title":"B","description":["kept"]}]}]"#,
        )
        .expect("parse");

        assert_eq!(events[0].description, vec!["Led the team", "Shipped v2"]);
        assert_eq!(events[0].events[0].description, vec!["kept"]);
        assert!(events[0].events[0].events.is_empty());
    }

    #[test]
    fn malformed_timeline_is_reported() {
        let err = parse_timeline(r#"[{"title":"missing date"}]"#).expect_err("malformed");
        assert!(matches!(err, TimelineLoadError::Malformed(_)));
    }
}
