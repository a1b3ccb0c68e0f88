//! Single-document pipeline: frontmatter extraction, date normalisation and
//! markdown rendering.

use serde::Serialize;
use slug::slugify;
use thiserror::Error;
use tracing::debug;

use crate::application::dates::{
    DateError, DateFormatter, EDIT_DATE_FIELD, PUB_DATE_FIELD, normalize_dates,
};
use crate::application::render::{RenderError, RenderRequest, RenderService};
use crate::domain::error::DomainError;
use crate::domain::frontmatter::{Frontmatter, split_document};
use crate::presentation::views::PostView;

const SLUG_FIELD: &str = "slug";
const TITLE_FIELD: &str = "title";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Frontmatter(#[from] DomainError),
    #[error(transparent)]
    Dates(#[from] DateError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A markdown document after the full pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocument {
    pub slug: String,
    pub frontmatter: Frontmatter,
    pub html: String,
    pub contains_math: bool,
    pub contains_code: bool,
    pub contains_footnotes: bool,
}

impl RenderedDocument {
    pub fn title(&self) -> &str {
        self.frontmatter
            .get_str(TITLE_FIELD)
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(&self.slug)
    }

    pub fn to_post_view(&self) -> PostView {
        let date = |field: &str| self.frontmatter.get_str(field).unwrap_or_default().to_string();
        PostView {
            slug: self.slug.clone(),
            title: self.title().to_string(),
            published: date(PUB_DATE_FIELD),
            edited: date(EDIT_DATE_FIELD),
            body_html: self.html.clone(),
            contains_math: self.contains_math,
            contains_code: self.contains_code,
            contains_footnotes: self.contains_footnotes,
        }
    }
}

/// Extract and normalise the frontmatter of `source` without rendering it.
pub fn read_frontmatter(
    source: &str,
    formatter: &DateFormatter,
) -> Result<Frontmatter, DocumentError> {
    let mut frontmatter = split_document(source)?.frontmatter;
    normalize_dates(&mut frontmatter, formatter)?;
    Ok(frontmatter)
}

/// Run `source` through the pipeline. `fallback_stem` names the document when
/// its frontmatter carries no slug.
pub fn process_document(
    source: &str,
    fallback_stem: &str,
    formatter: &DateFormatter,
    renderer: &dyn RenderService,
) -> Result<RenderedDocument, DocumentError> {
    let split = split_document(source)?;
    let mut frontmatter = split.frontmatter;
    normalize_dates(&mut frontmatter, formatter)?;

    let slug = resolve_slug(&frontmatter, fallback_stem)?;
    let output = renderer.render(&RenderRequest::new(slug.clone(), split.body))?;
    debug!(
        target = "application::document",
        slug = %slug,
        frontmatter = ?split.format,
        math = output.contains_math,
        code = output.contains_code,
        footnotes = output.contains_footnotes,
        "document processed"
    );

    Ok(RenderedDocument {
        slug,
        frontmatter,
        html: output.html,
        contains_math: output.contains_math,
        contains_code: output.contains_code,
        contains_footnotes: output.contains_footnotes,
    })
}

fn resolve_slug(frontmatter: &Frontmatter, fallback_stem: &str) -> Result<String, DomainError> {
    let candidate = frontmatter
        .get_str(SLUG_FIELD)
        .filter(|slug| !slug.trim().is_empty())
        .unwrap_or(fallback_stem);

    let slug = slugify(candidate);
    if slug.is_empty() {
        return Err(DomainError::validation(format!(
            "cannot derive a slug from `{candidate}`"
        )));
    }
    Ok(slug)
}
