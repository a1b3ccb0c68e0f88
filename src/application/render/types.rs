use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Slug of the document, used to tag diagnostics.
    pub slug: String,
    /// Markdown body with the frontmatter already removed.
    pub markdown: String,
}

impl RenderRequest {
    pub fn new(slug: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            markdown: markdown.into(),
        }
    }
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Sanitised HTML with math fragments restored.
    pub html: String,
    /// Indicates whether the rendered HTML contains any code blocks.
    pub contains_code: bool,
    /// Indicates whether the rendered HTML contains rendered math fragments.
    pub contains_math: bool,
    /// Indicates whether the document has footnotes.
    pub contains_footnotes: bool,
}

/// Structured errors surfaced by the rendering pipeline.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("document processing failed: {message}")]
    Document { message: String },
}

/// Implementations must be pure and deterministic: given the same input, they
/// return identical outputs or errors.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;
}
