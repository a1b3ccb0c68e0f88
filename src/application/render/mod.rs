//! Markdown rendering for blog posts.
//!
//! The pipeline is pure: it accepts a markdown body, produces deterministic
//! sanitised HTML and surfaces structured errors. Front-matter handling
//! happens before a request reaches it.

mod service;
mod types;

pub use service::{ComrakRenderService, render_service};
pub use types::{RenderError, RenderOutput, RenderRequest, RenderService};
