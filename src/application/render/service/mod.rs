mod config;
mod rewrite;

use std::sync::Arc;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use once_cell::sync::Lazy;

use crate::application::render::types::{
    RenderError, RenderOutput, RenderRequest, RenderService,
};

use config::{build_sanitizer, default_options};
use rewrite::{RewriteOutcome, rewrite_ast};

/// Comrak-based rendering pipeline with KaTeX math and Ammonia sanitisation.
pub struct ComrakRenderService {
    options: comrak::Options<'static>,
    sanitizer: ammonia::Builder<'static>,
}

impl ComrakRenderService {
    /// Construct a renderer with the GitHub-flavoured extensions, footnotes,
    /// alerts and math enabled.
    fn new() -> Self {
        Self {
            options: default_options(),
            sanitizer: build_sanitizer(),
        }
    }
}

static RENDER_SERVICE: Lazy<Arc<ComrakRenderService>> =
    Lazy::new(|| Arc::new(ComrakRenderService::new()));

/// Access the shared render service instance, initialised on first use.
pub fn render_service() -> Arc<ComrakRenderService> {
    Arc::clone(&RENDER_SERVICE)
}

impl Default for ComrakRenderService {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderService for ComrakRenderService {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, &request.markdown, &self.options);

        let outcome = rewrite_ast(root, &request.slug)?;
        let rendered_html = render_html_stage(root, &self.options)?;
        let sanitized_html = self.sanitizer.clean(&rendered_html).to_string();
        let html = restore_stage(sanitized_html, &outcome);

        Ok(RenderOutput {
            contains_code: outcome.contains_code || html.contains("<code"),
            contains_math: outcome.contains_math,
            contains_footnotes: outcome.contains_footnotes,
            html,
        })
    }
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}

fn restore_stage(html: String, outcome: &RewriteOutcome) -> String {
    outcome
        .math_fragments
        .iter()
        .fold(html, |acc, fragment| {
            if fragment.is_block {
                let placeholder = format!("<div>{}</div>", fragment.placeholder);
                acc.replace(&placeholder, &fragment.html)
            } else {
                acc.replace(&fragment.placeholder, &fragment.html)
            }
        })
}
