//! Whole-site build: every markdown post plus the optional timeline.
//!
//! Documents are processed one at a time. A failing document is logged and
//! recorded in the [`BuildReport`]; its siblings are still built.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::application::{
    dates::DateFormatter,
    document::{RenderedDocument, process_document},
    error::AppError,
    render::RenderService,
    timeline::{load_timeline, render_timeline},
};
use crate::config::SiteSettings;
use crate::domain::error::DomainError;
use crate::infra::{
    error::InfraError,
    output::{self, OutputDir},
};
use crate::presentation::views::{PostTemplate, render_template, render_timeline_html};

/// Output name of the timeline fragment; reserved against post slugs while a
/// timeline is configured.
pub const TIMELINE_SLUG: &str = "timeline";

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub rendered: Vec<String>,
    pub failures: Vec<BuildFailure>,
    pub timeline: Option<PathBuf>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Build every post below `site.content_dir` into `site.output_dir`.
///
/// Only failures that prevent the build from starting (unreadable content
/// directory, unwritable output directory) are returned as errors.
pub fn build_site(
    site: &SiteSettings,
    formatter: &DateFormatter,
    renderer: &dyn RenderService,
) -> Result<BuildReport, AppError> {
    let sources = output::markdown_sources(&site.content_dir)?;
    let out = OutputDir::create(&site.output_dir)?;
    let mut report = BuildReport::default();
    let mut claimed: HashMap<String, PathBuf> = HashMap::new();
    if let Some(timeline_path) = &site.timeline_path {
        claimed.insert(TIMELINE_SLUG.to_string(), timeline_path.clone());
    }

    for path in &sources {
        match build_document(path, &out, formatter, renderer, &claimed) {
            Ok(slug) => {
                debug!(
                    target = "application::build",
                    path = %path.display(),
                    slug = %slug,
                    "document rendered"
                );
                claimed.insert(slug.clone(), path.clone());
                report.rendered.push(slug);
            }
            Err(err) => {
                error!(
                    target = "application::build",
                    path = %path.display(),
                    error = %err,
                    "document failed"
                );
                report.failures.push(BuildFailure {
                    path: path.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    if let Some(timeline_path) = &site.timeline_path {
        match build_timeline(timeline_path, &out) {
            Ok(written) => report.timeline = Some(written),
            Err(err) => {
                error!(
                    target = "application::build",
                    path = %timeline_path.display(),
                    error = %err,
                    "timeline failed"
                );
                report.failures.push(BuildFailure {
                    path: timeline_path.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    info!(
        target = "application::build",
        rendered = report.rendered.len(),
        failed = report.failures.len(),
        timeline = report.timeline.is_some(),
        output = %out.root().display(),
        "site build finished"
    );

    Ok(report)
}

fn build_document(
    path: &Path,
    out: &OutputDir,
    formatter: &DateFormatter,
    renderer: &dyn RenderService,
    claimed: &HashMap<String, PathBuf>,
) -> Result<String, AppError> {
    let source = output::read_to_string(path)?;
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();

    let document = process_document(&source, stem, formatter, renderer)?;
    if let Some(owner) = claimed.get(&document.slug) {
        return Err(DomainError::invariant(format!(
            "slug `{}` is already used by {}",
            document.slug,
            owner.display()
        ))
        .into());
    }

    write_document(&document, out)?;
    Ok(document.slug)
}

fn write_document(document: &RenderedDocument, out: &OutputDir) -> Result<(), AppError> {
    let html = render_template(PostTemplate {
        post: document.to_post_view(),
    })?;
    let json = serde_json::to_string_pretty(&document.frontmatter)
        .map_err(InfraError::from)?;

    out.write(&format!("{}.html", document.slug), &html)?;
    out.write(&format!("{}.json", document.slug), &json)?;
    Ok(())
}

fn build_timeline(path: &Path, out: &OutputDir) -> Result<PathBuf, AppError> {
    let events = load_timeline(path)?;
    let view = render_timeline(&events, false)?;
    let html = render_timeline_html(&view)?;
    Ok(out.write(&format!("{TIMELINE_SLUG}.html"), &html)?)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::application::render::render_service;

    fn settings(content: &Path, output: &Path) -> SiteSettings {
        SiteSettings {
            content_dir: content.to_path_buf(),
            output_dir: output.to_path_buf(),
            timeline_path: None,
        }
    }

    #[test]
    fn duplicate_slugs_fail_the_later_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = dir.path().join("content");
        fs::create_dir_all(&content).expect("content dir");
        fs::write(content.join("a.md"), "---\nslug: same\n---\nFirst\n").expect("write a");
        fs::write(content.join("b.md"), "---\nslug: same\n---\nSecond\n").expect("write b");

        let report = build_site(
            &settings(&content, &dir.path().join("out")),
            &DateFormatter::default(),
            render_service().as_ref(),
        )
        .expect("build");

        assert_eq!(report.rendered, vec!["same".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("b.md"));
        assert!(report.failures[0].message.contains("already used"));
        assert!(!report.is_success());
    }

    #[test]
    fn post_cannot_take_the_timeline_slug() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = dir.path().join("content");
        fs::create_dir_all(&content).expect("content dir");
        fs::write(content.join("timeline.md"), "POST BODY\n").expect("write post");
        let data = dir.path().join("experience.json");
        fs::write(&data, r#"[{"date":"2020","title":"Job A"}]"#).expect("write timeline");

        let mut site = settings(&content, &dir.path().join("out"));
        site.timeline_path = Some(data);

        let report = build_site(&site, &DateFormatter::default(), render_service().as_ref())
            .expect("build");

        assert!(report.rendered.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("timeline.md"));
        assert!(report.failures[0].message.contains("already used"));
        assert!(!report.is_success());

        let html = fs::read_to_string(dir.path().join("out/timeline.html")).expect("timeline");
        assert!(html.contains("Job A"));
        assert!(!html.contains("POST BODY"));
    }

    #[test]
    fn timeline_slug_is_free_without_a_timeline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = dir.path().join("content");
        fs::create_dir_all(&content).expect("content dir");
        fs::write(content.join("timeline.md"), "Body\n").expect("write post");

        let report = build_site(
            &settings(&content, &dir.path().join("out")),
            &DateFormatter::default(),
            render_service().as_ref(),
        )
        .expect("build");

        assert_eq!(report.rendered, vec![TIMELINE_SLUG.to_string()]);
        assert!(report.is_success());
    }

    #[test]
    fn missing_timeline_is_reported_without_losing_posts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let content = dir.path().join("content");
        fs::create_dir_all(&content).expect("content dir");
        fs::write(content.join("post.md"), "Body\n").expect("write post");

        let mut site = settings(&content, &dir.path().join("out"));
        site.timeline_path = Some(dir.path().join("missing.json"));

        let report = build_site(&site, &DateFormatter::default(), render_service().as_ref())
            .expect("build");

        assert_eq!(report.rendered, vec!["post".to_string()]);
        assert_eq!(report.timeline, None);
        assert_eq!(report.failures.len(), 1);
        assert!(dir.path().join("out/post.html").is_file());
    }
}
