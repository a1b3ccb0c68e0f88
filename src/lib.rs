//! Build tooling for a personal homepage: markdown posts with normalised
//! frontmatter dates and a nested career timeline.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
