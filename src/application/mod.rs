//! Application services: date normalisation, timeline rendering, the
//! markdown pipeline and the site build.

pub mod build;
pub mod dates;
pub mod document;
pub mod error;
pub mod render;
pub mod timeline;
