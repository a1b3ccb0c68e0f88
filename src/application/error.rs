use thiserror::Error;

use crate::{
    application::{
        dates::{DateConfigError, DateError},
        document::DocumentError,
        render::RenderError,
        timeline::{TimelineError, TimelineLoadError},
    },
    domain::error::DomainError,
    infra::error::InfraError,
    presentation::views::TemplateRenderError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Date(#[from] DateError),
    #[error(transparent)]
    DateConfig(#[from] DateConfigError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    TimelineLoad(#[from] TimelineLoadError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
