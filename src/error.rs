//! Errors that stop the wiki from starting

use thiserror::Error;

use crate::article::ArticleError;
use crate::template::TemplateError;

/// Startup errors. Per-request failures never surface here; they are
/// rendered as error pages instead.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("article error: {0}")]
    Article(#[from] ArticleError),

    /// One of the page templates named in the configuration is not loaded
    #[error("required template missing: {name}")]
    MissingTemplate { name: String },
}
