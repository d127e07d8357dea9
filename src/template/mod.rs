//! Template system for wiki pages
//!
//! Templates are plain text files with two kinds of placeholder tokens:
//!
//! ```text
//! {:header.template}   reference to another template, expanded at startup
//! {Article.Title}      context key, filled in on every render
//! ```
//!
//! There is no escaping syntax for literal braces; a token with no matching
//! template or key is left in the output unchanged.

mod resolver;
mod store;

pub use resolver::{pre_resolve, render_page, resolve, CONTENT_KEY, TEMPLATE_PREFIX};
pub use store::{TemplateError, TemplateStore, TEMPLATE_EXTENSION};
