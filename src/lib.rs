//! Wikka - a minimal flat-file wiki
//!
//! Articles are Markdown files, pages are plain-text templates with
//! placeholder tokens. Templates reference each other as `{:name}` (expanded
//! once at startup) and per-request values as `{Key.Name}` (filled on every
//! render).
//!
//! # Example
//!
//! ```rust
//! use wikka::{render_page, Context, TemplateStore};
//!
//! let mut store = TemplateStore::new();
//! store.load("main.template", "<html>{:header.template}{:*}</html>");
//! store.load("header.template", "<h1>{Wiki.Title}</h1>");
//! store.load("view.template", "Hi {Name}");
//! store.pre_resolve_all().unwrap();
//!
//! let context = Context::new().with("Wiki.Title", "Wikka").with("Name", "Bob");
//! let html = render_page(&store, "view.template", "main.template", &context).unwrap();
//! assert_eq!(html, "<html><h1>Wikka</h1>Hi Bob</html>");
//! ```

pub mod article;
pub mod config;
pub mod context;
pub mod error;
pub mod markdown;
pub mod template;
pub mod wiki;

pub use article::{Article, ArticleError, ArticleRepository};
pub use config::{ConfigError, WikiConfig};
pub use context::Context;
pub use error::WikiError;
pub use markdown::{MarkdownRenderer, SafeMarkdown};
pub use template::{pre_resolve, render_page, resolve, TemplateError, TemplateStore, CONTENT_KEY};
pub use wiki::{Response, Wiki};
