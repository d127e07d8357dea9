//! Markdown rendering for article bodies.
//!
//! Article text is user-editable, so the default renderer never lets raw
//! HTML or script URLs through: HTML blocks and inline HTML are emitted as
//! escaped text, and `javascript:`-style link targets are replaced by `#`.

use pulldown_cmark::{html::push_html, CowStr, Event, Options, Parser, Tag};

/// URL schemes that are never emitted as link or image targets
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Converts article Markdown into HTML that is safe to embed in a page
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// pulldown-cmark renderer with GFM extensions and raw HTML disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeMarkdown;

impl MarkdownRenderer for SafeMarkdown {
    fn render(&self, markdown: &str) -> String {
        let options =
            Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS | Options::ENABLE_TABLES;

        let events = Parser::new_ext(markdown, options).map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: neutralise_url(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: neutralise_url(dest_url),
                title,
                id,
            }),
            other => other,
        });

        let mut html = String::with_capacity(markdown.len() * 2);
        push_html(&mut html, events);
        html
    }
}

/// Replace a URL with `#` if it uses a scheme that can run script.
///
/// Browsers ignore whitespace and control characters inside the scheme, so
/// those are stripped before comparing.
fn neutralise_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();

    if UNSAFE_SCHEMES.iter().any(|s| scheme.starts_with(s)) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}
