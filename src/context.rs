//! Render contexts: the key/value pairs a template is filled with
//!
//! A [`Context`] is built fresh for each render and not changed afterwards.
//! Keys are namespaced (`Wiki.*`, `Article.*`, `Error.*`) and appear in
//! templates as `{Article.Title}`.

use std::collections::BTreeMap;

use crate::article::Article;
use crate::config::WikiSettings;
use crate::markdown::MarkdownRenderer;

pub const WIKI_TITLE: &str = "Wiki.Title";
pub const WIKI_URL: &str = "Wiki.Url";
pub const ARTICLE_TITLE: &str = "Article.Title";
pub const ARTICLE_CONTENT: &str = "Article.Content";
pub const ARTICLE_RAW_CONTENT: &str = "Article.RawContent";
pub const ARTICLE_MODIFY_DATE: &str = "Article.ModifyDate";
pub const ERROR_CODE: &str = "Error.Code";
pub const ERROR_MESSAGE: &str = "Error.Message";

/// Key/value pairs for one render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the context with `key` set to `value`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Context for viewing or editing an existing article.
    ///
    /// `Article.Content` is the rendered Markdown; `Article.RawContent` is the
    /// source, HTML-escaped for use inside a `<textarea>`.
    pub fn for_article(
        wiki: &WikiSettings,
        article: &Article,
        markdown: &dyn MarkdownRenderer,
    ) -> Self {
        Self::for_wiki(wiki)
            .with(ARTICLE_TITLE, article.title.as_str())
            .with(ARTICLE_CONTENT, markdown.render(&article.content))
            .with(ARTICLE_RAW_CONTENT, escape_html(&article.content))
            .with(ARTICLE_MODIFY_DATE, article.modify_date())
    }

    /// Context for an error page.
    ///
    /// `message` is inserted as-is and may contain markup; escape any dynamic
    /// part of it with [`escape_html`] first.
    pub fn for_error(wiki: &WikiSettings, code: u16, message: &str) -> Self {
        Self::for_wiki(wiki)
            .with(ARTICLE_TITLE, format!("Error {}", code))
            .with(ERROR_CODE, code.to_string())
            .with(ERROR_MESSAGE, message)
    }

    /// Context with an arbitrary title and raw content, e.g. for a page that
    /// does not exist yet
    pub fn custom(wiki: &WikiSettings, title: &str, content: &str) -> Self {
        Self::for_wiki(wiki)
            .with(ARTICLE_TITLE, title)
            .with(ARTICLE_RAW_CONTENT, escape_html(content))
    }

    fn for_wiki(wiki: &WikiSettings) -> Self {
        Self::new()
            .with(WIKI_TITLE, wiki.title.as_str())
            .with(WIKI_URL, wiki.url.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a String cannot fail
    let _ = pulldown_cmark_escape::escape_html(&mut escaped, text);
    escaped
}
