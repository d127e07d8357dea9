//! Page flows of the wiki: view, edit and save
//!
//! [`Wiki`] owns the stores built at startup and turns a request for an
//! article into a [`Response`]. It never returns an error for a single
//! request; failures are rendered through the error template.

use std::sync::Arc;

use tracing::{error, warn};

use crate::article::ArticleRepository;
use crate::config::WikiConfig;
use crate::context::{escape_html, Context};
use crate::error::WikiError;
use crate::markdown::{MarkdownRenderer, SafeMarkdown};
use crate::template::{render_page, TemplateStore};

/// Message shown when saving or rendering fails
pub const SERVER_ERROR_MESSAGE: &str = "There happened something bad on the wiki server";

/// Title used on the edit page of an article that does not exist yet
pub const NEW_ARTICLE_TITLE: &str = "Create the page";

/// Result of a page flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A rendered page with its HTTP status
    Page { status: u16, body: String },
    /// Permanent redirect to another path
    Redirect { location: String },
}

impl Response {
    pub fn status(&self) -> u16 {
        match self {
            Response::Page { status, .. } => *status,
            Response::Redirect { .. } => 301,
        }
    }

    /// The page body, or `None` for a redirect
    pub fn body(&self) -> Option<&str> {
        match self {
            Response::Page { body, .. } => Some(body.as_str()),
            Response::Redirect { .. } => None,
        }
    }
}

/// A loaded wiki
pub struct Wiki {
    config: WikiConfig,
    templates: Arc<TemplateStore>,
    articles: ArticleRepository,
    markdown: Box<dyn MarkdownRenderer>,
}

impl Wiki {
    /// Load templates and articles from the configured directories
    pub fn open(config: WikiConfig) -> Result<Self, WikiError> {
        let articles = ArticleRepository::load_dir(&config.articles_dir())?;
        let templates = TemplateStore::load_dir(&config.templates_dir())?;
        Self::from_parts(config, templates, articles)
    }

    /// Build a wiki from already loaded stores.
    ///
    /// Pre-resolves the templates and checks that every page template named
    /// in the configuration exists.
    pub fn from_parts(
        config: WikiConfig,
        mut templates: TemplateStore,
        articles: ArticleRepository,
    ) -> Result<Self, WikiError> {
        templates.pre_resolve_all()?;

        if let Some(name) = config
            .templates
            .required()
            .into_iter()
            .find(|name| !templates.contains(name))
        {
            return Err(WikiError::MissingTemplate {
                name: name.to_string(),
            });
        }

        Ok(Self {
            config,
            templates: Arc::new(templates),
            articles,
            markdown: Box::new(SafeMarkdown),
        })
    }

    /// Replace the Markdown renderer
    pub fn with_markdown(mut self, markdown: impl MarkdownRenderer + 'static) -> Self {
        self.markdown = Box::new(markdown);
        self
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    pub fn templates(&self) -> &Arc<TemplateStore> {
        &self.templates
    }

    pub fn articles(&self) -> &ArticleRepository {
        &self.articles
    }

    /// Redirect to the configured front page
    pub fn frontpage(&self) -> Response {
        Response::Redirect {
            location: format!("/{}", self.config.wiki.frontpage),
        }
    }

    /// Show an article, or a 404 page offering to create it
    pub fn view(&self, name: &str) -> Response {
        let wiki = &self.config.wiki;
        match self.articles.get(name) {
            Some(article) => {
                let context = Context::for_article(wiki, &article, &*self.markdown);
                self.render(200, &self.config.templates.view, &context)
            }
            None => {
                let name = escape_html(&name.to_lowercase());
                let message = format!(
                    "{name} was not found. You may want to <a href=\"{name}/edit\">create this page!</a>"
                );
                self.render_error(404, &message)
            }
        }
    }

    /// Show the edit form for an article, empty if it does not exist yet
    pub fn edit(&self, name: &str) -> Response {
        if !self.config.wiki.editable {
            return self.editing_disabled();
        }

        let wiki = &self.config.wiki;
        let context = match self.articles.get(name) {
            Some(article) => Context::for_article(wiki, &article, &*self.markdown),
            None => Context::custom(wiki, NEW_ARTICLE_TITLE, ""),
        };
        self.render(200, &self.config.templates.edit, &context)
    }

    /// Store new content for an article and redirect to it
    pub fn save(&self, name: &str, content: &str) -> Response {
        if !self.config.wiki.editable {
            return self.editing_disabled();
        }

        match self.articles.save(name, content) {
            Ok(article) => Response::Redirect {
                location: format!("/{}", article.title),
            },
            Err(err) => {
                warn!("Failed to save article {}: {}", name, err);
                self.render_error(500, SERVER_ERROR_MESSAGE)
            }
        }
    }

    fn editing_disabled(&self) -> Response {
        self.render_error(404, "This wiki is read-only.")
    }

    fn render(&self, status: u16, page: &str, context: &Context) -> Response {
        match render_page(&self.templates, page, &self.config.templates.container, context) {
            Ok(body) => Response::Page { status, body },
            Err(err) => {
                error!("Failed to render {}: {}", page, err);
                self.render_error(500, SERVER_ERROR_MESSAGE)
            }
        }
    }

    /// Render the error template, falling back to plain text if that fails too
    fn render_error(&self, code: u16, message: &str) -> Response {
        let context = Context::for_error(&self.config.wiki, code, message);
        let templates = &self.config.templates;
        let body = match render_page(&self.templates, &templates.error, &templates.container, &context)
        {
            Ok(body) => body,
            Err(err) => {
                error!("Failed to render error page: {}", err);
                format!("Error {}: {}", code, message)
            }
        };
        Response::Page { status: code, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::Article;

    struct Shouting;

    impl MarkdownRenderer for Shouting {
        fn render(&self, markdown: &str) -> String {
            markdown.to_uppercase()
        }
    }

    fn templates() -> TemplateStore {
        let mut store = TemplateStore::new();
        store.load("main.template", "[{:*}]");
        store.load("view.template", "{Article.Title}:{Article.Content}");
        store.load("edit.template", "edit {Article.Title}:{Article.RawContent}");
        store.load("error.template", "{Error.Code} {Error.Message}");
        store
    }

    fn wiki() -> Wiki {
        let articles = ArticleRepository::new();
        articles.insert(Article::new("Home", "hello"));
        Wiki::from_parts(WikiConfig::default(), templates(), articles).expect("Should build")
    }

    #[test]
    fn test_missing_required_template() {
        let store = templates();
        let mut config = WikiConfig::default();
        config.templates.edit = "form.template".to_string();

        let result = Wiki::from_parts(config, store, ArticleRepository::new());
        match result {
            Err(WikiError::MissingTemplate { name }) => assert_eq!(name, "form.template"),
            Err(other) => panic!("Expected MissingTemplate, got {:?}", other),
            Ok(_) => panic!("Expected MissingTemplate"),
        }
    }

    #[test]
    fn test_template_cycle_is_fatal() {
        let mut store = templates();
        store.load("a.template", "{:b.template}");
        store.load("b.template", "{:a.template}");

        let result = Wiki::from_parts(WikiConfig::default(), store, ArticleRepository::new());
        assert!(matches!(
            result,
            Err(WikiError::Template(crate::template::TemplateError::Cycle { .. }))
        ));
    }

    #[test]
    fn test_view_uses_custom_markdown() {
        let wiki = wiki().with_markdown(Shouting);
        assert_eq!(
            wiki.view("home"),
            Response::Page {
                status: 200,
                body: "[Home:HELLO]".to_string()
            }
        );
    }

    #[test]
    fn test_view_missing_escapes_name() {
        let response = wiki().view("<b>");
        assert_eq!(response.status(), 404);
        let body = response.body().unwrap();
        assert!(body.starts_with("[404 &lt;b&gt; was not found."));
        assert!(!body.contains("<b>"));
    }

    #[test]
    fn test_read_only_wiki() {
        let mut config = WikiConfig::default();
        config.wiki.editable = false;
        let wiki = Wiki::from_parts(config, templates(), ArticleRepository::new()).unwrap();

        assert_eq!(wiki.edit("home").status(), 404);
        assert_eq!(wiki.save("home", "text").status(), 404);
        assert!(wiki.articles().is_empty());
    }

    #[test]
    fn test_error_page_falls_back_to_plain_text() {
        let mut wiki =
            Wiki::from_parts(WikiConfig::default(), templates(), ArticleRepository::new()).unwrap();
        // Simulate a store without the error template
        let mut store = TemplateStore::new();
        store.load("main.template", "[{:*}]");
        wiki.templates = Arc::new(store);

        let response = wiki.save("home", "");
        assert_eq!(
            response,
            Response::Page {
                status: 500,
                body: format!("Error 500: {}", SERVER_ERROR_MESSAGE)
            }
        );
    }

    #[test]
    fn test_frontpage_redirect() {
        assert_eq!(
            wiki().frontpage(),
            Response::Redirect {
                location: "/Home".to_string()
            }
        );
    }
}
