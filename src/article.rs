//! Article storage
//!
//! Articles are Markdown files named `<Title>.md`. They are looked up by
//! lowercased title and can be saved concurrently from request handlers.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File extension of article files
pub const ARTICLE_EXTENSION: &str = "md";

/// Display format of the modify date, e.g. `Monday, 2. January 15:04`
pub const DATE_FORMAT: &str = "%A, %-d. %B %H:%M";

/// Errors that can occur when loading or saving articles
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("error accessing article file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to save empty article {name}")]
    EmptyContent { name: String },

    #[error("invalid article name: {name:?}")]
    InvalidName { name: String },
}

/// A wiki article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub modified: DateTime<Local>,
    /// Raw Markdown
    pub content: String,
}

impl Article {
    /// Create an article modified now
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            modified: Local::now(),
            content: content.into(),
        }
    }

    pub fn modify_date(&self) -> String {
        self.modified.format(DATE_FORMAT).to_string()
    }
}

/// Articles keyed by lowercased title.
///
/// Saves hold the write lock across the file write and the map update, so
/// concurrent saves of the same article never lose an update.
#[derive(Debug, Default)]
pub struct ArticleRepository {
    /// Directory articles are persisted to; `None` keeps them in memory only
    dir: Option<PathBuf>,
    articles: RwLock<HashMap<String, Article>>,
}

impl ArticleRepository {
    /// Create an empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.md` file in `dir` and persist later saves there.
    ///
    /// The title is the file stem, so saving writes back to the same file.
    /// Files are visited in path order; when two files share a lowercased
    /// title the first one wins.
    pub fn load_dir(dir: &Path) -> Result<Self, ArticleError> {
        let io_error = |source| ArticleError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ARTICLE_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut articles: HashMap<String, Article> = HashMap::new();
        for path in paths {
            let Some(title) = path.file_stem().and_then(|n| n.to_str()) else {
                continue;
            };
            let key = title.to_lowercase();
            if let Some(existing) = articles.get(&key) {
                warn!(
                    "Ignoring {}: article {} is already loaded",
                    path.display(),
                    existing.title
                );
                continue;
            }

            let file_error = |source| ArticleError::Io {
                path: path.clone(),
                source,
            };
            let content = fs::read_to_string(&path).map_err(file_error)?;
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map_err(file_error)?;

            debug!("Loaded article {}", title);
            articles.insert(
                key,
                Article {
                    title: title.to_string(),
                    modified: modified.into(),
                    content,
                },
            );
        }

        info!("{} articles loaded from {}", articles.len(), dir.display());
        Ok(Self {
            dir: Some(dir.to_path_buf()),
            articles: RwLock::new(articles),
        })
    }

    /// Add an article without persisting it
    pub fn insert(&self, article: Article) {
        let mut articles = self.articles.write().unwrap_or_else(PoisonError::into_inner);
        articles.insert(article.title.to_lowercase(), article);
    }

    /// Look up an article by name, ignoring case
    pub fn get(&self, name: &str) -> Option<Article> {
        let articles = self.articles.read().unwrap_or_else(PoisonError::into_inner);
        articles.get(&name.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.articles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create or update an article and write it to disk.
    ///
    /// An existing article keeps the casing of its title; a new one is titled
    /// by the lowercased name.
    pub fn save(&self, name: &str, content: &str) -> Result<Article, ArticleError> {
        if content.is_empty() {
            return Err(ArticleError::EmptyContent {
                name: name.to_string(),
            });
        }
        if !is_safe_name(name) {
            return Err(ArticleError::InvalidName {
                name: name.to_string(),
            });
        }

        let key = name.to_lowercase();
        let mut articles = self.articles.write().unwrap_or_else(PoisonError::into_inner);
        let title = articles
            .get(&key)
            .map(|a| a.title.clone())
            .unwrap_or_else(|| key.clone());

        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{}.{}", title, ARTICLE_EXTENSION));
            fs::write(&path, content).map_err(|source| ArticleError::Io { path, source })?;
        }

        let article = Article::new(title, content);
        articles.insert(key, article.clone());
        info!("Saved article {}", article.title);
        Ok(article)
    }
}

/// Names must stay inside the article directory
fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}
