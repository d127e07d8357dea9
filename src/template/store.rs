//! Template store for holding named template text

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::resolver;

/// File extension of template files picked up by [`TemplateStore::load_dir`]
pub const TEMPLATE_EXTENSION: &str = "template";

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found in the store at render time
    #[error("template not found: {name}")]
    NotFound { name: String },

    /// Pre-resolution would expand references forever
    #[error("circular template reference in {name}: {}", chain.join(" -> "))]
    Cycle { name: String, chain: Vec<String> },

    /// Error reading a template file or directory
    #[error("error reading templates from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Named templates, keyed by file name (e.g. `view.template`).
///
/// Filled once at startup, pre-resolved with [`TemplateStore::pre_resolve_all`],
/// and read-only afterwards. Share it behind an `Arc` between requests.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: BTreeMap<String, String>,
}

impl TemplateStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.template` file in `dir`, named by file name
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let io_error = |source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut store = Self::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let text = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
                path: path.clone(),
                source,
            })?;
            debug!("Loaded template {}", name);
            store.load(name, text);
        }

        info!("{} templates loaded from {}", store.len(), dir.display());
        Ok(store)
    }

    /// Register a template, replacing any previous text under the same name.
    /// Placeholder syntax is not validated.
    pub fn load(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.templates.insert(name.into(), text.into());
    }

    /// Get the text of a template, or `""` if the name is unknown
    pub fn get(&self, name: &str) -> &str {
        self.lookup(name).unwrap_or("")
    }

    /// Get the text of a template if it exists
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Get all template names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Expand `{:name}` references in every template, in name order.
    ///
    /// Each template is replaced by its resolved form as soon as it is done,
    /// so later templates expand against already-resolved text.
    pub fn pre_resolve_all(&mut self) -> Result<(), TemplateError> {
        let names: Vec<String> = self.templates.keys().cloned().collect();
        for name in names {
            let resolved = resolver::pre_resolve(self, &name)?;
            self.templates.insert(name, resolved);
        }
        debug!("Pre-resolved {} templates", self.len());
        Ok(())
    }
}
