//! Wiki configuration loaded from a TOML file
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Top-level configuration
///
/// ```toml
/// [wiki]
/// title = "Wikka"
/// url = "http://localhost:8080/"
/// frontpage = "Home"
/// editable = true
///
/// [paths]
/// articles = "articles"
/// templates = "templates"
///
/// [templates]
/// container = "main.template"
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    pub wiki: WikiSettings,
    pub paths: PathSettings,
    pub templates: TemplateNames,
    pub logging: LoggingSettings,
    /// Directory of the config file, used to resolve relative paths
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Wiki-level values exposed to every page as `Wiki.*`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikiSettings {
    pub title: String,
    pub url: String,
    /// Article shown for the root path
    pub frontpage: String,
    /// Enables the edit and save flows
    pub editable: bool,
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            title: "Wikka".to_string(),
            url: "http://localhost:8080/".to_string(),
            frontpage: "Home".to_string(),
            editable: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub articles: PathBuf,
    pub templates: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            articles: PathBuf::from("articles"),
            templates: PathBuf::from("templates"),
        }
    }
}

/// Names of the templates used by the page flows
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateNames {
    pub view: String,
    pub edit: String,
    pub error: String,
    /// Outer layout holding the `{:*}` content slot
    pub container: String,
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            view: "view.template".to_string(),
            edit: "edit.template".to_string(),
            error: "error.template".to_string(),
            container: "main.template".to_string(),
        }
    }
}

impl TemplateNames {
    /// All names, in the order they are checked at startup
    pub fn required(&self) -> [&str; 4] {
        [
            self.view.as_str(),
            self.edit.as_str(),
            self.error.as_str(),
            self.container.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl WikiConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.articles)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.templates)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
