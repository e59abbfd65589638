//! dbweave configuration
//!
//! Looked up in order: an explicit path, `./dbweave.toml`, then
//! `<config dir>/dbweave/config.toml`. Missing files fall back to defaults.
//!
//! ```toml
//! dialect = "mysql"
//! use_delimited = true
//! database_url = "mysql://localhost/app"
//! mappings = ["mappings/users.toml"]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::dialect::DialectKind;
use crate::error::{WeaveError, WeaveResult};
use crate::lambda::LambdaTemplate;
use crate::mapping::MappingRegistry;

/// File name searched in the working directory.
pub const LOCAL_CONFIG: &str = "dbweave.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeaveConfig {
    /// Target dialect; guessed from `database_url` when unset
    pub dialect: Option<DialectKind>,

    /// Quote every identifier
    #[serde(default)]
    pub use_delimited: bool,

    /// Database connection URL
    pub database_url: Option<String>,

    /// Mapping documents, relative to the config file
    #[serde(default)]
    pub mappings: Vec<PathBuf>,

    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl WeaveConfig {
    pub fn builder() -> WeaveConfigBuilder {
        WeaveConfigBuilder::default()
    }

    pub fn from_toml(input: &str) -> WeaveResult<Self> {
        toml::from_str(input).map_err(|e| WeaveError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> WeaveResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WeaveError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config = Self::from_toml(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Load the first config found, or defaults when there is none.
    /// An explicit path that does not exist is an error.
    pub fn discover(explicit: Option<&Path>) -> WeaveResult<Self> {
        if let Some(path) = explicit {
            tracing::debug!("loading config from {}", path.display());
            return Self::from_file(path);
        }
        for candidate in Self::candidates() {
            if candidate.is_file() {
                tracing::debug!("loading config from {}", candidate.display());
                return Self::from_file(&candidate);
            }
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("dbweave").join("config.toml"));
        }
        paths
    }

    /// Explicit dialect, else the URL scheme, else Postgres.
    pub fn dialect(&self) -> DialectKind {
        self.dialect
            .or_else(|| self.database_url.as_deref().and_then(DialectKind::from_url))
            .unwrap_or_default()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Load every configured mapping document.
    pub fn load_mappings(&self) -> WeaveResult<MappingRegistry> {
        let mut registry = MappingRegistry::new();
        for path in &self.mappings {
            registry.load_file(self.resolve(path))?;
        }
        Ok(registry)
    }

    /// A statement template for this configuration.
    pub fn template(&self) -> WeaveResult<LambdaTemplate> {
        Ok(LambdaTemplate::new(self.dialect().strategy())
            .with_mappings(Arc::new(self.load_mappings()?))
            .use_delimited(self.use_delimited))
    }
}

#[derive(Debug, Default)]
pub struct WeaveConfigBuilder {
    config: WeaveConfig,
}

impl WeaveConfigBuilder {
    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.config.dialect = Some(dialect);
        self
    }

    pub fn database(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn use_delimited(mut self, use_delimited: bool) -> Self {
        self.config.use_delimited = use_delimited;
        self
    }

    pub fn mapping(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.mappings.push(path.into());
        self
    }

    pub fn build(self) -> WeaveConfig {
        self.config
    }
}
