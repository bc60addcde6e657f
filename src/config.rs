//! Configuration types for the paginator and its checkpoint store
//!
//! Configuration can be loaded from YAML or JSON. Every field has a
//! default, so an empty document yields a working in-memory setup.

use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of records skipped per forward-advance fetch
pub const DEFAULT_FETCH_LIMIT: usize = 1000;

// ============================================================================
// Paginator Config
// ============================================================================

/// Paginator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerConfig {
    /// Batch ceiling used when walking forward from a checkpoint.
    /// A checkpoint is cached after every batch.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Whether page contents are cached next to their start cursor
    #[serde(default = "default_true")]
    pub cache_objects: bool,

    /// Checkpoint store backend
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}

fn default_true() -> bool {
    true
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            fetch_limit: DEFAULT_FETCH_LIMIT,
            cache_objects: true,
            store: StoreConfig::default(),
        }
    }
}

impl PagerConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the forward-advance batch ceiling
    #[must_use]
    pub fn with_fetch_limit(mut self, fetch_limit: usize) -> Self {
        self.fetch_limit = fetch_limit;
        self
    }

    /// Enable or disable page content caching
    #[must_use]
    pub fn with_cache_objects(mut self, cache_objects: bool) -> Self {
        self.cache_objects = cache_objects;
        self
    }

    /// Set the store backend
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            other => Err(Error::config(format!(
                "Unsupported config file extension: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.fetch_limit == 0 {
            return Err(Error::invalid_value("fetch_limit", "must be at least 1"));
        }
        self.store.validate()
    }
}

// ============================================================================
// Store Config
// ============================================================================

/// Checkpoint store backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local store, optionally LRU-bounded by number of kinds
    Memory {
        #[serde(default)]
        capacity: Option<usize>,
    },

    /// One JSON file per kind under `dir`
    File { dir: PathBuf },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory { capacity: None }
    }
}

impl StoreConfig {
    /// Unbounded in-memory store
    pub fn memory() -> Self {
        Self::Memory { capacity: None }
    }

    /// LRU-bounded in-memory store
    pub fn bounded(capacity: usize) -> Self {
        Self::Memory {
            capacity: Some(capacity),
        }
    }

    /// File store rooted at `dir`
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::File { dir: dir.into() }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Memory { capacity: Some(0) } => {
                Err(Error::invalid_value("store.capacity", "must be at least 1"))
            }
            Self::File { dir } if dir.as_os_str().is_empty() => {
                Err(Error::invalid_value("store.dir", "must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = PagerConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, PagerConfig::default());
        assert_eq!(config.fetch_limit, 1000);
        assert!(config.cache_objects);
        assert_eq!(config.store, StoreConfig::memory());
    }

    #[test]
    fn test_yaml_file_store() {
        let yaml = r"
fetch_limit: 250
cache_objects: false
store:
  type: file
  dir: /var/cache/pager
";
        let config = PagerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.fetch_limit, 250);
        assert!(!config.cache_objects);
        assert_eq!(config.store, StoreConfig::file("/var/cache/pager"));
    }

    #[test]
    fn test_json_bounded_memory_store() {
        let json = r#"{"store": {"type": "memory", "capacity": 64}}"#;
        let config = PagerConfig::from_json_str(json).unwrap();
        assert_eq!(config.store, StoreConfig::bounded(64));
    }

    #[test]
    fn test_rejects_zero_fetch_limit() {
        let err = PagerConfig::from_yaml_str("fetch_limit: 0").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfigValue { ref field, .. } if field == "fetch_limit"
        ));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = PagerConfig::new().with_store(StoreConfig::bounded(0));
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfigValue { ref field, .. } if field == "store.capacity"
        ));
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempdir().unwrap();

        let yaml_path = dir.path().join("pager.yaml");
        std::fs::write(&yaml_path, "fetch_limit: 10").unwrap();
        assert_eq!(PagerConfig::from_file(&yaml_path).unwrap().fetch_limit, 10);

        let json_path = dir.path().join("pager.json");
        std::fs::write(&json_path, r#"{"fetch_limit": 20}"#).unwrap();
        assert_eq!(PagerConfig::from_file(&json_path).unwrap().fetch_limit, 20);

        let toml_path = dir.path().join("pager.toml");
        std::fs::write(&toml_path, "fetch_limit = 30").unwrap();
        assert!(PagerConfig::from_file(&toml_path).is_err());

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            PagerConfig::from_file(&missing),
            Err(Error::FileNotFound { .. })
        ));
    }
}
