//! Persistence configuration
//!
//! A [`PersistenceConfig`] is built in code with the `with_*` builders or
//! read from a TOML file:
//!
//! ```toml
//! base_path = "./sfm_data"
//! default_format = "json"
//! enable_compression = true
//! enable_versioning = true
//! versioning_strategy = "incremental"   # none | incremental | rolling | snapshot
//! snapshot_interval = 5                 # used by "snapshot"
//! max_versions = 10
//! enable_backup = true
//! backup_interval_hours = 24
//! validate_on_load = true
//! validate_on_save = true
//! thread_safe = true
//! auto_create_directories = true
//! strict_integrity = false
//! ```
//!
//! Missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::format::StorageFormat;

/// Default storage root
pub const DEFAULT_BASE_PATH: &str = "./sfm_data";

/// How previous versions are kept when a graph is overwritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersioningStrategy {
    /// Never archive; only the current version exists
    None,
    /// Archive every outgoing version
    #[default]
    Incremental,
    /// Archive every outgoing version, then prune to `max_versions`
    Rolling,
    /// Archive only versions whose number is a multiple of `snapshot_interval`
    Snapshot,
}

/// Persistence manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Storage root directory
    pub base_path: PathBuf,
    /// Format used when `save` is not given one
    pub default_format: StorageFormat,
    /// Upgrade the default format to its gzip variant
    pub enable_compression: bool,
    /// Archive the outgoing version on each save
    pub enable_versioning: bool,
    /// Which outgoing versions are archived
    pub versioning_strategy: VersioningStrategy,
    /// Archive spacing for [`VersioningStrategy::Snapshot`]
    pub snapshot_interval: u64,
    /// Versions retained by cleanup (and by rolling versioning)
    pub max_versions: usize,
    /// Allow backups to be created
    pub enable_backup: bool,
    /// Suggested backup cadence, surfaced to callers that schedule backups
    pub backup_interval_hours: u64,
    /// Validate graphs after loading
    pub validate_on_load: bool,
    /// Validate graphs before saving
    pub validate_on_save: bool,
    /// Serialize whole operations behind one lock
    pub thread_safe: bool,
    /// Create the directory tree when the manager is constructed
    pub auto_create_directories: bool,
    /// Treat checksum mismatches as errors instead of warnings
    pub strict_integrity: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            default_format: StorageFormat::Json,
            enable_compression: true,
            enable_versioning: true,
            versioning_strategy: VersioningStrategy::Incremental,
            snapshot_interval: 5,
            max_versions: 10,
            enable_backup: true,
            backup_interval_hours: 24,
            validate_on_load: true,
            validate_on_save: true,
            thread_safe: true,
            auto_create_directories: true,
            strict_integrity: false,
        }
    }
}

impl PersistenceConfig {
    /// Default configuration rooted at `base_path`
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        PersistenceConfig {
            base_path: base_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Configuration for tests
    ///
    /// Uncompressed JSON and strict integrity, so tests can inspect payloads
    /// and see checksum problems as errors.
    pub fn for_testing(base_path: impl AsRef<Path>) -> Self {
        PersistenceConfig {
            base_path: base_path.as_ref().to_path_buf(),
            enable_compression: false,
            strict_integrity: true,
            ..Default::default()
        }
    }

    /// Set the default format
    pub fn with_default_format(mut self, format: StorageFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Enable or disable compression of the default format
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    /// Enable or disable versioning
    pub fn with_versioning(mut self, enabled: bool) -> Self {
        self.enable_versioning = enabled;
        self
    }

    /// Set the versioning strategy
    pub fn with_versioning_strategy(mut self, strategy: VersioningStrategy) -> Self {
        self.versioning_strategy = strategy;
        self
    }

    /// Set the snapshot interval
    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval;
        self
    }

    /// Set the number of versions cleanup retains
    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions;
        self
    }

    /// Enable or disable backups
    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.enable_backup = enabled;
        self
    }

    /// Enable or disable validation on load and on save
    pub fn with_validation(mut self, on_load: bool, on_save: bool) -> Self {
        self.validate_on_load = on_load;
        self.validate_on_save = on_save;
        self
    }

    /// Enable or disable the operation lock
    pub fn with_thread_safety(mut self, enabled: bool) -> Self {
        self.thread_safe = enabled;
        self
    }

    /// Enable or disable directory creation on construction
    pub fn with_auto_create_directories(mut self, enabled: bool) -> Self {
        self.auto_create_directories = enabled;
        self
    }

    /// Enable or disable strict checksum handling
    pub fn with_strict_integrity(mut self, strict: bool) -> Self {
        self.strict_integrity = strict;
        self
    }

    /// Check invariants the manager relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBasePath);
        }
        if self.max_versions == 0 {
            return Err(ConfigError::ZeroMaxVersions);
        }
        if self.versioning_strategy == VersioningStrategy::Snapshot && self.snapshot_interval == 0
        {
            return Err(ConfigError::ZeroSnapshotInterval);
        }
        Ok(())
    }

    /// Format to use for a save given an optional explicit choice
    ///
    /// An explicit format is used as is. Otherwise the default format is
    /// used, upgraded to its compressed variant when compression is on.
    pub fn effective_format(&self, explicit: Option<StorageFormat>) -> StorageFormat {
        match explicit {
            Some(format) => format,
            None if self.enable_compression => self.default_format.compressed(),
            None => self.default_format,
        }
    }

    /// True if the outgoing `version` is archived when overwritten
    pub fn archives_version(&self, version: u64) -> bool {
        if !self.enable_versioning {
            return false;
        }
        match self.versioning_strategy {
            VersioningStrategy::None => false,
            VersioningStrategy::Incremental | VersioningStrategy::Rolling => true,
            VersioningStrategy::Snapshot => {
                self.snapshot_interval > 0 && version % self.snapshot_interval == 0
            }
        }
    }

    /// Versions to keep after each save, when rolling versioning is on
    pub fn rolling_limit(&self) -> Option<usize> {
        (self.enable_versioning && self.versioning_strategy == VersioningStrategy::Rolling)
            .then_some(self.max_versions)
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PersistenceConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse {
                path: None,
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: PersistenceConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: Some(path.to_path_buf()),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML and write to `path`
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `base_path` is empty
    #[error("base_path must not be empty")]
    EmptyBasePath,

    /// `max_versions` is zero
    #[error("max_versions must be at least 1")]
    ZeroMaxVersions,

    /// Snapshot versioning with a zero interval
    #[error("snapshot_interval must be at least 1 for snapshot versioning")]
    ZeroSnapshotInterval,

    /// Config file could not be read
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config document is not valid TOML for this schema
    #[error("failed to parse config{}: {source}", describe_source(.path))]
    Parse {
        /// Config file, if parsed from one
        path: Option<PathBuf>,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Config could not be serialized
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Config file could not be written
    #[error("failed to write config file '{}': {source}", .path.display())]
    Write {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

fn describe_source(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" file '{}'", path.display()),
        None => String::new(),
    }
}
