//! Storage directory structure
//!
//! All state lives under one root directory:
//!
//! ```text
//! sfm_data/
//! ├── graphs/                  # Current payload of each graph
//! │   └── <graph_id><ext>
//! ├── metadata/                # Current metadata sidecar of each graph
//! │   └── <graph_id>.json
//! ├── versions/                # Archived versions, one directory per graph
//! │   └── <graph_id>/
//! │       ├── v000001<ext>
//! │       ├── v000001.meta.json
//! │       └── ...
//! └── backups/                 # Verbatim payload copies
//!     └── <name>.backup
//! ```
//!
//! `<ext>` is the extension of the payload's [`StorageFormat`]. Everything
//! here is pure path arithmetic except [`StorageLayout::create_directories`].

use std::path::{Path, PathBuf};

use crate::format::StorageFormat;

/// Extension of the current metadata sidecar
pub const METADATA_EXTENSION: &str = ".json";

/// Suffix of an archived metadata sidecar
pub const ARCHIVED_METADATA_SUFFIX: &str = ".meta.json";

/// Extension of backup files
pub const BACKUP_EXTENSION: &str = ".backup";

/// Digits in an archived version file name
const VERSION_WIDTH: usize = 6;

/// Storage directory paths
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Create a layout rooted at `root`
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        StorageLayout {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of current payloads
    pub fn graphs_dir(&self) -> PathBuf {
        self.root.join("graphs")
    }

    /// Directory of current metadata sidecars
    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join("metadata")
    }

    /// Parent of the per-graph version directories
    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    /// Directory of backups
    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// Current payload of `graph_id` in `format`
    pub fn current_payload(&self, graph_id: &str, format: StorageFormat) -> PathBuf {
        self.graphs_dir()
            .join(format!("{}{}", graph_id, format.extension()))
    }

    /// Current metadata sidecar of `graph_id`
    pub fn current_metadata(&self, graph_id: &str) -> PathBuf {
        self.metadata_dir()
            .join(format!("{}{}", graph_id, METADATA_EXTENSION))
    }

    /// Version directory of `graph_id`
    pub fn version_dir(&self, graph_id: &str) -> PathBuf {
        self.versions_dir().join(graph_id)
    }

    /// Archived payload of `graph_id` at `version`
    pub fn archived_payload(&self, graph_id: &str, version: u64, format: StorageFormat) -> PathBuf {
        self.version_dir(graph_id)
            .join(format!("{}{}", version_stem(version), format.extension()))
    }

    /// Archived metadata sidecar of `graph_id` at `version`
    pub fn archived_metadata(&self, graph_id: &str, version: u64) -> PathBuf {
        self.version_dir(graph_id)
            .join(format!("{}{}", version_stem(version), ARCHIVED_METADATA_SUFFIX))
    }

    /// Backup file called `name`
    pub fn backup_file(&self, name: &str) -> PathBuf {
        self.backups_dir()
            .join(format!("{}{}", name, BACKUP_EXTENSION))
    }

    /// Create the root and the four top-level directories
    pub fn create_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.graphs_dir())?;
        std::fs::create_dir_all(self.metadata_dir())?;
        std::fs::create_dir_all(self.versions_dir())?;
        std::fs::create_dir_all(self.backups_dir())?;
        Ok(())
    }
}

fn version_stem(version: u64) -> String {
    format!("v{:0width$}", version, width = VERSION_WIDTH)
}

/// Check that `id` can be used as a single path component
///
/// Rejects empty ids, `.` and `..`, path separators, NUL, and a leading
/// `.` (reserved for temporary files).
pub fn validate_graph_id(id: &str) -> Result<(), LayoutError> {
    if id.is_empty() {
        return Err(LayoutError::Empty);
    }
    if id == "." || id == ".." {
        return Err(LayoutError::Reserved(id.to_string()));
    }
    if let Some(c) = id.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(LayoutError::ForbiddenCharacter {
            id: id.to_string(),
            character: c,
        });
    }
    if id.starts_with('.') {
        return Err(LayoutError::Reserved(id.to_string()));
    }
    Ok(())
}

/// Version number of an archived metadata file name (`v000007.meta.json` -> 7)
pub fn parse_archived_version(file_name: &str) -> Option<u64> {
    let stem = file_name.strip_suffix(ARCHIVED_METADATA_SUFFIX)?;
    let digits = stem.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Version and format of an archived payload file name
/// (`v000007.json.gz` -> `(7, JsonGz)`)
pub fn parse_archived_payload(file_name: &str) -> Option<(u64, StorageFormat)> {
    StorageFormat::ALL.into_iter().find_map(|format| {
        let digits = file_name
            .strip_suffix(format.extension())?
            .strip_prefix('v')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(|v| (v, format))
    })
}

/// Graph id of a current metadata file name (`g1.json` -> `g1`)
///
/// Hidden files (temporaries) are skipped.
pub fn graph_id_from_metadata_file(file_name: &str) -> Option<&str> {
    let id = file_name.strip_suffix(METADATA_EXTENSION)?;
    validate_graph_id(id).ok().map(|_| id)
}

/// Name of a backup file without its extension (`g1_x.backup` -> `g1_x`)
pub fn backup_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(BACKUP_EXTENSION)
        .filter(|name| !name.is_empty() && !name.starts_with('.'))
}

/// Identifier rejected by [`validate_graph_id`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Empty identifier
    #[error("identifier must not be empty")]
    Empty,

    /// `.`/`..` or a hidden name
    #[error("identifier '{0}' is reserved")]
    Reserved(String),

    /// Path separator or NUL
    #[error("identifier '{id}' contains forbidden character {character:?}")]
    ForbiddenCharacter {
        /// Offending identifier
        id: String,
        /// First forbidden character
        character: char,
    },
}
