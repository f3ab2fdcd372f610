//! Error types for backup persistence

use std::path::PathBuf;

/// Errors while saving or loading backup files
///
/// A missing backup file is not an error; loads report it as `None`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backup file exists but is not valid JSON
    #[error("invalid JSON file: {path}: {source}")]
    MalformedBackup {
        /// Backup file
        path: PathBuf,
        /// Parse failure
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure other than a missing file
    #[error("io error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Payload could not be written as JSON
    #[error("serialization failed for {path}: {source}")]
    Serialize {
        /// Destination file
        path: PathBuf,
        /// Serializer failure
        #[source]
        source: serde_json::Error,
    },

    /// Kind has no on-disk layout
    #[error("item kind '{0}' is not stored in backups")]
    NotStorable(&'static str),
}

impl StoreError {
    /// Create malformed backup error for path
    pub fn malformed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::MalformedBackup {
            path: path.into(),
            source,
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the failure is a corrupt backup
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedBackup { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
