//! Store configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default root directory for backups, relative to the working directory
pub const DEFAULT_ROOT_DIR: &str = "data";

/// Where backups live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root of all node directories
    pub root_dir: PathBuf,
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With root directory
    #[inline]
    #[must_use]
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
        }
    }
}
