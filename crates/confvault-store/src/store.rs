//! Backup files on disk
//!
//! Files live at `<root>/<node_dir>/<kind dir...>/<file name>` and hold the
//! record payload as JSON pretty-printed with two-space indentation.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;

use confvault_model::{FileKey, ItemKind, Record, StoreLayout};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Saves and loads records under a configured root directory
///
/// Each save or load is one plain filesystem operation. Callers running
/// operations in parallel must not target the same file concurrently.
#[derive(Debug, Clone, Default)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    /// Create store over `config`
    #[inline]
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Store configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory holding files of `kind` for one node
    ///
    /// # Errors
    /// Returns [`StoreError::NotStorable`] if the kind has no layout
    pub fn dir_path(&self, kind: &ItemKind, node_dir: &str) -> StoreResult<PathBuf> {
        let layout = layout(kind)?;
        let mut path = self.config.root_dir.join(node_dir);
        path.extend(layout.dir);
        Ok(path)
    }

    /// Full path of the file addressed by `key`
    ///
    /// # Errors
    /// Returns [`StoreError::NotStorable`] if the kind has no layout
    pub fn file_path(&self, kind: &ItemKind, node_dir: &str, key: &FileKey<'_>) -> StoreResult<PathBuf> {
        let layout = layout(kind)?;
        Ok(self.dir_path(kind, node_dir)?.join(key.file_name(layout.file)))
    }

    /// Load a record from its backup file
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    /// Returns [`StoreError::MalformedBackup`] if the file is not valid JSON
    /// (including bytes that are not UTF-8),
    /// [`StoreError::Io`] on other read failures
    pub fn load<R: Record>(
        &self,
        kind: &'static ItemKind,
        node_dir: &str,
        key: &FileKey<'_>,
    ) -> StoreResult<Option<R>> {
        let path = self.file_path(kind, node_dir, key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(kind = kind.name, path = %path.display(), "no backup file");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::io_error(path, e)),
        };

        let payload = serde_json::from_slice(&bytes).map_err(|e| StoreError::malformed(&path, e))?;
        tracing::debug!(kind = kind.name, path = %path.display(), "loaded backup");
        Ok(Some(R::from_payload(kind, payload)))
    }

    /// Save a record to its backup file, creating directories as needed
    ///
    /// Returns `Ok(false)` without touching the filesystem when the record
    /// has no data.
    ///
    /// # Errors
    /// Returns [`StoreError::NotStorable`] if the kind has no layout,
    /// [`StoreError::Io`] or [`StoreError::Serialize`] if writing fails
    pub fn save<R: Record>(&self, record: &R, node_dir: &str, key: &FileKey<'_>) -> StoreResult<bool> {
        if record.is_empty() {
            return Ok(false);
        }

        let kind = record.kind();
        let dir = self.dir_path(kind, node_dir)?;
        fs::create_dir_all(&dir).map_err(|e| StoreError::io_error(&dir, e))?;

        let path = self.file_path(kind, node_dir, key)?;
        let file = File::create(&path).map_err(|e| StoreError::io_error(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record.data()).map_err(|e| StoreError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        writer.flush().map_err(|e| StoreError::io_error(&path, e))?;

        tracing::debug!(kind = kind.name, path = %path.display(), "saved backup");
        Ok(true)
    }
}

fn layout(kind: &ItemKind) -> StoreResult<StoreLayout> {
    kind.store.ok_or(StoreError::NotStorable(kind.name))
}
