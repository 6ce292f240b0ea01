//! File-backed store: one `<slot>.json` file per slot in a data directory.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::store::{Store, StoreError};

const SLOT_EXTENSION: &str = "json";

/// Store that keeps each slot in its own file under `dir`.
///
/// Writes go to a per-writer temp file that is then renamed over the target,
/// so a crash mid-write leaves the previous value intact and concurrent
/// writers never share a temp file. On Unix files are created `0600`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default data directory for the current user.
    pub fn default_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "sct", "sct").map(|dirs| dirs.data_dir().to_path_buf())
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, StoreError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::OperationFailed(format!(
                "invalid slot name: {slot:?}"
            )));
        }
        Ok(self.dir.join(format!("{slot}.{SLOT_EXTENSION}")))
    }

    fn temp_path(&self, slot: &str) -> Result<PathBuf, StoreError> {
        let mut suffix = [0u8; 8];
        getrandom::getrandom(&mut suffix)
            .map_err(|e| StoreError::OperationFailed(format!("failed to name temp file: {e}")))?;
        Ok(self.dir.join(format!(".{slot}.{}.tmp", hex::encode(suffix))))
    }
}

/// Create `path` (which must not exist) readable by the owner only, then
/// write and sync `contents`.
async fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| io_error("failed to create", path, e))?;
    file.write_all(contents)
        .await
        .map_err(|e| io_error("failed to write", path, e))?;
    file.sync_all()
        .await
        .map_err(|e| io_error("failed to sync", path, e))
}

fn io_error(context: &str, path: &Path, e: io::Error) -> StoreError {
    StoreError::OperationFailed(format!("{context} {}: {e}", path.display()))
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, slot: &str) -> Result<Option<String>, StoreError> {
        let path = self.slot_path(slot)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("failed to read", &path, e)),
        }
    }

    async fn set(&self, slot: &str, value: String) -> Result<(), StoreError> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error("failed to create", &self.dir, e))?;

        // Write atomically using a temp file unique to this writer
        let temp_path = self.temp_path(slot)?;
        if let Err(e) = write_private_file(&temp_path, value.as_bytes()).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error("failed to rename", &path, e));
        }

        tracing::trace!(slot, "slot written");
        Ok(())
    }

    async fn remove(&self, slot: &str) -> Result<(), StoreError> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("failed to remove", &path, e)),
        }
    }

    async fn slots(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("failed to list", &self.dir, e)),
        };

        let mut slots = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("failed to list", &self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SLOT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                slots.push(stem.to_string());
            }
        }
        slots.sort();
        Ok(slots)
    }
}
