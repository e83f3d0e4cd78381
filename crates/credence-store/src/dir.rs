//! Directory-backed substrate.
//!
//! One file per slot under a namespace root; slot path separators map to
//! subdirectories. Single-slot atomicity comes from writing a temporary
//! file and renaming it into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::error::{Result, StoreError};
use crate::substrate::{valid_slot_name, Substrate};

/// Filesystem substrate rooted at a namespace directory.
pub struct DirSubstrate {
    root: PathBuf,
}

impl DirSubstrate {
    /// Open (creating if needed) a namespace directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The namespace directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf> {
        if !valid_slot_name(slot) {
            return Err(StoreError::InvalidSlotName(slot.to_string()));
        }
        Ok(self.root.join(slot))
    }

    fn map_io(e: std::io::Error) -> StoreError {
        if e.raw_os_error() == Some(28) {
            // ENOSPC
            StoreError::Full
        } else {
            StoreError::Io(e)
        }
    }
}

#[async_trait]
impl Substrate for DirSubstrate {
    async fn read(&self, slot: &str) -> Result<Option<Bytes>> {
        let path = self.slot_path(slot)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn write(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        let path = self.slot_path(slot)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(Self::map_io)?;
        }

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).await.map_err(Self::map_io)?;
        fs::rename(&tmp, &path).await.map_err(Self::map_io)?;
        Ok(())
    }

    async fn enumerate(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::Io(e)),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.extension().map_or(false, |ext| ext == "tmp") {
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let name = relative.to_string_lossy().replace('\\', "/");
                if name.starts_with(prefix) {
                    names.push(name);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn remove(&self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
