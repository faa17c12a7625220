//! Registry of temporarily stored uploads.
//!
//! Every accepted upload gets a fresh id and an expiry instant; expiry is
//! enforced lazily on retrieval and by a one-shot purge task scheduled at
//! admission. Both paths tolerate the entry being purged twice. Purge tasks
//! are tracked per entry and cancelled when the entry is removed early.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeDelta, Utc};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::domain::{FileId, FileName, UploadRoot};
use crate::services::{ServiceError, ServiceResult};

/// Metadata recorded for one stored upload.
#[derive(Clone, Debug)]
pub struct TempFileEntry {
    pub original_name: FileName,
    pub mime_type: String,
    pub size: u64,
    pub path: PathBuf,
    pub expires_at: DateTime<Utc>,
}

/// Retrieval failures. `Expired` means the id once existed, so callers can
/// answer 410 instead of 404.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum RetrieveError {
    #[error("file not found")]
    NotFound,
    #[error("file has expired")]
    Expired,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<FileId, TempFileEntry>,
    purge_tasks: HashMap<FileId, JoinHandle<()>>,
}

/// Keyed collection of temporary files rooted at one directory.
///
/// Ids are freshly generated per upload, so concurrent requests never
/// contend on the same key. Must live inside a tokio runtime (the actix
/// server provides one) so purge tasks can be scheduled.
#[derive(Clone)]
pub struct TempFileRegistry {
    state: Arc<Mutex<RegistryState>>,
    root: UploadRoot,
    retention: Duration,
}

impl TempFileRegistry {
    pub fn new(root: UploadRoot, retention: Duration) -> ServiceResult<Self> {
        fs::create_dir_all(root.as_path()).map_err(ServiceError::StorageSetup)?;
        Ok(Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            root,
            retention,
        })
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist an uploaded temp file under a fresh id and schedule its
    /// deletion after the retention window.
    pub fn admit(
        &self,
        original_name: FileName,
        mime_type: String,
        size: u64,
        file: NamedTempFile,
    ) -> ServiceResult<(FileId, TempFileEntry)> {
        let id = FileId::generate();
        let path = self.root.resolve(id, &original_name);
        file.persist(&path)
            .map_err(|err| ServiceError::SaveFile(err.error))?;

        let expires_at = Utc::now() + TimeDelta::from_std(self.retention).unwrap_or(TimeDelta::MAX);
        let entry = TempFileEntry {
            original_name,
            mime_type,
            size,
            path,
            expires_at,
        };

        // Entry and task handle are installed under one lock so the task,
        // which takes the same lock, cannot observe a half-registered id.
        let mut state = self.state.lock().unwrap();
        state.entries.insert(id, entry.clone());
        let registry = self.clone();
        let retention = self.retention;
        let task = tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            registry.purge(id);
        });
        state.purge_tasks.insert(id, task);

        Ok((id, entry))
    }

    /// Look up an entry for serving. Expired entries are purged on the spot
    /// and reported as `Expired`; the next lookup of the same id is
    /// `NotFound`.
    pub fn retrieve(&self, id: FileId) -> Result<TempFileEntry, RetrieveError> {
        let entry = {
            let state = self.state.lock().unwrap();
            state.entries.get(&id).cloned()
        };
        let entry = entry.ok_or(RetrieveError::NotFound)?;
        if Utc::now() > entry.expires_at {
            self.purge(id);
            return Err(RetrieveError::Expired);
        }
        Ok(entry)
    }

    /// Remove the entry and its bytes. Idempotent: unknown ids and already
    /// deleted files are logged, never errors.
    pub fn purge(&self, id: FileId) {
        let (entry, task) = {
            let mut state = self.state.lock().unwrap();
            (state.entries.remove(&id), state.purge_tasks.remove(&id))
        };
        if let Some(task) = task {
            task.abort();
        }
        let Some(entry) = entry else {
            return;
        };
        match fs::remove_file(&entry.path) {
            Ok(()) => log::info!("cleaned up temp file {}", entry.original_name),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("temp file {} already gone", entry.original_name)
            }
            Err(err) => log::error!("failed to delete temp file {}: {err}", entry.original_name),
        }
    }

    /// Remove or re-schedule files a previous process left behind. Files
    /// older than the retention window (by mtime) are deleted immediately;
    /// younger ones get a deferred deletion at the remaining offset. Returns
    /// how many files were deleted right away.
    pub fn sweep_orphans(&self) -> ServiceResult<usize> {
        let known: HashSet<PathBuf> = {
            let state = self.state.lock().unwrap();
            state.entries.values().map(|e| e.path.clone()).collect()
        };

        let mut removed = 0;
        let now = SystemTime::now();
        for dir_entry in fs::read_dir(self.root.as_path()).map_err(ServiceError::ListEntries)? {
            let dir_entry = dir_entry.map_err(ServiceError::ListEntries)?;
            let path = dir_entry.path();
            if path.is_dir() || known.contains(&path) {
                continue;
            }
            let age = dir_entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .unwrap_or_default();
            if age >= self.retention {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        log::info!("swept orphaned temp file {}", path.display());
                        removed += 1;
                    }
                    Err(err) => log::error!("failed to sweep {}: {err}", path.display()),
                }
            } else {
                let remaining = self.retention - age;
                tokio::spawn(async move {
                    tokio::time::sleep(remaining).await;
                    if let Err(err) = fs::remove_file(&path) {
                        if err.kind() != std::io::ErrorKind::NotFound {
                            log::error!("failed to sweep {}: {err}", path.display());
                        }
                    }
                });
            }
        }
        Ok(removed)
    }

    #[cfg(test)]
    fn scheduled_purges(&self) -> usize {
        self.state.lock().unwrap().purge_tasks.len()
    }

    /// Back-date an entry's expiry (for testing purposes).
    #[cfg(test)]
    pub fn expire_now(&self, id: FileId) {
        if let Some(entry) = self.state.lock().unwrap().entries.get_mut(&id) {
            entry.expires_at = Utc::now() - TimeDelta::seconds(1);
        }
    }
}
