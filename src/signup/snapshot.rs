//! Versioned write-through persistence for the signup form.
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ApplicationForm, Step};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Full form state as persisted: schema version, explicit step pointer, and
/// every field. Snapshots from another schema version are discarded on load
/// rather than misparsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub schema_version: u32,
    pub step: Step,
    pub form: ApplicationForm,
}

impl FormSnapshot {
    pub fn new(step: Step, form: ApplicationForm) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            step,
            form,
        }
    }
}

impl Default for FormSnapshot {
    fn default() -> Self {
        Self::new(Step::FIRST, ApplicationForm::default())
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot")]
    Read(#[source] io::Error),
    #[error("failed to write snapshot")]
    Write(#[source] io::Error),
    #[error("failed to encode snapshot")]
    Encode(#[source] serde_json::Error),
}

/// Durable storage for one form snapshot. Implementations hold at most one
/// snapshot; `load` after `clear` yields `None`.
pub trait SnapshotStore {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), SnapshotError>;
    fn load(&self) -> Result<Option<FormSnapshot>, SnapshotError>;
    fn clear(&self) -> Result<(), SnapshotError>;
}

/// Corrupt or version-mismatched blobs restore as an empty form.
fn decode(raw: &str) -> Option<FormSnapshot> {
    match serde_json::from_str::<FormSnapshot>(raw) {
        Ok(snapshot) if snapshot.schema_version == SNAPSHOT_SCHEMA_VERSION => Some(snapshot),
        Ok(snapshot) => {
            log::warn!(
                "discarding form snapshot with schema version {}",
                snapshot.schema_version
            );
            None
        }
        Err(err) => {
            log::warn!("discarding unreadable form snapshot: {err}");
            None
        }
    }
}

/// Snapshot store backed by a single JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), SnapshotError> {
        let raw = serde_json::to_string(snapshot).map_err(SnapshotError::Encode)?;
        fs::write(&self.path, raw).map_err(SnapshotError::Write)
    }

    fn load(&self) -> Result<Option<FormSnapshot>, SnapshotError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(decode(&raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SnapshotError::Read(err)),
        }
    }

    fn clear(&self) -> Result<(), SnapshotError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SnapshotError::Write(err)),
        }
    }
}

/// In-memory store holding the serialized blob, mirroring what a durable
/// client store would contain. Clones share the slot.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw persisted blob, as a durable client store would hold it.
    pub fn raw(&self) -> Option<String> {
        self.slot.read().unwrap().clone()
    }

    pub fn set_raw(&self, raw: String) {
        *self.slot.write().unwrap() = Some(raw);
    }
}

impl SnapshotStore for InMemoryStore {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), SnapshotError> {
        let raw = serde_json::to_string(snapshot).map_err(SnapshotError::Encode)?;
        *self.slot.write().unwrap() = Some(raw);
        Ok(())
    }

    fn load(&self) -> Result<Option<FormSnapshot>, SnapshotError> {
        Ok(self.slot.read().unwrap().as_deref().and_then(decode))
    }

    fn clear(&self) -> Result<(), SnapshotError> {
        *self.slot.write().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn file_store_round_trips() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("signup.json"));

        assert!(store.load().unwrap().is_none());

        let mut snapshot = FormSnapshot::default();
        snapshot.form.first_name = "Jan".to_string();
        snapshot.step = Step::Address;
        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap().unwrap(), snapshot);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing an already empty store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn version_mismatch_restores_as_empty() {
        let store = InMemoryStore::new();
        let snapshot = FormSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION + 1,
            ..FormSnapshot::default()
        };
        store.set_raw(serde_json::to_string(&snapshot).unwrap());

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_blob_restores_as_empty() {
        let store = InMemoryStore::new();
        store.set_raw("{not json".to_string());

        assert!(store.load().unwrap().is_none());
    }
}
