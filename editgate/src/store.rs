//! Persisted session storage.
//!
//! The session record lives in a single slot of a local, origin-scoped,
//! synchronous key-value store. Access is always whole-record: the manager
//! reads, writes, or removes the entire serialized session, never individual
//! fields. Only the session manager writes to the slot.
//!
//! All three operations are total. Unreadable state is reported as an absent
//! record and write failures are logged diagnostics, so a host without
//! working storage degrades to per-page-load sessions instead of erroring.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use crate::errors::{Error, Result};

/// The single persisted-session slot.
pub trait SessionStore: Send + Sync {
    /// Read the raw persisted record, if any.
    fn load(&self) -> Option<String>;
    /// Replace the persisted record.
    fn save(&self, record: &str);
    /// Remove the persisted record. Removing an absent record is a no-op.
    fn clear(&self);
}

/// In-memory store for tests and for embedding hosts that bridge to their own
/// native storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        self.slot.lock().unwrap().clone()
    }

    fn save(&self, record: &str) {
        *self.slot.lock().unwrap() = Some(record.to_string());
    }

    fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

/// File-backed store: one JSON file holding the single record, the native
/// host's analogue of a browser's origin-scoped local storage.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn try_load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage {
                operation: "read the session record".to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<String> {
        match self.try_load() {
            Ok(record) => record,
            Err(e) => {
                warn!("Treating session record as absent: {e}");
                None
            }
        }
    }

    fn save(&self, record: &str) {
        if let Err(e) = std::fs::write(&self.path, record) {
            warn!("Failed to persist session record to {}: {e}", self.path.display());
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove session record at {}: {e}", self.path.display()),
        }
    }
}
