//! JSON file storage backend.
//!
//! The whole state lives in one pretty-printed JSON document. Saves go
//! through a temp file and a rename, so a crash mid-write leaves the previous
//! document in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::{rename_with_fallback, sibling_path, unix_nanos, write_atomic};
use crate::storage::traits::{Loaded, StateStore};
use crate::storage::types::LibraryState;
use crate::storage::validation::check_integrity;

/// Stores the library state as a JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(contents: &str) -> std::result::Result<LibraryState, String> {
        let state: LibraryState =
            serde_json::from_str(contents).map_err(|e| format!("Invalid JSON: {}", e))?;
        check_integrity(&state).map_err(|e| e.to_string())?;
        Ok(state)
    }

    /// Move rejected data out of the way so the next save cannot destroy it.
    fn quarantine(&self) -> Option<PathBuf> {
        let target = unix_nanos()
            .and_then(|nanos| sibling_path(&self.path, &format!("corrupt-{}", nanos)))
            .ok()?;
        match rename_with_fallback(&self.path, &target) {
            Ok(()) => Some(target),
            Err(err) => {
                log::warn!(
                    "Could not move rejected data {:?} aside: {}",
                    self.path,
                    err
                );
                None
            }
        }
    }

    /// Start empty after rejecting the document, which is moved aside.
    fn recover(&self, reason: String) -> Loaded {
        let quarantined = self.quarantine();
        log::warn!(
            "Discarding library data at {:?}: {} (moved to {:?})",
            self.path,
            reason,
            quarantined
        );
        Loaded::recovered(reason, quarantined)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Loaded> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                log::info!("No library data at {:?}; starting empty", self.path);
                return Ok(Loaded::fresh());
            }
            // The bytes were never seen, so there is nothing to move aside.
            Err(err) => {
                let reason = format!("Read failed: {}", err);
                log::warn!("Could not read library data at {:?}: {}", self.path, err);
                return Ok(Loaded::recovered(reason, None));
            }
        };

        match Self::parse(&contents) {
            Ok(state) => {
                log::info!(
                    "Loaded library data from {:?}: {} items, {} members, {} active loans",
                    self.path,
                    state.items.len(),
                    state.members.len(),
                    state.loan_records.len()
                );
                Ok(Loaded::restored(state))
            }
            Err(reason) => Ok(self.recover(reason)),
        }
    }

    fn save(&self, state: &LibraryState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)?;
        write_atomic(&self.path, &json)
    }
}
