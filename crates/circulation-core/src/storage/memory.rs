//! In-memory storage backend.
//!
//! Keeps the last saved state in a `RefCell`. Useful for callers that do not
//! need durability and for exercising save failures.

use std::cell::{Cell, RefCell};

use crate::error::{CirculationError, Result};
use crate::storage::traits::{Loaded, StateStore};
use crate::storage::types::LibraryState;

#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: RefCell<Option<LibraryState>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously saved state.
    pub fn with_state(state: LibraryState) -> Self {
        Self {
            saved: RefCell::new(Some(state)),
            ..Self::default()
        }
    }

    /// Make every subsequent `save` fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    /// Snapshot of the last successfully saved state.
    pub fn saved(&self) -> Option<LibraryState> {
        self.saved.borrow().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Loaded> {
        Ok(match self.saved.borrow().as_ref() {
            Some(state) => Loaded::restored(state.clone()),
            None => Loaded::fresh(),
        })
    }

    fn save(&self, state: &LibraryState) -> Result<()> {
        if self.fail_saves.get() {
            return Err(CirculationError::Persistence(
                "Memory store configured to fail".to_string(),
            ));
        }
        *self.saved.borrow_mut() = Some(state.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
