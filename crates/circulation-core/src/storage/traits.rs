//! Persistence adapter trait definition.
//!
//! The `StateStore` trait is the seam between the in-memory store and
//! durable storage. The library only ever loads the whole state once and
//! saves the whole state after each mutation.

use std::path::PathBuf;

use super::types::LibraryState;
use crate::error::Result;

/// How a [`Loaded`] state came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No prior data existed; the state is empty.
    Fresh,

    /// Prior data was read back successfully.
    Restored,

    /// Prior data existed but could not be used; the state is empty.
    Recovered {
        /// Why the prior data was rejected
        reason: String,

        /// Where the rejected data was moved, if it could be moved
        quarantined: Option<PathBuf>,
    },
}

impl LoadStatus {
    /// Whether prior data was discarded.
    pub fn is_data_loss(&self) -> bool {
        matches!(self, LoadStatus::Recovered { .. })
    }
}

/// Result of [`StateStore::load`].
#[derive(Debug, Clone)]
pub struct Loaded {
    pub state: LibraryState,
    pub status: LoadStatus,
}

impl Loaded {
    pub fn fresh() -> Self {
        Self {
            state: LibraryState::new(),
            status: LoadStatus::Fresh,
        }
    }

    pub fn restored(state: LibraryState) -> Self {
        Self {
            state,
            status: LoadStatus::Restored,
        }
    }

    pub fn recovered(reason: impl Into<String>, quarantined: Option<PathBuf>) -> Self {
        Self {
            state: LibraryState::new(),
            status: LoadStatus::Recovered {
                reason: reason.into(),
                quarantined,
            },
        }
    }
}

/// Durable storage for the full library state.
///
/// Implementations must ensure:
/// - `save` is atomic from a later `load`'s point of view
/// - `load` on a location with no data is not an error
/// - malformed data degrades to an empty state reported via
///   [`LoadStatus::Recovered`], never to a panic
pub trait StateStore {
    /// Read the persisted state.
    ///
    /// # Errors
    ///
    /// Reserved for conditions where not even an empty state can be
    /// produced. Missing or malformed data is *not* an error.
    fn load(&self) -> Result<Loaded>;

    /// Replace the persisted state with `state`.
    ///
    /// # Errors
    ///
    /// Returns `CirculationError::Persistence` if the write did not complete.
    fn save(&self, state: &LibraryState) -> Result<()>;
}
