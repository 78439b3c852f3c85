//! Storage abstraction for the circulation store.
//!
//! This module defines the `StateStore` trait, the persisted data types and
//! the storage backends.
//!
//! ## Architecture
//!
//! - `JsonFileStore`: one JSON document, written atomically
//! - `MemoryStore`: no durability, for tests and embedding
//!
//! Every backend loads the whole state once and saves the whole state after
//! each mutation. Loaded documents are checked against the store invariants
//! before they are handed to the library.

pub mod json_file;
pub mod memory;
pub mod traits;
pub mod types;
pub mod validation;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::{LoadStatus, Loaded, StateStore};
pub use types::{Item, ItemId, LibraryState, LoanRecord, Member, MemberId, NewItem};
pub use validation::check_integrity;
