//! # Circulation Core
//!
//! Core library for a single-process lending-record system: a catalog of
//! circulating items, a registry of members, the active loans, and accrued
//! late fees, persisted to durable storage after every change.
//!
//! ## Architecture
//!
//! - **storage**: persisted types, the `StateStore` trait and its backends
//! - **catalog**: item and member registration, catalog search
//! - **ledger**: lend / return / payment state transitions
//! - **fees**: the late fee policy
//! - **library**: the `Library` facade that validates, mutates and persists
//!
//! ## Example
//!
//! ```no_run
//! use circulation_core::{Library, LibraryConfig, NewItem};
//!
//! # fn main() -> circulation_core::Result<()> {
//! let mut library = Library::open_with_config(&LibraryConfig::default())?;
//! let item = library.add_item(NewItem::new("Clean Code", "Robert Martin", "978-0132350886"))?;
//! let member = library.register_member("Alice Johnson", "alice@example.com")?;
//! assert!(library.lend_default(member.id, item.id)?.is_success());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod fees;
pub mod fs;
pub mod ledger;
pub mod library;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{read_config, write_config, LibraryConfig};
pub use error::{CirculationError, Result};
pub use fees::{FeePolicy, FINE_PER_DAY};
pub use ledger::{LendOutcome, Payment, PaymentOutcome, Refusal, ReturnOutcome};
pub use library::Library;
pub use storage::{
    Item, ItemId, JsonFileStore, LibraryState, LoadStatus, LoanRecord, Member, MemberId,
    MemoryStore, NewItem, StateStore,
};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
