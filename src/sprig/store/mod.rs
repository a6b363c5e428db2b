//! # Storage Layer
//!
//! This module defines the storage abstraction for sprig. The [`DataSource`] trait
//! is the seam to whatever actually keeps the records (a file, a remote service,
//! plain memory), while [`RecordStore`] is the in-memory authority the rest of the
//! engine talks to.
//!
//! ## Design Rationale
//!
//! Storage is split in two layers:
//! - [`DataSource`] handles the "where": loading, id assignment, persisting batches.
//! - [`RecordStore`] handles the "what": lookup/list parity, pending adds,
//!   validation, and the rule that memory only changes after the source accepted
//!   a write.
//!
//! Every write goes through a [`Changeset`], an all-or-nothing batch of record
//! replacements, removals and a new persisted order. A structural edit and the
//! relabelling it causes travel in the same changeset, so a failed write never
//! leaves some labels updated and others stale.
//!
//! ## Implementations
//!
//! - [`fs::JsonFileSource`]: Production file-based storage
//!   - All records in one `records.json` array, in persisted order
//!   - Written atomically (temp file + rename)
//!
//! - [`memory::MemSource`]: In-memory storage for testing
//!   - No persistence, sequential ids
//!   - Can simulate write failures, or commit failures only
//!
//! ## Storage Layout
//!
//! For `JsonFileSource`:
//! ```text
//! .sprig/
//! ├── records.json        # Flat record array (persisted order)
//! └── config.json         # Outline configuration
//! ```

use crate::error::Result;
use crate::model::{Draft, Record, RecordId};

pub mod changeset;
pub mod fs;
pub mod memory;
pub mod record_store;

pub use changeset::Changeset;
pub use record_store::RecordStore;

/// Abstract interface for the collaborator that persists records.
///
/// Implementations own id assignment and must apply a [`Changeset`] entirely or
/// not at all.
pub trait DataSource {
    /// Load every record, in persisted order
    fn load(&self) -> Result<Vec<Record>>;

    /// Persist a new record and return the id assigned to it
    fn create(&mut self, draft: &Draft) -> Result<RecordId>;

    /// Apply a batch of changes atomically
    fn commit(&mut self, changes: &Changeset) -> Result<()>;

    /// Withdraw a record persisted by `create` whose follow-up write failed
    fn discard(&mut self, id: RecordId) -> Result<()>;
}
