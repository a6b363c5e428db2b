//! # Sprig Architecture
//!
//! Sprig keeps a **flat collection of records** that point at their parents and
//! presents it as a numbered outline. The library owns the hierarchy rules; the
//! `sprig` binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs, render.rs)                          │
//! │  - Parses arguments, draws the tree, asks for confirmation  │
//! │  - The only place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Single entry point, parses ids                           │
//! │  - Pending deletes and inserts as tickets                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)                                   │
//! │  - insert, delete, promote, demote, move up/down, move to   │
//! │  - Every structural edit is relabelled and written at once  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Hierarchy + Numbering (hierarchy.rs, numbering.rs)         │
//! │  - Flat records → forest of ids, orphans and cycles handled │
//! │  - Position labels ("2.3.1") derived from the forest        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - RecordStore: lookup table + ordered arena, write-through │
//! │  - DataSource: JsonFileSource (production), MemSource       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived, Never Stored
//!
//! Only `id`, `parent` and the domain fields are persisted. The tree is rebuilt
//! from them whenever it is needed and the position labels are recomputed after
//! every structural change, so there is a single source of truth: the flat
//! record list.
//!
//! ## No I/O in the Core
//!
//! From `api.rs` inward nothing prints, prompts or exits. Results come back as
//! [`commands::CmdResult`] values and the client decides how to show them.
//!
//! ## Testing Strategy
//!
//! 1. **Commands**: thorough unit tests over `MemSource`-backed stores. This is
//!    where most of the testing lives.
//! 2. **API**: dispatch, id parsing and the ticket flows.
//! 3. **CLI**: end-to-end runs of the binary against a temporary directory
//!    (`tests/`).
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: One module per operation
//! - [`hierarchy`]: Forest reconstruction, sibling queries, tree snapshots
//! - [`numbering`]: Position labels
//! - [`store`]: `RecordStore`, the `DataSource` trait and its implementations
//! - [`model`]: `Record`, `Draft`, `RecordId`, `OrderKey`
//! - [`pending`]: Tickets for operations that complete later
//! - [`config`]: Outline configuration
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod numbering;
pub mod pending;
pub mod store;
