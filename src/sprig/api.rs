//! # API Facade
//!
//! [`OutlineApi`] is the single entry point for outline operations. It owns the
//! [`RecordStore`] and the [`SprigConfig`] and dispatches to `commands/*.rs`.
//!
//! ## What It Adds
//!
//! - **Id parsing**: accepts `"3"` or `"#3"` wherever a record is named.
//! - **Confirmation gate**: [`OutlineApi::request_delete`] parks a delete behind
//!   a [`Ticket`] until a collaborator (a prompt, a dialog) confirms or cancels
//!   it. Only the first answer counts.
//! - **Deferred inserts**: [`OutlineApi::begin_insert`] / [`OutlineApi::complete_insert`]
//!   for data sources that hand out ids out of band.
//!
//! ## What It Does Not Do
//!
//! No printing, no prompting, no formatting. Everything comes back as a
//! [`CmdResult`].
//!
//! ## Generic Over DataSource
//!
//! - Production: `OutlineApi<JsonFileSource>`
//! - Testing: `OutlineApi<MemSource>`

use crate::commands::{self, reorder::Direction};
use crate::config::SprigConfig;
use crate::error::{Result, SprigError};
use crate::hierarchy::TreeNode;
use crate::model::{Draft, RecordId};
use crate::pending::{PendingTable, Settlement, Ticket};
use crate::store::{DataSource, RecordStore};
use serde_json::{Map, Value};
use tracing::debug;

pub struct OutlineApi<S: DataSource> {
    store: RecordStore<S>,
    config: SprigConfig,
    pending_deletes: PendingTable<RecordId>,
}

impl<S: DataSource> OutlineApi<S> {
    pub fn new(store: RecordStore<S>, config: SprigConfig) -> Self {
        Self {
            store,
            config,
            pending_deletes: PendingTable::new(),
        }
    }

    /// Loads `source` into a fresh store.
    pub fn open(source: S, config: SprigConfig) -> Result<Self> {
        Ok(Self::new(RecordStore::open(source)?, config))
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    pub fn config(&self) -> &SprigConfig {
        &self.config
    }

    /// Direct access for collaborators that create records out of band.
    pub fn source_mut(&mut self) -> &mut S {
        self.store.source_mut()
    }

    pub fn list(&self) -> Result<commands::CmdResult> {
        commands::list::run(&self.store, &self.config)
    }

    pub fn show(&self, id: &str) -> Result<commands::CmdResult> {
        commands::list::show(&self.store, &self.config, parse_id(id)?)
    }

    /// The outline snapshot a renderer draws from.
    pub fn tree(&self) -> Vec<TreeNode> {
        self.store
            .forest(&self.config.order_field)
            .to_tree(|id| self.store.get(id), self.config.delete_policy)
    }

    pub fn insert(
        &mut self,
        parent: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<commands::CmdResult> {
        let parent = parent.map(parse_id).transpose()?;
        commands::insert::run(&mut self.store, &self.config, parent, fields)
    }

    /// Parks an insert until the data source reports the new id.
    pub fn begin_insert(&mut self, draft: Draft) -> Result<Ticket> {
        commands::helpers::guard_fields(draft.fields.keys().map(String::as_str))?;
        if let Some(parent) = draft.parent {
            self.store.require(parent)?;
        }
        Ok(self.store.begin_add(draft))
    }

    pub fn complete_insert(
        &mut self,
        ticket: Ticket,
        id: RecordId,
    ) -> Result<Settlement<commands::CmdResult>> {
        match self.store.complete_add(ticket, id)? {
            Settlement::Applied(id) => {
                let mut result = commands::CmdResult::default();
                commands::insert::finish(&mut self.store, &self.config, id, &mut result)?;
                Ok(Settlement::Applied(result))
            }
            Settlement::AlreadySettled => Ok(Settlement::AlreadySettled),
        }
    }

    pub fn cancel_insert(&mut self, ticket: Ticket) -> Result<Settlement<()>> {
        self.store.cancel_add(ticket)
    }

    pub fn update(
        &mut self,
        id: &str,
        set: Map<String, Value>,
        unset: &[String],
    ) -> Result<commands::CmdResult> {
        commands::update::run(&mut self.store, &self.config, parse_id(id)?, set, unset)
    }

    /// Deletes right away, without the confirmation gate.
    pub fn delete(&mut self, id: &str) -> Result<commands::CmdResult> {
        commands::delete::run(&mut self.store, &self.config, parse_id(id)?)
    }

    /// Opens a delete that waits for confirmation.
    ///
    /// A delete the policy would refuse fails here, before anyone is asked.
    pub fn request_delete(&mut self, id: &str) -> Result<Ticket> {
        let id = parse_id(id)?;
        commands::delete::check(&self.store, id, self.config.delete_policy)?;
        let ticket = self.pending_deletes.open(id);
        debug!(%ticket, %id, "delete awaiting confirmation");
        Ok(ticket)
    }

    pub fn confirm_delete(&mut self, ticket: Ticket) -> Result<Settlement<commands::CmdResult>> {
        let Some(id) = self.pending_deletes.take(ticket)? else {
            return Ok(Settlement::AlreadySettled);
        };
        commands::delete::run(&mut self.store, &self.config, id).map(Settlement::Applied)
    }

    pub fn cancel_delete(&mut self, ticket: Ticket) -> Result<Settlement<()>> {
        Ok(match self.pending_deletes.cancel(ticket)? {
            Settlement::Applied(_) => Settlement::Applied(()),
            Settlement::AlreadySettled => Settlement::AlreadySettled,
        })
    }

    pub fn pending_deletes(&self) -> Vec<(Ticket, RecordId)> {
        self.pending_deletes
            .waiting()
            .map(|(ticket, id)| (ticket, *id))
            .collect()
    }

    pub fn promote(&mut self, id: &str) -> Result<commands::CmdResult> {
        commands::promote::run(&mut self.store, &self.config, parse_id(id)?)
    }

    pub fn demote(&mut self, id: &str) -> Result<commands::CmdResult> {
        commands::demote::run(&mut self.store, &self.config, parse_id(id)?)
    }

    pub fn move_up(&mut self, id: &str) -> Result<commands::CmdResult> {
        commands::reorder::run(&mut self.store, &self.config, parse_id(id)?, Direction::Up)
    }

    pub fn move_down(&mut self, id: &str) -> Result<commands::CmdResult> {
        commands::reorder::run(&mut self.store, &self.config, parse_id(id)?, Direction::Down)
    }

    pub fn move_to(&mut self, id: &str, destination: Option<&str>) -> Result<commands::CmdResult> {
        let destination = destination.map(parse_id).transpose()?;
        commands::move_to::run(&mut self.store, &self.config, parse_id(id)?, destination)
    }

    pub fn renumber(&mut self) -> Result<commands::CmdResult> {
        commands::renumber::run(&mut self.store, &self.config)
    }

    pub fn doctor(&mut self, fix: bool) -> Result<commands::CmdResult> {
        commands::doctor::run(&mut self.store, &self.config, fix)
    }
}

pub fn parse_id(input: &str) -> Result<RecordId> {
    input.parse().map_err(SprigError::Api)
}

pub use crate::commands::config::ConfigAction;
pub use crate::commands::{CmdMessage, CmdResult, MessageLevel};
