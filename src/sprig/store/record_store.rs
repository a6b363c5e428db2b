use super::{Changeset, DataSource};
use crate::error::{Result, SprigError};
use crate::hierarchy::{self, Forest};
use crate::model::{Draft, Record, RecordId};
use crate::pending::{PendingTable, Settlement, Ticket};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The authoritative in-memory record collection.
///
/// Records live in a single arena (`records`, persisted order) and the lookup
/// table maps ids to arena positions, so both views always resolve to the same
/// stored instance.
///
/// Writes go to the [`DataSource`] first; memory is only touched once the source
/// accepted the change. A failed write therefore leaves the store unchanged.
pub struct RecordStore<S: DataSource> {
    source: S,
    records: Vec<Record>,
    index: HashMap<RecordId, usize>,
    pending_adds: PendingTable<Draft>,
}

impl<S: DataSource> RecordStore<S> {
    /// Loads every record from `source`.
    pub fn open(source: S) -> Result<Self> {
        let records = source.load()?;
        let mut seen = std::collections::HashSet::new();
        for record in &records {
            if !seen.insert(record.id) {
                return Err(SprigError::DuplicateId(record.id));
            }
        }
        debug!(count = records.len(), "loaded records");
        Ok(Self::from_loaded(source, records))
    }

    pub(crate) fn from_loaded(source: S, mut records: Vec<Record>) -> Self {
        for record in records.iter_mut() {
            record.strip_derived();
        }
        let mut store = Self {
            source,
            records,
            index: HashMap::new(),
            pending_adds: PendingTable::new(),
        };
        store.reindex();
        store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }

    /// Like [`get`](Self::get), for callers that treat absence as a failure.
    pub fn require(&self, id: RecordId) -> Result<&Record> {
        self.get(id).ok_or(SprigError::NotFound(id))
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }

    /// Every record, in persisted order.
    pub fn get_all(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The forest over the current records, siblings sorted by `order_field`.
    pub fn forest(&self, order_field: &str) -> Forest {
        hierarchy::build_ordered(&self.records, order_field)
    }

    // --- Adding records ---

    /// Creates a record through the data source and registers it.
    pub fn add(&mut self, draft: Draft) -> Result<RecordId> {
        let ticket = self.begin_add(draft);
        let id = {
            let draft = self
                .pending_adds
                .peek(ticket)
                .ok_or(SprigError::UnknownTicket(ticket))?;
            match self.source.create(draft) {
                Ok(id) => id,
                Err(err) => {
                    self.pending_adds.cancel(ticket)?;
                    return Err(err);
                }
            }
        };
        match self.complete_add(ticket, id)? {
            Settlement::Applied(id) => Ok(id),
            Settlement::AlreadySettled => Err(SprigError::UnknownTicket(ticket)),
        }
    }

    /// Parks a draft until its id is known.
    pub fn begin_add(&mut self, draft: Draft) -> Ticket {
        let ticket = self.pending_adds.open(draft);
        debug!(%ticket, "add pending");
        ticket
    }

    /// Registers a pending draft under the id assigned by the data source.
    ///
    /// Only the first resolution of a ticket has an effect. If `id` is already in
    /// use the ticket stays pending so the caller can retry or cancel.
    pub fn complete_add(&mut self, ticket: Ticket, id: RecordId) -> Result<Settlement<RecordId>> {
        let Some(draft) = self.pending_adds.take(ticket)? else {
            debug!(%ticket, "add already settled");
            return Ok(Settlement::AlreadySettled);
        };
        if self.contains(id) {
            self.pending_adds.reopen(ticket, draft);
            return Err(SprigError::DuplicateId(id));
        }
        let record = draft.into_record(id);
        self.index.insert(id, self.records.len());
        self.records.push(record);
        info!(%id, "record added");
        Ok(Settlement::Applied(id))
    }

    pub fn cancel_add(&mut self, ticket: Ticket) -> Result<Settlement<()>> {
        let settlement = match self.pending_adds.cancel(ticket)? {
            Settlement::Applied(_) => Settlement::Applied(()),
            Settlement::AlreadySettled => Settlement::AlreadySettled,
        };
        debug!(%ticket, applied = settlement.is_applied(), "add cancelled");
        Ok(settlement)
    }

    /// Takes back a freshly added record, in the source and in memory.
    ///
    /// Used when the write that should accompany an add fails.
    pub fn withdraw(&mut self, id: RecordId) -> Result<Record> {
        let record = self.require(id)?.clone();
        self.source.discard(id)?;
        self.records.retain(|r| r.id != id);
        self.reindex();
        info!(%id, "record withdrawn");
        Ok(record)
    }

    pub fn pending_adds(&self) -> impl Iterator<Item = (Ticket, &Draft)> {
        self.pending_adds.waiting()
    }

    // --- Changing records ---

    /// Replaces a stored record with `record`, keeping its position.
    pub fn update(&mut self, record: Record) -> Result<()> {
        self.update_many(vec![record])
    }

    /// Replaces several records in a single write; either all land or none.
    pub fn update_many(&mut self, records: Vec<Record>) -> Result<()> {
        let mut changes = Changeset::new();
        for record in records {
            changes.upsert(record);
        }
        self.apply(changes)
    }

    /// Removes a childless record.
    ///
    /// A record that other records still name as their parent is rejected; the
    /// delete command decides what happens to children.
    pub fn delete(&mut self, id: RecordId) -> Result<Record> {
        let record = self.require(id)?.clone();
        let count = self
            .records
            .iter()
            .filter(|r| r.parent == Some(id) && r.id != id)
            .count();
        if count > 0 {
            return Err(SprigError::HasChildren { id, count });
        }
        let mut changes = Changeset::new();
        changes.remove(id);
        self.apply(changes)?;
        Ok(record)
    }

    /// Commits a changeset to the source, then to memory.
    pub fn apply(&mut self, changes: Changeset) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        // Validate against a scratch copy so the source never sees a bad batch
        let mut staged = self.records.clone();
        changes.apply_to(&mut staged)?;

        if let Err(err) = self.source.commit(&changes) {
            warn!(error = %err, "commit rejected by data source");
            return Err(err);
        }

        self.records = staged;
        self.reindex();
        info!(
            upserts = changes.upserts.len(),
            removals = changes.removals.len(),
            reordered = changes.order.is_some(),
            "changes committed"
        );
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.id, pos))
            .collect();
    }
}
