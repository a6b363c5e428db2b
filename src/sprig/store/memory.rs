use super::record_store::RecordStore;
use super::{Changeset, DataSource};
use crate::error::{Result, SprigError};
use crate::model::{Draft, Record, RecordId};

/// In-memory data source for testing.
///
/// Ids are assigned sequentially, starting after the highest id it was seeded
/// with.
#[derive(Debug, Default)]
pub struct MemSource {
    records: Vec<Record>,
    last_id: u64,
    simulate_write_error: bool,
    simulate_commit_error: bool,
}

impl MemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        let last_id = records.iter().map(|r| r.id.0).max().unwrap_or(0);
        Self {
            records,
            last_id,
            simulate_write_error: false,
            simulate_commit_error: false,
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&mut self, simulate: bool) {
        self.simulate_write_error = simulate;
    }

    /// Fail `commit` only; `create` and `discard` keep working.
    pub fn set_simulate_commit_error(&mut self, simulate: bool) {
        self.simulate_commit_error = simulate;
    }

    /// What has been persisted so far.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error {
            return Err(SprigError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl DataSource for MemSource {
    fn load(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn create(&mut self, draft: &Draft) -> Result<RecordId> {
        self.check_writable()?;
        self.last_id += 1;
        let id = RecordId(self.last_id);
        self.records.push(draft.clone().into_record(id));
        Ok(id)
    }

    fn commit(&mut self, changes: &Changeset) -> Result<()> {
        self.check_writable()?;
        if self.simulate_commit_error {
            return Err(SprigError::Store("Simulated commit error".to_string()));
        }
        changes.apply_to(&mut self.records)
    }

    fn discard(&mut self, id: RecordId) -> Result<()> {
        self.check_writable()?;
        self.records.retain(|r| r.id != id);
        Ok(())
    }
}

pub type InMemoryStore = RecordStore<MemSource>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        RecordStore::from_loaded(MemSource::new(), Vec::new())
    }

    /// A store seeded with `records`, which are also the source's persisted state.
    pub fn with_records(records: Vec<Record>) -> Result<Self> {
        RecordStore::open(MemSource::with_records(records))
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    /// Builds seeded in-memory stores from terse `(id, parent, name)` rows.
    #[derive(Default)]
    pub struct StoreFixture {
        records: Vec<Record>,
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_root(self, id: u64, name: &str) -> Self {
            self.with_record(Record::new(RecordId(id), None).with_field("name", name))
        }

        pub fn with_child(self, id: u64, parent: u64, name: &str) -> Self {
            self.with_record(
                Record::new(RecordId(id), Some(RecordId(parent))).with_field("name", name),
            )
        }

        pub fn with_record(mut self, record: Record) -> Self {
            self.records.push(record);
            self
        }

        pub fn records(&self) -> &[Record] {
            &self.records
        }

        pub fn build(self) -> InMemoryStore {
            InMemoryStore::with_records(self.records).unwrap()
        }
    }

    /// `[{1,null},{2,1},{3,1},{4,99}]`: two children under 1 and an orphan.
    pub fn orphan_outline() -> StoreFixture {
        StoreFixture::new()
            .with_root(1, "Plan")
            .with_child(2, 1, "Draft")
            .with_child(3, 1, "Review")
            .with_child(4, 99, "Stray")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{orphan_outline, StoreFixture};
    use super::*;

    #[test]
    fn create_assigns_sequential_ids() {
        let mut source = MemSource::new();
        let a = source.create(&Draft::new(None)).unwrap();
        let b = source.create(&Draft::new(Some(a))).unwrap();
        assert_eq!(a, RecordId(1));
        assert_eq!(b, RecordId(2));
        assert_eq!(source.records()[1].parent, Some(a));
    }

    #[test]
    fn ids_continue_after_seeded_records() {
        let mut source = MemSource::with_records(vec![Record::new(RecordId(41), None)]);
        assert_eq!(source.create(&Draft::new(None)).unwrap(), RecordId(42));
    }

    #[test]
    fn simulated_error_blocks_writes() {
        let mut source = MemSource::new();
        source.set_simulate_write_error(true);
        assert!(matches!(
            source.create(&Draft::new(None)),
            Err(SprigError::Store(_))
        ));
        assert!(source.commit(&Changeset::new()).is_err());
        assert!(source.records().is_empty());
    }

    #[test]
    fn commit_error_spares_create_and_discard() {
        let mut source = MemSource::new();
        source.set_simulate_commit_error(true);

        let id = source.create(&Draft::new(None)).unwrap();
        assert!(source.commit(&Changeset::new()).is_err());
        source.discard(id).unwrap();
        assert!(source.records().is_empty());
    }

    #[test]
    fn fixtures_seed_store() {
        let store = orphan_outline().build();
        assert_eq!(store.len(), 4);
        assert_eq!(store.source().records().len(), 4);

        let store = StoreFixture::new().with_root(7, "Solo").build();
        assert_eq!(
            store.get(RecordId(7)).unwrap().field("name"),
            Some(&serde_json::json!("Solo"))
        );
    }
}
