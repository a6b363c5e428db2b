use crate::error::{Result, SprigError};
use crate::model::{Record, RecordId};
use std::collections::{HashMap, HashSet};

/// An all-or-nothing batch of writes.
///
/// - `upserts` replace existing records (matched by id) in place.
/// - `removals` drop records.
/// - `order`, when set, is the complete persisted order after removals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub upserts: Vec<Record>,
    pub removals: Vec<RecordId>,
    pub order: Option<Vec<RecordId>>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.removals.is_empty() && self.order.is_none()
    }

    /// Stages a replacement; a later upsert for the same id wins.
    pub fn upsert(&mut self, record: Record) {
        match self.upserts.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.upserts.push(record),
        }
    }

    pub fn staged(&self, id: RecordId) -> Option<&Record> {
        self.upserts.iter().find(|r| r.id == id)
    }

    pub fn remove(&mut self, id: RecordId) {
        if !self.removals.contains(&id) {
            self.removals.push(id);
        }
    }

    pub fn with_order(mut self, order: Vec<RecordId>) -> Self {
        self.order = Some(order);
        self
    }

    /// Applies the changes to a record list.
    ///
    /// Everything is validated before the list is touched, so on error `records`
    /// is left exactly as it was.
    pub fn apply_to(&self, records: &mut Vec<Record>) -> Result<()> {
        let present: HashSet<RecordId> = records.iter().map(|r| r.id).collect();

        for record in &self.upserts {
            if !present.contains(&record.id) {
                return Err(SprigError::NotFound(record.id));
            }
            if self.removals.contains(&record.id) {
                return Err(SprigError::InvalidChangeset(format!(
                    "record {} is both updated and removed",
                    record.id
                )));
            }
        }
        for id in &self.removals {
            if !present.contains(id) {
                return Err(SprigError::NotFound(*id));
            }
        }

        if let Some(order) = &self.order {
            let remaining: HashSet<RecordId> = present
                .iter()
                .filter(|id| !self.removals.contains(id))
                .copied()
                .collect();
            let ordered: HashSet<RecordId> = order.iter().copied().collect();
            if ordered.len() != order.len() || ordered != remaining {
                return Err(SprigError::InvalidChangeset(
                    "order is not a permutation of the remaining records".to_string(),
                ));
            }
        }

        for record in records.iter_mut() {
            if let Some(staged) = self.staged(record.id) {
                *record = staged.clone();
            }
        }
        records.retain(|r| !self.removals.contains(&r.id));

        if let Some(order) = &self.order {
            let mut by_id: HashMap<RecordId, Record> =
                records.drain(..).map(|r| (r.id, r)).collect();
            for id in order {
                if let Some(record) = by_id.remove(id) {
                    records.push(record);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(ids: &[u64]) -> Vec<Record> {
        ids.iter().map(|id| Record::new(RecordId(*id), None)).collect()
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r.id.0).collect()
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut list = records(&[1, 2, 3]);
        let mut changes = Changeset::new();
        changes.upsert(Record::new(RecordId(2), Some(RecordId(1))));
        changes.apply_to(&mut list).unwrap();

        assert_eq!(ids(&list), vec![1, 2, 3]);
        assert_eq!(list[1].parent, Some(RecordId(1)));
    }

    #[test]
    fn later_upsert_wins() {
        let mut changes = Changeset::new();
        changes.upsert(Record::new(RecordId(2), None).with_field("name", "a"));
        changes.upsert(Record::new(RecordId(2), None).with_field("name", "b"));
        assert_eq!(changes.upserts.len(), 1);
        assert_eq!(
            changes.staged(RecordId(2)).unwrap().field("name"),
            Some(&serde_json::json!("b"))
        );
    }

    #[test]
    fn removal_and_order() {
        let mut list = records(&[1, 2, 3, 4]);
        let mut changes = Changeset::new().with_order(vec![RecordId(4), RecordId(1), RecordId(3)]);
        changes.remove(RecordId(2));
        changes.apply_to(&mut list).unwrap();

        assert_eq!(ids(&list), vec![4, 1, 3]);
    }

    #[test]
    fn unknown_upsert_leaves_list_untouched() {
        let mut list = records(&[1, 2]);
        let mut changes = Changeset::new();
        changes.remove(RecordId(1));
        changes.upsert(Record::new(RecordId(42), None));

        match changes.apply_to(&mut list) {
            Err(SprigError::NotFound(id)) => assert_eq!(id, RecordId(42)),
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert_eq!(ids(&list), vec![1, 2]);
    }

    #[test]
    fn order_must_be_a_permutation() {
        let mut list = records(&[1, 2, 3]);
        let changes = Changeset::new().with_order(vec![RecordId(1), RecordId(1), RecordId(2)]);
        assert!(matches!(
            changes.apply_to(&mut list),
            Err(SprigError::InvalidChangeset(_))
        ));

        let changes = Changeset::new().with_order(vec![RecordId(1), RecordId(2)]);
        assert!(changes.apply_to(&mut list).is_err());
        assert_eq!(ids(&list), vec![1, 2, 3]);
    }

    #[test]
    fn update_and_remove_same_record_is_rejected() {
        let mut list = records(&[1]);
        let mut changes = Changeset::new();
        changes.upsert(Record::new(RecordId(1), None));
        changes.remove(RecordId(1));
        assert!(matches!(
            changes.apply_to(&mut list),
            Err(SprigError::InvalidChangeset(_))
        ));
    }
}
