use crate::commands::helpers::{describe, fetch, place_after, report_relabels};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::{Result, SprigError};
use crate::model::RecordId;
use crate::numbering;
use crate::store::{Changeset, DataSource, RecordStore};
use tracing::debug;

/// Moves a record one level up, directly behind its former parent.
///
/// Its subtree comes along.
pub fn run<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
) -> Result<CmdResult> {
    let mut record = store.require(id)?.clone();
    let options = config.numbering();
    let forest = store.forest(&options.order_field);

    let Some(parent) = forest.parent(id) else {
        return Err(SprigError::InvalidReorder {
            action: "promote",
            id,
            reason: "it is already at the top level",
        });
    };
    let grandparent = forest.parent(parent);
    let siblings = forest.siblings(parent).ok_or(SprigError::NotFound(parent))?;

    // The former parent's sibling group with `id` slotted in right behind it.
    // Every member is labelled afresh so stale stored keys cannot reorder it.
    let mut group = Vec::with_capacity(siblings.len() + 1);
    for sibling in siblings {
        group.push(*sibling);
        if *sibling == parent {
            group.push(id);
        }
    }

    record.parent = grandparent;
    let mut changes = Changeset::new();
    for (i, member) in group.iter().enumerate() {
        let mut updated = if *member == id {
            record.clone()
        } else {
            store.require(*member)?.clone()
        };
        let label = numbering::child_label(&forest, grandparent, i + 1, &options);
        updated.set_label(&options.order_field, label);
        changes.upsert(updated);
    }

    let mut order: Vec<RecordId> = forest.walk().into_iter().map(|(id, _)| id).collect();
    place_after(&mut order, id, parent);
    changes.order = Some(order);

    debug!(%id, from = %parent, to = ?grandparent, "promoting");
    let labels = numbering::commit_with_labels(store, &options, changes)?;

    let mut result = CmdResult::default().with_affected(fetch(store, &[id]));
    if let Some(record) = result.affected.first() {
        let message = format!("Promoted {}", describe(record, config));
        result.add_message(CmdMessage::success(message));
    }
    report_relabels(&mut result, &labels);
    Ok(result.with_relabeled(labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{orphan_outline, StoreFixture};
    use crate::model::Record;
    use crate::store::memory::InMemoryStore;

    /// 1 ─ 2 ─ 5
    ///   │   └ 6
    ///   └ 3
    /// 4
    fn nested() -> InMemoryStore {
        let mut store = StoreFixture::new()
            .with_root(1, "Plan")
            .with_child(2, 1, "Draft")
            .with_child(3, 1, "Review")
            .with_root(4, "Ship")
            .with_child(5, 2, "Outline")
            .with_child(6, 2, "Sketch")
            .build();
        numbering::renumber(&mut store, &SprigConfig::default().numbering()).unwrap();
        store
    }

    fn label(store: &InMemoryStore, id: u64) -> Option<String> {
        store.get(RecordId(id)).unwrap().label("position")
    }

    #[test]
    fn lands_right_after_former_parent() {
        let mut store = nested();
        run(&mut store, &SprigConfig::default(), RecordId(5)).unwrap();

        let forest = store.forest("position");
        assert_eq!(forest.children(RecordId(1)), &[RecordId(2), RecordId(5), RecordId(3)]);
        assert_eq!(forest.children(RecordId(2)), &[RecordId(6)]);
        assert_eq!(label(&store, 5), Some("2".into()));
        assert_eq!(label(&store, 3), Some("3".into()));
        assert_eq!(label(&store, 6), Some("1.1".into()));
    }

    #[test]
    fn promoted_to_top_level_loses_label() {
        let mut store = nested();
        run(&mut store, &SprigConfig::default(), RecordId(2)).unwrap();

        let forest = store.forest("position");
        assert_eq!(forest.roots(), &[RecordId(1), RecordId(2), RecordId(4)]);
        assert_eq!(label(&store, 2), None);
        assert_eq!(label(&store, 3), Some("1".into()));
        // Subtree comes along and is relabelled under its new place
        assert_eq!(forest.children(RecordId(2)), &[RecordId(5), RecordId(6)]);
        assert_eq!(label(&store, 6), Some("2".into()));
    }

    #[test]
    fn promoted_with_labelled_roots() {
        let mut store = nested();
        let config = SprigConfig {
            label_roots: true,
            ..Default::default()
        };
        numbering::renumber(&mut store, &config.numbering()).unwrap();

        run(&mut store, &config, RecordId(3)).unwrap();

        let forest = store.forest("position");
        assert_eq!(forest.roots(), &[RecordId(1), RecordId(3), RecordId(4)]);
        assert_eq!(label(&store, 3), Some("2".into()));
        assert_eq!(label(&store, 4), Some("3".into()));
    }

    #[test]
    fn stale_labels_do_not_move_it_ahead_of_former_parent() {
        let mut store = StoreFixture::new()
            .with_root(1, "Plan")
            .with_record(
                Record::new(RecordId(2), Some(RecordId(1)))
                    .with_field("name", "Draft")
                    .with_field("position", "5"),
            )
            .with_record(
                Record::new(RecordId(3), Some(RecordId(1)))
                    .with_field("name", "Review")
                    .with_field("position", "7"),
            )
            .with_record(
                Record::new(RecordId(4), Some(RecordId(2)))
                    .with_field("name", "Outline")
                    .with_field("position", "5.1"),
            )
            .build();

        run(&mut store, &SprigConfig::default(), RecordId(4)).unwrap();

        let forest = store.forest("position");
        assert_eq!(forest.children(RecordId(1)), &[RecordId(2), RecordId(4), RecordId(3)]);
        assert_eq!(label(&store, 2), Some("1".into()));
        assert_eq!(label(&store, 4), Some("2".into()));
        assert_eq!(label(&store, 3), Some("3".into()));
    }

    #[test]
    fn stale_root_labels_do_not_reorder_top_level() {
        // Roots carry leftover labels that disagree with the shown order
        let mut store = StoreFixture::new()
            .with_record(Record::new(RecordId(1), None).with_field("position", "1"))
            .with_record(Record::new(RecordId(2), None).with_field("position", "2"))
            .with_child(3, 1, "Draft")
            .build();

        run(&mut store, &SprigConfig::default(), RecordId(3)).unwrap();

        let forest = store.forest("position");
        assert_eq!(forest.roots(), &[RecordId(1), RecordId(3), RecordId(2)]);
        assert_eq!(label(&store, 1), None);
        assert_eq!(label(&store, 2), None);
        assert_eq!(label(&store, 3), None);
    }

    #[test]
    fn root_cannot_be_promoted() {
        let mut store = orphan_outline().build();
        let result = run(&mut store, &SprigConfig::default(), RecordId(1));
        assert!(matches!(
            result,
            Err(SprigError::InvalidReorder { action: "promote", .. })
        ));
    }

    #[test]
    fn orphan_counts_as_root() {
        let mut store = orphan_outline().build();
        let result = run(&mut store, &SprigConfig::default(), RecordId(4));
        assert!(matches!(result, Err(SprigError::InvalidReorder { .. })));
        assert_eq!(store.get(RecordId(4)).unwrap().parent, Some(RecordId(99)));
    }
}
