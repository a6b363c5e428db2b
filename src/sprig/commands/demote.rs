use crate::commands::helpers::{describe, fetch, persisted_order, place_last, report_relabels};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::{Result, SprigError};
use crate::model::RecordId;
use crate::numbering;
use crate::store::{Changeset, DataSource, RecordStore};
use tracing::debug;

/// Makes a record the last child of its previous sibling.
pub fn run<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
) -> Result<CmdResult> {
    let mut record = store.require(id)?.clone();
    let options = config.numbering();
    let forest = store.forest(&options.order_field);

    let Some(new_parent) = forest.previous_sibling(id) else {
        return Err(SprigError::InvalidReorder {
            action: "demote",
            id,
            reason: "it has no previous sibling",
        });
    };

    // Unlabelled and last in persisted order sorts after every existing child
    record.parent = Some(new_parent);
    record.set_label(&options.order_field, None);

    let mut order = persisted_order(store);
    place_last(&mut order, id);

    let mut changes = Changeset::new().with_order(order);
    changes.upsert(record);

    debug!(%id, to = %new_parent, "demoting");
    let labels = numbering::commit_with_labels(store, &options, changes)?;

    let mut result = CmdResult::default().with_affected(fetch(store, &[id]));
    if let (Some(record), Some(parent)) = (result.affected.first(), store.get(new_parent)) {
        let message = format!(
            "Demoted {} under {}",
            describe(record, config),
            describe(parent, config)
        );
        result.add_message(CmdMessage::success(message));
    }
    report_relabels(&mut result, &labels);
    Ok(result.with_relabeled(labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{orphan_outline, StoreFixture};

    #[test]
    fn demote_under_previous_sibling() {
        let mut store = orphan_outline().build();
        let config = SprigConfig::default();
        numbering::renumber(&mut store, &config.numbering()).unwrap();

        run(&mut store, &config, RecordId(3)).unwrap();

        let forest = store.forest("position");
        assert_eq!(forest.children(RecordId(1)), &[RecordId(2)]);
        assert_eq!(forest.children(RecordId(2)), &[RecordId(3)]);
        assert_eq!(store.get(RecordId(3)).unwrap().parent, Some(RecordId(2)));
        assert_eq!(store.get(RecordId(2)).unwrap().label("position"), Some("1".into()));
        assert_eq!(store.get(RecordId(3)).unwrap().label("position"), Some("1.1".into()));
    }

    #[test]
    fn appended_after_existing_children() {
        let mut store = StoreFixture::new()
            .with_root(1, "Plan")
            .with_child(2, 1, "Draft")
            .with_child(3, 2, "Outline")
            .with_child(4, 1, "Review")
            .build();
        let config = SprigConfig::default();
        numbering::renumber(&mut store, &config.numbering()).unwrap();

        run(&mut store, &config, RecordId(4)).unwrap();

        let forest = store.forest("position");
        assert_eq!(forest.children(RecordId(2)), &[RecordId(3), RecordId(4)]);
        assert_eq!(store.get(RecordId(4)).unwrap().label("position"), Some("1.2".into()));
    }

    #[test]
    fn roots_demote_into_previous_root() {
        let mut store = StoreFixture::new()
            .with_root(1, "Plan")
            .with_root(2, "Ship")
            .build();
        run(&mut store, &SprigConfig::default(), RecordId(2)).unwrap();

        assert_eq!(store.forest("position").roots(), &[RecordId(1)]);
        assert_eq!(store.get(RecordId(2)).unwrap().label("position"), Some("1".into()));
    }

    #[test]
    fn first_sibling_cannot_be_demoted() {
        let mut store = orphan_outline().build();
        let before = store.get_all().to_vec();

        let result = run(&mut store, &SprigConfig::default(), RecordId(2));

        assert!(matches!(
            result,
            Err(SprigError::InvalidReorder { action: "demote", .. })
        ));
        assert_eq!(store.get_all(), before.as_slice());
    }
}
