use crate::commands::helpers::{describe, fetch};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::Result;
use crate::model::RecordId;
use crate::numbering;
use crate::store::{Changeset, DataSource, RecordStore};

/// Checks the outline for broken parent links and stale labels.
///
/// With `fix`, broken links are cleared (the records stay where they are shown,
/// at the top level) and labels are rewritten, in one write.
pub fn run<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    fix: bool,
) -> Result<CmdResult> {
    let options = config.numbering();
    let forest = store.forest(&options.order_field);
    let stale = numbering::plan(&forest, |id| store.get(id), &options);

    let broken: Vec<RecordId> = forest
        .orphans()
        .iter()
        .chain(forest.broken_cycles())
        .copied()
        .collect();

    let mut result = CmdResult::default();
    if broken.is_empty() && stale.is_empty() {
        result.add_message(CmdMessage::success("No inconsistencies found."));
        return Ok(result);
    }

    let heading = if fix {
        "Inconsistencies found and fixed:"
    } else {
        "Inconsistencies found:"
    };
    result.add_message(CmdMessage::warning(heading));
    for id in forest.orphans() {
        if let Some(record) = store.get(*id) {
            let parent = record.parent.map(|p| p.to_string()).unwrap_or_default();
            result.add_message(CmdMessage::info(format!(
                "  - {} points at missing parent {}",
                describe(record, config),
                parent
            )));
        }
    }
    for id in forest.broken_cycles() {
        if let Some(record) = store.get(*id) {
            result.add_message(CmdMessage::info(format!(
                "  - {} is part of a parent cycle",
                describe(record, config)
            )));
        }
    }
    if !stale.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "  - {} label(s) out of date",
            stale.len()
        )));
    }

    if !fix {
        result.add_message(CmdMessage::info("Run `sprig doctor --fix` to repair."));
        return Ok(result);
    }

    let mut changes = Changeset::new();
    for id in &broken {
        let mut record = store.require(*id)?.clone();
        record.parent = None;
        changes.upsert(record);
    }
    let labels = numbering::commit_with_labels(store, &options, changes)?;

    let mut touched = broken.clone();
    touched.extend(labels.iter().map(|c| c.id).filter(|id| !broken.contains(id)));
    Ok(result
        .with_affected(fetch(store, &touched))
        .with_relabeled(labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use crate::store::memory::fixtures::{orphan_outline, StoreFixture};

    #[test]
    fn healthy_outline() {
        let mut store = StoreFixture::new().with_root(1, "Plan").build();
        let result = run(&mut store, &SprigConfig::default(), false).unwrap();
        assert_eq!(result.messages.len(), 1);
        assert!(result.affected.is_empty());
    }

    #[test]
    fn report_only_changes_nothing() {
        let mut store = orphan_outline().build();
        let before = store.get_all().to_vec();

        let result = run(&mut store, &SprigConfig::default(), false).unwrap();

        assert!(result.messages.len() > 2);
        assert_eq!(store.get_all(), before.as_slice());
    }

    #[test]
    fn fix_clears_orphans_and_relabels() {
        let mut store = orphan_outline().build();
        let config = SprigConfig::default();

        run(&mut store, &config, true).unwrap();

        assert_eq!(store.get(RecordId(4)).unwrap().parent, None);
        assert_eq!(store.get(RecordId(3)).unwrap().label("position"), Some("2".into()));

        let again = run(&mut store, &config, false).unwrap();
        assert_eq!(again.messages[0].content, "No inconsistencies found.");
    }

    #[test]
    fn fix_breaks_cycles() {
        let mut store = StoreFixture::new()
            .with_record(Record::new(RecordId(1), Some(RecordId(2))))
            .with_record(Record::new(RecordId(2), Some(RecordId(1))))
            .build();

        run(&mut store, &SprigConfig::default(), true).unwrap();

        assert_eq!(store.get(RecordId(1)).unwrap().parent, None);
        assert_eq!(store.get(RecordId(2)).unwrap().parent, Some(RecordId(1)));
        assert!(store.forest("position").broken_cycles().is_empty());
    }
}
