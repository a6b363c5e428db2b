use crate::commands::helpers::{describe, fetch, persisted_order, place_last, report_relabels};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::{Result, SprigError};
use crate::model::RecordId;
use crate::numbering;
use crate::store::{Changeset, DataSource, RecordStore};
use tracing::debug;

/// Reparents a record (with its subtree) under `destination`, or to the top
/// level when `destination` is `None`. The record goes last among its new
/// siblings.
pub fn run<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
    destination: Option<RecordId>,
) -> Result<CmdResult> {
    let mut record = store.require(id)?.clone();
    let options = config.numbering();
    let forest = store.forest(&options.order_field);

    if let Some(dest) = destination {
        if !store.contains(dest) {
            return Err(SprigError::InvalidMove(format!(
                "destination {} does not exist",
                dest
            )));
        }
        if dest == id {
            return Err(SprigError::InvalidMove(format!(
                "cannot move {} under itself",
                id
            )));
        }
        if forest.is_descendant(dest, id) {
            return Err(SprigError::InvalidMove(format!(
                "cannot move {} under its own descendant {}",
                id, dest
            )));
        }
    }

    let mut result = CmdResult::default();
    if forest.parent(id) == destination && record.parent == destination {
        result.add_message(CmdMessage::info(format!(
            "{} is already there",
            describe(&record, config)
        )));
        return Ok(result.with_affected(vec![record]));
    }

    record.parent = destination;
    record.set_label(&options.order_field, None);

    let mut order = persisted_order(store);
    place_last(&mut order, id);

    let mut changes = Changeset::new().with_order(order);
    changes.upsert(record);

    debug!(%id, to = ?destination, "moving");
    let labels = numbering::commit_with_labels(store, &options, changes)?;

    result.affected = fetch(store, &[id]);
    if let Some(record) = result.affected.first() {
        let target = match destination.and_then(|dest| store.get(dest)) {
            Some(parent) => describe(parent, config),
            None => "the top level".to_string(),
        };
        result.add_message(CmdMessage::success(format!(
            "Moved {} to {}",
            describe(record, config),
            target
        )));
    }
    report_relabels(&mut result, &labels);
    Ok(result.with_relabeled(labels))
}
