use crate::commands::helpers::{describe, fetch, guard_fields, report_relabels};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::{Result, SprigError};
use crate::model::{Draft, RecordId};
use crate::numbering;
use crate::store::{DataSource, RecordStore};
use serde_json::{Map, Value};
use tracing::warn;

/// Adds a record under `parent`, or at the top level.
///
/// A value for the ordering field acts as a placement hint: the record is
/// sorted in by it before the outline is relabelled. Without one the record
/// goes last among its siblings.
pub fn run<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    parent: Option<RecordId>,
    fields: Map<String, Value>,
) -> Result<CmdResult> {
    if let Some(parent) = parent {
        if !store.contains(parent) {
            return Err(SprigError::NotFound(parent));
        }
    }

    guard_fields(fields.keys().map(String::as_str))?;

    let draft = Draft { parent, fields };
    let id = store.add(draft)?;
    let mut result = CmdResult::default();

    finish(store, config, id, &mut result)?;
    Ok(result)
}

/// Relabels after a record landed and fills in the result.
///
/// If the relabel cannot be written the record is withdrawn again, so an
/// insert either lands labelled or not at all.
pub(crate) fn finish<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
    result: &mut CmdResult,
) -> Result<()> {
    let changes = match numbering::renumber(store, &config.numbering()) {
        Ok(changes) => changes,
        Err(err) => {
            warn!(%id, error = %err, "relabel after insert failed, withdrawing record");
            if let Err(rollback) = store.withdraw(id) {
                warn!(%id, error = %rollback, "could not withdraw record");
            }
            return Err(err);
        }
    };
    report_relabels(result, &changes);
    result.relabeled = changes;

    result.affected = fetch(store, &[id]);
    if let Some(record) = result.affected.first() {
        let message = match record.label(&config.order_field) {
            Some(label) => format!("Added {} at {}", describe(record, config), label),
            None => format!("Added {}", describe(record, config)),
        };
        result.messages.insert(0, CmdMessage::success(message));
    }
    Ok(())
}
