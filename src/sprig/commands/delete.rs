use crate::commands::helpers::{describe, fetch, persisted_order, report_relabels};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::{DeletePolicy, SprigConfig};
use crate::error::{Result, SprigError};
use crate::model::{Record, RecordId};
use crate::numbering;
use crate::store::{Changeset, DataSource, RecordStore};
use tracing::debug;

/// Ids of records that name `id` as their stored parent.
pub fn stored_children<S: DataSource>(store: &RecordStore<S>, id: RecordId) -> Vec<RecordId> {
    store
        .get_all()
        .iter()
        .filter(|r| r.parent == Some(id) && r.id != id)
        .map(|r| r.id)
        .collect()
}

/// Fails early when `policy` would refuse to delete `id`.
pub fn check<S: DataSource>(
    store: &RecordStore<S>,
    id: RecordId,
    policy: DeletePolicy,
) -> Result<()> {
    store.require(id)?;
    let count = stored_children(store, id).len();
    if policy == DeletePolicy::Reject && count > 0 {
        return Err(SprigError::HasChildren { id, count });
    }
    Ok(())
}

pub fn run<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
) -> Result<CmdResult> {
    let policy = config.delete_policy;
    check(store, id, policy)?;
    let target = store.require(id)?.clone();

    let forest = store.forest(&config.order_field);
    let mut changes = Changeset::new();
    let mut removed: Vec<Record> = vec![target.clone()];
    let mut moved: Vec<RecordId> = Vec::new();

    changes.remove(id);
    match policy {
        DeletePolicy::Reject => {}
        DeletePolicy::Cascade => {
            for descendant in forest.descendants(id) {
                changes.remove(descendant);
                if let Some(record) = store.get(descendant) {
                    removed.push(record.clone());
                }
            }
        }
        DeletePolicy::Reparent => {
            let new_parent = forest.parent(id);
            let children: Vec<RecordId> = forest.children(id).to_vec();
            let unlabelled_level = new_parent.is_none() && !config.label_roots;

            for child in &children {
                let mut record = store.require(*child)?.clone();
                record.parent = new_parent;
                if unlabelled_level {
                    record.set_label(&config.order_field, None);
                }
                changes.upsert(record);
            }

            // Children take the deleted record's slot
            let mut order: Vec<RecordId> = Vec::new();
            for existing in persisted_order(store) {
                if existing == id {
                    order.extend(children.iter().copied());
                } else if !children.contains(&existing) {
                    order.push(existing);
                }
            }
            changes.order = Some(order);
            moved = children;
        }
    }

    debug!(%id, %policy, removals = changes.removals.len(), "deleting");
    let labels = numbering::commit_with_labels(store, &config.numbering(), changes)?;

    let mut result = CmdResult::default().with_affected(removed.clone());
    result.add_message(CmdMessage::success(format!(
        "Deleted {}",
        describe(&target, config)
    )));
    if removed.len() > 1 {
        result.add_message(CmdMessage::info(format!(
            "  - Removed {} descendant(s)",
            removed.len() - 1
        )));
    }
    if !moved.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "  - Moved {} child record(s) up one level",
            moved.len()
        )));
        result.affected.extend(fetch(store, &moved));
    }
    report_relabels(&mut result, &labels);
    Ok(result.with_relabeled(labels))
}
