use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::{Result, SprigError};
use crate::model::{is_structural_key, Record, RecordId};
use crate::numbering::LabelChange;
use crate::store::{DataSource, RecordStore};
use serde_json::Value;

/// Human-readable name of a record, from the configured title field.
pub fn title(record: &Record, config: &SprigConfig) -> String {
    match record.field(&config.title_field) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("#{}", record.id),
    }
}

pub fn describe(record: &Record, config: &SprigConfig) -> String {
    let name = title(record, config);
    if name.starts_with('#') {
        name
    } else {
        format!("{} (#{})", name, record.id)
    }
}

/// Refuses field names that would shadow `id`, `parent` or `children`.
pub fn guard_fields<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<()> {
    match keys.into_iter().find(|key| is_structural_key(key)) {
        Some(key) => Err(SprigError::Api(format!(
            "'{}' cannot be set as a field; use add --parent, move, promote or demote",
            key
        ))),
        None => Ok(()),
    }
}

/// Current copies of `ids`, skipping any that no longer exist.
pub fn fetch<S: DataSource>(store: &RecordStore<S>, ids: &[RecordId]) -> Vec<Record> {
    ids.iter().filter_map(|id| store.get(*id).cloned()).collect()
}

pub fn persisted_order<S: DataSource>(store: &RecordStore<S>) -> Vec<RecordId> {
    store.ids()
}

/// Moves `id` directly behind `anchor` in a persisted order.
pub fn place_after(order: &mut Vec<RecordId>, id: RecordId, anchor: RecordId) {
    order.retain(|other| *other != id);
    let at = order
        .iter()
        .position(|other| *other == anchor)
        .map(|pos| pos + 1)
        .unwrap_or(order.len());
    order.insert(at, id);
}

pub fn place_last(order: &mut Vec<RecordId>, id: RecordId) {
    order.retain(|other| *other != id);
    order.push(id);
}

pub fn swap_slots(order: &mut [RecordId], a: RecordId, b: RecordId) {
    let first = order.iter().position(|id| *id == a);
    let second = order.iter().position(|id| *id == b);
    if let (Some(first), Some(second)) = (first, second) {
        order.swap(first, second);
    }
}

pub fn report_relabels(result: &mut CmdResult, changes: &[LabelChange]) {
    if !changes.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "Relabeled {} record(s)",
            changes.len()
        )));
    }
}
