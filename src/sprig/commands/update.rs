use crate::commands::helpers::{describe, fetch, guard_fields, report_relabels};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::Result;
use crate::model::RecordId;
use crate::numbering;
use crate::store::{Changeset, DataSource, RecordStore};
use serde_json::{Map, Value};

/// Sets and removes domain fields on one record.
///
/// Setting the ordering field repositions the record among its siblings; the
/// outline is relabelled right after, so the written value is only a hint.
pub fn run<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
    set: Map<String, Value>,
    unset: &[String],
) -> Result<CmdResult> {
    let mut record = store.require(id)?.clone();
    guard_fields(set.keys().map(String::as_str).chain(unset.iter().map(String::as_str)))?;

    let before = record.clone();
    for (key, value) in set {
        record.fields.insert(key, value);
    }
    for key in unset {
        record.fields.remove(key);
    }

    let mut result = CmdResult::default();
    if record == before {
        result.add_message(CmdMessage::info(format!(
            "Nothing to change on {}",
            describe(&record, config)
        )));
        return Ok(result.with_affected(vec![record]));
    }

    let mut changes = Changeset::new();
    changes.upsert(record);
    let labels = numbering::commit_with_labels(store, &config.numbering(), changes)?;

    result.affected = fetch(store, &[id]);
    if let Some(record) = result.affected.first() {
        result.add_message(CmdMessage::success(format!(
            "Updated {}",
            describe(record, config)
        )));
    }
    report_relabels(&mut result, &labels);
    Ok(result.with_relabeled(labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SprigError;
    use crate::store::memory::fixtures::orphan_outline;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn sets_and_unsets_fields() {
        let mut store = orphan_outline().build();
        let config = SprigConfig::default();

        run(
            &mut store,
            &config,
            RecordId(2),
            fields(&[("owner", json!("ana")), ("done", json!(true))]),
            &["name".to_string()],
        )
        .unwrap();

        let record = store.get(RecordId(2)).unwrap();
        assert_eq!(record.field("owner"), Some(&json!("ana")));
        assert_eq!(record.field("done"), Some(&json!(true)));
        assert!(record.field("name").is_none());
        assert_eq!(record.parent, Some(RecordId(1)));
    }

    #[test]
    fn position_edit_reorders_siblings() {
        let mut store = orphan_outline().build();
        let config = SprigConfig::default();
        numbering::renumber(&mut store, &config.numbering()).unwrap();

        let result = run(
            &mut store,
            &config,
            RecordId(3),
            fields(&[("position", json!("0"))]),
            &[],
        )
        .unwrap();

        assert_eq!(
            store.forest("position").children(RecordId(1)),
            &[RecordId(3), RecordId(2)]
        );
        assert_eq!(store.get(RecordId(3)).unwrap().label("position"), Some("1".into()));
        assert_eq!(result.relabeled.len(), 2);
    }

    #[test]
    fn structural_keys_are_refused() {
        let mut store = orphan_outline().build();
        let result = run(
            &mut store,
            &SprigConfig::default(),
            RecordId(2),
            fields(&[("parent", json!(4))]),
            &[],
        );
        assert!(matches!(result, Err(SprigError::Api(_))));
        assert_eq!(store.get(RecordId(2)).unwrap().parent, Some(RecordId(1)));
    }

    #[test]
    fn unknown_record_is_not_found() {
        let mut store = orphan_outline().build();
        let result = run(&mut store, &SprigConfig::default(), RecordId(8), Map::new(), &[]);
        assert!(matches!(result, Err(SprigError::NotFound(RecordId(8)))));
    }
}
