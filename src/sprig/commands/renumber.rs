use crate::commands::helpers::fetch;
use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::Result;
use crate::model::RecordId;
use crate::numbering;
use crate::store::{DataSource, RecordStore};

pub fn run<S: DataSource>(store: &mut RecordStore<S>, config: &SprigConfig) -> Result<CmdResult> {
    let changes = numbering::renumber(store, &config.numbering())?;
    let ids: Vec<RecordId> = changes.iter().map(|c| c.id).collect();

    let mut result = CmdResult::default().with_affected(fetch(store, &ids));
    if changes.is_empty() {
        result.add_message(CmdMessage::success("All labels are up to date."));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Relabeled {} record(s)",
            changes.len()
        )));
    }
    Ok(result.with_relabeled(changes))
}
