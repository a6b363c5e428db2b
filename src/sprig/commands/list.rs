use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::Result;
use crate::hierarchy::TreeNode;
use crate::model::RecordId;
use crate::store::{DataSource, RecordStore};

/// The whole outline as a tree snapshot.
pub fn run<S: DataSource>(store: &RecordStore<S>, config: &SprigConfig) -> Result<CmdResult> {
    let forest = store.forest(&config.order_field);
    let tree = forest.to_tree(|id| store.get(id), config.delete_policy);

    let mut result = CmdResult::default().with_listed(tree);
    if !forest.orphans().is_empty() || !forest.broken_cycles().is_empty() {
        result.add_message(CmdMessage::warning(format!(
            "{} record(s) shown at the top level because of broken parent links; see `sprig doctor`",
            forest.orphans().len() + forest.broken_cycles().len()
        )));
    }
    Ok(result)
}

/// One record and its subtree.
pub fn show<S: DataSource>(
    store: &RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
) -> Result<CmdResult> {
    store.require(id)?;
    let tree = run(store, config)?.listed;
    let listed = find(tree, id).into_iter().collect();
    Ok(CmdResult::default().with_listed(listed))
}

fn find(nodes: Vec<TreeNode>, id: RecordId) -> Option<TreeNode> {
    for node in nodes {
        if node.record.id == id {
            return Some(node);
        }
        if let Some(found) = find(node.children, id) {
            return Some(found);
        }
    }
    None
}
