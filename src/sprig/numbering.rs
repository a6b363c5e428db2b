//! # Position Numbering
//!
//! Every non-root record carries a hierarchical position label in the ordering
//! field: its 1-based rank among its siblings, appended to its parent's label.
//!
//! ```text
//! Plan                 (root, unlabelled)
//! ├── Draft            1
//! │   └── Outline      1.1
//! └── Review           2
//! ```
//!
//! With [`NumberingOptions::label_roots`] the roots are numbered as well and the
//! whole outline shifts one level (`1`, `1.1`, `1.1.1`).
//!
//! Labels are derived state. They are recomputed from the forest after every
//! structural change by [`plan`], which only reports labels that actually differ
//! from what is stored, so a second pass over an unchanged outline is empty.
//!
//! [`commit_with_labels`] is the single write path for structural edits: it takes
//! the edit as a [`Changeset`], plans labels over the state the edit would
//! produce, and persists edit and labels together.

use crate::error::Result;
use crate::hierarchy::{self, Forest};
use crate::model::{Record, RecordId};
use crate::store::{Changeset, DataSource, RecordStore};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingOptions {
    pub order_field: String,
    pub label_roots: bool,
}

impl Default for NumberingOptions {
    fn default() -> Self {
        Self {
            order_field: "position".to_string(),
            label_roots: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelChange {
    pub id: RecordId,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Computes the labels that differ from the stored ones.
///
/// Traversal is pre-order, so parents are listed before their children.
pub fn plan<'a, F>(forest: &Forest, lookup: F, options: &NumberingOptions) -> Vec<LabelChange>
where
    F: Fn(RecordId) -> Option<&'a Record>,
{
    let mut changes = Vec::new();
    let mut stack: Vec<(RecordId, Option<String>)> = forest
        .roots()
        .iter()
        .enumerate()
        .rev()
        .map(|(i, id)| (*id, options.label_roots.then(|| (i + 1).to_string())))
        .collect();

    while let Some((id, label)) = stack.pop() {
        let current = lookup(id).and_then(|record| record.label(&options.order_field));
        if current != label {
            changes.push(LabelChange {
                id,
                from: current,
                to: label.clone(),
            });
        }

        for (i, child) in forest.children(id).iter().enumerate().rev() {
            let rank = i + 1;
            let child_label = match &label {
                Some(prefix) => format!("{}.{}", prefix, rank),
                None => rank.to_string(),
            };
            stack.push((*child, Some(child_label)));
        }
    }

    changes
}

/// The label `id` gets from its place in `forest`, regardless of what is stored.
pub fn label_for(forest: &Forest, id: RecordId, options: &NumberingOptions) -> Option<String> {
    let mut ranks = Vec::new();
    let mut current = id;
    loop {
        ranks.push(forest.sibling_index(current)? + 1);
        match forest.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    if !options.label_roots {
        ranks.pop();
    }
    if ranks.is_empty() {
        return None;
    }
    let segments: Vec<String> = ranks.iter().rev().map(|rank| rank.to_string()).collect();
    Some(segments.join("."))
}

/// The label for the `rank`-th child of `parent`; `None` means the top level.
pub fn child_label(
    forest: &Forest,
    parent: Option<RecordId>,
    rank: usize,
    options: &NumberingOptions,
) -> Option<String> {
    match parent {
        Some(parent) => Some(match label_for(forest, parent, options) {
            Some(prefix) => format!("{}.{}", prefix, rank),
            None => rank.to_string(),
        }),
        None => options.label_roots.then(|| rank.to_string()),
    }
}

/// Relabels the whole outline and persists what changed in one write.
pub fn renumber<S: DataSource>(
    store: &mut RecordStore<S>,
    options: &NumberingOptions,
) -> Result<Vec<LabelChange>> {
    commit_with_labels(store, options, Changeset::new())
}

/// Applies `changes` together with the relabelling they cause.
///
/// Nothing is written when the edit is invalid or the source rejects the batch.
pub fn commit_with_labels<S: DataSource>(
    store: &mut RecordStore<S>,
    options: &NumberingOptions,
    mut changes: Changeset,
) -> Result<Vec<LabelChange>> {
    let mut staged = store.get_all().to_vec();
    changes.apply_to(&mut staged)?;

    let forest = hierarchy::build_ordered(&staged, &options.order_field);
    let by_id: HashMap<RecordId, &Record> = staged.iter().map(|r| (r.id, r)).collect();
    let labels = plan(&forest, |id| by_id.get(&id).copied(), options);

    let mut root_cleared = false;
    for change in &labels {
        let Some(record) = by_id.get(&change.id) else {
            continue;
        };
        let mut record = (*record).clone();
        record.set_label(&options.order_field, change.to.clone());
        changes.upsert(record);
        root_cleared |= change.to.is_none() && forest.parent(change.id).is_none();
    }

    // Unlabelled roots fall back to persisted order, so pin the order they are
    // shown in before their labels go.
    if root_cleared {
        let shown: Vec<RecordId> = forest.walk().into_iter().map(|(id, _)| id).collect();
        let persisted: Vec<RecordId> = staged.iter().map(|r| r.id).collect();
        if shown != persisted {
            changes.order = Some(shown);
        }
    }

    debug!(labels = labels.len(), "relabelling");
    store.apply(changes)?;
    Ok(labels)
}
