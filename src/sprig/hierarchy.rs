//! # Hierarchy: Flat Records to Forest
//!
//! Records only carry a `parent` reference. The tree is never stored; it is
//! rebuilt on demand from the flat collection by [`build`], which returns a
//! [`Forest`].
//!
//! ## No Owned Children
//!
//! A [`Forest`] holds ids only: the ordered root ids and, per node, the ordered
//! ids of its children. Records stay in the [`crate::store::RecordStore`] arena
//! and are looked up when needed, so there is no parent/child ownership cycle and
//! a forest can be thrown away and rebuilt after every change.
//!
//! ## Reconstruction Rules
//!
//! 1. Every record starts with an empty child list.
//! 2. A `parent` that names no existing record is ignored for this build: the
//!    record is an **orphan** and becomes a root. The stored `parent` is left
//!    alone; only an explicit update (see `doctor --fix`) clears it.
//! 3. Records are appended to their parent's children in input order.
//! 4. Records without a parent become roots in input order.
//! 5. Records that no root reaches sit on a parent cycle. Each cycle is cut at
//!    its member that comes first in the input, which becomes a root.
//!
//! Every input record ends up exactly once in the forest, either as a root or as
//! the child of exactly one node.
//!
//! ## Sibling Order
//!
//! [`build`] keeps input order. [`build_ordered`] first sorts the records by the
//! ordering field (see [`crate::model::OrderKey`]), which is how the engine turns
//! swapped position labels into a visible move.
//!
//! ## Rendering Support
//!
//! [`Forest::to_tree`] produces an owned [`TreeNode`] snapshot with the
//! [`Affordances`] of every node, for UIs that want to draw the outline and offer
//! only the structural actions that are currently valid.

use crate::config::DeletePolicy;
use crate::model::{Record, RecordId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<RecordId>,
    children: HashMap<RecordId, Vec<RecordId>>,
    parents: HashMap<RecordId, RecordId>,
    orphans: Vec<RecordId>,
    broken_cycles: Vec<RecordId>,
}

/// Builds a forest from records, keeping their order.
pub fn build<'a, I>(records: I) -> Forest
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut known: HashSet<RecordId> = HashSet::new();
    let mut input: Vec<&Record> = Vec::new();
    for record in records {
        if known.insert(record.id) {
            input.push(record);
        } else {
            warn!(id = %record.id, "duplicate record id ignored");
        }
    }

    let mut children: HashMap<RecordId, Vec<RecordId>> =
        input.iter().map(|r| (r.id, Vec::new())).collect();
    let mut parents = HashMap::new();
    let mut roots = Vec::new();
    let mut orphans = Vec::new();

    for record in &input {
        match record.parent {
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(record.id);
                parents.insert(record.id, parent);
            }
            Some(parent) => {
                debug!(id = %record.id, %parent, "parent missing, treating as root");
                orphans.push(record.id);
                roots.push(record.id);
            }
            None => roots.push(record.id),
        }
    }

    let mut forest = Forest {
        roots,
        children,
        parents,
        orphans,
        broken_cycles: Vec::new(),
    };
    forest.break_cycles(&input);

    if !forest.orphans.is_empty() {
        warn!(count = forest.orphans.len(), "orphaned records promoted to root");
    }
    forest
}

/// Builds a forest with siblings sorted by the ordering field.
///
/// The sort is stable: records with equal keys keep their persisted order.
pub fn build_ordered(records: &[Record], order_field: &str) -> Forest {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by_cached_key(|record| record.order_key(order_field));
    build(sorted)
}

impl Forest {
    fn break_cycles(&mut self, input: &[&Record]) {
        let mut visited: HashSet<RecordId> = HashSet::new();
        for root in self.roots.clone() {
            self.mark_subtree(root, &mut visited);
        }
        if visited.len() == input.len() {
            return;
        }

        let position: HashMap<RecordId, usize> =
            input.iter().enumerate().map(|(i, r)| (r.id, i)).collect();

        for record in input {
            if visited.contains(&record.id) {
                continue;
            }

            // Unreached records only have unreached ancestors, so climbing must
            // eventually revisit a node, and that node sits on the cycle.
            let mut seen = HashSet::new();
            let mut current = record.id;
            while seen.insert(current) {
                match self.parents.get(&current) {
                    Some(&parent) => current = parent,
                    None => break,
                }
            }

            let mut members = vec![current];
            let mut next = self.parents.get(&current).copied();
            while let Some(member) = next {
                if member == current {
                    break;
                }
                members.push(member);
                next = self.parents.get(&member).copied();
            }

            let Some(&breaker) = members
                .iter()
                .min_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX))
            else {
                continue;
            };

            if let Some(parent) = self.parents.remove(&breaker) {
                if let Some(siblings) = self.children.get_mut(&parent) {
                    siblings.retain(|id| *id != breaker);
                }
            }
            self.roots.push(breaker);
            self.broken_cycles.push(breaker);
            warn!(id = %breaker, cycle_len = members.len(), "parent cycle broken");

            self.mark_subtree(breaker, &mut visited);
        }
    }

    fn mark_subtree(&self, start: RecordId, visited: &mut HashSet<RecordId>) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if visited.insert(id) {
                stack.extend(self.children(id).iter().copied());
            }
        }
    }

    pub fn roots(&self) -> &[RecordId] {
        &self.roots
    }

    pub fn children(&self, id: RecordId) -> &[RecordId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The parent in this forest; `None` for roots, orphans included.
    pub fn parent(&self, id: RecordId) -> Option<RecordId> {
        self.parents.get(&id).copied()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.children.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Records whose `parent` did not resolve.
    pub fn orphans(&self) -> &[RecordId] {
        &self.orphans
    }

    /// Records detached from a parent cycle to become roots.
    pub fn broken_cycles(&self) -> &[RecordId] {
        &self.broken_cycles
    }

    /// The sequence `id` belongs to: the roots, or its parent's children.
    pub fn siblings(&self, id: RecordId) -> Option<&[RecordId]> {
        match self.parents.get(&id) {
            Some(parent) => Some(self.children(*parent)),
            None if self.contains(id) => Some(&self.roots),
            None => None,
        }
    }

    pub fn sibling_index(&self, id: RecordId) -> Option<usize> {
        self.siblings(id)?.iter().position(|s| *s == id)
    }

    pub fn previous_sibling(&self, id: RecordId) -> Option<RecordId> {
        let siblings = self.siblings(id)?;
        let index = siblings.iter().position(|s| *s == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_sibling(&self, id: RecordId) -> Option<RecordId> {
        let siblings = self.siblings(id)?;
        let index = siblings.iter().position(|s| *s == id)?;
        siblings.get(index + 1).copied()
    }

    /// Every node in pre-order, with its depth (roots are depth 0).
    pub fn walk(&self) -> Vec<(RecordId, usize)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(RecordId, usize)> =
            self.roots.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for child in self.children(id).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }

    /// All nodes below `id`, in pre-order.
    pub fn descendants(&self, id: RecordId) -> Vec<RecordId> {
        let mut out = Vec::new();
        let mut stack: Vec<RecordId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// True when `ancestor` appears on the parent chain of `id`.
    pub fn is_descendant(&self, id: RecordId, ancestor: RecordId) -> bool {
        let mut current = id;
        while let Some(&parent) = self.parents.get(&current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    pub fn affordances(&self, id: RecordId, policy: DeletePolicy) -> Option<Affordances> {
        let siblings = self.siblings(id)?;
        let index = siblings.iter().position(|s| *s == id)?;
        let childless = self.children(id).is_empty();
        Some(Affordances {
            add: true,
            promote: self.parent(id).is_some(),
            demote: index > 0,
            move_up: index > 0,
            move_down: index + 1 < siblings.len(),
            delete: childless || policy != DeletePolicy::Reject,
        })
    }

    /// An owned snapshot of the outline for rendering.
    ///
    /// Nodes whose record `lookup` cannot find are skipped together with their
    /// subtree.
    pub fn to_tree<'a, F>(&self, lookup: F, policy: DeletePolicy) -> Vec<TreeNode>
    where
        F: Fn(RecordId) -> Option<&'a Record>,
    {
        self.roots
            .iter()
            .filter_map(|id| self.tree_node(*id, 0, &lookup, policy))
            .collect()
    }

    fn tree_node<'a>(
        &self,
        id: RecordId,
        depth: usize,
        lookup: &dyn Fn(RecordId) -> Option<&'a Record>,
        policy: DeletePolicy,
    ) -> Option<TreeNode> {
        let record = lookup(id)?.clone();
        let children = self
            .children(id)
            .iter()
            .filter_map(|child| self.tree_node(*child, depth + 1, lookup, policy))
            .collect();
        Some(TreeNode {
            record,
            depth,
            actions: self.affordances(id, policy).unwrap_or_default(),
            children,
        })
    }
}

/// Which structural actions a node currently allows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub add: bool,
    pub promote: bool,
    pub demote: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub delete: bool,
}

/// One node of a rendered outline.
///
/// The record is kept under its own `record` key so that domain fields never
/// collide with `depth`, `actions` or `children`.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub record: Record,
    pub depth: usize,
    pub actions: Affordances,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}
