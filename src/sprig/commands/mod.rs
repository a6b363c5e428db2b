//! # Commands
//!
//! One module per operation. Every command is a plain function taking the store
//! (and the outline config) and returning a [`CmdResult`]; nothing here prints.
//!
//! Structural commands follow the same shape:
//!
//! 1. build the ordered forest for the current records;
//! 2. validate the request against it;
//! 3. stage the edit as a [`crate::store::Changeset`];
//! 4. hand it to [`crate::numbering::commit_with_labels`], which relabels the
//!    staged outline and writes edit and labels in one batch.
//!
//! A failed validation or write leaves the store as it was.

use crate::config::SprigConfig;
use crate::hierarchy::TreeNode;
use crate::model::Record;
use crate::numbering::LabelChange;

pub mod config;
pub mod delete;
pub mod demote;
pub mod doctor;
pub mod helpers;
pub mod init;
pub mod insert;
pub mod list;
pub mod move_to;
pub mod promote;
pub mod renumber;
pub mod reorder;
pub mod update;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Records written or removed by the command, as they are after it ran
    pub affected: Vec<Record>,
    pub listed: Vec<TreeNode>,
    pub relabeled: Vec<LabelChange>,
    pub config: Option<SprigConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected(mut self, records: Vec<Record>) -> Self {
        self.affected = records;
        self
    }

    pub fn with_listed(mut self, nodes: Vec<TreeNode>) -> Self {
        self.listed = nodes;
        self
    }

    pub fn with_relabeled(mut self, changes: Vec<LabelChange>) -> Self {
        self.relabeled = changes;
        self
    }

    pub fn with_config(mut self, config: SprigConfig) -> Self {
        self.config = Some(config);
        self
    }
}
