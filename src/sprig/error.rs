use crate::model::RecordId;
use crate::pending::Ticket;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SprigError {
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Cannot {action} record {id}: {reason}")]
    InvalidReorder {
        action: &'static str,
        id: RecordId,
        reason: &'static str,
    },

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Record {id} still has {count} children")]
    HasChildren { id: RecordId, count: usize },

    #[error("Duplicate record id: {0}")]
    DuplicateId(RecordId),

    #[error("Unknown pending operation: {0}")]
    UnknownTicket(Ticket),

    #[error("Invalid changeset: {0}")]
    InvalidChangeset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, SprigError>;
