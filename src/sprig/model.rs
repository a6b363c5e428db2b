//! # Domain Model: Records, Drafts and Order Keys
//!
//! This module defines the core data structures for sprig: [`Record`], [`Draft`],
//! [`RecordId`] and [`OrderKey`].
//!
//! ## Records Are Flat
//!
//! A record only knows its own `id` and the `id` of its `parent`. Everything else
//! is an open payload of domain fields that the engine never interprets, with one
//! exception: the configurable ordering field (default `position`), which holds the
//! hierarchical position label (`"2.3.1"`) and drives sibling order.
//!
//! Records serialize flat, so the payload sits next to the structural fields:
//!
//! ```text
//! {"id": 3, "parent": 1, "position": "2", "name": "Design review"}
//! ```
//!
//! The `children` relation is never stored. It only exists in a derived
//! [`crate::hierarchy::Forest`], and a `children` key found in loaded data is dropped.
//!
//! ## Drafts
//!
//! New records are created from a [`Draft`]: a parent reference plus fields, but
//! no id. The id is assigned by the data source (see [`crate::store::DataSource`]),
//! possibly out of band, and the draft only becomes a [`Record`] once it is known.
//!
//! ## Order Keys
//!
//! Siblings are displayed in the order of their ordering field. Labels are compared
//! segment-wise as integers so `"1.10"` sorts after `"1.9"`. Values that are not
//! dotted integers sort after every numeric label, and records without a value
//! sort last.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Derived key never persisted with a record.
pub const CHILDREN_KEY: &str = "children";

/// Keys the engine owns; never valid as domain field names.
pub const STRUCTURAL_KEYS: [&str; 3] = ["id", "parent", CHILDREN_KEY];

pub fn is_structural_key(name: &str) -> bool {
    STRUCTURAL_KEYS.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('#').unwrap_or(s.trim());
        digits
            .parse::<u64>()
            .map(RecordId)
            .map_err(|_| format!("Invalid record id: {}", s))
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        RecordId(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub parent: Option<RecordId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: RecordId, parent: Option<RecordId>) -> Self {
        Self {
            id,
            parent,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The position label stored under `order_field`, if any.
    ///
    /// Numbers are accepted as labels too (`3` reads as `"3"`), since hand-edited
    /// data often carries them.
    pub fn label(&self, order_field: &str) -> Option<String> {
        match self.fields.get(order_field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn set_label(&mut self, order_field: &str, label: Option<String>) {
        match label {
            Some(label) => {
                self.fields
                    .insert(order_field.to_string(), Value::String(label));
            }
            None => {
                self.fields.remove(order_field);
            }
        }
    }

    pub fn order_key(&self, order_field: &str) -> OrderKey {
        match self.fields.get(order_field) {
            Some(value) => OrderKey::from_value(value),
            None => OrderKey::Missing,
        }
    }

    /// Removes derived keys that may have leaked into stored data.
    pub(crate) fn strip_derived(&mut self) {
        self.fields.remove(CHILDREN_KEY);
    }
}

/// A record that has not been given an id yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub parent: Option<RecordId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Draft {
    pub fn new(parent: Option<RecordId>) -> Self {
        Self {
            parent,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn into_record(self, id: RecordId) -> Record {
        let mut record = Record {
            id,
            parent: self.parent,
            fields: self.fields,
        };
        record.strip_derived();
        record
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderKey {
    Numeric(Vec<u64>),
    Text(String),
    Missing,
}

impl OrderKey {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => match n.as_u64() {
                Some(n) => OrderKey::Numeric(vec![n]),
                None => OrderKey::Text(n.to_string()),
            },
            Value::Null => OrderKey::Missing,
            other => OrderKey::Text(other.to_string()),
        }
    }

    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() {
            return OrderKey::Missing;
        }
        let segments: Option<Vec<u64>> = label
            .split('.')
            .map(|segment| segment.parse::<u64>().ok())
            .collect();
        match segments {
            Some(segments) => OrderKey::Numeric(segments),
            None => OrderKey::Text(label.to_string()),
        }
    }
}
