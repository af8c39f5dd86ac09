//! Records as returned by a [`RecordStore`](super::RecordStore).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value::{stringify, timestamp};

/// A stored record of some entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    pub id: String,
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Eager-loaded related records, keyed by association name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub included: BTreeMap<String, Vec<Record>>,
}

impl Record {
    /// Creates a record with `updated_at` equal to `created_at`.
    pub fn new(
        entity: impl Into<String>,
        id: impl Into<String>,
        fields: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity: entity.into(),
            id: id.into(),
            fields,
            created_at,
            updated_at: created_at,
            included: BTreeMap::new(),
        }
    }

    /// Reads a field or system attribute. Missing fields read as null.
    pub fn attribute(&self, name: &str) -> Value {
        match name {
            "id" => Value::String(self.id.clone()),
            "created_at" => Value::String(timestamp(&self.created_at)),
            "updated_at" => Value::String(timestamp(&self.updated_at)),
            _ => self.fields.get(name).cloned().unwrap_or(Value::Null),
        }
    }

    /// The textual form of an attribute, empty when null or structured.
    pub fn attribute_text(&self, name: &str) -> String {
        stringify(&self.attribute(name)).unwrap_or_default()
    }

    /// Eager-loaded records of an association. Empty when not loaded.
    pub fn related(&self, association: &str) -> &[Record] {
        self.included
            .get(association)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Values of `field` across the eager-loaded records of an association.
    pub fn related_values(&self, association: &str, field: &str) -> Vec<Value> {
        self.related(association)
            .iter()
            .map(|r| r.attribute(field))
            .collect()
    }
}
