//! Associations between entities and batched eager-loading.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::record::Record;
use super::value::as_key;

/// How an association is stored on the owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssociationKind {
    /// The owning record holds one foreign key.
    BelongsTo { foreign_key: String },
    /// The owning record holds an array of related identifiers.
    BelongsToMany { ids_field: String },
}

/// A named link from one entity to records of another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub name: String,
    pub target_entity: String,
    pub kind: AssociationKind,
}

impl Association {
    pub fn belongs_to(
        name: impl Into<String>,
        target_entity: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target_entity: target_entity.into(),
            kind: AssociationKind::BelongsTo {
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn belongs_to_many(
        name: impl Into<String>,
        target_entity: impl Into<String>,
        ids_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target_entity: target_entity.into(),
            kind: AssociationKind::BelongsToMany {
                ids_field: ids_field.into(),
            },
        }
    }

    /// The field of the owning record that holds the related identifier(s).
    pub fn key_field(&self) -> &str {
        match &self.kind {
            AssociationKind::BelongsTo { foreign_key } => foreign_key,
            AssociationKind::BelongsToMany { ids_field } => ids_field,
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self.kind, AssociationKind::BelongsToMany { .. })
    }

    /// Identifiers referenced by one record, in stored order.
    pub fn referenced_ids(&self, record: &Record) -> Vec<String> {
        match record.fields.get(self.key_field()) {
            Some(serde_json::Value::Array(items)) => items.iter().filter_map(as_key).collect(),
            Some(value) => as_key(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Distinct identifiers referenced by a batch of records, in first-seen order.
    pub fn collect_keys(&self, records: &[Record]) -> Vec<String> {
        let mut seen = HashSet::new();
        records
            .iter()
            .flat_map(|r| self.referenced_ids(r))
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Distributes a batch of loaded related records onto their owners.
    ///
    /// Each owner gets its referenced records in reference order. Dangling
    /// references are skipped.
    pub fn attach(&self, records: &mut [Record], related: &[Record]) {
        let by_id: HashMap<&str, &Record> = related.iter().map(|r| (r.id.as_str(), r)).collect();

        for record in records.iter_mut() {
            let loaded = self
                .referenced_ids(record)
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|r| (*r).clone()))
                .collect();
            record.included.insert(self.name.clone(), loaded);
        }
    }
}
