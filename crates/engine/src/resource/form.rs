//! Form operations: field updates, create, update, delete and lookups.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{AdminResult, QueryError, SchemaError};
use crate::query::{Association, Query, Record, RecordStore, SortDirection};
use crate::schema::{Derivation, FieldKind, FilterSpec, slugify};

use super::ResourceDefinition;

/// The form a payload was submitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOperation<'a> {
    Create,
    /// Editing the record with this id.
    Edit(&'a str),
}

impl FormOperation<'_> {
    pub fn is_create(&self) -> bool {
        matches!(self, FormOperation::Create)
    }
}

/// Field values that passed validation, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub fields: Map<String, Value>,
}

/// A selectable related record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationOption {
    pub id: String,
    pub label: String,
}

impl ResourceDefinition {
    /// Reacts to a live change of one form field.
    ///
    /// Returns the other fields whose values change as a consequence. Slug
    /// derivations only follow their source while creating; on edit a stored
    /// slug is never recomputed.
    pub fn field_updated(
        &self,
        operation: FormOperation<'_>,
        field: &str,
        value: &Value,
    ) -> Map<String, Value> {
        let mut changes = Map::new();
        if !operation.is_create() {
            return changes;
        }

        let text = value.as_str().unwrap_or_default();
        for target in self.form_fields() {
            if let Some(Derivation::Slug { source }) = &target.derivation {
                if source == field {
                    changes.insert(target.name.clone(), Value::String(slugify(text)));
                }
            }
        }
        changes
    }

    /// Validates a payload and inserts a new record.
    pub async fn create(
        &self,
        store: &dyn RecordStore,
        payload: &Map<String, Value>,
    ) -> AdminResult<Record> {
        let validated = self
            .validate_record(store, payload, FormOperation::Create)
            .await?;
        let record = store
            .insert(self.entity(), validated.fields, Utc::now())
            .await?;

        info!(resource = %self.name(), id = %record.id, "Created record");
        Ok(record)
    }

    /// Validates a partial payload against an existing record and saves it.
    ///
    /// Submitted values override the stored ones; fields not submitted keep
    /// their stored values. Derived fields are left as stored.
    pub async fn update(
        &self,
        store: &dyn RecordStore,
        id: &str,
        payload: &Map<String, Value>,
    ) -> AdminResult<Record> {
        let existing = self.get_existing(store, id).await?;

        let mut merged = existing.fields.clone();
        for (key, value) in payload {
            merged.insert(key.clone(), value.clone());
        }

        let validated = self
            .validate_record(store, &merged, FormOperation::Edit(id))
            .await?;

        let mut fields = existing.fields;
        fields.extend(validated.fields);
        let record = store.update(self.entity(), id, fields).await?;

        info!(resource = %self.name(), id = %record.id, "Updated record");
        Ok(record)
    }

    /// Fetches one record with the associations its table columns display.
    pub async fn find(&self, store: &dyn RecordStore, id: &str) -> AdminResult<Option<Record>> {
        let mut query = Query::select(self.entity()).filter_in("id", [id]).limit(1);
        for association in self.column_associations()? {
            query = query.with(association.clone());
        }
        Ok(store.execute(&query).await?.into_iter().next())
    }

    /// Deletes records by id. Returns how many existed.
    pub async fn delete(&self, store: &dyn RecordStore, ids: &[String]) -> AdminResult<u64> {
        let deleted = store.delete(self.entity(), ids).await?;
        info!(resource = %self.name(), requested = ids.len(), deleted, "Deleted records");
        Ok(deleted)
    }

    /// The sidebar badge: the number of records of this resource.
    pub async fn navigation_badge(&self, store: &dyn RecordStore) -> AdminResult<String> {
        let count = store.count(&Query::select(self.entity())).await?;
        Ok(count.to_string())
    }

    /// Selectable options for a relation field or a relation filter, ordered
    /// by their label.
    pub async fn relation_options(
        &self,
        store: &dyn RecordStore,
        name: &str,
    ) -> AdminResult<Vec<RelationOption>> {
        let (association, label_field) = self.relation_source(name)?;

        let records = store
            .execute(
                &Query::select(&association.target_entity)
                    .order_by(label_field, SortDirection::Ascending),
            )
            .await?;

        debug!(
            resource = %self.name(),
            relation = %name,
            options = records.len(),
            "Loaded relation options"
        );

        Ok(records
            .into_iter()
            .map(|record| RelationOption {
                label: record.attribute_text(label_field),
                id: record.id,
            })
            .collect())
    }

    fn relation_source(&self, name: &str) -> Result<(&Association, &str), SchemaError> {
        if let Ok(field) = self.schema().field(name) {
            if let FieldKind::Relation {
                association,
                label_field,
                ..
            } = &field.kind
            {
                return Ok((self.association(association)?, label_field.as_str()));
            }
            return Err(SchemaError::FieldKindMismatch {
                resource: self.name().to_string(),
                field: name.to_string(),
                expected: "relation",
            });
        }

        match self.schema().filter(name)? {
            FilterSpec::RelationEnum(filter) => Ok((
                self.association(&filter.association)?,
                filter.related_label_field.as_str(),
            )),
            FilterSpec::Ternary(_) => Err(SchemaError::FieldKindMismatch {
                resource: self.name().to_string(),
                field: name.to_string(),
                expected: "relation",
            }),
        }
    }

    fn column_associations(&self) -> Result<Vec<&Association>, SchemaError> {
        let mut associations: Vec<&Association> = Vec::new();
        for column in self.table_columns() {
            if let Some((name, _)) = column.relation_path() {
                let association = self.association(name)?;
                if !associations.iter().any(|a| a.name == association.name) {
                    associations.push(association);
                }
            }
        }
        Ok(associations)
    }

    async fn get_existing(&self, store: &dyn RecordStore, id: &str) -> AdminResult<Record> {
        store.get(self.entity(), id).await?.ok_or_else(|| {
            QueryError::NotFound {
                entity: self.entity().to_string(),
                id: id.to_string(),
            }
            .into()
        })
    }
}
