//! Entity schemas: typed field, column and filter descriptors.
//!
//! Everything in this module is data. A [`ResourceSchema`] is assembled once
//! at startup, checked by [`ResourceSchema::check`], and shared read-only
//! afterwards.

mod column;
mod field;
mod filter_spec;
mod slug;

pub use column::{ColumnKind, TableColumn};
pub use field::{
    Constraints, Derivation, FieldDefault, FieldDescriptor, FieldKind, SelectOption,
};
pub use filter_spec::{FilterSpec, RelationFilter, TernaryFilter, TernaryMode};
pub use slug::slugify;

pub(crate) use field::humanize;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::query::{Association, SYSTEM_ATTRIBUTES};

/// The form, table, search and filter configuration of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Name of the owning resource, used in error messages.
    pub resource: String,
    pub form_fields: Vec<FieldDescriptor>,
    pub table_columns: Vec<TableColumn>,
    /// Attributes matched by global search.
    pub searchable_attributes: Vec<String>,
    pub filters: Vec<FilterSpec>,
}

impl ResourceSchema {
    /// Creates an empty schema for a resource.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            form_fields: Vec::new(),
            table_columns: Vec::new(),
            searchable_attributes: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Looks up a form field by name.
    pub fn field(&self, name: &str) -> Result<&FieldDescriptor, SchemaError> {
        self.form_fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SchemaError::UnknownField {
                resource: self.resource.clone(),
                field: name.to_string(),
            })
    }

    /// Returns the constraints of a form field.
    pub fn constraints(&self, name: &str) -> Result<&Constraints, SchemaError> {
        self.field(name).map(|f| &f.constraints)
    }

    /// Looks up a table column by path.
    pub fn column(&self, path: &str) -> Result<&TableColumn, SchemaError> {
        self.table_columns
            .iter()
            .find(|c| c.path == path)
            .ok_or_else(|| SchemaError::UnknownColumn {
                resource: self.resource.clone(),
                column: path.to_string(),
            })
    }

    /// Looks up a filter by name.
    pub fn filter(&self, name: &str) -> Result<&FilterSpec, SchemaError> {
        self.filters
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| SchemaError::UnknownFilter {
                resource: self.resource.clone(),
                filter: name.to_string(),
            })
    }

    /// True if `name` is a form field or a system attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        SYSTEM_ATTRIBUTES.contains(&name) || self.form_fields.iter().any(|f| f.name == name)
    }

    /// Checks the structural invariants of the schema.
    ///
    /// Field names are unique, derivations read an earlier field, and every
    /// searchable attribute, column and filter refers to something that exists.
    pub fn check(&self, associations: &[Association]) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for field in &self.form_fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    resource: self.resource.clone(),
                    field: field.name.clone(),
                });
            }

            if let Some(derivation) = &field.derivation {
                // `seen` holds this field and everything declared before it
                let source = derivation.source();
                if source == field.name || !seen.contains(source) {
                    return Err(SchemaError::DerivationOrder {
                        field: field.name.clone(),
                        source_field: source.to_string(),
                    });
                }
            }

            if let Some(association) = field.association() {
                self.require_association(associations, association)?;
            }
        }

        for attribute in &self.searchable_attributes {
            if !self.has_attribute(attribute) {
                return Err(self.unknown_field(attribute));
            }
        }

        for column in &self.table_columns {
            match column.relation_path() {
                Some((association, _)) => {
                    self.require_association(associations, association)?;
                }
                None if !self.has_attribute(&column.path) => {
                    return Err(SchemaError::UnknownColumn {
                        resource: self.resource.clone(),
                        column: column.path.clone(),
                    });
                }
                None => {}
            }
        }

        let mut filter_names = HashSet::new();
        for filter in &self.filters {
            if !filter_names.insert(filter.name()) {
                return Err(SchemaError::InvalidConfig {
                    message: format!(
                        "duplicate filter '{}' in resource '{}'",
                        filter.name(),
                        self.resource
                    ),
                });
            }
            match filter {
                FilterSpec::Ternary(f) if !self.has_attribute(&f.field) => {
                    return Err(self.unknown_field(&f.field));
                }
                FilterSpec::RelationEnum(f) => {
                    self.require_association(associations, &f.association)?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn require_association<'a>(
        &self,
        associations: &'a [Association],
        name: &str,
    ) -> Result<&'a Association, SchemaError> {
        associations
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| SchemaError::UnknownAssociation {
                resource: self.resource.clone(),
                association: name.to_string(),
            })
    }

    fn unknown_field(&self, field: &str) -> SchemaError {
        SchemaError::UnknownField {
            resource: self.resource.clone(),
            field: field.to_string(),
        }
    }
}
