//! Declarative list filter specifications.
//!
//! A [`FilterSpec`] only describes a filter. Applying a user-selected value to a
//! query is the job of [`FilterEngine`](crate::filter::FilterEngine).

use serde::{Deserialize, Serialize};

use super::field::humanize;

/// What the true/false states of a ternary filter test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TernaryMode {
    /// `true` / `false` compare the field against the boolean.
    #[default]
    Boolean,
    /// `true` means the field is set, `false` means it is null.
    Nullable,
}

/// A three-state filter over one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TernaryFilter {
    pub name: String,
    pub label: String,
    pub field: String,
    #[serde(default)]
    pub mode: TernaryMode,
    pub true_label: String,
    pub false_label: String,
    pub placeholder: String,
}

/// A filter restricting records to a chosen set of related records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationFilter {
    pub name: String,
    pub label: String,
    pub association: String,
    /// Field of the related record shown as the option label.
    pub related_label_field: String,
    /// Whether several related records can be chosen at once.
    #[serde(default)]
    pub multiple: bool,
    /// Field of the filtered record holding the related identifier(s).
    /// Bound to the association's key when the resource is built.
    pub key_field: String,
}

/// A list filter, either ternary or relation-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSpec {
    Ternary(TernaryFilter),
    RelationEnum(RelationFilter),
}

impl FilterSpec {
    /// A boolean ternary filter named after its field.
    pub fn ternary(field: impl Into<String>) -> Self {
        let field = field.into();
        FilterSpec::Ternary(TernaryFilter {
            name: field.clone(),
            label: humanize(&field),
            true_label: "Yes".to_string(),
            false_label: "No".to_string(),
            placeholder: "-".to_string(),
            mode: TernaryMode::Boolean,
            field,
        })
    }

    /// A relation filter named after its association.
    pub fn relation(association: impl Into<String>, related_label_field: impl Into<String>) -> Self {
        let association = association.into();
        FilterSpec::RelationEnum(RelationFilter {
            name: association.clone(),
            label: humanize(&association),
            key_field: format!("{association}_id"),
            related_label_field: related_label_field.into(),
            multiple: false,
            association,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            FilterSpec::Ternary(f) => &f.name,
            FilterSpec::RelationEnum(f) => &f.name,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        match &mut self {
            FilterSpec::Ternary(f) => f.label = label.into(),
            FilterSpec::RelationEnum(f) => f.label = label.into(),
        }
        self
    }

    /// Sets the labels of the true and false states. Ternary filters only.
    pub fn state_labels(mut self, true_label: impl Into<String>, false_label: impl Into<String>) -> Self {
        if let FilterSpec::Ternary(f) = &mut self {
            f.true_label = true_label.into();
            f.false_label = false_label.into();
        }
        self
    }

    /// Switches a ternary filter to null / not-null semantics.
    pub fn nullable(mut self) -> Self {
        if let FilterSpec::Ternary(f) = &mut self {
            f.mode = TernaryMode::Nullable;
        }
        self
    }

    /// Allows selecting several related records. Relation filters only.
    pub fn multiple(mut self) -> Self {
        if let FilterSpec::RelationEnum(f) = &mut self {
            f.multiple = true;
        }
        self
    }

    /// Short name of the value kind this filter accepts.
    pub fn value_kind(&self) -> &'static str {
        match self {
            FilterSpec::Ternary(_) => "ternary",
            FilterSpec::RelationEnum(_) => "relation",
        }
    }
}
