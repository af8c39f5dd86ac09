//! Applies user-selected filter values to list queries.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::query::{Op, Query};
use crate::schema::{FilterSpec, TernaryMode};

/// The state of a ternary filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TernaryState {
    True,
    False,
    /// No choice made. The filter does not restrict anything.
    #[default]
    Unset,
}

impl TernaryState {
    /// Parses a submitted value: `true`/`1`, `false`/`0`, or empty for unset.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(TernaryState::True),
            "false" | "0" => Some(TernaryState::False),
            "" => Some(TernaryState::Unset),
            _ => None,
        }
    }
}

/// A value chosen for one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Ternary(TernaryState),
    /// Identifiers of the chosen related records. Empty means no choice.
    Relation(Vec<String>),
}

impl FilterValue {
    /// Parses a raw submitted value for the given filter.
    ///
    /// Relation filters take a comma-separated id list.
    pub fn parse(spec: &FilterSpec, raw: &str) -> Result<Self, SchemaError> {
        match spec {
            FilterSpec::Ternary(_) => TernaryState::parse(raw)
                .map(FilterValue::Ternary)
                .ok_or_else(|| SchemaError::FilterValueMismatch {
                    filter: spec.name().to_string(),
                    expected: "true, false or empty",
                }),
            FilterSpec::RelationEnum(_) => Ok(FilterValue::Relation(
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect(),
            )),
        }
    }
}

/// Narrows queries according to filter specs.
pub struct FilterEngine;

impl FilterEngine {
    /// Returns a new query narrowed by one filter value.
    ///
    /// `Unset` ternaries and empty relation choices return the query
    /// unchanged. A value of the wrong kind for the spec is rejected.
    pub fn apply(query: &Query, spec: &FilterSpec, value: &FilterValue) -> Result<Query, SchemaError> {
        match (spec, value) {
            (FilterSpec::Ternary(_), FilterValue::Ternary(TernaryState::Unset)) => Ok(query.clone()),
            (FilterSpec::Ternary(filter), FilterValue::Ternary(state)) => {
                let is_true = *state == TernaryState::True;
                let narrowed = match filter.mode {
                    TernaryMode::Boolean => query.clone().filter(&filter.field, Op::Eq, is_true),
                    TernaryMode::Nullable if is_true => {
                        query.clone().filter(&filter.field, Op::NotNull, serde_json::Value::Null)
                    }
                    TernaryMode::Nullable => {
                        query.clone().filter(&filter.field, Op::IsNull, serde_json::Value::Null)
                    }
                };
                Ok(narrowed)
            }
            (FilterSpec::RelationEnum(_), FilterValue::Relation(ids)) if ids.is_empty() => {
                Ok(query.clone())
            }
            (FilterSpec::RelationEnum(filter), FilterValue::Relation(ids)) => {
                Ok(query.clone().filter_in(&filter.key_field, ids.iter().cloned()))
            }
            (spec, _) => Err(SchemaError::FilterValueMismatch {
                filter: spec.name().to_string(),
                expected: spec.value_kind(),
            }),
        }
    }
}
