//! Payload validation against a resource's form schema.

use chrono::Utc;
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::error::{AdminResult, FieldViolation, ValidationErrors, ViolationKind};
use crate::query::value::{as_key, parse_datetime, stringify};
use crate::query::{Op, Query, RecordStore};
use crate::schema::{Derivation, FieldDefault, FieldDescriptor, FieldKind, slugify};

use super::ResourceDefinition;
use super::form::{FormOperation, ValidatedRecord};

/// Absent, null, whitespace-only or an empty list.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn number_value(value: &Value) -> Option<(f64, Value)> {
    match value {
        Value::Number(n) => Some((n.as_f64()?, value.clone())),
        Value::String(s) => {
            let parsed: f64 = s.trim().parse().ok()?;
            if !parsed.is_finite() {
                return None;
            }
            let normalized = if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
                Value::from(parsed as i64)
            } else {
                Value::Number(Number::from_f64(parsed)?)
            };
            Some((parsed, normalized))
        }
        _ => None,
    }
}

fn boolean_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Relation identifiers, or `None` when the shape is wrong.
fn relation_ids(value: &Value, multiple: bool) -> Option<Vec<String>> {
    match value {
        Value::Array(items) if multiple => items.iter().map(as_key).collect(),
        single => as_key(single).map(|id| vec![id]),
    }
}

impl ResourceDefinition {
    /// Applies defaults and derivations for a create.
    fn prepare_create(&self, fields: &mut Map<String, Value>) {
        for field in self.form_fields() {
            if !fields.contains_key(&field.name) {
                match &field.default {
                    Some(FieldDefault::Value(value)) => {
                        fields.insert(field.name.clone(), value.clone());
                    }
                    Some(FieldDefault::Today) => {
                        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
                        fields.insert(field.name.clone(), Value::String(today));
                    }
                    None => {}
                }
            }

            if let Some(Derivation::Slug { source }) = &field.derivation {
                if let Some(text) = fields.get(source).and_then(Value::as_str) {
                    if !text.trim().is_empty() {
                        fields.insert(field.name.clone(), Value::String(slugify(text)));
                    }
                }
            }
        }
    }

    /// Checks the shape and static constraints of one present value.
    ///
    /// Returns the normalized value to store.
    fn check_value(&self, field: &FieldDescriptor, value: &Value) -> Result<Value, ViolationKind> {
        let constraints = &field.constraints;

        let normalized = match &field.kind {
            FieldKind::Number => {
                let (number, normalized) = number_value(value).ok_or(ViolationKind::Numeric)?;
                if let Some(min) = constraints.min {
                    if number < min {
                        return Err(ViolationKind::Min { min });
                    }
                }
                if let Some(max) = constraints.max {
                    if number > max {
                        return Err(ViolationKind::Max { max });
                    }
                }
                normalized
            }
            FieldKind::Text | FieldKind::Markdown => match value {
                Value::String(_) => value.clone(),
                _ => return Err(ViolationKind::InvalidType { expected: "a string" }),
            },
            FieldKind::Boolean => Value::Bool(
                boolean_value(value).ok_or(ViolationKind::InvalidType {
                    expected: "true or false",
                })?,
            ),
            FieldKind::Date => match value.as_str().and_then(parse_datetime) {
                Some(_) => value.clone(),
                None => return Err(ViolationKind::InvalidType { expected: "a date" }),
            },
            FieldKind::Select { options } => {
                let chosen = stringify(value).ok_or(ViolationKind::NotAnOption)?;
                if !options.iter().any(|o| o.value == chosen) {
                    return Err(ViolationKind::NotAnOption);
                }
                Value::String(chosen)
            }
            FieldKind::Relation { multiple, .. } => {
                let ids = relation_ids(value, *multiple).ok_or(ViolationKind::InvalidType {
                    expected: if *multiple {
                        "a list of identifiers"
                    } else {
                        "an identifier"
                    },
                })?;
                if *multiple {
                    Value::Array(ids.into_iter().map(Value::String).collect())
                } else {
                    ids.into_iter().next().map(Value::String).unwrap_or(Value::Null)
                }
            }
            FieldKind::Image { .. } => match value {
                Value::String(_) => value.clone(),
                _ => return Err(ViolationKind::InvalidType { expected: "a file path" }),
            },
        };

        // patterns match the submitted text, before numeric normalization
        if let Some(regex) = self.pattern(&field.name) {
            let text = stringify(value).unwrap_or_default();
            if !regex.is_match(text.trim()) {
                return Err(ViolationKind::Pattern {
                    pattern: regex.as_str().to_string(),
                });
            }
        }

        Ok(normalized)
    }

    /// Identifiers in `value` that do not exist in the related entity.
    async fn missing_references(
        &self,
        store: &dyn RecordStore,
        field: &FieldDescriptor,
        value: &Value,
    ) -> AdminResult<Vec<String>> {
        let Some(association) = field.association() else {
            return Ok(Vec::new());
        };
        let association = self.association(association)?;

        let ids: Vec<String> = match value {
            Value::Array(items) => items.iter().filter_map(as_key).collect(),
            single => as_key(single).into_iter().collect(),
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = store
            .execute(&Query::select(&association.target_entity).filter_in("id", ids.iter().cloned()))
            .await?;

        Ok(ids
            .into_iter()
            .filter(|id| !found.iter().any(|r| &r.id == id))
            .collect())
    }

    async fn is_taken(
        &self,
        store: &dyn RecordStore,
        field: &FieldDescriptor,
        value: &Value,
        operation: FormOperation<'_>,
    ) -> AdminResult<bool> {
        let mut query = Query::select(self.entity()).filter(&field.name, Op::Eq, value.clone());
        if let FormOperation::Edit(id) = operation {
            query = query.filter("id", Op::Ne, id);
        }
        Ok(store.count(&query).await? > 0)
    }

    /// Validates a submitted payload.
    ///
    /// On create, defaults fill absent fields and derivations are applied
    /// first. Every field is then checked and all violations are collected.
    /// A blank required field yields exactly one `Required` violation and no
    /// further checks. Uniqueness ignores the record being edited. Unknown
    /// payload keys and non-dehydrated fields are dropped from the result.
    pub async fn validate_record(
        &self,
        store: &dyn RecordStore,
        payload: &Map<String, Value>,
        operation: FormOperation<'_>,
    ) -> AdminResult<ValidatedRecord> {
        let mut fields = payload.clone();
        if operation.is_create() {
            self.prepare_create(&mut fields);
        }

        let mut errors = ValidationErrors::new();
        let mut validated = Map::new();

        for field in self.form_fields() {
            let value = fields.get(&field.name);

            if is_blank(value) {
                if field.constraints.required {
                    errors.push(FieldViolation::new(
                        &field.name,
                        &field.label,
                        ViolationKind::Required,
                    ));
                } else if field.dehydrated && value.is_some() {
                    validated.insert(field.name.clone(), Value::Null);
                }
                continue;
            }
            let Some(value) = value else { continue };

            let normalized = match self.check_value(field, value) {
                Ok(normalized) => normalized,
                Err(kind) => {
                    errors.push(FieldViolation::new(&field.name, &field.label, kind));
                    continue;
                }
            };

            let missing = self.missing_references(store, field, &normalized).await?;
            if !missing.is_empty() {
                errors.push(FieldViolation::new(
                    &field.name,
                    &field.label,
                    ViolationKind::UnknownReference { ids: missing },
                ));
                continue;
            }

            if field.constraints.unique && self.is_taken(store, field, &normalized, operation).await? {
                errors.push(FieldViolation::new(
                    &field.name,
                    &field.label,
                    ViolationKind::Unique,
                ));
                continue;
            }

            if field.dehydrated {
                validated.insert(field.name.clone(), normalized);
            }
        }

        if !errors.is_empty() {
            warn!(
                resource = %self.name(),
                violations = errors.len(),
                "Validation failed"
            );
            return Err(errors.into());
        }

        Ok(ValidatedRecord { fields: validated })
    }
}
