//! Error types for the admin engine.
//!
//! Errors fall into three families that callers treat very differently:
//!
//! - [`SchemaError`] - a resource, field, filter or registry is misconfigured.
//!   Builders return it at startup so a broken definition never serves traffic.
//! - [`ValidationErrors`] - one or more field-scoped violations on a submitted
//!   payload. Recoverable; the form layer re-displays every violation.
//! - [`RequestError`] - a list request names something the resource does not
//!   offer. The caller sent a bad request; the definition is fine.
//! - [`QueryError`] - the store failed. Propagated unchanged, never retried.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The top-level error returned by engine entry points.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Configuration errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Payload validation errors
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Malformed list requests
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Store errors
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl AdminError {
    /// Returns the validation errors if this is a validation failure.
    pub fn as_validation(&self) -> Option<&ValidationErrors> {
        match self {
            AdminError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Errors raised by misconfigured schemas, resources and registries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown field '{field}' in resource '{resource}'")]
    UnknownField { resource: String, field: String },

    #[error("duplicate field '{field}' in resource '{resource}'")]
    DuplicateField { resource: String, field: String },

    #[error("field '{field}' derives from '{source_field}', which is not an earlier field")]
    DerivationOrder { field: String, source_field: String },

    #[error("field '{field}' in resource '{resource}' is not a {expected} field")]
    FieldKindMismatch {
        resource: String,
        field: String,
        expected: &'static str,
    },

    #[error("invalid pattern on field '{field}': {message}")]
    InvalidPattern { field: String, message: String },

    #[error("unknown association '{association}' in resource '{resource}'")]
    UnknownAssociation {
        resource: String,
        association: String,
    },

    #[error("unknown column '{column}' in resource '{resource}'")]
    UnknownColumn { resource: String, column: String },

    #[error("unknown filter '{filter}' in resource '{resource}'")]
    UnknownFilter { resource: String, filter: String },

    #[error("filter '{filter}' expects a {expected} value")]
    FilterValueMismatch {
        filter: String,
        expected: &'static str,
    },

    #[error(
        "search detail '{path}' in resource '{resource}' reads association '{association}', which the search query does not eager-load"
    )]
    DetailNotEagerLoaded {
        resource: String,
        path: String,
        association: String,
    },

    #[error("title attribute '{attribute}' is not a field of resource '{resource}'")]
    UnknownTitleAttribute { resource: String, attribute: String },

    #[error("duplicate resource '{name}'")]
    DuplicateResource { name: String },

    #[error("unknown resource '{name}'")]
    UnknownResource { name: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Errors raised by list requests that do not fit the resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("resource '{resource}' has no filter named '{filter}'")]
    UnknownFilter { resource: String, filter: String },
}

/// What went wrong with a single field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field was absent, null, blank or an empty list.
    Required,
    /// Another record already holds this value.
    Unique,
    /// The value is not a number.
    Numeric,
    /// The value is below the minimum.
    Min { min: f64 },
    /// The value is above the maximum.
    Max { max: f64 },
    /// The value does not match the field pattern.
    Pattern { pattern: String },
    /// The value is not one of the select options.
    NotAnOption,
    /// The related records do not exist.
    UnknownReference { ids: Vec<String> },
    /// The value has the wrong JSON shape for the field kind.
    InvalidType { expected: &'static str },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Required => write!(f, "required"),
            ViolationKind::Unique => write!(f, "unique"),
            ViolationKind::Numeric => write!(f, "numeric"),
            ViolationKind::Min { .. } => write!(f, "min"),
            ViolationKind::Max { .. } => write!(f, "max"),
            ViolationKind::Pattern { .. } => write!(f, "pattern"),
            ViolationKind::NotAnOption => write!(f, "in"),
            ViolationKind::UnknownReference { .. } => write!(f, "exists"),
            ViolationKind::InvalidType { .. } => write!(f, "type"),
        }
    }
}

/// A violation scoped to one field of a payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    /// The field name.
    pub field: String,
    /// The rule that failed.
    pub kind: ViolationKind,
    /// A human-readable message for re-display next to the field.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation with a message derived from the rule and label.
    pub fn new(field: impl Into<String>, label: &str, kind: ViolationKind) -> Self {
        let message = match &kind {
            ViolationKind::Required => format!("The {label} field is required."),
            ViolationKind::Unique => format!("The {label} has already been taken."),
            ViolationKind::Numeric => format!("The {label} field must be a number."),
            ViolationKind::Min { min } => {
                format!("The {label} field must be at least {min}.")
            }
            ViolationKind::Max { max } => {
                format!("The {label} field must not be greater than {max}.")
            }
            ViolationKind::Pattern { .. } => format!("The {label} field format is invalid."),
            ViolationKind::NotAnOption => format!("The selected {label} is invalid."),
            ViolationKind::UnknownReference { ids } => {
                format!("The selected {label} does not exist: {}.", ids.join(", "))
            }
            ViolationKind::InvalidType { expected } => {
                format!("The {label} field must be {expected}.")
            }
        };
        Self {
            field: field.into(),
            kind,
            message,
        }
    }
}

/// Every field-scoped violation found on one payload.
///
/// Violations accumulate across fields; validation never stops at the first one.
#[derive(Error, Debug, Clone, Default, PartialEq, Serialize)]
#[error("validation failed on {} field(s): {}", .violations.len(), field_list(.violations))]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

fn field_list(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.
    pub fn push(&mut self, violation: FieldViolation) {
        self.violations.push(violation);
    }

    /// Returns true when no violation was recorded.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// All violations in field order.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Violations recorded for one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldViolation> {
        self.violations.iter().filter(move |v| v.field == field)
    }

    /// Returns true if the field has at least one violation.
    pub fn has(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }

    /// `Ok(value)` when empty, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Errors originating from the record store.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("store unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    #[error("query execution failed in {backend_name}: {message}")]
    Execution {
        backend_name: String,
        message: String,
    },

    #[error("record not found: {entity}/{id}")]
    NotFound { entity: String, id: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for engine operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// Result type alias for store operations.
pub type QueryResult<T> = Result<T, QueryError>;

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> Self {
        QueryError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for QueryError {
    fn from(err: r2d2::Error) -> Self {
        QueryError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        }
    }
}
