//! The query-builder adapter contract.
//!
//! A [`Query`] is a backend-neutral description of a record fetch: one entity,
//! AND-ed conditions (with OR groups), eager-loaded associations, sort keys
//! and pagination. A [`RecordStore`] executes it.
//!
//! # Backends
//!
//! - [`InMemoryStore`] - always available, used by tests and demos
//! - [`SqliteStore`](sqlite::SqliteStore) - feature `sqlite` (default), JSON
//!   records in one table behind an r2d2 pool
//!
//! # Example
//!
//! ```
//! use shopdesk_engine::query::{Association, Op, Query, SortDirection};
//!
//! let brand = Association::belongs_to("brand", "brands", "brand_id");
//! let query = Query::select("products")
//!     .filter("is_visible", Op::Eq, true)
//!     .with(brand.clone())
//!     .order_by_related(&brand, "name", SortDirection::Ascending)
//!     .limit(10);
//!
//! assert_eq!(query.conditions.len(), 1);
//! assert_eq!(query.includes[0].name, "brand");
//! assert_eq!(query.limit, Some(10));
//! ```

mod association;
mod memory;
mod record;
mod store;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use association::{Association, AssociationKind};
pub use memory::InMemoryStore;
pub use record::Record;
pub use store::RecordStore;
pub(crate) use store::invalid_year;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attributes every record carries regardless of its entity.
pub const SYSTEM_ATTRIBUTES: [&str; 3] = ["id", "created_at", "updated_at"];

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive substring match on the textual form of the value.
    Contains,
    IsNull,
    NotNull,
}

/// One predicate of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// `field <op> value`. The value is ignored by `IsNull` / `NotNull`.
    Compare { field: String, op: Op, value: Value },
    /// The field equals one of the values. Array fields match when any
    /// element does.
    In { field: String, values: Vec<Value> },
    /// At least one nested condition holds. An empty group matches nothing.
    Any { conditions: Vec<Condition> },
    /// Some record reached through the association satisfies the condition.
    Related {
        association: Association,
        condition: Box<Condition>,
    },
}

impl Condition {
    pub fn compare(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Condition::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::compare(field, Op::Contains, Value::String(needle.into()))
    }

    pub fn related(association: Association, condition: Condition) -> Self {
        Condition::Related {
            association,
            condition: Box::new(condition),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Parses `asc` / `desc` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

/// A sort key, on the record itself or on a belongs-to related record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    /// When set, `field` is read from the related record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Association>,
    pub direction: SortDirection,
}

/// A backend-neutral record query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    pub entity: String,
    /// Conditions, combined with AND.
    pub conditions: Vec<Condition>,
    /// Associations to eager-load into [`Record::included`].
    pub includes: Vec<Association>,
    /// Sort keys in priority order. Empty means insertion order.
    pub sort: Vec<SortKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    /// Starts a query over all records of an entity.
    pub fn select(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Default::default()
        }
    }

    /// Adds a `field <op> value` condition.
    pub fn filter(mut self, field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::compare(field, op, value));
        self
    }

    /// Restricts the field to one of the given values.
    pub fn filter_in<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(Condition::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Adds an OR group.
    pub fn filter_any(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions.push(Condition::Any { conditions });
        self
    }

    /// Eager-loads an association. Adding the same association twice is a no-op.
    pub fn with(mut self, association: Association) -> Self {
        if !self.includes.iter().any(|a| a.name == association.name) {
            self.includes.push(association);
        }
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            related: None,
            direction,
        });
        self
    }

    /// Sorts by a field of a belongs-to related record.
    pub fn order_by_related(
        mut self,
        association: &Association,
        field: impl Into<String>,
        direction: SortDirection,
    ) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            related: Some(association.clone()),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The same query without limit and offset.
    pub fn unpaginated(&self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    /// True if the query eager-loads the named association.
    pub fn includes_association(&self, name: &str) -> bool {
        self.includes.iter().any(|a| a.name == name)
    }
}
