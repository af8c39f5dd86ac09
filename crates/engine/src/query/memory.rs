//! In-memory record store.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{QueryError, QueryResult};

use super::value::{compare, contains, equals, sort_cmp};
use super::{Condition, Op, Query, Record, RecordStore, SortDirection, SortKey};

/// A record store backed by a vector.
///
/// Records of all entities share one vector, so iteration order is insertion
/// order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all entities.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Evaluates a condition. `records` is the whole store, searched by
/// [`Condition::Related`].
fn matches(record: &Record, condition: &Condition, records: &[Record]) -> bool {
    match condition {
        Condition::Compare { field, op, value } => {
            let actual = record.attribute(field);
            match op {
                Op::Eq if value.is_null() => actual.is_null(),
                Op::Eq => equals(&actual, value),
                Op::Ne if value.is_null() => !actual.is_null(),
                // null never compares unequal, matching SQL
                Op::Ne => !actual.is_null() && !equals(&actual, value),
                Op::Gt => compare(&actual, value) == Some(Ordering::Greater),
                Op::Gte => matches!(
                    compare(&actual, value),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                Op::Lt => compare(&actual, value) == Some(Ordering::Less),
                Op::Lte => matches!(
                    compare(&actual, value),
                    Some(Ordering::Less | Ordering::Equal)
                ),
                Op::Contains => value.as_str().is_some_and(|needle| contains(&actual, needle)),
                Op::IsNull => actual.is_null(),
                Op::NotNull => !actual.is_null(),
            }
        }
        Condition::In { field, values } => match record.attribute(field) {
            Value::Array(items) => items
                .iter()
                .any(|item| values.iter().any(|v| equals(item, v))),
            actual => values.iter().any(|v| equals(&actual, v)),
        },
        Condition::Any { conditions } => conditions.iter().any(|c| matches(record, c, records)),
        Condition::Related {
            association,
            condition,
        } => {
            let ids = association.referenced_ids(record);
            records.iter().any(|r| {
                r.entity == association.target_entity
                    && ids.contains(&r.id)
                    && matches(r, condition, records)
            })
        }
    }
}

fn matches_all(record: &Record, query: &Query, records: &[Record]) -> bool {
    record.entity == query.entity
        && query.conditions.iter().all(|c| matches(record, c, records))
}

/// Reads the value a sort key orders by.
fn sort_value(record: &Record, key: &SortKey, related: &HashMap<(&str, &str), &Record>) -> Value {
    match &key.related {
        None => record.attribute(&key.field),
        Some(association) => association
            .referenced_ids(record)
            .first()
            .and_then(|id| related.get(&(association.target_entity.as_str(), id.as_str())))
            .map(|r| r.attribute(&key.field))
            .unwrap_or(Value::Null),
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn execute(&self, query: &Query) -> QueryResult<Vec<Record>> {
        let records = self.records.read();

        let mut matched: Vec<Record> = records
            .iter()
            .filter(|r| matches_all(r, query, &records))
            .cloned()
            .collect();

        if !query.sort.is_empty() {
            let related: HashMap<(&str, &str), &Record> = records
                .iter()
                .map(|r| ((r.entity.as_str(), r.id.as_str()), r))
                .collect();

            // stable, so ties keep insertion order
            matched.sort_by(|a, b| {
                for key in &query.sort {
                    let ordering = sort_cmp(
                        &sort_value(a, key, &related),
                        &sort_value(b, key, &related),
                    );
                    let ordering = match key.direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let offset = query
            .offset
            .map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX));
        let limit = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        let mut page: Vec<Record> = matched.into_iter().skip(offset).take(limit).collect();

        for association in &query.includes {
            let keys = association.collect_keys(&page);
            let loaded: Vec<Record> = records
                .iter()
                .filter(|r| r.entity == association.target_entity && keys.contains(&r.id))
                .cloned()
                .collect();
            association.attach(&mut page, &loaded);
        }

        debug!(
            entity = %query.entity,
            returned = page.len(),
            includes = query.includes.len(),
            "Executed in-memory query"
        );

        Ok(page)
    }

    async fn count(&self, query: &Query) -> QueryResult<u64> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| matches_all(r, query, &records))
            .count() as u64)
    }

    async fn get(&self, entity: &str, id: &str) -> QueryResult<Option<Record>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .find(|r| r.entity == entity && r.id == id)
            .cloned())
    }

    async fn insert(
        &self,
        entity: &str,
        fields: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> QueryResult<Record> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = Record::new(entity, id, fields, created_at);

        self.records.write().push(record.clone());
        debug!(entity, id = %record.id, "Inserted record");

        Ok(record)
    }

    async fn update(
        &self,
        entity: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> QueryResult<Record> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|r| r.entity == entity && r.id == id)
            .ok_or_else(|| QueryError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            })?;

        record.fields = fields;
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn delete(&self, entity: &str, ids: &[String]) -> QueryResult<u64> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| !(r.entity == entity && ids.contains(&r.id)));
        let removed = (before - records.len()) as u64;

        debug!(entity, removed, "Deleted records");
        Ok(removed)
    }
}
