//! The record store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};

use super::value::{month_range, timestamp};
use super::{Op, Query, Record};

/// Executes [`Query`] values and persists records.
///
/// Implementations must honor these rules:
///
/// - Without sort keys, records come back in insertion order.
/// - Includes are loaded in batch, one lookup per association.
/// - `count` ignores limit, offset and includes.
/// - Date-like strings and timestamps compare chronologically.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns a human-readable name for this backend.
    fn backend_name(&self) -> &'static str;

    /// Returns the records matching a query, with includes attached.
    async fn execute(&self, query: &Query) -> QueryResult<Vec<Record>>;

    /// Counts the records matching a query.
    async fn count(&self, query: &Query) -> QueryResult<u64>;

    /// Counts matching records per calendar month of `year`, keyed on a
    /// date-like `field`. Index 0 is January.
    ///
    /// The default implementation issues one count per month.
    async fn count_by_month(&self, query: &Query, field: &str, year: i32) -> QueryResult<[u64; 12]> {
        let mut counts = [0u64; 12];
        for (index, month) in (1..=12u32).enumerate() {
            let (start, end) = month_range(year, month).ok_or_else(|| invalid_year(year))?;
            let monthly = query
                .unpaginated()
                .filter(field, Op::Gte, timestamp(&start))
                .filter(field, Op::Lt, timestamp(&end));
            counts[index] = self.count(&monthly).await?;
        }
        Ok(counts)
    }

    /// Fetches one record by id, without includes.
    async fn get(&self, entity: &str, id: &str) -> QueryResult<Option<Record>>;

    /// Inserts a record. The store assigns the id.
    async fn insert(
        &self,
        entity: &str,
        fields: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> QueryResult<Record>;

    /// Replaces the fields of an existing record and bumps `updated_at`.
    async fn update(&self, entity: &str, id: &str, fields: Map<String, Value>)
    -> QueryResult<Record>;

    /// Deletes records by id. Returns how many existed.
    async fn delete(&self, entity: &str, ids: &[String]) -> QueryResult<u64>;
}

pub(crate) fn invalid_year(year: i32) -> QueryError {
    QueryError::Execution {
        backend_name: "query".to_string(),
        message: format!("year {year} is out of range"),
    }
}
