//! Counts and per-month buckets for dashboard widgets.

mod clock;
mod widget;

pub use clock::{Clock, FixedClock, SystemClock};
pub use widget::{
    ChartData, ChartType, Dashboard, Dataset, RenderedWidget, Stat, StatColor, Widget, WidgetMeta,
    WidgetOutput,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AdminResult, QueryResult};
use crate::query::value::{timestamp, year_range};
use crate::query::{Op, Query, RecordStore};

/// The count of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBucket {
    /// Abbreviated English month name, `Jan` to `Dec`.
    pub period_label: String,
    /// 1 to 12.
    pub month: u32,
    pub count: u64,
}

/// Counts the records matching `query`.
pub async fn count_where(store: &dyn RecordStore, query: &Query) -> AdminResult<u64> {
    Ok(store.count(query).await?)
}

/// A query for the records of `entity` created during `year`.
pub fn created_in_year(entity: &str, year: i32) -> QueryResult<Query> {
    let (start, end) = year_range(year).ok_or_else(|| crate::query::invalid_year(year))?;
    Ok(Query::select(entity)
        .filter("created_at", Op::Gte, timestamp(&start))
        .filter("created_at", Op::Lt, timestamp(&end)))
}

/// Records of `entity` created in each month of `year`, January first.
///
/// Always returns twelve buckets. Their counts add up to the count of
/// [`created_in_year`].
pub async fn monthly_counts(
    store: &dyn RecordStore,
    entity: &str,
    year: i32,
) -> AdminResult<Vec<StatBucket>> {
    monthly_counts_where(store, &Query::select(entity), year).await
}

/// Like [`monthly_counts`], restricted to the records matching `query`.
pub async fn monthly_counts_where(
    store: &dyn RecordStore,
    query: &Query,
    year: i32,
) -> AdminResult<Vec<StatBucket>> {
    let counts = store.count_by_month(query, "created_at", year).await?;

    let buckets: Vec<StatBucket> = (1..=12u32)
        .zip(counts)
        .map(|(month, count)| StatBucket {
            period_label: month_label(month),
            month,
            count,
        })
        .collect();

    debug!(
        entity = %query.entity,
        year,
        total = buckets.iter().map(|b| b.count).sum::<u64>(),
        "Computed monthly counts"
    );

    Ok(buckets)
}

fn month_label(month: u32) -> String {
    NaiveDate::from_ymd_opt(2000, month, 1)
        .map(|date| date.format("%b").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Condition, InMemoryStore};
    use chrono::{TimeZone, Utc};
    use serde_json::Map;

    #[test]
    fn test_month_labels() {
        let labels: Vec<String> = (1..=12).map(month_label).collect();
        assert_eq!(labels[0], "Jan");
        assert_eq!(labels[8], "Sep");
        assert_eq!(labels[11], "Dec");
    }

    #[test]
    fn test_created_in_year_bounds() {
        let query = created_in_year("products", 2024).unwrap();
        assert_eq!(
            query.conditions,
            vec![
                Condition::compare("created_at", Op::Gte, "2024-01-01T00:00:00.000000Z"),
                Condition::compare("created_at", Op::Lt, "2025-01-01T00:00:00.000000Z"),
            ]
        );
    }

    #[tokio::test]
    async fn test_monthly_counts_in_memory() {
        let store = InMemoryStore::new();
        for (month, day) in [(1, 5), (1, 31), (3, 1), (12, 31)] {
            let at = Utc.with_ymd_and_hms(2024, month, day, 23, 59, 59).unwrap();
            store.insert("products", Map::new(), at).await.unwrap();
        }
        let outside = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        store.insert("products", Map::new(), outside).await.unwrap();

        let buckets = monthly_counts(&store, "products", 2024).await.unwrap();
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1]);

        let total = count_where(&store, &created_in_year("products", 2024).unwrap())
            .await
            .unwrap();
        assert_eq!(counts.iter().sum::<u64>(), total);
    }
}
