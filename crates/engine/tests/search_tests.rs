//! Global search integration tests.

mod common;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use common::*;
use shopdesk_engine::AdminConfig;
use shopdesk_engine::error::QueryResult;
use shopdesk_engine::query::{InMemoryStore, Query, Record, RecordStore};
use shopdesk_engine::search::GlobalSearch;

fn search_engine() -> GlobalSearch {
    GlobalSearch::new(registry(), AdminConfig::default())
}

/// Wraps a store and records every executed query.
#[derive(Default)]
struct RecordingStore {
    inner: InMemoryStore,
    executed: Mutex<Vec<Query>>,
}

#[async_trait]
impl RecordStore for RecordingStore {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn execute(&self, query: &Query) -> QueryResult<Vec<Record>> {
        self.executed.lock().push(query.clone());
        self.inner.execute(query).await
    }

    async fn count(&self, query: &Query) -> QueryResult<u64> {
        self.inner.count(query).await
    }

    async fn get(&self, entity: &str, id: &str) -> QueryResult<Option<Record>> {
        self.inner.get(entity, id).await
    }

    async fn insert(
        &self,
        entity: &str,
        fields: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> QueryResult<Record> {
        self.inner.insert(entity, fields, created_at).await
    }

    async fn update(&self, entity: &str, id: &str, fields: Map<String, Value>) -> QueryResult<Record> {
        self.inner.update(entity, id, fields).await
    }

    async fn delete(&self, entity: &str, ids: &[String]) -> QueryResult<u64> {
        self.inner.delete(entity, ids).await
    }
}

#[tokio::test]
async fn test_nonexistent_term_returns_empty() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let results = search_engine()
        .search(&store, "nonexistent-term", 20)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_limit_keeps_first_match() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let results = search_engine().search(&store, "Red", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record_id, shop.products[0].id);
    assert_eq!(results[0].title, "Red T-Shirt");
}

#[tokio::test]
async fn test_term_in_one_resource_only() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let results = search_engine().search(&store, "globex", 20).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].resource_name, "brands");
    assert_eq!(results[0].matched_attributes, vec!["name", "slug"]);
}

#[tokio::test]
async fn test_results_follow_registration_order() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let results = search_engine().search(&store, "mug", 20).await.unwrap();
    let hits: Vec<(&str, &str)> = results
        .iter()
        .map(|r| (r.resource_name.as_str(), r.title.as_str()))
        .collect();
    assert_eq!(
        hits,
        vec![
            ("products", "Red Mug"),
            ("products", "Blue Mug"),
            ("categories", "Mugs"),
        ]
    );
}

#[tokio::test]
async fn test_result_details_and_url() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let results = search_engine().search(&store, "hoodie", 20).await.unwrap();
    assert_eq!(results.len(), 1);

    let hit = &results[0];
    assert_eq!(hit.url, format!("/admin/products/{}/edit", shop.products[3].id));
    assert_eq!(hit.details, vec![("Brand".to_string(), "Globex".to_string())]);
    assert_eq!(hit.matched_attributes, vec!["name", "slug"]);
}

#[tokio::test]
async fn test_blank_term_issues_no_queries() {
    let store = RecordingStore::default();
    seed(&store).await;

    let results = search_engine().search(&store, "   ", 20).await.unwrap();
    assert!(results.is_empty());
    assert!(store.executed.lock().is_empty());
}

#[tokio::test]
async fn test_search_eager_loads_and_limits_each_query() {
    let store = RecordingStore::default();
    seed(&store).await;

    search_engine().search_default(&store, "red").await.unwrap();

    let executed = store.executed.lock();
    assert_eq!(executed.len(), 3);
    assert_eq!(executed[0].entity, "products");
    assert!(executed[0].includes_association("brand"));
    assert!(executed.iter().all(|q| q.limit == Some(20)));
}
