//! List page integration tests: filters, table search, sorting, pagination
//! and row projection, run against the in-memory store.

mod common;

use serde_json::json;

use common::*;
use shopdesk_engine::error::{AdminError, RequestError, SchemaError};
use shopdesk_engine::filter::{FilterValue, TernaryState};
use shopdesk_engine::query::{InMemoryStore, RecordStore, SortDirection};
use shopdesk_engine::resource::ListRequest;

// ============================================================================
// Filter Tests
// ============================================================================

#[tokio::test]
async fn test_unset_ternary_is_same_as_no_filter() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let products = products();

    let unfiltered = products.list(&store, &ListRequest::new()).await.unwrap();
    let unset = products
        .list(
            &store,
            &ListRequest::new().filter("is_visible", FilterValue::Ternary(TernaryState::Unset)),
        )
        .await
        .unwrap();

    assert_eq!(unset.total, 4);
    assert_eq!(names(&unset.records), names(&unfiltered.records));
}

#[tokio::test]
async fn test_ternary_true_and_false() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let products = products();

    let visible = products
        .list(
            &store,
            &ListRequest::new().filter("is_visible", FilterValue::Ternary(TernaryState::True)),
        )
        .await
        .unwrap();
    assert_eq!(names(&visible.records), vec!["Red T-Shirt", "Blue Mug"]);

    let hidden = products
        .list(
            &store,
            &ListRequest::new().filter("is_visible", FilterValue::Ternary(TernaryState::False)),
        )
        .await
        .unwrap();
    assert_eq!(names(&hidden.records), vec!["Red Mug", "Green Hoodie"]);
}

#[tokio::test]
async fn test_empty_relation_filter_is_same_as_no_filter() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let page = products()
        .list(&store, &ListRequest::new().filter("brand", FilterValue::Relation(vec![])))
        .await
        .unwrap();
    assert_eq!(page.total, 4);
}

#[tokio::test]
async fn test_relation_filter_restricts_to_matching_brand() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let page = products()
        .list(
            &store,
            &ListRequest::new().filter("brand", FilterValue::Relation(vec![shop.acme.id.clone()])),
        )
        .await
        .unwrap();
    assert_eq!(names(&page.records), vec!["Red T-Shirt", "Blue Mug"]);
}

#[tokio::test]
async fn test_relation_filter_on_many_association() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let page = products()
        .list(
            &store,
            &ListRequest::new()
                .filter("categories", FilterValue::Relation(vec![shop.shirts.id.clone()])),
        )
        .await
        .unwrap();
    assert_eq!(names(&page.records), vec!["Red T-Shirt", "Green Hoodie"]);
}

#[tokio::test]
async fn test_relation_filter_matches_any_of_several_ids() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;
    seed_edge_products(&store, &shop).await;
    let products = products();

    let both_brands = products
        .list(
            &store,
            &ListRequest::new().filter(
                "brand",
                FilterValue::Relation(vec![shop.acme.id.clone(), shop.globex.id.clone()]),
            ),
        )
        .await
        .unwrap();
    assert_eq!(both_brands.total, 5);
    assert!(!names(&both_brands.records).contains(&"Loose Item".to_string()));

    let both_categories = products
        .list(
            &store,
            &ListRequest::new().filter(
                "categories",
                FilterValue::Relation(vec![shop.shirts.id.clone(), shop.mugs.id.clone()]),
            ),
        )
        .await
        .unwrap();
    // Combo Pack is in both and appears once
    assert_eq!(
        names(&both_categories.records),
        vec!["Red T-Shirt", "Red Mug", "Blue Mug", "Green Hoodie", "Combo Pack"]
    );

    let mugs_or_unknown = products
        .list(
            &store,
            &ListRequest::new().filter(
                "categories",
                FilterValue::Relation(vec!["missing".to_string(), shop.mugs.id.clone()]),
            ),
        )
        .await
        .unwrap();
    assert_eq!(
        names(&mugs_or_unknown.records),
        vec!["Red Mug", "Blue Mug", "Combo Pack"]
    );
}

#[tokio::test]
async fn test_filters_combine() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let page = products()
        .list(
            &store,
            &ListRequest::new()
                .filter("brand", FilterValue::Relation(vec![shop.globex.id.clone()]))
                .filter("is_visible", FilterValue::Ternary(TernaryState::False)),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 2);
}

#[test]
fn test_unknown_filter_is_rejected() {
    let err = products()
        .build_list_query(
            &ListRequest::new().filter("colour", FilterValue::Relation(vec!["red".to_string()])),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "resource 'products' has no filter named 'colour'"
    );
    assert!(matches!(
        err,
        AdminError::Request(RequestError::UnknownFilter { .. })
    ));
}

#[test]
fn test_mismatched_filter_value_is_rejected() {
    let err = products()
        .build_list_query(
            &ListRequest::new().filter("brand", FilterValue::Ternary(TernaryState::True)),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AdminError::Schema(SchemaError::FilterValueMismatch { .. })
    ));
}

// ============================================================================
// Search, Sort and Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_table_search_is_case_insensitive() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let page = products()
        .list(&store, &ListRequest::new().search("MUG"))
        .await
        .unwrap();
    assert_eq!(names(&page.records), vec!["Red Mug", "Blue Mug"]);
}

#[tokio::test]
async fn test_table_search_follows_related_columns() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;
    seed_edge_products(&store, &shop).await;

    let query = products()
        .build_list_query(&ListRequest::new().search("globex"))
        .unwrap();
    assert_eq!(query.conditions.len(), 1);

    let page = products()
        .list(&store, &ListRequest::new().search("GLOBEX"))
        .await
        .unwrap();
    assert_eq!(names(&page.records), vec!["Red Mug", "Green Hoodie", "Combo Pack"]);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn test_sort_by_column() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let page = products()
        .list(
            &store,
            &ListRequest::new().sort("name", SortDirection::Ascending),
        )
        .await
        .unwrap();
    assert_eq!(
        names(&page.records),
        vec!["Blue Mug", "Green Hoodie", "Red Mug", "Red T-Shirt"]
    );
}

#[tokio::test]
async fn test_sort_by_related_column() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let page = products()
        .list(
            &store,
            &ListRequest::new().sort("brand.name", SortDirection::Descending),
        )
        .await
        .unwrap();
    // Globex first, ties keep insertion order
    assert_eq!(
        names(&page.records),
        vec!["Red Mug", "Green Hoodie", "Red T-Shirt", "Blue Mug"]
    );
}

#[tokio::test]
async fn test_unsortable_column_is_ignored() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let query = products()
        .build_list_query(&ListRequest::new().sort("published_at", SortDirection::Descending))
        .unwrap();
    assert!(query.sort.is_empty());

    let page = products()
        .list(&store, &ListRequest::new().sort("nope", SortDirection::Ascending))
        .await
        .unwrap();
    assert_eq!(names(&page.records)[0], "Red T-Shirt");
}

#[tokio::test]
async fn test_pagination() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let page = products()
        .list(&store, &ListRequest::new().page(2).per_page(3))
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.page, 2);
    assert_eq!(page.last_page(), 2);
    assert_eq!(names(&page.records), vec!["Green Hoodie"]);
}

#[tokio::test]
async fn test_page_far_beyond_the_end_is_empty() {
    let store = InMemoryStore::new();
    seed(&store).await;

    let request = ListRequest::new().page(u64::MAX).per_page(100);
    let query = products().build_list_query(&request).unwrap();
    assert_eq!(query.offset, Some(u64::MAX));

    let page = products().list(&store, &request).await.unwrap();
    assert!(page.records.is_empty());
    assert_eq!(page.total, 4);
    assert_eq!(page.page, u64::MAX);
}

#[test]
fn test_per_page_is_clamped() {
    let query = products()
        .build_list_query(&ListRequest::new().per_page(10_000))
        .unwrap();
    assert_eq!(query.limit, Some(100));

    let query = products()
        .build_list_query(&ListRequest::new().page(0).per_page(0))
        .unwrap();
    assert_eq!(query.limit, Some(1));
    assert_eq!(query.offset, Some(0));
}

// ============================================================================
// Row Projection Tests
// ============================================================================

#[tokio::test]
async fn test_table_rows_read_eager_loaded_columns() {
    let store = InMemoryStore::new();
    seed(&store).await;
    let products = products();

    let query = products.build_list_query(&ListRequest::new()).unwrap();
    assert!(query.includes_association("brand"));

    let records = store.execute(&query).await.unwrap();
    let rows = products.table_rows(&records);

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].get("name"), Some(&json!("Red T-Shirt")));
    assert_eq!(rows[0].get("brand.name"), Some(&json!("Acme")));
    assert_eq!(rows[1].get("brand.name"), Some(&json!("Globex")));
    assert_eq!(rows[1].get("is_visible"), Some(&json!(false)));
    assert_eq!(rows[0].get("sku"), None);
}
