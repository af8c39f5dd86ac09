//! Form integration tests: validation, derivation, create, update, delete and
//! relation options.

mod common;

use chrono::Utc;
use serde_json::json;

use common::*;
use shopdesk_engine::error::{AdminError, QueryError, ViolationKind};
use shopdesk_engine::query::{InMemoryStore, Query, RecordStore};
use shopdesk_engine::resource::FormOperation;

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_two_missing_required_fields_yield_two_violations() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let mut payload = product_payload("Yellow Cap", "CAP-YEL", &shop.acme, &shop.shirts);
    payload.remove("sku");
    payload.remove("price");

    let err = products()
        .validate_record(&store, &payload, FormOperation::Create)
        .await
        .unwrap_err();
    let errors = err.as_validation().expect("validation failure");

    assert_eq!(errors.len(), 2);
    assert!(errors.has("sku"));
    assert!(errors.has("price"));
    assert!(errors
        .violations()
        .iter()
        .all(|v| v.kind == ViolationKind::Required));
    assert_eq!(
        errors.for_field("sku").next().unwrap().message,
        "The SKU (Stock Keeping Unit) field is required."
    );
}

#[tokio::test]
async fn test_invalid_payload_is_not_persisted() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;
    let before = store.len();

    let mut payload = product_payload("Yellow Cap", "CAP-YEL", &shop.acme, &shop.shirts);
    payload.insert("quantity".to_string(), json!(250));

    let err = products().create(&store, &payload).await.unwrap_err();
    let errors = err.as_validation().unwrap();
    assert_eq!(
        errors.for_field("quantity").next().unwrap().kind,
        ViolationKind::Max { max: 100.0 }
    );
    assert_eq!(store.len(), before);
}

#[tokio::test]
async fn test_constraint_violations_accumulate() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let mut payload = product_payload("Red T-Shirt", "TS-RED", &shop.acme, &shop.shirts);
    payload.insert("price".to_string(), json!("12.345"));
    payload.insert("quantity".to_string(), json!("lots"));
    payload.insert("type".to_string(), json!("subscription"));
    payload.insert("brand_id".to_string(), json!("no-such-brand"));

    let err = products()
        .validate_record(&store, &payload, FormOperation::Create)
        .await
        .unwrap_err();
    let errors = err.as_validation().unwrap();

    let kind = |field: &str| errors.for_field(field).next().map(|v| v.kind.clone());
    assert_eq!(kind("name"), Some(ViolationKind::Unique));
    assert_eq!(kind("slug"), Some(ViolationKind::Unique));
    assert_eq!(kind("sku"), Some(ViolationKind::Unique));
    assert!(matches!(kind("price"), Some(ViolationKind::Pattern { .. })));
    assert_eq!(kind("quantity"), Some(ViolationKind::Numeric));
    assert_eq!(kind("type"), Some(ViolationKind::NotAnOption));
    assert_eq!(
        kind("brand_id"),
        Some(ViolationKind::UnknownReference {
            ids: vec!["no-such-brand".to_string()]
        })
    );
    assert_eq!(errors.len(), 7);
}

#[tokio::test]
async fn test_defaults_and_normalization_on_create() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let payload = product_payload("Yellow Cap", "CAP-YEL", &shop.acme, &shop.shirts);
    let validated = products()
        .validate_record(&store, &payload, FormOperation::Create)
        .await
        .unwrap();

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(validated.fields["is_visible"], json!(true));
    assert_eq!(validated.fields["published_at"], json!(today));
    assert_eq!(validated.fields["price"], json!(12.5));
    assert_eq!(validated.fields["slug"], json!("yellow-cap"));
}

#[tokio::test]
async fn test_unknown_payload_keys_are_dropped() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let mut payload = product_payload("Yellow Cap", "CAP-YEL", &shop.acme, &shop.shirts);
    payload.insert("is_admin".to_string(), json!(true));

    let record = products().create(&store, &payload).await.unwrap();
    assert!(!record.fields.contains_key("is_admin"));
}

// ============================================================================
// Derivation Tests
// ============================================================================

#[tokio::test]
async fn test_slug_derived_on_create_and_kept_on_edit() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;
    let products = products();

    assert_eq!(
        products.field_updated(FormOperation::Create, "name", &json!("Red T-Shirt!!"))["slug"],
        json!("red-t-shirt")
    );

    // free the fixture's "red-t-shirt" slug
    store
        .delete("products", &[shop.products[0].id.clone()])
        .await
        .unwrap();
    let payload = product_payload("Red T-Shirt!!", "TS-RED-2", &shop.globex, &shop.shirts);
    let created = products.create(&store, &payload).await.unwrap();
    assert_eq!(created.attribute("slug"), json!("red-t-shirt"));

    let edit = fields(json!({"name": "Crimson T-Shirt"}));
    assert!(products
        .field_updated(FormOperation::Edit(&created.id), "name", &json!("Crimson T-Shirt"))
        .is_empty());
    let updated = products.update(&store, &created.id, &edit).await.unwrap();

    assert_eq!(updated.attribute("name"), json!("Crimson T-Shirt"));
    assert_eq!(updated.attribute("slug"), json!("red-t-shirt"));
}

#[tokio::test]
async fn test_update_ignores_own_unique_values() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;
    let blue_mug = &shop.products[2];

    let updated = products()
        .update(&store, &blue_mug.id, &fields(json!({"quantity": 12})))
        .await
        .unwrap();
    assert_eq!(updated.attribute("quantity"), json!(12));
    assert_eq!(updated.attribute("sku"), json!("MUG-BLUE"));

    let err = products()
        .update(&store, &blue_mug.id, &fields(json!({"sku": "MUG-RED"})))
        .await
        .unwrap_err();
    assert_eq!(
        err.as_validation().unwrap().for_field("sku").next().unwrap().kind,
        ViolationKind::Unique
    );
}

#[tokio::test]
async fn test_update_missing_record() {
    let store = InMemoryStore::new();
    let err = brands()
        .update(&store, "missing", &fields(json!({"name": "Initech"})))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Query(QueryError::NotFound { .. })));
}

// ============================================================================
// Record Action Tests
// ============================================================================

#[tokio::test]
async fn test_find_eager_loads_column_associations() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;

    let record = products()
        .find(&store, &shop.products[1].id)
        .await
        .unwrap()
        .expect("record exists");
    assert_eq!(record.related_values("brand", "name"), vec![json!("Globex")]);

    assert!(products().find(&store, "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_bulk_delete_and_badge() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;
    let products = products();

    assert_eq!(products.navigation_badge(&store).await.unwrap(), "4");

    let ids = vec![shop.products[0].id.clone(), shop.products[1].id.clone()];
    assert_eq!(products.delete(&store, &ids).await.unwrap(), 2);
    assert_eq!(products.navigation_badge(&store).await.unwrap(), "2");
    assert_eq!(store.count(&Query::select("brands")).await.unwrap(), 2);
}

#[tokio::test]
async fn test_relation_options_are_ordered_by_label() {
    let store = InMemoryStore::new();
    let shop = seed(&store).await;
    let products = products();

    let options = products.relation_options(&store, "categories").await.unwrap();
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Mugs", "Shirts"]);
    assert_eq!(options[0].id, shop.mugs.id);

    let brand_options = products.relation_options(&store, "brand").await.unwrap();
    assert_eq!(brand_options[0].label, "Acme");

    assert!(products.relation_options(&store, "price").await.is_err());
}
