//! Shared fixtures for the engine integration tests.
//!
//! A small shop: brands, categories and products that reference both.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value, json};

use shopdesk_engine::query::{Association, Record, RecordStore};
use shopdesk_engine::resource::{ResourceDefinition, ResourceRegistry};
use shopdesk_engine::schema::{FieldDescriptor, FilterSpec, TableColumn};

pub fn fields(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("fixture must be a JSON object")
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn brands() -> ResourceDefinition {
    ResourceDefinition::builder("brands", "brands")
        .labels("Brand", "Brands")
        .field(FieldDescriptor::text("name").required().unique())
        .field(
            FieldDescriptor::text("slug")
                .slug_of("name")
                .disabled()
                .required()
                .unique(),
        )
        .field(FieldDescriptor::boolean("is_visible").default_value(true))
        .column(TableColumn::text("name").searchable().sortable())
        .column(TableColumn::boolean("is_visible"))
        .globally_searchable("name", ["name", "slug"])
        .build()
        .expect("brands definition")
}

pub fn categories() -> ResourceDefinition {
    ResourceDefinition::builder("categories", "categories")
        .labels("Category", "Categories")
        .field(FieldDescriptor::text("name").required().unique())
        .field(FieldDescriptor::text("slug").slug_of("name").disabled())
        .column(TableColumn::text("name").searchable())
        .globally_searchable("name", ["name"])
        .build()
        .expect("categories definition")
}

pub fn products() -> ResourceDefinition {
    ResourceDefinition::builder("products", "products")
        .labels("Product", "Products")
        .association(Association::belongs_to("brand", "brands", "brand_id"))
        .association(Association::belongs_to_many(
            "categories",
            "categories",
            "categories",
        ))
        .field(FieldDescriptor::text("name").required().unique())
        .field(
            FieldDescriptor::text("slug")
                .slug_of("name")
                .disabled()
                .required()
                .unique(),
        )
        .field(FieldDescriptor::markdown("description"))
        .field(
            FieldDescriptor::text("sku")
                .label("SKU (Stock Keeping Unit)")
                .required()
                .unique(),
        )
        .field(
            FieldDescriptor::number("price")
                .pattern(r"^\d{1,6}(\.\d{0,2})?$")
                .required(),
        )
        .field(
            FieldDescriptor::number("quantity")
                .min(0.0)
                .max(100.0)
                .required(),
        )
        .field(
            FieldDescriptor::select(
                "type",
                [("downloadable", "Downloadable"), ("deliverable", "Deliverable")],
            )
            .required(),
        )
        .field(
            FieldDescriptor::boolean("is_visible")
                .label("Visibility")
                .default_value(true),
        )
        .field(FieldDescriptor::date("published_at").default_today())
        .field(FieldDescriptor::belongs_to("brand_id", "brand", "name").required())
        .field(FieldDescriptor::belongs_to_many("categories", "categories", "name").required())
        .column(TableColumn::text("name").searchable().sortable())
        .column(TableColumn::text("brand.name").searchable().sortable())
        .column(TableColumn::boolean("is_visible").label("Visibility"))
        .column(TableColumn::text("price").searchable().sortable())
        .column(TableColumn::text("quantity").sortable())
        .column(TableColumn::date("published_at"))
        .filter(
            FilterSpec::ternary("is_visible")
                .label("Visibility")
                .state_labels("Only Visible Products", "Only Hidden Products"),
        )
        .filter(FilterSpec::relation("brand", "name"))
        .filter(FilterSpec::relation("categories", "name"))
        .globally_searchable("name", ["name", "slug", "description"])
        .search_include("brand")
        .search_detail("Brand", "brand.name")
        .build()
        .expect("products definition")
}

pub fn registry() -> Arc<ResourceRegistry> {
    Arc::new(
        ResourceRegistry::builder()
            .register(products())
            .and_then(|b| b.register(brands()))
            .and_then(|b| b.register(categories()))
            .expect("registry")
            .build(),
    )
}

/// Records inserted by [`seed`].
pub struct Shop {
    pub acme: Record,
    pub globex: Record,
    pub shirts: Record,
    pub mugs: Record,
    /// Red T-Shirt, Red Mug, Blue Mug, Green Hoodie in insertion order.
    pub products: Vec<Record>,
}

async fn insert(store: &dyn RecordStore, entity: &str, value: Value, created: DateTime<Utc>) -> Record {
    store
        .insert(entity, fields(value), created)
        .await
        .expect("seed insert")
}

/// Seeds two brands, two categories and four products created across 2024.
pub async fn seed(store: &dyn RecordStore) -> Shop {
    let acme = insert(store, "brands", json!({"name": "Acme", "slug": "acme", "is_visible": true}), at(2024, 1, 2)).await;
    let globex = insert(store, "brands", json!({"name": "Globex", "slug": "globex", "is_visible": true}), at(2024, 1, 3)).await;
    let shirts = insert(store, "categories", json!({"name": "Shirts", "slug": "shirts"}), at(2024, 1, 4)).await;
    let mugs = insert(store, "categories", json!({"name": "Mugs", "slug": "mugs"}), at(2024, 1, 5)).await;

    let rows = [
        ("Red T-Shirt", "red-t-shirt", "TS-RED", 19.99, 10, true, &acme, &shirts, at(2024, 2, 10)),
        ("Red Mug", "red-mug", "MUG-RED", 7.5, 40, false, &globex, &mugs, at(2024, 2, 20)),
        ("Blue Mug", "blue-mug", "MUG-BLUE", 7.5, 0, true, &acme, &mugs, at(2024, 5, 1)),
        ("Green Hoodie", "green-hoodie", "HD-GRN", 39.0, 5, false, &globex, &shirts, at(2024, 11, 30)),
    ];

    let mut products = Vec::new();
    for (name, slug, sku, price, quantity, visible, brand, category, created) in rows {
        products.push(
            insert(
                store,
                "products",
                json!({
                    "name": name,
                    "slug": slug,
                    "sku": sku,
                    "price": price,
                    "quantity": quantity,
                    "type": "deliverable",
                    "is_visible": visible,
                    "published_at": "2024-01-01",
                    "brand_id": brand.id,
                    "categories": [category.id],
                }),
                created,
            )
            .await,
        );
    }

    Shop {
        acme,
        globex,
        shirts,
        mugs,
        products,
    }
}

/// Adds "Combo Pack" (Globex, in both categories) and "Loose Item" (no brand,
/// no categories) after the seeded products.
pub async fn seed_edge_products(store: &dyn RecordStore, shop: &Shop) {
    insert(
        store,
        "products",
        json!({
            "name": "Combo Pack",
            "price": 25.0,
            "quantity": 2,
            "is_visible": true,
            "brand_id": shop.globex.id,
            "categories": [shop.mugs.id, shop.shirts.id],
        }),
        at(2024, 12, 1),
    )
    .await;
    insert(
        store,
        "products",
        json!({"name": "Loose Item", "price": 1.0, "quantity": 1, "is_visible": true}),
        at(2024, 12, 2),
    )
    .await;
}

/// A complete, valid product payload for the given brand and category.
pub fn product_payload(name: &str, sku: &str, brand: &Record, category: &Record) -> Map<String, Value> {
    fields(json!({
        "name": name,
        "sku": sku,
        "price": "12.50",
        "quantity": 3,
        "type": "downloadable",
        "brand_id": brand.id,
        "categories": [category.id],
    }))
}

pub fn names(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.attribute_text("name")).collect()
}
