use shopdesk_engine::AdminConfig;
use shopdesk_engine::error::SchemaError;
use shopdesk_engine::query::Association;
use shopdesk_engine::resource::{Navigation, ResourceDefinition};
use shopdesk_engine::schema::{FieldDescriptor, FilterSpec, TableColumn};

use super::{BRANDS, CATEGORIES, PRODUCTS, SHOP_GROUP};
use crate::enums::ProductType;

/// Upload directory of product images.
pub const IMAGE_DIRECTORY: &str = "form-attachments";

/// Up to six integer digits and two decimals.
pub const PRICE_PATTERN: &str = r"^\d{1,6}(\.\d{0,2})?$";

pub fn product_resource(config: &AdminConfig) -> Result<ResourceDefinition, SchemaError> {
    let types = [ProductType::Downloadable, ProductType::Deliverable]
        .map(|kind| (kind.as_str(), kind.label()));

    ResourceDefinition::builder(PRODUCTS, PRODUCTS)
        .labels("Product", "Products")
        .navigation(Navigation {
            label: "Products".to_string(),
            icon: Some("heroicon-o-rectangle-stack".to_string()),
            group: Some(SHOP_GROUP.to_string()),
            sort: 0,
        })
        .config(config)
        .association(Association::belongs_to("brand", BRANDS, "brand_id"))
        .association(Association::belongs_to_many("categories", CATEGORIES, "categories"))
        // main section
        .field(FieldDescriptor::text("name").required().unique())
        .field(
            FieldDescriptor::text("slug")
                .slug_of("name")
                .disabled()
                .dehydrated(true)
                .required()
                .unique(),
        )
        .field(FieldDescriptor::markdown("description"))
        .field(
            FieldDescriptor::text("sku")
                .label("SKU (Stock Keeping Unit)")
                .section("Pricing & Inventory")
                .unique()
                .required(),
        )
        .field(
            FieldDescriptor::number("price")
                .section("Pricing & Inventory")
                .pattern(PRICE_PATTERN)
                .required(),
        )
        .field(
            FieldDescriptor::number("quantity")
                .section("Pricing & Inventory")
                .min(0.0)
                .max(100.0)
                .required(),
        )
        .field(
            FieldDescriptor::select("type", types)
                .section("Pricing & Inventory")
                .required(),
        )
        .field(
            FieldDescriptor::boolean("is_visible")
                .label("Visibility")
                .helper_text("Enable or disable product visibility")
                .section("Status")
                .default_value(true),
        )
        .field(
            FieldDescriptor::boolean("is_featured")
                .label("Featured")
                .helper_text("Enable or disable products featured status")
                .section("Status"),
        )
        .field(
            FieldDescriptor::date("published_at")
                .label("Availability")
                .section("Status")
                .default_today(),
        )
        .field(
            FieldDescriptor::image("image", IMAGE_DIRECTORY)
                .preserve_filenames()
                .section("Image"),
        )
        .field(
            FieldDescriptor::belongs_to("brand_id", "brand", "name")
                .label("Brand")
                .section("Association")
                .required(),
        )
        .field(
            FieldDescriptor::belongs_to_many("categories", "categories", "name")
                .section("Association")
                .required(),
        )
        .column(TableColumn::image("image"))
        .column(TableColumn::text("name").searchable().sortable())
        .column(
            TableColumn::text("brand.name")
                .label("Brand")
                .searchable()
                .sortable()
                .toggleable(),
        )
        .column(
            TableColumn::boolean("is_visible")
                .label("Visibility")
                .sortable()
                .toggleable(),
        )
        .column(TableColumn::text("price").searchable().sortable().toggleable())
        .column(TableColumn::text("quantity").searchable().sortable().toggleable())
        .column(TableColumn::date("published_at").label("Availability").sortable())
        .column(TableColumn::text("type"))
        .filter(
            FilterSpec::ternary("is_visible")
                .label("Visibility")
                .state_labels("Only Visible Products", "Only Hidden Products"),
        )
        .filter(FilterSpec::relation("brand", "name"))
        .globally_searchable("name", ["name", "slug", "description"])
        .search_include("brand")
        .search_detail("Brand", "brand.name")
        .build()
}
