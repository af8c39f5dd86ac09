use shopdesk_engine::AdminConfig;
use shopdesk_engine::error::SchemaError;
use shopdesk_engine::resource::{Navigation, ResourceDefinition};
use shopdesk_engine::schema::{FieldDescriptor, FilterSpec, TableColumn};

use super::{BRANDS, SHOP_GROUP};

pub fn brand_resource(config: &AdminConfig) -> Result<ResourceDefinition, SchemaError> {
    ResourceDefinition::builder(BRANDS, BRANDS)
        .labels("Brand", "Brands")
        .navigation(Navigation {
            label: "Brands".to_string(),
            icon: Some("heroicon-o-tag".to_string()),
            group: Some(SHOP_GROUP.to_string()),
            sort: 1,
        })
        .config(config)
        .field(FieldDescriptor::text("name").required().unique())
        .field(
            FieldDescriptor::text("slug")
                .slug_of("name")
                .disabled()
                .required()
                .unique(),
        )
        .field(FieldDescriptor::text("url").label("Website URL"))
        .field(
            FieldDescriptor::boolean("is_visible")
                .label("Visibility")
                .helper_text("Enable or disable brand visibility")
                .default_value(true),
        )
        .field(FieldDescriptor::markdown("description"))
        .column(TableColumn::text("name").searchable().sortable())
        .column(TableColumn::text("url").label("Website URL").searchable().toggleable())
        .column(TableColumn::boolean("is_visible").label("Visibility").sortable())
        .column(TableColumn::date("updated_at").label("Updated Date").sortable())
        .filter(FilterSpec::ternary("is_visible").label("Visibility"))
        .globally_searchable("name", ["name", "slug"])
        .build()
}
