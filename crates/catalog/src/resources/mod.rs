//! Resource definitions of the shop.

mod brand;
mod category;
mod product;

pub use brand::brand_resource;
pub use category::category_resource;
pub use product::{IMAGE_DIRECTORY, PRICE_PATTERN, product_resource};

use shopdesk_engine::AdminConfig;
use shopdesk_engine::error::SchemaError;
use shopdesk_engine::resource::ResourceRegistry;

pub const PRODUCTS: &str = "products";
pub const BRANDS: &str = "brands";
pub const CATEGORIES: &str = "categories";
pub const CUSTOMERS: &str = "customers";
pub const ORDERS: &str = "orders";

/// Navigation group of every catalog resource.
pub const SHOP_GROUP: &str = "Shop";

/// Builds the registry of catalog resources. Products are searched first.
pub fn registry(config: &AdminConfig) -> Result<ResourceRegistry, SchemaError> {
    Ok(ResourceRegistry::builder()
        .register(product_resource(config)?)?
        .register(brand_resource(config)?)?
        .register(category_resource(config)?)?
        .build())
}
