//! Shopdesk catalog
//!
//! The concrete back-office of the shop, declared on top of
//! [`shopdesk_engine`]: product, brand and category resources grouped under
//! the `Shop` navigation group, and the dashboard widgets.
//!
//! # Example
//!
//! ```
//! use shopdesk_catalog::resources::{self, PRODUCTS};
//! use shopdesk_engine::AdminConfig;
//!
//! let registry = resources::registry(&AdminConfig::default()).unwrap();
//! let products = registry.get(PRODUCTS).unwrap();
//! assert_eq!(products.edit_url("42"), "/products/42/edit");
//! ```

pub mod enums;
pub mod resources;
pub mod widgets;

pub use enums::{OrderStatus, ProductType, UnknownVariant};
pub use resources::registry;
pub use widgets::dashboard;
