//! Shopdesk admin engine
//!
//! This crate provides the declarative core of the Shopdesk back-office:
//! resources assembled from typed field schemas, list queries narrowed by
//! structured filters, global search across resources, and per-month
//! statistics for dashboard widgets. Persistence is reached through the
//! [`RecordStore`](query::RecordStore) trait.
//!
//! # Features
//!
//! - `sqlite` (default) - [`SqliteStore`](query::sqlite::SqliteStore), an r2d2-pooled SQLite backend
//!
//! An in-memory store is always available.
//!
//! # Architecture
//!
//! - [`schema`] - Field, column and filter descriptors
//! - [`query`] - The query value, the store trait and its backends
//! - [`resource`] - Resource definitions, forms, lists and the registry
//! - [`filter`] - Applies ternary and relation filter values to queries
//! - [`search`] - Global search over the registry
//! - [`stats`] - Counts, monthly buckets and dashboard widgets
//! - [`config`] - Engine configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use shopdesk_engine::query::{InMemoryStore, Query, RecordStore};
//! use shopdesk_engine::resource::ResourceDefinition;
//! use shopdesk_engine::schema::FieldDescriptor;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let brands = ResourceDefinition::builder("brands", "brands")
//!     .field(FieldDescriptor::text("name").required())
//!     .field(FieldDescriptor::text("slug").slug_of("name"))
//!     .build()
//!     .unwrap();
//!
//! let store = InMemoryStore::new();
//! let payload = json!({"name": "Acme Tools"}).as_object().cloned().unwrap();
//! let record = brands.create(&store, &payload).await.unwrap();
//!
//! assert_eq!(record.attribute("slug"), json!("acme-tools"));
//! assert_eq!(store.count(&Query::select("brands")).await.unwrap(), 1);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod query;
pub mod resource;
pub mod schema;
pub mod search;
pub mod stats;

pub use config::AdminConfig;
pub use error::{AdminError, AdminResult, QueryError, RequestError, SchemaError, ValidationErrors};
pub use query::{InMemoryStore, Query, Record, RecordStore};
pub use resource::{ResourceDefinition, ResourceRegistry};
pub use search::{GlobalSearch, SearchResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
