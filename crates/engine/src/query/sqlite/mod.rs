//! SQLite record store.
//!
//! Records of every entity share one `records` table with a JSON `fields`
//! column. Queries are translated to SQL by [`SqlTranslator`]; eager-loads
//! run one extra `IN (...)` query per association.

mod schema;
mod sql;
mod store;

pub use schema::{SCHEMA_VERSION, initialize_schema};
pub use sql::{SqlFragment, SqlParam, SqlTranslator};
pub use store::{SqliteStore, SqliteStoreConfig};
