//! SQLite schema definitions and migrations.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{QueryError, QueryResult};

/// Current schema version, kept in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// Migration scripts. Entry `n` upgrades a database at version `n` to `n + 1`.
///
/// All entities share the `records` table. `seq` preserves insertion order;
/// timestamps are stored in canonical RFC 3339 form so text comparison is
/// chronological.
const MIGRATIONS: [&str; SCHEMA_VERSION as usize] = ["
    CREATE TABLE IF NOT EXISTS records (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        entity TEXT NOT NULL,
        id TEXT NOT NULL,
        fields TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (entity, id)
    );

    CREATE INDEX IF NOT EXISTS idx_records_entity_created
        ON records (entity, created_at);
"];

fn internal_error(context: &'static str) -> impl Fn(rusqlite::Error) -> QueryError {
    move |e| QueryError::Internal {
        backend_name: "sqlite".to_string(),
        message: format!("{context}: {e}"),
        source: None,
    }
}

fn user_version(conn: &Connection) -> QueryResult<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(internal_error("Failed to read user_version"))
}

/// Brings the schema up to [`SCHEMA_VERSION`], applying pending migrations in
/// one transaction. A database from a newer release is rejected.
pub fn initialize_schema(conn: &Connection) -> QueryResult<()> {
    let found = user_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(QueryError::Internal {
            backend_name: "sqlite".to_string(),
            message: format!(
                "database schema version {found} is newer than supported version {SCHEMA_VERSION}"
            ),
            source: None,
        });
    }
    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(internal_error("Failed to begin migration"))?;
    let pending = MIGRATIONS.iter().enumerate().skip(usize::try_from(found).unwrap_or(0));
    for (from, script) in pending {
        tx.execute_batch(script)
            .map_err(internal_error("Failed to apply migration"))?;
        debug!(version = from + 1, "Applied schema migration");
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(internal_error("Failed to write user_version"))?;
    tx.commit()
        .map_err(internal_error("Failed to commit migration"))?;

    info!(from = found, to = SCHEMA_VERSION, "Migrated record store schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        assert_eq!(user_version(&conn).unwrap(), SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'records'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_schema_lives_in_user_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(user_version(&conn).unwrap(), 0);
        initialize_schema(&conn).unwrap();

        let extra_tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT IN ('records', 'sqlite_sequence')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(extra_tables, 0);
    }
}
