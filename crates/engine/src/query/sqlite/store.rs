//! SQLite record store.

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::query::store::invalid_year;
use crate::query::value::{month_range, parse_datetime, timestamp};
use crate::query::{Op, Query, Record, RecordStore};

use super::schema;
use super::sql::{SqlFragment, SqlParam, SqlTranslator, UNICODE_LOWER};

fn internal_error(message: String) -> QueryError {
    QueryError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    }
}

fn serialization_error(message: String) -> QueryError {
    QueryError::Serialization { message }
}

/// Pool and connection settings for [`SqliteStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Connections kept by the pool. Forced to 1 for `:memory:`.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// How long a caller waits for a free connection.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// How long a statement waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Write-ahead logging for file databases.
    #[serde(default = "default_wal")]
    pub wal: bool,
}

fn default_pool_size() -> u32 {
    4
}

fn default_acquire_timeout_ms() -> u64 {
    10_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_wal() -> bool {
    true
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: default_wal(),
        }
    }
}

/// Per-connection setup run by the pool on every new connection.
fn prepare_connection(conn: &mut Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// A record store persisting JSON records in SQLite.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteStoreConfig,
    is_memory: bool,
}

impl Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Creates a new in-memory store with an initialized schema.
    ///
    /// The pool holds a single connection, since every `:memory:` connection
    /// opens a separate database.
    pub fn in_memory() -> QueryResult<Self> {
        let store = Self::with_config(":memory:", SqliteStoreConfig::default())?;
        store.init_schema()?;
        Ok(store)
    }

    /// Opens or creates a file database with an initialized schema.
    pub fn open<P: AsRef<Path>>(path: P) -> QueryResult<Self> {
        let store = Self::with_config(path, SqliteStoreConfig::default())?;
        store.init_schema()?;
        Ok(store)
    }

    /// Creates a store with custom configuration. The schema is not initialized.
    pub fn with_config<P: AsRef<Path>>(path: P, mut config: SqliteStoreConfig) -> QueryResult<Self> {
        let is_memory = path.as_ref().as_os_str() == ":memory:";
        if is_memory {
            config.pool_size = 1;
        }

        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let manager = if is_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path.as_ref())
        }
        .with_init(move |conn| prepare_connection(conn, busy_timeout));

        let mut builder = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_timeout(Duration::from_millis(config.acquire_timeout_ms));
        if is_memory {
            // a recycled connection would take the database with it
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder.build(manager)?;

        if config.wal && !is_memory {
            // journal_mode persists in the file; it returns the new mode as a row
            pool.get()?
                .query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
                .map_err(|e| internal_error(format!("Failed to enable WAL mode: {}", e)))?;
        }

        debug!(pool_size = config.pool_size, is_memory, "Opened SQLite pool");

        Ok(Self {
            pool,
            config,
            is_memory,
        })
    }

    /// Initialize the database schema.
    pub fn init_schema(&self) -> QueryResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn)
    }

    /// Get a connection from the pool.
    pub(crate) fn get_connection(&self) -> QueryResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    pub fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Runs a SELECT over `records` and decodes the rows.
    fn select_records(&self, conn: &Connection, frag: &SqlFragment) -> QueryResult<Vec<Record>> {
        let mut stmt = conn
            .prepare(&frag.sql)
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;

        let params = frag.bound_params();
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| internal_error(format!("Failed to execute query: {}", e)))?;

        let raw_rows = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read row: {}", e)))?;

        raw_rows
            .into_iter()
            .map(|(entity, id, fields, created_at, updated_at)| {
                decode_record(entity, id, &fields, &created_at, &updated_at)
            })
            .collect()
    }

    fn fetch_by_ids(&self, conn: &Connection, entity: &str, ids: &[String]) -> QueryResult<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::select(entity).filter_in("id", ids.iter().cloned());
        let translator = SqlTranslator::default();
        let mut frag = translator.where_clause(&query);
        frag.sql = format!(
            "SELECT entity, id, fields, created_at, updated_at FROM records WHERE {}",
            frag.sql
        );
        self.select_records(conn, &frag)
    }
}

fn parse_timestamp(value: &str) -> QueryResult<DateTime<Utc>> {
    parse_datetime(value).ok_or_else(|| internal_error(format!("Failed to parse timestamp '{}'", value)))
}

fn decode_record(
    entity: String,
    id: String,
    fields: &str,
    created_at: &str,
    updated_at: &str,
) -> QueryResult<Record> {
    let fields: Map<String, Value> = serde_json::from_str(fields)
        .map_err(|e| serialization_error(format!("Failed to deserialize record fields: {}", e)))?;

    let mut record = Record::new(entity, id, fields, parse_timestamp(created_at)?);
    record.updated_at = parse_timestamp(updated_at)?;
    Ok(record)
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn execute(&self, query: &Query) -> QueryResult<Vec<Record>> {
        let conn = self.get_connection()?;
        let translator = SqlTranslator::default();

        let mut frag = translator.where_clause(query);
        let order_by = translator.order_by(&mut frag, query);
        frag.sql = format!(
            "SELECT records.entity, records.id, records.fields, records.created_at, records.updated_at
             FROM records WHERE {} {} {}",
            frag.sql,
            order_by,
            translator.limit(query)
        );

        let mut records = self.select_records(&conn, &frag)?;

        for association in &query.includes {
            let keys = association.collect_keys(&records);
            let related = self.fetch_by_ids(&conn, &association.target_entity, &keys)?;
            association.attach(&mut records, &related);
        }

        debug!(
            entity = %query.entity,
            returned = records.len(),
            includes = query.includes.len(),
            "Executed SQLite query"
        );

        Ok(records)
    }

    async fn count(&self, query: &Query) -> QueryResult<u64> {
        let conn = self.get_connection()?;
        let mut frag = SqlTranslator::default().where_clause(query);
        frag.sql = format!("SELECT COUNT(*) FROM records WHERE {}", frag.sql);

        let params = frag.bound_params();
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&frag.sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| internal_error(format!("Failed to count records: {}", e)))?;

        Ok(count as u64)
    }

    /// Counts all months with one grouped query.
    async fn count_by_month(&self, query: &Query, field: &str, year: i32) -> QueryResult<[u64; 12]> {
        let (start, _) = month_range(year, 1).ok_or_else(|| invalid_year(year))?;
        let (_, end) = month_range(year, 12).ok_or_else(|| invalid_year(year))?;

        let bounded = query
            .unpaginated()
            .filter(field, Op::Gte, timestamp(&start))
            .filter(field, Op::Lt, timestamp(&end));

        let conn = self.get_connection()?;
        let translator = SqlTranslator::default();
        let mut frag = translator.where_clause(&bounded);
        let month_expr = translator.field_expr(&mut frag, field);
        frag.sql = format!(
            "SELECT CAST(strftime('%m', {month_expr}) AS INTEGER) AS month, COUNT(*)
             FROM records WHERE {} GROUP BY month",
            frag.sql
        );

        let mut stmt = conn
            .prepare(&frag.sql)
            .map_err(|e| internal_error(format!("Failed to prepare monthly count: {}", e)))?;
        let params = frag.bound_params();
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| internal_error(format!("Failed to execute monthly count: {}", e)))?;

        let mut counts = [0u64; 12];
        for row in rows {
            let (month, count) =
                row.map_err(|e| internal_error(format!("Failed to read row: {}", e)))?;
            if let Some(month @ 1..=12) = month {
                counts[(month - 1) as usize] = count as u64;
            }
        }

        Ok(counts)
    }

    async fn get(&self, entity: &str, id: &str) -> QueryResult<Option<Record>> {
        let conn = self.get_connection()?;
        let mut records = self.fetch_by_ids(&conn, entity, &[id.to_string()])?;
        Ok(records.pop())
    }

    async fn insert(
        &self,
        entity: &str,
        fields: Map<String, Value>,
        created_at: DateTime<Utc>,
    ) -> QueryResult<Record> {
        let conn = self.get_connection()?;
        let id = uuid::Uuid::new_v4().to_string();
        let data = serde_json::to_string(&fields)
            .map_err(|e| serialization_error(format!("Failed to serialize record fields: {}", e)))?;
        let created = timestamp(&created_at);

        conn.execute(
            "INSERT INTO records (entity, id, fields, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![entity, id, data, created],
        )
        .map_err(|e| internal_error(format!("Failed to insert record: {}", e)))?;

        debug!(entity, id = %id, "Inserted record");

        Ok(Record::new(entity, id, fields, created_at))
    }

    async fn update(
        &self,
        entity: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> QueryResult<Record> {
        let conn = self.get_connection()?;
        let data = serde_json::to_string(&fields)
            .map_err(|e| serialization_error(format!("Failed to serialize record fields: {}", e)))?;
        let now = timestamp(&Utc::now());

        let changed = conn
            .execute(
                "UPDATE records SET fields = ?1, updated_at = ?2 WHERE entity = ?3 AND id = ?4",
                params![data, now, entity, id],
            )
            .map_err(|e| internal_error(format!("Failed to update record: {}", e)))?;

        if changed == 0 {
            return Err(QueryError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            });
        }

        self.fetch_by_ids(&conn, entity, &[id.to_string()])?
            .pop()
            .ok_or_else(|| QueryError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            })
    }

    async fn delete(&self, entity: &str, ids: &[String]) -> QueryResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.get_connection()?;
        let mut frag = SqlFragment::default();
        let entity_param = frag.add_param(SqlParam::string(entity));
        let placeholders: Vec<String> = ids
            .iter()
            .map(|id| frag.add_param(SqlParam::string(id)))
            .collect();
        frag.sql = format!(
            "DELETE FROM records WHERE entity = {} AND id IN ({})",
            entity_param,
            placeholders.join(", ")
        );

        let params = frag.bound_params();
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let removed = conn
            .execute(&frag.sql, param_refs.as_slice())
            .map_err(|e| internal_error(format!("Failed to delete records: {}", e)))?;

        debug!(entity, removed, "Deleted records");
        Ok(removed as u64)
    }
}
