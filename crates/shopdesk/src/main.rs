//! Shopdesk console
//!
//! Opens the shop database and prints the dashboard, global search results,
//! resource lists or newly created records as JSON.

mod config;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use clap::Parser;
use serde_json::Value;
use shopdesk_catalog::dashboard;
use shopdesk_engine::filter::FilterValue;
use shopdesk_engine::query::SortDirection;
use shopdesk_engine::query::sqlite::SqliteStore;
use shopdesk_engine::resource::ListRequest;
use shopdesk_engine::stats::{Clock, FixedClock, SystemClock};
use shopdesk_engine::{AdminConfig, AdminError, GlobalSearch, ResourceDefinition};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{Command, ListArgs, ShopdeskConfig};

/// Installs the log subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "shopdesk={level},shopdesk_engine={level},shopdesk_catalog={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Opens the configured SQLite database with an initialized schema.
fn create_store(config: &ShopdeskConfig) -> anyhow::Result<SqliteStore> {
    info!(database = %config.database, "Opening SQLite store");
    let store = if config.is_memory() {
        SqliteStore::in_memory()?
    } else {
        SqliteStore::open(&config.database)?
    };
    Ok(store)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn list_request(definition: &ResourceDefinition, args: &ListArgs) -> anyhow::Result<ListRequest> {
    let mut request = ListRequest::new().page(args.page);
    if let Some(per_page) = args.per_page {
        request = request.per_page(per_page);
    }
    if let Some(term) = &args.search {
        request = request.search(term.as_str());
    }
    if let Some(sort) = &args.sort {
        request = match sort.strip_prefix('-') {
            Some(column) => request.sort(column, SortDirection::Descending),
            None => request.sort(sort.as_str(), SortDirection::Ascending),
        };
    }
    for (name, raw) in &args.filters {
        let spec = definition.request_filter(name)?;
        request = request.filter(name.as_str(), FilterValue::parse(spec, raw)?);
    }
    Ok(request)
}

async fn run(config: ShopdeskConfig, admin: AdminConfig) -> anyhow::Result<()> {
    let store = create_store(&config)?;
    let resources = Arc::new(shopdesk_catalog::registry(&admin)?);

    match &config.command {
        Command::Dashboard { year } => {
            let clock: Arc<dyn Clock> = match year {
                Some(year) => {
                    let start = Utc
                        .with_ymd_and_hms(*year, 1, 1, 0, 0, 0)
                        .single()
                        .ok_or_else(|| anyhow::anyhow!("Invalid year {year}"))?;
                    Arc::new(FixedClock(start))
                }
                None => Arc::new(SystemClock),
            };
            let widgets = dashboard(&admin, clock).render(&store).await?;
            print_json(&widgets)
        }
        Command::Search { term, limit } => {
            let search = GlobalSearch::new(resources, admin.clone());
            let results = match limit {
                Some(limit) => search.search(&store, term, *limit).await?,
                None => search.search_default(&store, term).await?,
            };
            print_json(&results)
        }
        Command::List(args) => {
            let definition = resources.get(&args.resource)?;
            let request = list_request(definition, args)?;
            let page = definition.list(&store, &request).await?;
            print_json(&serde_json::json!({
                "total": page.total,
                "page": page.page,
                "per_page": page.per_page,
                "last_page": page.last_page(),
                "rows": definition.table_rows(&page.records),
            }))
        }
        Command::Create { resource, payload } => {
            let payload: Value = serde_json::from_str(payload)?;
            let Value::Object(fields) = payload else {
                anyhow::bail!("Payload must be a JSON object");
            };
            match resources.get(resource)?.create(&store, &fields).await {
                Ok(record) => print_json(&record),
                Err(AdminError::Validation(errors)) => {
                    print_json(&errors)?;
                    std::process::exit(2);
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ShopdeskConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let admin = config.admin_config();
    info!(
        database = %config.database,
        panel_path = %admin.panel_path,
        version = shopdesk_engine::VERSION,
        "Starting Shopdesk console"
    );

    run(config, admin).await
}
