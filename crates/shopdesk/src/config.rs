//! Console configuration.
//!
//! Every option can also be set through the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHOPDESK_DATABASE` | shopdesk.db | SQLite file, or `:memory:` |
//! | `SHOPDESK_LOG_LEVEL` | info | Log level |
//! | `SHOPDESK_PANEL_PATH` | /admin | URL prefix of search result links |
//! | `SHOPDESK_SEARCH_LIMIT` | 20 | Global search results per resource |
//! | `SHOPDESK_PAGE_SIZE` | 10 | Rows per list page |
//! | `SHOPDESK_MAX_PAGE_SIZE` | 100 | Largest accepted page size |
//! | `SHOPDESK_POLLING_INTERVAL` | 15s | Refresh period of polling widgets |

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use shopdesk_engine::AdminConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "shopdesk")]
#[command(about = "Shopdesk back-office console", version)]
pub struct ShopdeskConfig {
    /// SQLite database file, or `:memory:` for a throwaway database.
    #[arg(long, env = "SHOPDESK_DATABASE", default_value = "shopdesk.db")]
    pub database: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SHOPDESK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// URL prefix of the admin panel.
    #[arg(long, env = "SHOPDESK_PANEL_PATH", default_value = "/admin")]
    pub panel_path: String,

    /// Global search results per resource.
    #[arg(long, env = "SHOPDESK_SEARCH_LIMIT", default_value = "20")]
    pub search_limit: usize,

    /// Rows per list page when `--per-page` is not given.
    #[arg(long, env = "SHOPDESK_PAGE_SIZE", default_value = "10")]
    pub page_size: u64,

    /// Largest accepted page size.
    #[arg(long, env = "SHOPDESK_MAX_PAGE_SIZE", default_value = "100")]
    pub max_page_size: u64,

    /// Refresh period reported for polling widgets.
    #[arg(
        long,
        env = "SHOPDESK_POLLING_INTERVAL",
        default_value = "15s",
        value_parser = humantime::parse_duration
    )]
    pub polling_interval: Duration,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render the dashboard widgets.
    Dashboard {
        /// Year of the monthly charts. Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,
    },
    /// Search every globally searchable resource.
    Search {
        term: String,
        /// Results per resource.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List one page of a resource.
    List(ListArgs),
    /// Validate a JSON payload and create a record.
    Create { resource: String, payload: String },
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    pub resource: String,

    /// Table search term.
    #[arg(long)]
    pub search: Option<String>,

    /// Filter as `name=value`. Relation filters take comma-separated ids.
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Sort column, prefixed with `-` for descending.
    #[arg(long, allow_hyphen_values = true)]
    pub sort: Option<String>,

    #[arg(long, default_value = "1")]
    pub page: u64,

    #[arg(long)]
    pub per_page: Option<u64>,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

impl ShopdeskConfig {
    /// The engine configuration these options describe.
    pub fn admin_config(&self) -> AdminConfig {
        AdminConfig {
            panel_path: self.panel_path.clone(),
            global_search_limit: self.search_limit,
            default_page_size: self.page_size,
            max_page_size: self.max_page_size,
            stats_polling_interval: self.polling_interval,
        }
    }

    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.trim().is_empty() {
            errors.push("Database path cannot be empty".to_string());
        }

        if let Err(engine_errors) = self.admin_config().validate() {
            errors.extend(engine_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn is_memory(&self) -> bool {
        self.database == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ShopdeskConfig {
        ShopdeskConfig::try_parse_from(std::iter::once("shopdesk").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--database", "shop.db", "dashboard"]);
        assert_eq!(config.database, "shop.db");
        assert_eq!(config.search_limit, 20);
        assert_eq!(config.polling_interval, Duration::from_secs(15));
        assert_eq!(config.admin_config(), AdminConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_list_filters() {
        let config = parse(&[
            "list",
            "products",
            "--filter",
            "is_visible=true",
            "--filter",
            "brand=a,b",
            "--sort",
            "-price",
        ]);
        match config.command {
            Command::List(args) => {
                assert_eq!(args.resource, "products");
                assert_eq!(args.page, 1);
                assert_eq!(
                    args.filters,
                    vec![
                        ("is_visible".to_string(), "true".to_string()),
                        ("brand".to_string(), "a,b".to_string()),
                    ]
                );
                assert_eq!(args.sort.as_deref(), Some("-price"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_filter_rejects_missing_name() {
        assert!(parse_filter("=true").is_err());
        assert!(parse_filter("is_visible").is_err());
        assert_eq!(parse_filter("is_visible=").unwrap().1, "");
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let config = parse(&[
            "--panel-path",
            "admin",
            "--search-limit",
            "0",
            "--page-size",
            "500",
            "search",
            "red",
        ]);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
