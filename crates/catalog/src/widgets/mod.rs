//! Dashboard widgets.

mod products_chart;
mod stats_overview;

pub use products_chart::ProductsChart;
pub use stats_overview::StatsOverview;

use std::sync::Arc;

use shopdesk_engine::AdminConfig;
use shopdesk_engine::stats::{Clock, Dashboard};

/// The dashboard page: the stats overview followed by the products chart.
pub fn dashboard(config: &AdminConfig, clock: Arc<dyn Clock>) -> Dashboard {
    Dashboard::new()
        .widget(ProductsChart::new(clock.clone()))
        .widget(StatsOverview::new(clock, config.stats_polling_interval))
}
