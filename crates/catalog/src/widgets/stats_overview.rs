use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shopdesk_engine::AdminResult;
use shopdesk_engine::query::{Op, Query, RecordStore};
use shopdesk_engine::stats::{
    Clock, Stat, StatBucket, StatColor, Widget, WidgetMeta, WidgetOutput, count_where,
    monthly_counts, monthly_counts_where,
};
use tracing::debug;

use crate::enums::OrderStatus;
use crate::resources::{CUSTOMERS, ORDERS, PRODUCTS};

const TRENDING_UP: &str = "heroicon-m-arrow-trending-up";
const TRENDING_DOWN: &str = "heroicon-m-arrow-trending-down";

/// Headline counts of customers, products and pending orders, each with a
/// sparkline of the current year.
pub struct StatsOverview {
    clock: Arc<dyn Clock>,
    polling_interval: Duration,
}

impl StatsOverview {
    pub fn new(clock: Arc<dyn Clock>, polling_interval: Duration) -> Self {
        Self {
            clock,
            polling_interval,
        }
    }
}

fn sparkline(buckets: &[StatBucket]) -> Vec<u64> {
    buckets.iter().map(|b| b.count).collect()
}

#[async_trait]
impl Widget for StatsOverview {
    fn name(&self) -> &str {
        "stats_overview"
    }

    fn meta(&self) -> WidgetMeta {
        WidgetMeta {
            sort: 2,
            polling_interval: Some(self.polling_interval),
            lazy: true,
        }
    }

    async fn render(&self, store: &dyn RecordStore) -> AdminResult<WidgetOutput> {
        let year = self.clock.current_year();
        debug!(year, "Rendering stats overview");

        let customers = Query::select(CUSTOMERS);
        let products = Query::select(PRODUCTS);
        let pending = Query::select(ORDERS).filter("status", Op::Eq, OrderStatus::Pending.as_str());

        let stats = vec![
            Stat::new("Total Customers", count_where(store, &customers).await?)
                .description("Increase in Customers")
                .description_icon(TRENDING_UP)
                .color(StatColor::Success)
                .chart(sparkline(&monthly_counts(store, CUSTOMERS, year).await?)),
            Stat::new("Total Products", count_where(store, &products).await?)
                .description("Total products in app")
                .description_icon(TRENDING_DOWN)
                .color(StatColor::Danger)
                .chart(sparkline(&monthly_counts(store, PRODUCTS, year).await?)),
            Stat::new("Pending Orders", count_where(store, &pending).await?)
                .description("Total products in app")
                .description_icon(TRENDING_DOWN)
                .color(StatColor::Danger)
                .chart(sparkline(&monthly_counts_where(store, &pending, year).await?)),
        ];

        Ok(WidgetOutput::Stats { stats })
    }
}
