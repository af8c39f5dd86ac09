use std::sync::Arc;

use async_trait::async_trait;
use shopdesk_engine::AdminResult;
use shopdesk_engine::query::RecordStore;
use shopdesk_engine::stats::{
    ChartData, ChartType, Clock, Widget, WidgetMeta, WidgetOutput, monthly_counts,
};

use crate::resources::PRODUCTS;

/// Products created per month of the current year.
pub struct ProductsChart {
    clock: Arc<dyn Clock>,
}

impl ProductsChart {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Widget for ProductsChart {
    fn name(&self) -> &str {
        "products_chart"
    }

    fn meta(&self) -> WidgetMeta {
        WidgetMeta {
            sort: 3,
            polling_interval: None,
            lazy: true,
        }
    }

    async fn render(&self, store: &dyn RecordStore) -> AdminResult<WidgetOutput> {
        let buckets = monthly_counts(store, PRODUCTS, self.clock.current_year()).await?;
        Ok(WidgetOutput::Chart {
            chart: ChartData::monthly("Chart", ChartType::Line, "Products created", &buckets),
        })
    }
}
