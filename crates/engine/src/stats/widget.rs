//! Dashboard widget values and the widget trait.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::AdminResult;
use crate::query::RecordStore;

use super::StatBucket;

/// Accent color of a stat tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatColor {
    Primary,
    Success,
    Warning,
    Danger,
    Info,
    Gray,
}

/// One tile of a stats overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<StatColor>,
    /// Sparkline points, oldest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chart: Vec<u64>,
}

impl Stat {
    pub fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
            description: None,
            description_icon: None,
            color: None,
            chart: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn description_icon(mut self, icon: impl Into<String>) -> Self {
        self.description_icon = Some(icon.into());
        self
    }

    pub fn color(mut self, color: StatColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn chart(mut self, points: impl IntoIterator<Item = u64>) -> Self {
        self.chart = points.into_iter().collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Bar,
}

/// A labelled data series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<u64>,
}

/// Data behind a chart widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub heading: String,
    pub chart_type: ChartType,
    pub datasets: Vec<Dataset>,
    pub labels: Vec<String>,
}

impl ChartData {
    /// A single-series chart over monthly buckets.
    pub fn monthly(
        heading: impl Into<String>,
        chart_type: ChartType,
        dataset_label: impl Into<String>,
        buckets: &[StatBucket],
    ) -> Self {
        Self {
            heading: heading.into(),
            chart_type,
            datasets: vec![Dataset {
                label: dataset_label.into(),
                data: buckets.iter().map(|b| b.count).collect(),
            }],
            labels: buckets.iter().map(|b| b.period_label.clone()).collect(),
        }
    }
}

/// Placement and refresh behavior of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WidgetMeta {
    /// Position on the dashboard, ascending.
    pub sort: i32,
    /// Refresh period. `None` disables polling.
    #[serde(serialize_with = "serialize_interval")]
    pub polling_interval: Option<Duration>,
    /// Rendered after the page loads.
    pub lazy: bool,
}

fn serialize_interval<S>(interval: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match interval {
        Some(duration) => {
            serializer.serialize_str(&humantime::format_duration(*duration).to_string())
        }
        None => serializer.serialize_none(),
    }
}

/// What a widget renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetOutput {
    Stats { stats: Vec<Stat> },
    Chart { chart: ChartData },
}

/// A dashboard widget backed by the record store.
#[async_trait]
pub trait Widget: Send + Sync {
    fn name(&self) -> &str;

    fn meta(&self) -> WidgetMeta;

    async fn render(&self, store: &dyn RecordStore) -> AdminResult<WidgetOutput>;
}

/// A rendered widget with its placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedWidget {
    pub name: String,
    pub meta: WidgetMeta,
    #[serde(flatten)]
    pub output: WidgetOutput,
}

/// The widgets of the dashboard page.
#[derive(Default)]
pub struct Dashboard {
    widgets: Vec<Box<dyn Widget>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn widget(mut self, widget: impl Widget + 'static) -> Self {
        self.widgets.push(Box::new(widget));
        self
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Renders every widget in `sort` order. The first failure fails the page.
    pub async fn render(&self, store: &dyn RecordStore) -> AdminResult<Vec<RenderedWidget>> {
        let mut ordered: Vec<&dyn Widget> = self.widgets.iter().map(|w| w.as_ref()).collect();
        ordered.sort_by_key(|w| w.meta().sort);

        let mut rendered = Vec::with_capacity(ordered.len());
        for widget in ordered {
            debug!(widget = %widget.name(), "Rendering widget");
            rendered.push(RenderedWidget {
                name: widget.name().to_string(),
                meta: widget.meta(),
                output: widget.render(store).await?,
            });
        }
        Ok(rendered)
    }
}
