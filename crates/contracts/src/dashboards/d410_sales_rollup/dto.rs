use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::projections::p909_sales_records::dto::SeriesKind;
use crate::shared::period::{Granularity, TimeBucket};
use crate::shared::sales_query::SalesQuery;

/// Record field a reducer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    Amount,
    Quantity,
    ReturnQuantity,
    DiscountAmount,
    /// quantity - returnQuantity
    NetQuantity,
}

impl MetricField {
    pub fn code(&self) -> &'static str {
        match self {
            MetricField::Amount => "amount",
            MetricField::Quantity => "quantity",
            MetricField::ReturnQuantity => "returnQuantity",
            MetricField::DiscountAmount => "discountAmount",
            MetricField::NetQuantity => "netQuantity",
        }
    }
}

/// Combination rule for one field within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceOp {
    Sum,
    Mean,
    Max,
    Min,
    Count,
}

impl ReduceOp {
    pub fn code(&self) -> &'static str {
        match self {
            ReduceOp::Sum => "sum",
            ReduceOp::Mean => "mean",
            ReduceOp::Max => "max",
            ReduceOp::Min => "min",
            ReduceOp::Count => "count",
        }
    }
}

/// One requested metric: `{field, op}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reducer {
    pub field: MetricField,
    pub op: ReduceOp,
}

impl Reducer {
    pub fn new(field: MetricField, op: ReduceOp) -> Self {
        Self { field, op }
    }

    pub fn sum(field: MetricField) -> Self {
        Self::new(field, ReduceOp::Sum)
    }

    pub fn mean(field: MetricField) -> Self {
        Self::new(field, ReduceOp::Mean)
    }

    pub fn count() -> Self {
        Self::new(MetricField::Amount, ReduceOp::Count)
    }

    /// Key in `AggregateRow::metrics`, e.g. `amount_sum`; `count` for counts.
    pub fn metric_name(&self) -> String {
        match self.op {
            ReduceOp::Count => "count".to_string(),
            op => format!("{}_{}", self.field.code(), op.code()),
        }
    }

    /// amount sum, amount mean, quantity sum, count
    pub fn defaults() -> Vec<Reducer> {
        vec![
            Reducer::sum(MetricField::Amount),
            Reducer::mean(MetricField::Amount),
            Reducer::sum(MetricField::Quantity),
            Reducer::count(),
        ]
    }
}

/// One group of the rollup: (bucket, dimension values) -> reduced metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub bucket: TimeBucket,
    /// Values in the order of the requested dimension keys
    pub dimensions: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
}

impl AggregateRow {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Group keyed by dimension values only (no time bucket).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRow {
    pub dimensions: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
    /// returnQuantity sum / quantity sum × 100, undefined when quantity sums to 0
    #[serde(default)]
    pub return_rate: Option<f64>,
    /// discountAmount sum / amount sum × 100, undefined when amount sums to 0
    #[serde(default)]
    pub discount_rate: Option<f64>,
}

impl DimensionRow {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Whole-series statistics of one metric across aggregate rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub metric: String,
    pub total: f64,
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    /// Sample standard deviation, undefined with fewer than two periods
    pub std_dev: Option<f64>,
    pub period_count: usize,
}

/// Headline figures for a record set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesKpi {
    pub total_amount: f64,
    pub total_quantity: i64,
    pub transaction_count: usize,
    pub promotional_amount: f64,
    pub promotional_quantity: i64,
    pub promotional_share_percent: Option<f64>,
}

fn default_reducers() -> Vec<Reducer> {
    Reducer::defaults()
}

/// POST /api/d410/sales_rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRollupRequest {
    #[serde(flatten)]
    pub query: SalesQuery,
    #[serde(default)]
    pub dimension_keys: Vec<String>,
    #[serde(default = "default_reducers")]
    pub reducers: Vec<Reducer>,
    #[serde(default = "default_series")]
    pub series: SeriesKind,
}

fn default_series() -> SeriesKind {
    SeriesKind::Actual
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRollupResponse {
    pub granularity: Granularity,
    pub dimension_keys: Vec<String>,
    pub rows: Vec<AggregateRow>,
    /// Statistics of the first requested reducer, `None` when no reducer was requested
    pub summary: Option<SummaryStats>,
    pub kpi: SalesKpi,
}

/// POST /api/d410/breakdown (category, store, region performance, top products)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownRequest {
    #[serde(flatten)]
    pub query: SalesQuery,
    pub dimension_keys: Vec<String>,
    #[serde(default = "default_reducers")]
    pub reducers: Vec<Reducer>,
    /// Metric name to sort by (descending); defaults to the first reducer
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownResponse {
    pub dimension_keys: Vec<String>,
    pub rows: Vec<DimensionRow>,
}
