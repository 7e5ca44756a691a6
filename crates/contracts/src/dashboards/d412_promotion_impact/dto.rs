use serde::{Deserialize, Serialize};

use crate::shared::sales_query::SalesQuery;

/// Metric compared between the promoted and non-promoted partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionMetric {
    AmountSum,
    AmountMean,
    QuantitySum,
    QuantityMean,
    DiscountSum,
    DiscountMean,
    Count,
}

impl PromotionMetric {
    pub fn code(&self) -> &'static str {
        match self {
            PromotionMetric::AmountSum => "amount_sum",
            PromotionMetric::AmountMean => "amount_mean",
            PromotionMetric::QuantitySum => "quantity_sum",
            PromotionMetric::QuantityMean => "quantity_mean",
            PromotionMetric::DiscountSum => "discount_sum",
            PromotionMetric::DiscountMean => "discount_mean",
            PromotionMetric::Count => "count",
        }
    }

    /// The five metrics the promotion dashboard shows by default.
    pub fn defaults() -> Vec<PromotionMetric> {
        vec![
            PromotionMetric::AmountSum,
            PromotionMetric::AmountMean,
            PromotionMetric::QuantitySum,
            PromotionMetric::QuantityMean,
            PromotionMetric::Count,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionImpactRow {
    pub metric: PromotionMetric,
    pub promoted_value: f64,
    pub non_promoted_value: f64,
    /// `(promoted - non_promoted) / non_promoted * 100`, undefined when the
    /// non-promoted value is zero
    pub lift_percent: Option<f64>,
}

/// Per-promotion-name figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionSummaryRow {
    pub promotion: String,
    pub amount_sum: f64,
    pub amount_mean: f64,
    pub record_count: usize,
    pub discount_sum: f64,
    pub discount_mean: f64,
    /// `(amount_sum - discount_sum) / discount_sum`
    pub roi: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionImpactStatus {
    Ok,
    /// One partition has no records; lift cannot be computed
    InsufficientPartitionData,
}

fn default_metrics() -> Vec<PromotionMetric> {
    PromotionMetric::defaults()
}

/// POST /api/d412/promotion_impact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionImpactRequest {
    #[serde(flatten)]
    pub query: SalesQuery,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<PromotionMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionImpactResponse {
    pub status: PromotionImpactStatus,
    pub promoted_count: usize,
    pub non_promoted_count: usize,
    pub rows: Vec<PromotionImpactRow>,
    pub breakdown: Vec<PromotionSummaryRow>,
}
