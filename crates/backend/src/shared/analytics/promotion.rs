use contracts::dashboards::d410_sales_rollup::dto::{MetricField, ReduceOp, Reducer};
use contracts::dashboards::d412_promotion_impact::dto::{
    PromotionImpactRow, PromotionMetric, PromotionSummaryRow,
};
use contracts::projections::p909_sales_records::dto::SalesRecord;
use thiserror::Error;

use super::aggregator::{group_by_dimensions, rank_by_metric, reduce_records};
use super::ratio::{lift_percent, safe_ratio};

/// Dimension that carries the promotion name.
pub const PROMOTION_DIMENSION: &str = "promotion";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionImpactError {
    #[error(
        "insufficient partition data: {promoted} promoted and {non_promoted} non-promoted records"
    )]
    InsufficientPartitionData {
        promoted: usize,
        non_promoted: usize,
    },
}

fn reducer_for(metric: PromotionMetric) -> Reducer {
    match metric {
        PromotionMetric::AmountSum => Reducer::sum(MetricField::Amount),
        PromotionMetric::AmountMean => Reducer::mean(MetricField::Amount),
        PromotionMetric::QuantitySum => Reducer::sum(MetricField::Quantity),
        PromotionMetric::QuantityMean => Reducer::mean(MetricField::Quantity),
        PromotionMetric::DiscountSum => Reducer::sum(MetricField::DiscountAmount),
        PromotionMetric::DiscountMean => Reducer::mean(MetricField::DiscountAmount),
        PromotionMetric::Count => Reducer::count(),
    }
}

/// Evaluates the reducers over a whole partition (one group, no keys).
fn partition_values(records: &[&SalesRecord], reducers: &[Reducer]) -> Vec<f64> {
    let metrics = reduce_records(records.iter().copied(), reducers);
    reducers
        .iter()
        .map(|r| metrics.get(&r.metric_name()).copied().unwrap_or(0.0))
        .collect()
}

/// Record counts of the (promoted, non-promoted) partitions.
pub fn partition_counts(records: &[SalesRecord]) -> (usize, usize) {
    let promoted = records.iter().filter(|r| r.has_promotion).count();
    (promoted, records.len() - promoted)
}

/// Lift of each metric between promoted and non-promoted records.
///
/// Fails with `InsufficientPartitionData` when either partition is empty.
pub fn analyze(
    records: &[SalesRecord],
    metrics: &[PromotionMetric],
) -> Result<Vec<PromotionImpactRow>, PromotionImpactError> {
    let (promoted, non_promoted): (Vec<&SalesRecord>, Vec<&SalesRecord>) =
        records.iter().partition(|r| r.has_promotion);

    if promoted.is_empty() || non_promoted.is_empty() {
        return Err(PromotionImpactError::InsufficientPartitionData {
            promoted: promoted.len(),
            non_promoted: non_promoted.len(),
        });
    }

    let reducers: Vec<Reducer> = metrics.iter().copied().map(reducer_for).collect();
    let promoted_values = partition_values(&promoted, &reducers);
    let baseline_values = partition_values(&non_promoted, &reducers);

    Ok(metrics
        .iter()
        .zip(promoted_values.into_iter().zip(baseline_values))
        .map(|(metric, (promoted_value, non_promoted_value))| PromotionImpactRow {
            metric: *metric,
            promoted_value,
            non_promoted_value,
            lift_percent: lift_percent(promoted_value, non_promoted_value),
        })
        .collect())
}

/// Figures per promotion name, largest amount first.
pub fn promotion_breakdown(records: &[SalesRecord]) -> Vec<PromotionSummaryRow> {
    let amount_sum = Reducer::sum(MetricField::Amount);
    let reducers = vec![
        amount_sum,
        Reducer::mean(MetricField::Amount),
        Reducer::count(),
        Reducer::sum(MetricField::DiscountAmount),
        Reducer::mean(MetricField::DiscountAmount),
    ];
    let rows = group_by_dimensions(records, &[PROMOTION_DIMENSION.to_string()], &reducers);

    rank_by_metric(rows, &amount_sum.metric_name(), None)
        .into_iter()
        .map(|row| {
            let value = |field: MetricField, op: ReduceOp| {
                row.metric(&Reducer::new(field, op).metric_name())
                    .unwrap_or(0.0)
            };
            let amount_sum = value(MetricField::Amount, ReduceOp::Sum);
            let discount_sum = value(MetricField::DiscountAmount, ReduceOp::Sum);
            PromotionSummaryRow {
                promotion: row.dimensions.first().cloned().unwrap_or_default(),
                amount_sum,
                amount_mean: value(MetricField::Amount, ReduceOp::Mean),
                record_count: value(MetricField::Amount, ReduceOp::Count) as usize,
                discount_sum,
                discount_mean: value(MetricField::DiscountAmount, ReduceOp::Mean),
                roi: safe_ratio(amount_sum - discount_sum, discount_sum),
            }
        })
        .collect()
}
