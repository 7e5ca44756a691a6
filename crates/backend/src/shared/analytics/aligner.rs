use contracts::dashboards::d410_sales_rollup::dto::AggregateRow;
use contracts::dashboards::d411_forecast_accuracy::dto::{ComparisonRow, TotalsComparison};
use contracts::shared::period::TimeBucket;
use std::collections::BTreeMap;

use super::ratio::{percent_of, percentage_error};

fn series_by_bucket(rows: &[AggregateRow], metric: &str, side: &str) -> BTreeMap<TimeBucket, f64> {
    let mut series = BTreeMap::new();
    for row in rows {
        match row.metric(metric) {
            // several dimension groups in one bucket collapse into a single scalar
            Some(value) => *series.entry(row.bucket).or_insert(0.0) += value,
            None => tracing::warn!(
                "{} row {} has no metric '{}', skipped",
                side,
                row.bucket,
                metric
            ),
        }
    }
    series
}

/// Full outer join of two reduced series on bucket.
///
/// A side absent from a bucket is zero-filled for the raw values, while the
/// percentage error stays undefined unless `actual > 0`. One row per bucket
/// present on either side, in bucket order.
pub fn align(actual: &[AggregateRow], predicted: &[AggregateRow], metric: &str) -> Vec<ComparisonRow> {
    let actual = series_by_bucket(actual, metric, "actual");
    let mut predicted = series_by_bucket(predicted, metric, "predicted");

    let mut joined: BTreeMap<TimeBucket, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (bucket, value) in actual {
        joined.insert(bucket, (Some(value), predicted.remove(&bucket)));
    }
    for (bucket, value) in predicted {
        joined.insert(bucket, (None, Some(value)));
    }

    joined
        .into_iter()
        .map(|(bucket, (a, p))| {
            let actual = a.unwrap_or(0.0);
            let predicted = p.unwrap_or(0.0);
            ComparisonRow {
                bucket,
                actual,
                predicted,
                has_actual: a.is_some(),
                has_predicted: p.is_some(),
                absolute_error: (actual - predicted).abs(),
                percentage_error: percentage_error(actual, predicted),
            }
        })
        .collect()
}

/// Sums of both series over all comparison rows.
pub fn totals(rows: &[ComparisonRow]) -> TotalsComparison {
    let total_actual: f64 = rows.iter().map(|r| r.actual).sum();
    let total_predicted: f64 = rows.iter().map(|r| r.predicted).sum();
    let difference = total_predicted - total_actual;

    TotalsComparison {
        total_actual,
        total_predicted,
        difference,
        difference_percent: percent_of(difference, total_actual),
        accuracy_percent: percentage_error(total_actual, total_predicted).map(|e| 100.0 - e),
    }
}
