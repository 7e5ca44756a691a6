//! Error statistics between an actual and a predicted series.
//!
//! Sample rule: a report exists only when the two series overlap in at least
//! one bucket. Every bucket that carries an actual value is then scored, with
//! a missing prediction counted as `0.0`. Buckets that only have a prediction
//! never enter the statistics, so a forecast beyond the observed range cannot
//! bias the error. The report carries both the scored count and the number of
//! buckets present in both series.

use contracts::dashboards::d410_sales_rollup::dto::{AggregateRow, MetricField, Reducer};
use contracts::dashboards::d411_forecast_accuracy::dto::{
    AccuracyReport, ComparisonRow, GroupAccuracyRow,
};
use contracts::projections::p909_sales_records::dto::SalesRecord;
use contracts::shared::period::Granularity;
use std::collections::BTreeSet;

use super::aggregator::{aggregate, MISSING_DIMENSION};
use super::aligner::{align, totals};
use super::ratio::{mean, percentage_error, safe_ratio};

/// MAE, RMSE, MAPE and Pearson correlation over the scored rows.
pub fn evaluate(rows: &[ComparisonRow]) -> AccuracyReport {
    let overlap_count = rows.iter().filter(|r| r.has_actual && r.has_predicted).count();
    if overlap_count == 0 {
        return AccuracyReport::empty();
    }

    let scored: Vec<&ComparisonRow> = rows.iter().filter(|r| r.has_actual).collect();
    let abs_errors: Vec<f64> = scored.iter().map(|r| (r.actual - r.predicted).abs()).collect();
    let sq_errors: Vec<f64> = abs_errors.iter().map(|e| e * e).collect();
    let pct_errors: Vec<f64> = scored
        .iter()
        .filter_map(|r| percentage_error(r.actual, r.predicted))
        .collect();

    let actual: Vec<f64> = scored.iter().map(|r| r.actual).collect();
    let predicted: Vec<f64> = scored.iter().map(|r| r.predicted).collect();

    AccuracyReport {
        sample_count: scored.len(),
        overlap_count,
        mae: mean(&abs_errors),
        rmse: mean(&sq_errors).map(f64::sqrt),
        mape: mean(&pct_errors),
        correlation: pearson(&actual, &predicted),
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Pearson coefficient; undefined below two points or when either side is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() || is_constant(xs) || is_constant(ys) {
        return None;
    }

    let mx = mean(xs)?;
    let my = mean(ys)?;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }

    safe_ratio(cov, (vx * vy).sqrt()).map(|r| r.clamp(-1.0, 1.0))
}

fn rows_of_group(rows: &[AggregateRow], group: &str) -> Vec<AggregateRow> {
    rows.iter()
        .filter(|r| r.dimensions.first().map_or(MISSING_DIMENSION, String::as_str) == group)
        .cloned()
        .collect()
}

/// Accuracy per value of `group_by`.
///
/// Both record sets are reduced to summed amount per (bucket, group value),
/// aligned per group, and evaluated. Groups appear in ascending order and
/// include values present on only one side.
pub fn evaluate_by_group(
    actual: &[SalesRecord],
    predicted: &[SalesRecord],
    granularity: Granularity,
    group_by: &str,
) -> Vec<GroupAccuracyRow> {
    let keys = vec![group_by.to_string()];
    let reducer = Reducer::sum(MetricField::Amount);
    let metric = reducer.metric_name();
    let actual_rows = aggregate(actual, granularity, &keys, &[reducer]);
    let predicted_rows = aggregate(predicted, granularity, &keys, &[reducer]);

    let groups: BTreeSet<&str> = actual_rows
        .iter()
        .chain(&predicted_rows)
        .map(|r| r.dimensions.first().map_or(MISSING_DIMENSION, String::as_str))
        .collect();

    groups
        .into_iter()
        .map(|group| {
            let comparison = align(
                &rows_of_group(&actual_rows, group),
                &rows_of_group(&predicted_rows, group),
                &metric,
            );
            let report = evaluate(&comparison);
            GroupAccuracyRow {
                group: group.to_string(),
                accuracy_percent: report.accuracy_percent(),
                report,
                totals: totals(&comparison),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(records: &[SalesRecord]) -> Vec<AggregateRow> {
        aggregate(records, Granularity::Day, &[], &[Reducer::sum(MetricField::Amount)])
    }

    fn compare(actual: &[SalesRecord], predicted: &[SalesRecord]) -> Vec<ComparisonRow> {
        align(&daily(actual), &daily(predicted), "amount_sum")
    }

    #[test]
    fn test_scenario_report() {
        let rows = compare(
            &[
                SalesRecord::new(date(2007, 1, 1), 100.0),
                SalesRecord::new(date(2007, 1, 1), 150.0).with_promotion(true),
                SalesRecord::new(date(2007, 1, 2), 200.0),
            ],
            &[
                SalesRecord::new(date(2007, 1, 1), 240.0),
                SalesRecord::new(date(2007, 1, 3), 50.0),
            ],
        );
        let report = evaluate(&rows);
        assert_eq!(report.sample_count, 2);
        assert_eq!(report.overlap_count, 1);
        assert_abs_diff_eq!(report.mae.unwrap(), 105.0);
        assert_abs_diff_eq!(report.rmse.unwrap(), 20050f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(report.rmse.unwrap(), 141.598, epsilon = 1e-3);
        assert_abs_diff_eq!(report.mape.unwrap(), 52.0);
    }

    #[test]
    fn test_identical_series_is_perfect() {
        let series = vec![
            SalesRecord::new(date(2007, 1, 1), 10.0),
            SalesRecord::new(date(2007, 1, 2), 25.0),
            SalesRecord::new(date(2007, 1, 3), 40.0),
        ];
        let report = evaluate(&compare(&series, &series));
        assert_eq!(report.sample_count, 3);
        assert_eq!(report.overlap_count, 3);
        assert_eq!(report.mae, Some(0.0));
        assert_eq!(report.rmse, Some(0.0));
        assert_eq!(report.mape, Some(0.0));
        assert_abs_diff_eq!(report.correlation.unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(report.accuracy_percent(), Some(100.0));
    }

    #[test]
    fn test_no_overlap_gives_empty_report() {
        let report = evaluate(&compare(
            &[SalesRecord::new(date(2007, 1, 1), 10.0)],
            &[SalesRecord::new(date(2007, 2, 1), 10.0)],
        ));
        assert_eq!(report, AccuracyReport::empty());
        assert_eq!(evaluate(&[]), AccuracyReport::empty());
    }

    #[test]
    fn test_constant_series_has_undefined_correlation() {
        let actual = vec![
            SalesRecord::new(date(2007, 1, 1), 10.0),
            SalesRecord::new(date(2007, 1, 2), 20.0),
        ];
        let predicted = vec![
            SalesRecord::new(date(2007, 1, 1), 15.0),
            SalesRecord::new(date(2007, 1, 2), 15.0),
        ];
        let report = evaluate(&compare(&actual, &predicted));
        assert_eq!(report.sample_count, 2);
        assert_eq!(report.correlation, None);
        assert_abs_diff_eq!(report.mae.unwrap(), 5.0);
    }

    #[test]
    fn test_mape_undefined_without_positive_actuals() {
        let report = evaluate(&compare(
            &[SalesRecord::new(date(2007, 1, 1), 0.0)],
            &[SalesRecord::new(date(2007, 1, 1), 5.0)],
        ));
        assert_eq!(report.sample_count, 1);
        assert_eq!(report.mae, Some(5.0));
        assert_eq!(report.mape, None);
        assert_eq!(report.correlation, None);
    }

    #[test]
    fn test_pearson_negative() {
        let r = pearson(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0]).unwrap();
        assert_abs_diff_eq!(r, -1.0, epsilon = 1e-12);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn test_evaluate_by_group() {
        let actual = vec![
            SalesRecord::new(date(2007, 1, 1), 100.0).with_dimension("category", "Audio"),
            SalesRecord::new(date(2007, 1, 1), 50.0).with_dimension("category", "TV"),
        ];
        let predicted = vec![
            SalesRecord::new(date(2007, 1, 1), 90.0).with_dimension("category", "Audio"),
            SalesRecord::new(date(2007, 1, 1), 70.0).with_dimension("category", "Cameras"),
        ];
        let groups = evaluate_by_group(&actual, &predicted, Granularity::Day, "category");
        let names: Vec<&str> = groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(names, vec!["Audio", "Cameras", "TV"]);

        assert_eq!(groups[0].report.sample_count, 1);
        assert_abs_diff_eq!(groups[0].accuracy_percent.unwrap(), 90.0);
        assert_eq!(groups[1].report, AccuracyReport::empty());
        assert_eq!(groups[2].report, AccuracyReport::empty());
        assert_eq!(groups[2].totals.total_actual, 50.0);
    }
}
