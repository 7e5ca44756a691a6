use serde::{Deserialize, Serialize};

use crate::shared::period::{Granularity, TimeBucket};
use crate::shared::sales_query::SalesQuery;

/// Actual vs predicted for one bucket of the outer-joined series.
///
/// A side missing from its series contributes `0.0` to `actual`/`predicted`
/// and is flagged through `has_actual`/`has_predicted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub bucket: TimeBucket,
    pub actual: f64,
    pub predicted: f64,
    pub has_actual: bool,
    pub has_predicted: bool,
    pub absolute_error: f64,
    /// `|actual - predicted| / actual * 100`, defined only when `actual > 0`
    pub percentage_error: Option<f64>,
}

/// Whole-range error statistics. Every statistic may be undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Buckets scored: every bucket with an actual value
    pub sample_count: usize,
    /// Buckets present in both series
    #[serde(default)]
    pub overlap_count: usize,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    pub mape: Option<f64>,
    pub correlation: Option<f64>,
}

impl AccuracyReport {
    /// Report for a range with nothing to compare.
    pub fn empty() -> Self {
        Self {
            sample_count: 0,
            overlap_count: 0,
            mae: None,
            rmse: None,
            mape: None,
            correlation: None,
        }
    }

    /// `100 - MAPE`
    pub fn accuracy_percent(&self) -> Option<f64> {
        self.mape.map(|m| 100.0 - m)
    }
}

/// Totals of both series over every bucket of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsComparison {
    pub total_actual: f64,
    pub total_predicted: f64,
    /// predicted - actual
    pub difference: f64,
    pub difference_percent: Option<f64>,
    /// `(1 - |actual - predicted| / actual) * 100`
    pub accuracy_percent: Option<f64>,
}

/// Accuracy of one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAccuracyRow {
    pub group: String,
    pub report: AccuracyReport,
    pub accuracy_percent: Option<f64>,
    pub totals: TotalsComparison,
}

/// POST /api/d411/forecast_accuracy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastAccuracyRequest {
    #[serde(flatten)]
    pub query: SalesQuery,
    /// Dimension to compute per-group accuracy for, e.g. "category"
    #[serde(default)]
    pub group_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastAccuracyResponse {
    pub granularity: Granularity,
    pub rows: Vec<ComparisonRow>,
    pub report: AccuracyReport,
    pub totals: TotalsComparison,
    #[serde(default)]
    pub groups: Vec<GroupAccuracyRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_statistics_serialize_as_null() {
        let json = serde_json::to_value(AccuracyReport::empty()).unwrap();
        assert_eq!(json["sample_count"], 0);
        assert_eq!(json["overlap_count"], 0);
        assert!(json["mape"].is_null());
        assert!(json["correlation"].is_null());
    }

    #[test]
    fn test_accuracy_percent_follows_mape() {
        let mut report = AccuracyReport::empty();
        assert_eq!(report.accuracy_percent(), None);
        report.mape = Some(12.5);
        assert_eq!(report.accuracy_percent(), Some(87.5));
    }
}
