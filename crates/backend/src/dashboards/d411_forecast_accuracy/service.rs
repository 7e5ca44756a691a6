use anyhow::Result;
use contracts::dashboards::d410_sales_rollup::dto::{MetricField, Reducer};
use contracts::dashboards::d411_forecast_accuracy::dto::{
    ForecastAccuracyRequest, ForecastAccuracyResponse,
};
use contracts::projections::p909_sales_records::dto::SeriesKind;

use crate::shared::analytics::accuracy::{evaluate, evaluate_by_group};
use crate::shared::analytics::aggregator::aggregate;
use crate::shared::analytics::aligner::{align, totals};
use crate::shared::config::QueryConfig;
use crate::shared::sources::{RecordQuery, RecordSource};

/// Actual vs predicted summed amount per bucket, with error statistics
pub async fn get_forecast_accuracy(
    source: &dyn RecordSource,
    config: &QueryConfig,
    request: ForecastAccuracyRequest,
) -> Result<ForecastAccuracyResponse> {
    let query = RecordQuery::from_sales_query(&request.query, config.row_cap());
    let (actual, predicted) = tokio::try_join!(
        source.fetch(SeriesKind::Actual, &query),
        source.fetch(SeriesKind::Predicted, &query)
    )?;

    let granularity = request.query.granularity;
    let reducer = Reducer::sum(MetricField::Amount);
    let actual_rows = aggregate(&actual, granularity, &[], &[reducer]);
    let predicted_rows = aggregate(&predicted, granularity, &[], &[reducer]);

    let rows = align(&actual_rows, &predicted_rows, &reducer.metric_name());
    let report = evaluate(&rows);
    let totals = totals(&rows);
    let groups = match &request.group_by {
        Some(key) => evaluate_by_group(&actual, &predicted, granularity, key),
        None => vec![],
    };

    Ok(ForecastAccuracyResponse {
        granularity,
        rows,
        report,
        totals,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use contracts::projections::p909_sales_records::dto::SalesRecord;
    use contracts::shared::period::Granularity;
    use contracts::shared::sales_query::SalesQuery;

    use crate::shared::sources::memory::MemorySource;
    use crate::shared::sources::SourceError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scenario() -> MemorySource {
        MemorySource::new(
            vec![
                SalesRecord::new(date(2007, 1, 1), 100.0).with_dimension("category", "Audio"),
                SalesRecord::new(date(2007, 1, 1), 150.0)
                    .with_promotion(true)
                    .with_dimension("category", "TV"),
                SalesRecord::new(date(2007, 1, 2), 200.0).with_dimension("category", "Audio"),
            ],
            vec![
                SalesRecord::new(date(2007, 1, 1), 240.0).with_dimension("category", "Audio"),
                SalesRecord::new(date(2007, 1, 3), 50.0).with_dimension("category", "TV"),
            ],
        )
    }

    fn request(granularity: Granularity, group_by: Option<&str>) -> ForecastAccuracyRequest {
        ForecastAccuracyRequest {
            query: SalesQuery::new(date(2007, 1, 1), date(2007, 1, 31), granularity),
            group_by: group_by.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_scenario_end_to_end() {
        let response = get_forecast_accuracy(&scenario(), &QueryConfig::default(), request(Granularity::Day, None))
            .await
            .unwrap();

        assert_eq!(response.rows.len(), 3);
        assert_eq!(response.rows[0].percentage_error, Some(4.0));
        assert_eq!(response.rows[1].percentage_error, Some(100.0));
        assert_eq!(response.rows[2].percentage_error, None);

        assert_eq!(response.report.sample_count, 2);
        assert_eq!(response.report.overlap_count, 1);
        assert_abs_diff_eq!(response.report.mae.unwrap(), 105.0, epsilon = 1e-9);
        assert_abs_diff_eq!(response.report.rmse.unwrap(), 20050f64.sqrt(), epsilon = 1e-9);

        assert_eq!(response.totals.total_actual, 450.0);
        assert_eq!(response.totals.total_predicted, 290.0);
        assert!(response.groups.is_empty());
    }

    #[tokio::test]
    async fn test_monthly_with_groups() {
        let response = get_forecast_accuracy(
            &scenario(),
            &QueryConfig::default(),
            request(Granularity::Month, Some("category")),
        )
        .await
        .unwrap();

        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0].actual, 450.0);
        assert_eq!(response.rows[0].predicted, 290.0);

        let groups: Vec<&str> = response.groups.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(groups, vec!["Audio", "TV"]);
        assert_abs_diff_eq!(response.groups[0].accuracy_percent.unwrap(), 80.0, epsilon = 1e-9);
        assert_abs_diff_eq!(response.groups[1].accuracy_percent.unwrap(), 100.0 - 100.0 / 150.0 * 100.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_empty_range_is_not_an_error() {
        let mut req = request(Granularity::Day, None);
        req.query.start_date = date(2010, 1, 1);
        req.query.end_date = date(2010, 1, 31);
        let response = get_forecast_accuracy(&scenario(), &QueryConfig::default(), req).await.unwrap();
        assert!(response.rows.is_empty());
        assert_eq!(response.report.sample_count, 0);
        assert_eq!(response.report.mae, None);
    }

    #[tokio::test]
    async fn test_schema_mismatch_propagates() {
        let failing = MemorySource::failing(SourceError::schema("memory", "row 1: missing column 'DateKey'"));
        let err = get_forecast_accuracy(&failing, &QueryConfig::default(), request(Granularity::Day, None))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SourceError>(),
            Some(SourceError::SchemaMismatch { .. })
        ));
    }
}
