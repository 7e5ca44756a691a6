use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use contracts::dashboards::d413_period_filter::dto::{PeriodFilterRequest, PeriodFilterResponse};
use contracts::projections::p909_sales_records::dto::SeriesKind;
use std::collections::BTreeSet;

use crate::shared::analytics::filter_resolver::resolve;
use crate::shared::config::QueryConfig;
use crate::shared::sources::{RecordQuery, RecordSource};

/// Data window for the filter options: the request's bounds, each missing
/// bound taken from the configured default year.
pub fn data_window(
    config: &QueryConfig,
    request: &PeriodFilterRequest,
) -> Result<(NaiveDate, NaiveDate)> {
    let year = config.default_year;
    let start = match request.start_date {
        Some(d) => d,
        None => NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| anyhow!("invalid default year {}", year))?,
    };
    let end = match request.end_date {
        Some(d) => d,
        None => NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| anyhow!("invalid default year {}", year))?,
    };
    Ok((start, end))
}

/// Resolves the incoming time filter against the dates present in the actual
/// series.
pub async fn get_period_filter(
    source: &dyn RecordSource,
    config: &QueryConfig,
    request: PeriodFilterRequest,
) -> Result<PeriodFilterResponse> {
    let (start, end) = data_window(config, &request)?;
    // options must cover every date in the window, so the row cap is not applied
    let query = RecordQuery::new(start, end);

    let records = source.fetch(SeriesKind::Actual, &query).await?;
    let dates: Vec<NaiveDate> = records
        .iter()
        .map(|r| r.timestamp)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    tracing::debug!(
        "D413 Dashboard: {} distinct dates between {} and {}",
        dates.len(),
        start,
        end
    );

    Ok(resolve(request.view, request.selection, &dates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::dashboards::d413_period_filter::dto::{FilterAdjustment, FilterLevel};
    use contracts::projections::p909_sales_records::dto::SalesRecord;
    use contracts::shared::time_filter::{DashboardView, TimeFilterSelection};

    use crate::shared::sources::memory::MemorySource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn source() -> MemorySource {
        let mut actual: Vec<SalesRecord> = (1..=10)
            .map(|d| SalesRecord::new(date(2007, 1, d), 10.0))
            .collect();
        actual.push(SalesRecord::new(date(2007, 3, 5), 10.0));
        actual.push(SalesRecord::new(date(2007, 3, 5), 20.0));
        actual.push(SalesRecord::new(date(2008, 6, 1), 10.0));
        MemorySource::new(actual, vec![])
    }

    fn request(selection: TimeFilterSelection) -> PeriodFilterRequest {
        PeriodFilterRequest {
            start_date: None,
            end_date: None,
            view: DashboardView::Daily,
            selection,
        }
    }

    #[test]
    fn test_data_window_defaults_to_configured_year() {
        let config = QueryConfig::default();
        let window = data_window(&config, &request(TimeFilterSelection::all())).unwrap();
        assert_eq!(window, (date(2007, 1, 1), date(2007, 12, 31)));

        let mut req = request(TimeFilterSelection::all());
        req.end_date = Some(date(2008, 12, 31));
        let window = data_window(&config, &req).unwrap();
        assert_eq!(window, (date(2007, 1, 1), date(2008, 12, 31)));
    }

    #[tokio::test]
    async fn test_options_limited_to_window() {
        let response = get_period_filter(
            &source(),
            &QueryConfig::default(),
            request(TimeFilterSelection::all()),
        )
        .await
        .unwrap();
        assert_eq!(response.options.years, vec![2007]);
        assert_eq!(response.options.quarters, vec![1]);
        assert_eq!(response.options.months, vec![1, 3]);
        assert_eq!(response.date_range, None);
    }

    #[tokio::test]
    async fn test_row_cap_does_not_hide_options() {
        let config = QueryConfig {
            max_rows: 1,
            ..QueryConfig::default()
        };
        let response = get_period_filter(&source(), &config, request(TimeFilterSelection::all()))
            .await
            .unwrap();
        assert_eq!(response.options.months, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_week_forces_month() {
        let selection = TimeFilterSelection {
            year: Some(2007),
            quarter: None,
            month: Some(1),
            week: Some(10),
        };
        let response = get_period_filter(&source(), &QueryConfig::default(), request(selection))
            .await
            .unwrap();
        assert_eq!(response.selection.month, Some(3));
        assert_eq!(
            response.adjustments,
            vec![FilterAdjustment::Forced {
                level: FilterLevel::Month,
                from: Some(1),
                to: 3,
                by: FilterLevel::Week,
            }]
        );
        assert_eq!(response.date_range, Some((date(2007, 3, 5), date(2007, 3, 11))));
    }

    #[tokio::test]
    async fn test_year_outside_window_resets() {
        let selection = TimeFilterSelection {
            year: Some(2008),
            ..TimeFilterSelection::all()
        };
        let response = get_period_filter(&source(), &QueryConfig::default(), request(selection))
            .await
            .unwrap();
        assert_eq!(response.selection.year, None);
        assert_eq!(
            response.adjustments,
            vec![FilterAdjustment::ResetToAll {
                level: FilterLevel::Year,
                value: 2008,
            }]
        );
    }
}
