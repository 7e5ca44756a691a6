use axum::{extract::State, http::StatusCode, Json};
use contracts::dashboards::d410_sales_rollup::dto::{
    BreakdownRequest, BreakdownResponse, SalesRollupRequest, SalesRollupResponse,
};

use super::error_status;
use crate::dashboards::d410_sales_rollup::service;
use crate::routes::AppState;

/// POST /api/d410/sales_rollup
pub async fn get_sales_rollup(
    State(state): State<AppState>,
    Json(request): Json<SalesRollupRequest>,
) -> Result<Json<SalesRollupResponse>, StatusCode> {
    if !request.query.is_valid_range() {
        tracing::warn!(
            "D410 Dashboard: Invalid range {} > {}",
            request.query.start_date,
            request.query.end_date
        );
        return Err(StatusCode::BAD_REQUEST);
    }

    tracing::info!(
        "D410 Dashboard: Rolling up {} series {}..{} by {:?}",
        request.series.code(),
        request.query.start_date,
        request.query.end_date,
        request.query.granularity
    );

    match service::get_sales_rollup(state.source.as_ref(), &state.config.query, request).await {
        Ok(response) => {
            tracing::info!("D410 Dashboard: Returning {} rows", response.rows.len());
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("D410 Dashboard: Failed to get sales rollup: {}", e);
            Err(error_status(&e))
        }
    }
}

/// POST /api/d410/breakdown
pub async fn get_breakdown(
    State(state): State<AppState>,
    Json(request): Json<BreakdownRequest>,
) -> Result<Json<BreakdownResponse>, StatusCode> {
    if !request.query.is_valid_range() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match service::get_breakdown(state.source.as_ref(), &state.config.query, request).await {
        Ok(response) => {
            tracing::info!(
                "D410 Dashboard: Returning {} breakdown rows by {:?}",
                response.rows.len(),
                response.dimension_keys
            );
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("D410 Dashboard: Failed to get breakdown: {}", e);
            Err(error_status(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::dashboards::d410_sales_rollup::dto::Reducer;
    use contracts::projections::p909_sales_records::dto::{SalesRecord, SeriesKind};
    use contracts::shared::period::Granularity;
    use contracts::shared::sales_query::SalesQuery;
    use std::sync::Arc;

    use crate::shared::config::Config;
    use crate::shared::sources::memory::MemorySource;
    use crate::shared::sources::SourceError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state(source: MemorySource) -> AppState {
        AppState {
            source: Arc::new(source),
            config: Arc::new(Config::default()),
        }
    }

    fn request(start: NaiveDate, end: NaiveDate) -> SalesRollupRequest {
        SalesRollupRequest {
            query: SalesQuery::new(start, end, Granularity::Month),
            dimension_keys: vec![],
            reducers: Reducer::defaults(),
            series: SeriesKind::Actual,
        }
    }

    #[tokio::test]
    async fn test_rollup_ok() {
        let source = MemorySource::new(vec![SalesRecord::new(date(2007, 1, 5), 10.0)], vec![]);
        let Json(response) = get_sales_rollup(
            State(state(source)),
            Json(request(date(2007, 1, 1), date(2007, 12, 31))),
        )
        .await
        .unwrap();
        assert_eq!(response.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_inverted_range_is_bad_request() {
        let status = get_sales_rollup(
            State(state(MemorySource::default())),
            Json(request(date(2007, 2, 1), date(2007, 1, 1))),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unavailable_source_is_503() {
        let failing = MemorySource::failing(SourceError::unavailable("memory", "down"));
        let status = get_sales_rollup(
            State(state(failing)),
            Json(request(date(2007, 1, 1), date(2007, 1, 31))),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
