use axum::{extract::State, http::StatusCode, Json};
use contracts::dashboards::d411_forecast_accuracy::dto::{
    ForecastAccuracyRequest, ForecastAccuracyResponse,
};

use super::error_status;
use crate::dashboards::d411_forecast_accuracy::service;
use crate::routes::AppState;

/// POST /api/d411/forecast_accuracy
pub async fn get_forecast_accuracy(
    State(state): State<AppState>,
    Json(request): Json<ForecastAccuracyRequest>,
) -> Result<Json<ForecastAccuracyResponse>, StatusCode> {
    if !request.query.is_valid_range() {
        return Err(StatusCode::BAD_REQUEST);
    }

    tracing::info!(
        "D411 Dashboard: Comparing actual vs predicted {}..{} by {:?}",
        request.query.start_date,
        request.query.end_date,
        request.query.granularity
    );

    match service::get_forecast_accuracy(state.source.as_ref(), &state.config.query, request).await
    {
        Ok(response) => {
            tracing::info!(
                "D411 Dashboard: {} buckets, {} scored, MAPE {:?}",
                response.rows.len(),
                response.report.sample_count,
                response.report.mape
            );
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("D411 Dashboard: Failed to get forecast accuracy: {}", e);
            Err(error_status(&e))
        }
    }
}
