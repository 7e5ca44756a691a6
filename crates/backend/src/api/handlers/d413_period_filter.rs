use axum::{extract::State, http::StatusCode, Json};
use contracts::dashboards::d413_period_filter::dto::{PeriodFilterRequest, PeriodFilterResponse};

use super::error_status;
use crate::dashboards::d413_period_filter::service;
use crate::routes::AppState;

/// POST /api/d413/period_filter
pub async fn get_period_filter(
    State(state): State<AppState>,
    Json(request): Json<PeriodFilterRequest>,
) -> Result<Json<PeriodFilterResponse>, StatusCode> {
    if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
        if start > end {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    match service::get_period_filter(state.source.as_ref(), &state.config.query, request).await {
        Ok(response) => {
            tracing::info!(
                "D413 Dashboard: Resolved {:?} with {} adjustments",
                response.selection,
                response.adjustments.len()
            );
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("D413 Dashboard: Failed to resolve period filter: {}", e);
            Err(error_status(&e))
        }
    }
}
