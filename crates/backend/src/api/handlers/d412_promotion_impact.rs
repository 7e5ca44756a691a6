use axum::{extract::State, http::StatusCode, Json};
use contracts::dashboards::d412_promotion_impact::dto::{
    PromotionImpactRequest, PromotionImpactResponse,
};

use super::error_status;
use crate::dashboards::d412_promotion_impact::service;
use crate::routes::AppState;

/// POST /api/d412/promotion_impact
pub async fn get_promotion_impact(
    State(state): State<AppState>,
    Json(request): Json<PromotionImpactRequest>,
) -> Result<Json<PromotionImpactResponse>, StatusCode> {
    if !request.query.is_valid_range() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match service::get_promotion_impact(state.source.as_ref(), &state.config.query, request).await {
        Ok(response) => {
            tracing::info!(
                "D412 Dashboard: {:?}, {} promoted / {} non-promoted records",
                response.status,
                response.promoted_count,
                response.non_promoted_count
            );
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("D412 Dashboard: Failed to get promotion impact: {}", e);
            Err(error_status(&e))
        }
    }
}
