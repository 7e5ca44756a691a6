// Dashboard handlers (d410-d413)
pub mod d410_sales_rollup;
pub mod d411_forecast_accuracy;
pub mod d412_promotion_impact;
pub mod d413_period_filter;

use axum::http::StatusCode;

use crate::shared::sources::SourceError;

/// Status code for a failed dashboard service call.
pub fn error_status(error: &anyhow::Error) -> StatusCode {
    match error.downcast_ref::<SourceError>() {
        Some(SourceError::SourceUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        Some(SourceError::SchemaMismatch { .. }) => StatusCode::BAD_GATEWAY,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
