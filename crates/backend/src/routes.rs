use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::shared::config::Config;
use crate::shared::sources::RecordSource;

/// Shared by all dashboard handlers.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn RecordSource>,
    pub config: Arc<Config>,
}

/// Formats a number with dot-separated thousands groups.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Logs method, path, status, latency and response size of every request.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(
                "{} {} -> {} in {}ms, body error: {}",
                method,
                uri.path(),
                parts.status.as_u16(),
                start.elapsed().as_millis(),
                e
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    tracing::info!(
        "{} {} -> {} in {}ms, {} bytes",
        method,
        uri.path(),
        parts.status.as_u16(),
        start.elapsed().as_millis(),
        format_number(bytes.len())
    );

    Response::from_parts(parts, Body::from(bytes))
}

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // SALES DASHBOARDS
        // ========================================
        .route(
            "/api/d410/sales_rollup",
            post(handlers::d410_sales_rollup::get_sales_rollup),
        )
        .route(
            "/api/d410/breakdown",
            post(handlers::d410_sales_rollup::get_breakdown),
        )
        .route(
            "/api/d411/forecast_accuracy",
            post(handlers::d411_forecast_accuracy::get_forecast_accuracy),
        )
        .route(
            "/api/d412/promotion_impact",
            post(handlers::d412_promotion_impact::get_promotion_impact),
        )
        .route(
            "/api/d413/period_filter",
            post(handlers::d413_period_filter::get_period_filter),
        )
        .layer(middleware::from_fn(request_logger))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1.000");
        assert_eq!(format_number(1234567), "1.234.567");
    }
}
