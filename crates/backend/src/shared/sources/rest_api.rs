use async_trait::async_trait;
use contracts::projections::p909_sales_records::dto::{SalesRecord, SeriesKind};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::schema::ColumnMapping;
use super::{RecordQuery, RecordSource, SourceError};
use crate::shared::config::RestApiConfig;

const SOURCE_NAME: &str = "rest_api";

/// HTTP client for the sales REST API
/// (`{base_url}/api/{version}/sales/actuals` and `.../predictions`).
pub struct RestApiSource {
    client: reqwest::Client,
    base_url: String,
    version: String,
    api_key: Option<String>,
    columns: ColumnMapping,
}

impl RestApiSource {
    pub fn new(config: &RestApiConfig, columns: ColumnMapping) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            columns,
        })
    }

    pub fn endpoint(&self, series: SeriesKind) -> String {
        let path = match series {
            SeriesKind::Actual => "actuals",
            SeriesKind::Predicted => "predictions",
        };
        format!("{}/api/{}/sales/{}", self.base_url, self.version, path)
    }
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Maps a response body onto records. Accepts a bare array or an object with
/// a `data` array.
pub fn records_from_json(body: &Value, columns: &ColumnMapping) -> Result<Vec<SalesRecord>, SourceError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Err(SourceError::schema(SOURCE_NAME, "response object has no 'data' array")),
        },
        _ => return Err(SourceError::schema(SOURCE_NAME, "response body is not an array")),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let row = index + 1;
            let object = item
                .as_object()
                .ok_or_else(|| SourceError::schema(SOURCE_NAME, format!("row {}: not an object", row)))?;
            columns.map_row(SOURCE_NAME, row, |name| object.get(name).and_then(cell_text))
        })
        .collect()
}

#[async_trait]
impl RecordSource for RestApiSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(
        &self,
        series: SeriesKind,
        query: &RecordQuery,
    ) -> Result<Vec<SalesRecord>, SourceError> {
        let url = self.endpoint(series);
        // row cap applies after local filtering, so it is not sent upstream
        let params = [
            ("start_date", query.start_date.format("%Y-%m-%d").to_string()),
            ("end_date", query.end_date.format("%Y-%m-%d").to_string()),
        ];

        tracing::info!(
            "REST API: GET {} ({}..{}, auth={})",
            url,
            query.start_date,
            query.end_date,
            if self.api_key.is_some() { "bearer" } else { "none" }
        );

        let mut request = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = format!("HTTP {} from {}: {}", status, url, body);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SourceError::unavailable(SOURCE_NAME, format!("authentication rejected, {}", reason))
                }
                s if s.is_server_error() => SourceError::unavailable(SOURCE_NAME, reason),
                _ => SourceError::schema(SOURCE_NAME, reason),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::schema(SOURCE_NAME, format!("invalid JSON from {}: {}", url, e)))?;

        let records = records_from_json(&body, &self.columns)?;
        let total = records.len();
        let kept = query.apply(records);
        tracing::info!("REST API: {} {} records ({} received)", kept.len(), series.code(), total);
        Ok(kept)
    }
}
