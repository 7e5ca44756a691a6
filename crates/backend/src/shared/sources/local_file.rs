use async_trait::async_trait;
use contracts::projections::p909_sales_records::dto::{SalesRecord, SeriesKind};
use std::path::PathBuf;

use super::schema::ColumnMapping;
use super::{RecordQuery, RecordSource, SourceError};
use crate::shared::config::{resolve_data_path, LocalFileConfig};

const SOURCE_NAME: &str = "local_file";

/// Two CSV files with a header row, one per series.
pub struct LocalFileSource {
    actuals_path: PathBuf,
    predictions_path: PathBuf,
    columns: ColumnMapping,
}

impl LocalFileSource {
    pub fn new(config: &LocalFileConfig, columns: ColumnMapping) -> Self {
        Self {
            actuals_path: resolve_data_path(&config.actuals_path),
            predictions_path: resolve_data_path(&config.predictions_path),
            columns,
        }
    }

    fn path(&self, series: SeriesKind) -> &PathBuf {
        match series {
            SeriesKind::Actual => &self.actuals_path,
            SeriesKind::Predicted => &self.predictions_path,
        }
    }
}

/// Parses CSV text. Header lookup is case-insensitive; row numbers in errors
/// are 1-based data rows.
pub fn records_from_csv(text: &str, columns: &ColumnMapping) -> Result<Vec<SalesRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SourceError::schema(SOURCE_NAME, format!("failed to read CSV headers: {}", e)))?
        .clone();

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let line = result
            .map_err(|e| SourceError::schema(SOURCE_NAME, format!("row {}: {}", row, e)))?;
        let record = columns.map_row(SOURCE_NAME, row, |name| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .and_then(|i| line.get(i))
                .map(str::to_string)
        })?;
        records.push(record);
    }
    Ok(records)
}

#[async_trait]
impl RecordSource for LocalFileSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(
        &self,
        series: SeriesKind,
        query: &RecordQuery,
    ) -> Result<Vec<SalesRecord>, SourceError> {
        let path = self.path(series);
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            SourceError::unavailable(SOURCE_NAME, format!("cannot read {}: {}", path.display(), e))
        })?;

        let records = records_from_csv(&text, &self.columns)?;
        let total = records.len();
        let kept = query.apply(records);
        tracing::info!(
            "{}: {} {} records ({} in file)",
            SOURCE_NAME,
            kept.len(),
            series.code(),
            total
        );
        Ok(kept)
    }
}
