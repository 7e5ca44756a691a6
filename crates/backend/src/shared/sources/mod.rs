pub mod local_file;
pub mod rest_api;
pub mod schema;
pub mod warehouse;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use contracts::projections::p909_sales_records::dto::{SalesRecord, SeriesKind};
use contracts::shared::period::quarter_of_month;
use contracts::shared::sales_query::SalesQuery;
use contracts::shared::time_filter::TimeFilterSelection;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

use crate::shared::analytics::filter_resolver::anchored_week;
use crate::shared::config::{Config, DataSourceKind};

/// Fetch-boundary failures. Both are fatal to the calling request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },
    #[error("schema mismatch in source '{source_name}': {reason}")]
    SchemaMismatch { source_name: String, reason: String },
}

impl SourceError {
    pub fn unavailable(source_name: &str, reason: impl Display) -> Self {
        SourceError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(source_name: &str, reason: impl Display) -> Self {
        SourceError::SchemaMismatch {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Filters handed to a source. Adapters may push any part of it down to
/// the backend, but must return only records for which `matches` holds.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    /// Inclusive
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    pub dimension_filters: BTreeMap<String, String>,
    pub time_filter: TimeFilterSelection,
    pub promotion_only: bool,
    /// Cap applied after filtering
    pub max_rows: Option<usize>,
}

impl RecordQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            dimension_filters: BTreeMap::new(),
            time_filter: TimeFilterSelection::default(),
            promotion_only: false,
            max_rows: None,
        }
    }

    pub fn from_sales_query(query: &SalesQuery, max_rows: Option<usize>) -> Self {
        Self {
            start_date: query.start_date,
            end_date: query.end_date,
            dimension_filters: query.dimension_filters.clone(),
            time_filter: query.time_filter,
            promotion_only: query.promotion_only,
            max_rows,
        }
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        let date = record.timestamp;
        if date < self.start_date || date > self.end_date {
            return false;
        }

        let tf = &self.time_filter;
        if tf.year.map_or(false, |y| date.year() != y) {
            return false;
        }
        // a week within a year wins over month and quarter, as in the resolver
        match tf.year.zip(tf.week) {
            Some((year, week)) => match anchored_week(year, week) {
                Some((start, end)) if date >= start && date <= end => {}
                _ => return false,
            },
            None => {
                if tf.quarter.map_or(false, |q| quarter_of_month(date.month()) != q)
                    || tf.month.map_or(false, |m| date.month() != m)
                    || tf.week.map_or(false, |w| date.iso_week().week() != w)
                {
                    return false;
                }
            }
        }

        if self.promotion_only && !record.has_promotion {
            return false;
        }

        self.dimension_filters
            .iter()
            .all(|(name, value)| record.dimension(name) == Some(value.as_str()))
    }

    /// Keeps matching records and truncates to `max_rows`.
    pub fn apply(&self, records: Vec<SalesRecord>) -> Vec<SalesRecord> {
        let mut kept: Vec<SalesRecord> = records.into_iter().filter(|r| self.matches(r)).collect();
        if let Some(max) = self.max_rows {
            if kept.len() > max {
                tracing::warn!("result truncated from {} to {} records", kept.len(), max);
                kept.truncate(max);
            }
        }
        kept
    }
}

/// Backend holding the actual and predicted sales series.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Records of one series within `[start_date, end_date]`. An empty result
    /// is not an error.
    async fn fetch(
        &self,
        series: SeriesKind,
        query: &RecordQuery,
    ) -> Result<Vec<SalesRecord>, SourceError>;
}

/// Builds the adapter selected by `[data_source] kind`.
pub async fn build_source(config: &Config) -> anyhow::Result<Arc<dyn RecordSource>> {
    let columns = config.columns.clone();
    let source: Arc<dyn RecordSource> = match config.data_source.kind {
        DataSourceKind::Warehouse => {
            Arc::new(warehouse::WarehouseSource::connect(&config.warehouse, columns).await?)
        }
        DataSourceKind::RestApi => Arc::new(rest_api::RestApiSource::new(&config.rest_api, columns)?),
        DataSourceKind::LocalFile => Arc::new(local_file::LocalFileSource::new(&config.local_file, columns)),
    };
    tracing::info!("Record source: {}", source.name());
    Ok(source)
}
