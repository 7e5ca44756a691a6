use async_trait::async_trait;
use contracts::projections::p909_sales_records::dto::{SalesRecord, SeriesKind};

use super::{RecordQuery, RecordSource, SourceError};

/// Fixed record sets for service tests; `failure` makes every fetch fail.
#[derive(Default)]
pub struct MemorySource {
    pub actual: Vec<SalesRecord>,
    pub predicted: Vec<SalesRecord>,
    pub failure: Option<SourceError>,
}

impl MemorySource {
    pub fn new(actual: Vec<SalesRecord>, predicted: Vec<SalesRecord>) -> Self {
        Self {
            actual,
            predicted,
            failure: None,
        }
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(
        &self,
        series: SeriesKind,
        query: &RecordQuery,
    ) -> Result<Vec<SalesRecord>, SourceError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let records = match series {
            SeriesKind::Actual => self.actual.clone(),
            SeriesKind::Predicted => self.predicted.clone(),
        };
        Ok(query.apply(records))
    }
}
