use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::period::Granularity;
use super::time_filter::TimeFilterSelection;

/// Common request envelope for the sales dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesQuery {
    /// Inclusive, `YYYY-MM-DD`
    pub start_date: NaiveDate,
    /// Inclusive, `YYYY-MM-DD`
    pub end_date: NaiveDate,
    #[serde(default)]
    pub granularity: Granularity,
    /// Dimension name -> exact value. Absent dimension means "all".
    #[serde(default)]
    pub dimension_filters: BTreeMap<String, String>,
    #[serde(default)]
    pub time_filter: TimeFilterSelection,
    /// Restrict to records sold under a promotion.
    #[serde(default)]
    pub promotion_only: bool,
}

impl SalesQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, granularity: Granularity) -> Self {
        Self {
            start_date,
            end_date,
            granularity,
            dimension_filters: BTreeMap::new(),
            time_filter: TimeFilterSelection::default(),
            promotion_only: false,
        }
    }

    pub fn is_valid_range(&self) -> bool {
        self.start_date <= self.end_date
    }
}
