use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shared::time_filter::{DashboardView, TimeFilterSelection};

/// Level of the time filter hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    Year,
    Quarter,
    Month,
    Week,
}

/// Change the resolver applied to the incoming selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterAdjustment {
    /// Level not shown in this view
    Cleared { level: FilterLevel },
    /// Selected value has no data in the enclosing scope
    ResetToAll { level: FilterLevel, value: i64 },
    /// A more specific selection forced a coarser level
    Forced {
        level: FilterLevel,
        from: Option<i64>,
        to: i64,
        by: FilterLevel,
    },
}

/// Values selectable at each level given the (resolved) enclosing selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableValues {
    pub years: Vec<i32>,
    pub quarters: Vec<u32>,
    pub months: Vec<u32>,
    pub weeks: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTimeFilter {
    pub selection: TimeFilterSelection,
    pub options: SelectableValues,
    pub adjustments: Vec<FilterAdjustment>,
    /// Inclusive date range the selection denotes, `None` when nothing is selected
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// POST /api/d413/period_filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodFilterRequest {
    /// Data window the options are computed from; defaults to the configured year
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub view: DashboardView,
    #[serde(default)]
    pub selection: TimeFilterSelection,
}

pub type PeriodFilterResponse = ResolvedTimeFilter;
