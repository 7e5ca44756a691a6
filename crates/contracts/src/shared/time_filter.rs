use serde::{Deserialize, Serialize};

/// Dashboard view the time filter is rendered for.
///
/// Week selection exists only in the daily view, month selection in the daily
/// and monthly views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardView {
    Daily,
    Monthly,
    Quarterly,
}

impl DashboardView {
    pub fn allows_month(&self) -> bool {
        matches!(self, DashboardView::Daily | DashboardView::Monthly)
    }

    pub fn allows_week(&self) -> bool {
        matches!(self, DashboardView::Daily)
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        DashboardView::Daily
    }
}

/// Hierarchical time filter: Year ⊇ Quarter ⊇ Month ⊇ Week.
/// `None` at any level means "All".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilterSelection {
    #[serde(default)]
    pub year: Option<i32>,
    /// 1..=4
    #[serde(default)]
    pub quarter: Option<u32>,
    /// 1..=12
    #[serde(default)]
    pub month: Option<u32>,
    /// ISO week number 1..=53
    #[serde(default)]
    pub week: Option<u32>,
}

impl TimeFilterSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.year.is_none() && self.quarter.is_none() && self.month.is_none() && self.week.is_none()
    }
}
