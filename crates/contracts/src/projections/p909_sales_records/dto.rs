use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which of the two parallel streams a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Actual,
    Predicted,
}

impl SeriesKind {
    pub fn code(&self) -> &'static str {
        match self {
            SeriesKind::Actual => "actual",
            SeriesKind::Predicted => "predicted",
        }
    }
}

/// One observed transaction or forecast unit.
///
/// Records are never mutated after fetch. Business invariants such as
/// `return_quantity <= quantity` are not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub timestamp: NaiveDate,
    /// Monetary value, currency already resolved by the source
    pub amount: f64,
    pub quantity: i64,
    #[serde(default)]
    pub return_quantity: i64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub has_promotion: bool,
    /// Dimension name -> value, e.g. "region" -> "Germany"
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

impl SalesRecord {
    pub fn new(timestamp: NaiveDate, amount: f64) -> Self {
        Self {
            timestamp,
            amount,
            quantity: 0,
            return_quantity: 0,
            discount_amount: 0.0,
            has_promotion: false,
            dimensions: BTreeMap::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_promotion(mut self, has_promotion: bool) -> Self {
        self.has_promotion = has_promotion;
        self
    }

    pub fn with_discount(mut self, discount_amount: f64) -> Self {
        self.discount_amount = discount_amount;
        self
    }

    pub fn with_returns(mut self, return_quantity: i64) -> Self {
        self.return_quantity = return_quantity;
        self
    }

    pub fn with_dimension(mut self, name: &str, value: &str) -> Self {
        self.dimensions.insert(name.to_string(), value.to_string());
        self
    }

    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(String::as_str)
    }
}
