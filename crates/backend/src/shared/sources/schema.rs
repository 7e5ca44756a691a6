use chrono::NaiveDate;
use contracts::projections::p909_sales_records::dto::SalesRecord;
use maplit::btreemap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SourceError;

/// Promotion name the warehouse uses for "no promotion".
pub const NO_PROMOTION: &str = "No Discount";

/// Storage column names for the record fields (`[columns]` in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub date: String,
    pub amount: String,
    pub quantity: String,
    pub return_quantity: String,
    pub discount_amount: String,
    pub promotion_name: String,
    /// Explicit boolean flag; wins over `promotion_name` when the column exists
    pub has_promotion: String,
    /// Dimension name -> column name
    pub dimensions: BTreeMap<String, String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            date: "DateKey".into(),
            amount: "SalesAmount".into(),
            quantity: "SalesQuantity".into(),
            return_quantity: "ReturnQuantity".into(),
            discount_amount: "DiscountAmount".into(),
            promotion_name: "PromotionName".into(),
            has_promotion: "HasPromotion".into(),
            dimensions: btreemap! {
                "continent".to_string() => "ContinentName".to_string(),
                "region".to_string() => "RegionCountryName".to_string(),
                "category".to_string() => "ProductCategoryName".to_string(),
                "product".to_string() => "ProductName".to_string(),
                "storeName".to_string() => "StoreName".to_string(),
                "storeType".to_string() => "StoreType".to_string(),
                "promotion".to_string() => "PromotionName".to_string(),
            },
        }
    }
}

/// Accepts `YYYY-MM-DD` with an optional ` HH:MM:SS` or `THH:MM:SS` suffix.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split(|c| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Finite decimals only; `NaN` and `inf` are rejected.
fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Integers, or integral floats inside the `i64` range.
fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        parse_float(raw)
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ColumnMapping {
    /// Every distinct column the mapping reads.
    pub fn columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = vec![
            self.date.as_str(),
            self.amount.as_str(),
            self.quantity.as_str(),
            self.return_quantity.as_str(),
            self.discount_amount.as_str(),
            self.promotion_name.as_str(),
            self.has_promotion.as_str(),
        ];
        cols.extend(self.dimensions.values().map(String::as_str));
        cols.sort_unstable();
        cols.dedup();
        cols
    }

    /// Column backing a dimension, if mapped.
    pub fn dimension_column(&self, dimension: &str) -> Option<&str> {
        self.dimensions.get(dimension).map(String::as_str)
    }

    /// Maps one storage row onto a `SalesRecord`.
    ///
    /// `get` returns the raw cell for a column name, `None` when the column is
    /// absent or the cell is null. `row` is only used in error messages.
    pub fn map_row<F>(&self, source_name: &str, row: usize, get: F) -> Result<SalesRecord, SourceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |column: &str| {
            non_empty(get(column)).ok_or_else(|| {
                SourceError::schema(source_name, format!("row {}: missing column '{}'", row, column))
            })
        };
        let invalid = |column: &str, raw: &str| {
            SourceError::schema(
                source_name,
                format!("row {}: invalid value '{}' in column '{}'", row, raw, column),
            )
        };

        let raw_date = required(&self.date)?;
        let timestamp = parse_date(&raw_date).ok_or_else(|| invalid(&self.date, &raw_date))?;

        let raw_amount = required(&self.amount)?;
        let amount = parse_float(&raw_amount).ok_or_else(|| invalid(&self.amount, &raw_amount))?;

        let optional_int = |column: &str| -> Result<i64, SourceError> {
            match non_empty(get(column)) {
                Some(raw) => parse_int(&raw).ok_or_else(|| invalid(column, &raw)),
                None => Ok(0),
            }
        };
        let quantity = optional_int(&self.quantity)?;
        let return_quantity = optional_int(&self.return_quantity)?;

        let discount_amount = match non_empty(get(&self.discount_amount)) {
            Some(raw) => parse_float(&raw).ok_or_else(|| invalid(&self.discount_amount, &raw))?,
            None => 0.0,
        };

        let has_promotion = match non_empty(get(&self.has_promotion)) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| invalid(&self.has_promotion, &raw))?,
            None => non_empty(get(&self.promotion_name))
                .map_or(false, |name| name.trim() != NO_PROMOTION),
        };

        let mut record = SalesRecord::new(timestamp, amount)
            .with_quantity(quantity)
            .with_returns(return_quantity)
            .with_discount(discount_amount)
            .with_promotion(has_promotion);
        for (dimension, column) in &self.dimensions {
            if let Some(value) = non_empty(get(column)) {
                record.dimensions.insert(dimension.clone(), value.trim().to_string());
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(cells: &[(&str, &str)]) -> HashMap<String, String> {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn map(cells: &[(&str, &str)]) -> Result<SalesRecord, SourceError> {
        let row = row(cells);
        ColumnMapping::default().map_row("test", 1, |c| row.get(c).cloned())
    }

    #[test]
    fn test_full_row() {
        let r = map(&[
            ("DateKey", "2007-01-01 00:00:00"),
            ("SalesAmount", "150.5"),
            ("SalesQuantity", "3"),
            ("ReturnQuantity", "1"),
            ("DiscountAmount", "12.25"),
            ("PromotionName", "European Spring Promotion"),
            ("RegionCountryName", "Germany"),
            ("ProductCategoryName", "Audio"),
        ])
        .unwrap();
        assert_eq!(r.timestamp, NaiveDate::from_ymd_opt(2007, 1, 1).unwrap());
        assert_eq!(r.amount, 150.5);
        assert_eq!(r.quantity, 3);
        assert_eq!(r.return_quantity, 1);
        assert_eq!(r.discount_amount, 12.25);
        assert!(r.has_promotion);
        assert_eq!(r.dimension("region"), Some("Germany"));
        assert_eq!(r.dimension("category"), Some("Audio"));
        assert_eq!(r.dimension("promotion"), Some("European Spring Promotion"));
        assert_eq!(r.dimension("storeName"), None);
    }

    #[test]
    fn test_optional_fields_default_to_zero() {
        let r = map(&[("DateKey", "2007-01-02"), ("SalesAmount", "200")]).unwrap();
        assert_eq!(r.quantity, 0);
        assert_eq!(r.return_quantity, 0);
        assert_eq!(r.discount_amount, 0.0);
        assert!(!r.has_promotion);
    }

    #[test]
    fn test_no_discount_is_not_a_promotion() {
        let r = map(&[
            ("DateKey", "2007-01-02"),
            ("SalesAmount", "200"),
            ("PromotionName", "No Discount"),
        ])
        .unwrap();
        assert!(!r.has_promotion);
    }

    #[test]
    fn test_explicit_flag_wins() {
        let r = map(&[
            ("DateKey", "2007-01-02"),
            ("SalesAmount", "200"),
            ("PromotionName", "No Discount"),
            ("HasPromotion", "true"),
        ])
        .unwrap();
        assert!(r.has_promotion);
    }

    #[test]
    fn test_missing_required_column_is_schema_mismatch() {
        let err = map(&[("DateKey", "2007-01-02")]).unwrap_err();
        assert_eq!(
            err,
            SourceError::schema("test", "row 1: missing column 'SalesAmount'")
        );
        assert!(matches!(
            map(&[("DateKey", "01/02/2007"), ("SalesAmount", "1")]),
            Err(SourceError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            map(&[("DateKey", "2007-01-02"), ("SalesAmount", "1"), ("SalesQuantity", "abc")]),
            Err(SourceError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_integral_float_quantity_accepted() {
        let r = map(&[
            ("DateKey", "2007-01-02T00:00:00"),
            ("SalesAmount", "1"),
            ("SalesQuantity", "4.0"),
            ("ReturnQuantity", "-2"),
        ])
        .unwrap();
        assert_eq!(r.quantity, 4);
        assert_eq!(r.return_quantity, -2);
    }

    #[test]
    fn test_non_finite_and_out_of_range_values_rejected() {
        for amount in ["NaN", "inf", "-infinity"] {
            let err = map(&[("DateKey", "2007-01-02"), ("SalesAmount", amount)]).unwrap_err();
            assert!(matches!(err, SourceError::SchemaMismatch { .. }));
        }
        let err = map(&[
            ("DateKey", "2007-01-02"),
            ("SalesAmount", "1"),
            ("DiscountAmount", "NaN"),
        ])
        .unwrap_err();
        assert!(matches!(err, SourceError::SchemaMismatch { .. }));

        for quantity in ["1e300", "-1e19", "9.3e18"] {
            let err = map(&[
                ("DateKey", "2007-01-02"),
                ("SalesAmount", "1"),
                ("SalesQuantity", quantity),
            ])
            .unwrap_err();
            assert!(matches!(err, SourceError::SchemaMismatch { .. }));
        }
        assert_eq!(parse_int("1e3"), Some(1000));
    }

    #[test]
    fn test_columns_deduplicated() {
        let mapping = ColumnMapping::default();
        let cols = mapping.columns();
        assert_eq!(cols.iter().filter(|c| **c == "PromotionName").count(), 1);
        assert!(cols.contains(&"DateKey"));
    }
}
