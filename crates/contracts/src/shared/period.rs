use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation period size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    /// Position in the Day < Week < Month < Quarter < Year hierarchy.
    pub fn rank(&self) -> u8 {
        match self {
            Granularity::Day => 0,
            Granularity::Week => 1,
            Granularity::Month => 2,
            Granularity::Quarter => 3,
            Granularity::Year => 4,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "day" | "daily" | "d" => Some(Granularity::Day),
            "week" | "weekly" | "w" => Some(Granularity::Week),
            "month" | "monthly" | "m" => Some(Granularity::Month),
            "quarter" | "quarterly" | "q" => Some(Granularity::Quarter),
            "year" | "yearly" | "y" => Some(Granularity::Year),
            _ => None,
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::Day
    }
}

/// Quarter number (1-4) for a month number (1-12).
pub fn quarter_of_month(month: u32) -> u32 {
    (month.saturating_sub(1)) / 3 + 1
}

/// A period identifier at one granularity.
///
/// `year` is the calendar year, except for weeks where it is the ISO week-year.
/// `ordinal` is day-of-year, ISO week number, month (1-12), quarter (1-4),
/// or always 1 for whole years.
///
/// Field order matters: the derived `Ord` sorts buckets of the same
/// granularity chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeBucket {
    pub granularity: Granularity,
    pub year: i32,
    pub ordinal: u32,
}

impl TimeBucket {
    pub fn new(granularity: Granularity, year: i32, ordinal: u32) -> Self {
        Self {
            granularity,
            year,
            ordinal,
        }
    }

    /// First day of the period, `None` if the ordinal is out of range.
    pub fn start_date(&self) -> Option<NaiveDate> {
        match self.granularity {
            Granularity::Day => NaiveDate::from_yo_opt(self.year, self.ordinal),
            Granularity::Week => NaiveDate::from_isoywd_opt(self.year, self.ordinal, Weekday::Mon),
            Granularity::Month => NaiveDate::from_ymd_opt(self.year, self.ordinal, 1),
            Granularity::Quarter => {
                if (1..=4).contains(&self.ordinal) {
                    NaiveDate::from_ymd_opt(self.year, (self.ordinal - 1) * 3 + 1, 1)
                } else {
                    None
                }
            }
            Granularity::Year => {
                if self.ordinal == 1 {
                    NaiveDate::from_ymd_opt(self.year, 1, 1)
                } else {
                    None
                }
            }
        }
    }

    /// Last day of the period (inclusive).
    pub fn end_date(&self) -> Option<NaiveDate> {
        let start = self.start_date()?;
        match self.granularity {
            Granularity::Day => Some(start),
            Granularity::Week => Some(start + Duration::days(6)),
            Granularity::Month => first_of_month_after(start.year(), start.month(), 1)
                .map(|d| d - Duration::days(1)),
            Granularity::Quarter => first_of_month_after(start.year(), start.month(), 3)
                .map(|d| d - Duration::days(1)),
            Granularity::Year => NaiveDate::from_ymd_opt(self.year, 12, 31),
        }
    }

    /// Human-readable key, e.g. `2007-01-01`, `2007-W01`, `2007-01`, `2007-Q1`, `2007`.
    pub fn label(&self) -> String {
        match self.granularity {
            Granularity::Day => match self.start_date() {
                Some(d) => d.format("%Y-%m-%d").to_string(),
                None => format!("{:04}-D{:03}", self.year, self.ordinal),
            },
            Granularity::Week => format!("{:04}-W{:02}", self.year, self.ordinal),
            Granularity::Month => format!("{:04}-{:02}", self.year, self.ordinal),
            Granularity::Quarter => format!("{:04}-Q{}", self.year, self.ordinal),
            Granularity::Year => format!("{:04}", self.year),
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn first_of_month_after(year: i32, month: u32, months: u32) -> Option<NaiveDate> {
    let total = year * 12 + (month as i32 - 1) + months as i32;
    NaiveDate::from_ymd_opt(total.div_euclid(12), total.rem_euclid(12) as u32 + 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds_handle_leap_years() {
        let feb = TimeBucket::new(Granularity::Month, 2008, 2);
        assert_eq!(feb.start_date(), Some(date(2008, 2, 1)));
        assert_eq!(feb.end_date(), Some(date(2008, 2, 29)));

        let dec = TimeBucket::new(Granularity::Month, 2007, 12);
        assert_eq!(dec.end_date(), Some(date(2007, 12, 31)));
    }

    #[test]
    fn test_week_start_is_iso_monday() {
        // ISO week 1 of 2008 starts on Monday 2007-12-31
        let w = TimeBucket::new(Granularity::Week, 2008, 1);
        assert_eq!(w.start_date(), Some(date(2007, 12, 31)));
        assert_eq!(w.end_date(), Some(date(2008, 1, 6)));
        assert_eq!(w.label(), "2008-W01");
    }

    #[test]
    fn test_quarter_bounds_and_labels() {
        let q4 = TimeBucket::new(Granularity::Quarter, 2009, 4);
        assert_eq!(q4.start_date(), Some(date(2009, 10, 1)));
        assert_eq!(q4.end_date(), Some(date(2009, 12, 31)));
        assert_eq!(q4.to_string(), "2009-Q4");
        assert_eq!(TimeBucket::new(Granularity::Quarter, 2009, 5).start_date(), None);
    }

    #[test]
    fn test_day_label() {
        let d = TimeBucket::new(Granularity::Day, 2007, 32);
        assert_eq!(d.label(), "2007-02-01");
    }

    #[test]
    fn test_quarter_of_month() {
        assert_eq!(quarter_of_month(1), 1);
        assert_eq!(quarter_of_month(3), 1);
        assert_eq!(quarter_of_month(4), 2);
        assert_eq!(quarter_of_month(12), 4);
    }

    #[test]
    fn test_granularity_serde_is_lowercase() {
        let json = serde_json::to_string(&Granularity::Quarter).unwrap();
        assert_eq!(json, "\"quarter\"");
        let g: Granularity = serde_json::from_str("\"week\"").unwrap();
        assert_eq!(g, Granularity::Week);
    }
}
