//! Hierarchical Year ⊇ Quarter ⊇ Month ⊇ Week time filter.
//!
//! `resolve` is a pure function of the view, the incoming selection and the
//! dates present in the data. Resolution order:
//!
//! 1. levels the view does not show are cleared;
//! 2. a year without data is reset to All;
//! 3. a week is anchored at the earliest date of the selected year carrying
//!    that ISO week number (`anchored_week`) and reset when that span has no
//!    data; its start date forces the month (week wins over a previously
//!    chosen month);
//! 4. a month without data in the year is reset to All;
//! 5. a month forces an inconsistent quarter, otherwise a quarter without data
//!    is reset to All.
//!
//! Selectable values at each level only ever list values with data inside the
//! resolved enclosing selection.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use contracts::dashboards::d413_period_filter::dto::{
    FilterAdjustment, FilterLevel, ResolvedTimeFilter, SelectableValues,
};
use contracts::shared::period::{quarter_of_month, Granularity, TimeBucket};
use contracts::shared::time_filter::{DashboardView, TimeFilterSelection};
use std::collections::BTreeSet;

fn distinct<T: Ord + Copy>(
    dates: impl Iterator<Item = NaiveDate>,
    key: impl Fn(&NaiveDate) -> T,
) -> Vec<T> {
    dates
        .map(|d| key(&d))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn iso_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the anchor's week that lies inside the anchor's calendar year.
fn week_start(anchor: NaiveDate) -> NaiveDate {
    let monday = iso_monday(anchor);
    NaiveDate::from_ymd_opt(anchor.year(), 1, 1).map_or(monday, |jan1| monday.max(jan1))
}

/// Last day of the anchor's week that lies inside the anchor's calendar year.
fn week_end(anchor: NaiveDate) -> NaiveDate {
    let sunday = iso_monday(anchor) + Duration::days(6);
    NaiveDate::from_ymd_opt(anchor.year(), 12, 31).map_or(sunday, |dec31| sunday.min(dec31))
}

/// Span of ISO week `week` inside calendar year `year`: the week containing the
/// earliest date of the year with that week number, clipped to the year.
///
/// 2008-W01 is 2008-01-01..=2008-01-06; the days 2008-12-29..=31, which also
/// carry week number 1, are not part of it.
pub fn anchored_week(year: i32, week: u32) -> Option<(NaiveDate, NaiveDate)> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let anchor = if jan1.iso_week().week() == week {
        jan1
    } else {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).filter(|d| d.year() == year)?
    };
    Some((week_start(anchor), week_end(anchor)))
}

fn reset(adjustments: &mut Vec<FilterAdjustment>, level: FilterLevel, value: i64) {
    tracing::debug!("time filter {:?}={} has no data, reset to All", level, value);
    adjustments.push(FilterAdjustment::ResetToAll { level, value });
}

pub fn resolve(
    view: DashboardView,
    selection: TimeFilterSelection,
    available: &[NaiveDate],
) -> ResolvedTimeFilter {
    let mut sel = selection;
    let mut adjustments = Vec::new();

    if !view.allows_week() && sel.week.take().is_some() {
        adjustments.push(FilterAdjustment::Cleared {
            level: FilterLevel::Week,
        });
    }
    if !view.allows_month() && sel.month.take().is_some() {
        adjustments.push(FilterAdjustment::Cleared {
            level: FilterLevel::Month,
        });
    }

    let years = distinct(available.iter().copied(), |d| d.year());
    if let Some(year) = sel.year {
        if !years.contains(&year) {
            reset(&mut adjustments, FilterLevel::Year, year as i64);
            sel.year = None;
        }
    }

    let year_scope: Vec<NaiveDate> = available
        .iter()
        .copied()
        .filter(|d| sel.year.map_or(true, |y| d.year() == y))
        .collect();

    // without a year a week number does not denote a single week
    let mut week_rules = None;
    if let Some(week) = sel.week {
        let found = match sel.year {
            Some(year) => anchored_week(year, week)
                .filter(|(start, end)| year_scope.iter().any(|d| d >= start && d <= end))
                .map(Some),
            None => year_scope
                .iter()
                .any(|d| d.iso_week().week() == week)
                .then_some(None),
        };
        match found {
            Some(span) => week_rules = span,
            None => {
                reset(&mut adjustments, FilterLevel::Week, week as i64);
                sel.week = None;
            }
        }
    }

    if let Some((start, _)) = week_rules {
        let month = start.month();
        if sel.month != Some(month) {
            adjustments.push(FilterAdjustment::Forced {
                level: FilterLevel::Month,
                from: sel.month.map(i64::from),
                to: month as i64,
                by: FilterLevel::Week,
            });
            sel.month = Some(month);
        }
    } else if let Some(month) = sel.month {
        if !year_scope.iter().any(|d| d.month() == month) {
            reset(&mut adjustments, FilterLevel::Month, month as i64);
            sel.month = None;
        }
    }

    match (sel.month, sel.quarter) {
        (Some(month), Some(quarter)) if quarter_of_month(month) != quarter => {
            let to = quarter_of_month(month);
            adjustments.push(FilterAdjustment::Forced {
                level: FilterLevel::Quarter,
                from: Some(quarter as i64),
                to: to as i64,
                by: if week_rules.is_some() {
                    FilterLevel::Week
                } else {
                    FilterLevel::Month
                },
            });
            sel.quarter = Some(to);
        }
        (None, Some(quarter)) => {
            if !year_scope
                .iter()
                .any(|d| quarter_of_month(d.month()) == quarter)
            {
                reset(&mut adjustments, FilterLevel::Quarter, quarter as i64);
                sel.quarter = None;
            }
        }
        _ => {}
    }

    let in_quarter = |d: &NaiveDate| sel.quarter.map_or(true, |q| quarter_of_month(d.month()) == q);
    let in_month = |d: &NaiveDate| sel.month.map_or(true, |m| d.month() == m);

    let options = SelectableValues {
        years,
        quarters: distinct(year_scope.iter().copied(), |d| quarter_of_month(d.month())),
        months: if view.allows_month() {
            distinct(year_scope.iter().copied().filter(in_quarter), |d| d.month())
        } else {
            vec![]
        },
        weeks: if view.allows_week() {
            distinct(
                year_scope
                    .iter()
                    .copied()
                    .filter(|d| in_quarter(d) && in_month(d)),
                |d| d.iso_week().week(),
            )
        } else {
            vec![]
        },
    };

    let date_range = date_range(&sel, week_rules);

    ResolvedTimeFilter {
        selection: sel,
        options,
        adjustments,
        date_range,
    }
}

/// Inclusive range denoted by a resolved selection; `None` without a year.
fn date_range(
    sel: &TimeFilterSelection,
    week_span: Option<(NaiveDate, NaiveDate)>,
) -> Option<(NaiveDate, NaiveDate)> {
    let year = sel.year?;
    if week_span.is_some() {
        return week_span;
    }
    let bucket = match (sel.month, sel.quarter) {
        (Some(month), _) => TimeBucket::new(Granularity::Month, year, month),
        (None, Some(quarter)) => TimeBucket::new(Granularity::Quarter, year, quarter),
        (None, None) => TimeBucket::new(Granularity::Year, year, 1),
    };
    Some((bucket.start_date()?, bucket.end_date()?))
}
