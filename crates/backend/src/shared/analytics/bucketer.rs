use chrono::{Datelike, Duration, NaiveDate};
use contracts::shared::period::{quarter_of_month, Granularity, TimeBucket};

/// Period containing `date` at the given granularity.
///
/// Weeks use the ISO week-year, so 2007-12-31 lands in 2008-W01 and
/// 2010-01-03 in 2009-W53.
pub fn bucket_of(date: NaiveDate, granularity: Granularity) -> TimeBucket {
    match granularity {
        Granularity::Day => TimeBucket::new(granularity, date.year(), date.ordinal()),
        Granularity::Week => {
            let iso = date.iso_week();
            TimeBucket::new(granularity, iso.year(), iso.week())
        }
        Granularity::Month => TimeBucket::new(granularity, date.year(), date.month()),
        Granularity::Quarter => {
            TimeBucket::new(granularity, date.year(), quarter_of_month(date.month()))
        }
        Granularity::Year => TimeBucket::new(granularity, date.year(), 1),
    }
}

/// Bucket immediately following `bucket` at the same granularity.
pub fn next_bucket(bucket: &TimeBucket) -> Option<TimeBucket> {
    let end = bucket.end_date()?;
    let next_day = end.checked_add_signed(Duration::days(1))?;
    Some(bucket_of(next_day, bucket.granularity))
}

/// Coarser bucket the child belongs to. Membership is decided by the child's
/// start date, so a week spanning two months belongs to the month of its Monday.
pub fn parent_of(child: &TimeBucket, parent_granularity: Granularity) -> Option<TimeBucket> {
    if parent_granularity.rank() < child.granularity.rank() {
        return None;
    }
    child
        .start_date()
        .map(|start| bucket_of(start, parent_granularity))
}

/// Whether `child` belongs to `parent` under the start-date rule.
pub fn contains(parent: &TimeBucket, child: &TimeBucket) -> bool {
    parent_of(child, parent.granularity).as_ref() == Some(parent)
}

/// Ordered child buckets belonging to `parent`.
///
/// Returns an empty list when the child granularity is coarser than the
/// parent, and the parent itself when both are equal.
pub fn periods_within(parent: &TimeBucket, child_granularity: Granularity) -> Vec<TimeBucket> {
    if child_granularity.rank() > parent.granularity.rank() {
        return vec![];
    }
    if child_granularity == parent.granularity {
        return vec![*parent];
    }

    let (start, end) = match (parent.start_date(), parent.end_date()) {
        (Some(s), Some(e)) => (s, e),
        _ => return vec![],
    };

    let mut result = Vec::new();
    let mut cursor = Some(bucket_of(start, child_granularity));

    while let Some(bucket) = cursor {
        let Some(child_start) = bucket.start_date() else {
            break;
        };
        if child_start > end {
            break;
        }
        if child_start >= start {
            result.push(bucket);
        }
        cursor = next_bucket(&bucket);
    }

    result
}
