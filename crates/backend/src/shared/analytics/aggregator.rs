use contracts::dashboards::d410_sales_rollup::dto::{
    AggregateRow, DimensionRow, MetricField, ReduceOp, Reducer, SalesKpi, SummaryStats,
};
use contracts::projections::p909_sales_records::dto::SalesRecord;
use contracts::shared::period::{Granularity, TimeBucket};
use std::collections::BTreeMap;

use super::bucketer::bucket_of;
use super::ratio::{percent_of, safe_ratio};

/// Group value used when a record lacks a requested dimension.
pub const MISSING_DIMENSION: &str = "Unknown";

fn field_value(record: &SalesRecord, field: MetricField) -> f64 {
    match field {
        MetricField::Amount => record.amount,
        MetricField::Quantity => record.quantity as f64,
        MetricField::ReturnQuantity => record.return_quantity as f64,
        MetricField::DiscountAmount => record.discount_amount,
        MetricField::NetQuantity => (record.quantity - record.return_quantity) as f64,
    }
}

fn dimension_key(record: &SalesRecord, dimension_keys: &[String]) -> Vec<String> {
    dimension_keys
        .iter()
        .map(|k| {
            record
                .dimension(k)
                .unwrap_or(MISSING_DIMENSION)
                .to_string()
        })
        .collect()
}

/// Running totals and extrema for one reducer.
#[derive(Debug, Clone, Default)]
struct FieldAccumulator {
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl FieldAccumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }
}

/// Incremental state of one group; values are aligned with the reducer list.
/// The raw totals feed the breakdown rates whatever the reducers are.
#[derive(Debug, Clone)]
struct GroupAccumulator {
    count: usize,
    values: Vec<FieldAccumulator>,
    amount: f64,
    quantity: i64,
    return_quantity: i64,
    discount_amount: f64,
}

impl GroupAccumulator {
    fn new(reducer_count: usize) -> Self {
        Self {
            count: 0,
            values: vec![FieldAccumulator::default(); reducer_count],
            amount: 0.0,
            quantity: 0,
            return_quantity: 0,
            discount_amount: 0.0,
        }
    }

    fn push(&mut self, record: &SalesRecord, reducers: &[Reducer]) {
        self.count += 1;
        self.amount += record.amount;
        self.quantity += record.quantity;
        self.return_quantity += record.return_quantity;
        self.discount_amount += record.discount_amount;
        for (acc, reducer) in self.values.iter_mut().zip(reducers) {
            if reducer.op != ReduceOp::Count {
                acc.push(field_value(record, reducer.field));
            }
        }
    }

    fn finish(&self, reducers: &[Reducer]) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        for (acc, reducer) in self.values.iter().zip(reducers) {
            let value = match reducer.op {
                ReduceOp::Sum => acc.sum,
                ReduceOp::Mean => acc.sum / self.count as f64,
                ReduceOp::Max => acc.max.unwrap_or(0.0),
                ReduceOp::Min => acc.min.unwrap_or(0.0),
                ReduceOp::Count => self.count as f64,
            };
            metrics.insert(reducer.metric_name(), value);
        }
        metrics
    }

    fn return_rate(&self) -> Option<f64> {
        percent_of(self.return_quantity as f64, self.quantity as f64)
    }

    fn discount_rate(&self) -> Option<f64> {
        percent_of(self.discount_amount, self.amount)
    }
}

/// Reduces a set of records into one metric map, as a single group.
pub fn reduce_records<'a, I>(records: I, reducers: &[Reducer]) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut acc = GroupAccumulator::new(reducers.len());
    for record in records {
        acc.push(record, reducers);
    }
    if acc.count == 0 {
        return BTreeMap::new();
    }
    acc.finish(reducers)
}

/// Rollup by (time bucket × dimension values).
///
/// Single pass over `records`. Output is one row per distinct group, ordered by
/// bucket and then by the dimension tuple. Empty input gives an empty result.
pub fn aggregate(
    records: &[SalesRecord],
    granularity: Granularity,
    dimension_keys: &[String],
    reducers: &[Reducer],
) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(TimeBucket, Vec<String>), GroupAccumulator> = BTreeMap::new();

    for record in records {
        let key = (
            bucket_of(record.timestamp, granularity),
            dimension_key(record, dimension_keys),
        );
        groups
            .entry(key)
            .or_insert_with(|| GroupAccumulator::new(reducers.len()))
            .push(record, reducers);
    }

    groups
        .into_iter()
        .map(|((bucket, dimensions), acc)| AggregateRow {
            bucket,
            dimensions,
            metrics: acc.finish(reducers),
        })
        .collect()
}

/// Rollup by dimension values only, ordered by the dimension tuple.
pub fn group_by_dimensions(
    records: &[SalesRecord],
    dimension_keys: &[String],
    reducers: &[Reducer],
) -> Vec<DimensionRow> {
    let mut groups: BTreeMap<Vec<String>, GroupAccumulator> = BTreeMap::new();

    for record in records {
        groups
            .entry(dimension_key(record, dimension_keys))
            .or_insert_with(|| GroupAccumulator::new(reducers.len()))
            .push(record, reducers);
    }

    groups
        .into_iter()
        .map(|(dimensions, acc)| DimensionRow {
            dimensions,
            metrics: acc.finish(reducers),
            return_rate: acc.return_rate(),
            discount_rate: acc.discount_rate(),
        })
        .collect()
}

/// Sort rows by `metric` descending (rows lacking it go last, ties by
/// dimension tuple) and keep the first `limit`.
pub fn rank_by_metric(
    mut rows: Vec<DimensionRow>,
    metric: &str,
    limit: Option<usize>,
) -> Vec<DimensionRow> {
    rows.sort_by(|a, b| {
        let va = a.metric(metric).unwrap_or(f64::NEG_INFINITY);
        let vb = b.metric(metric).unwrap_or(f64::NEG_INFINITY);
        vb.total_cmp(&va).then_with(|| a.dimensions.cmp(&b.dimensions))
    });
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

/// Whole-series statistics of `metric` across aggregate rows.
pub fn summary_stats(rows: &[AggregateRow], metric: &str) -> SummaryStats {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.metric(metric)).collect();
    let n = values.len();
    let total: f64 = values.iter().sum();
    let mean = safe_ratio(total, n as f64);

    let std_dev = match mean {
        Some(m) if n >= 2 => {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        }
        _ => None,
    };

    SummaryStats {
        metric: metric.to_string(),
        total,
        mean,
        max: values.iter().copied().reduce(f64::max),
        min: values.iter().copied().reduce(f64::min),
        std_dev,
        period_count: n,
    }
}

/// Headline figures: totals and the promotional share of them.
pub fn sales_kpi(records: &[SalesRecord]) -> SalesKpi {
    let mut kpi = SalesKpi::default();
    for record in records {
        kpi.total_amount += record.amount;
        kpi.total_quantity += record.quantity;
        kpi.transaction_count += 1;
        if record.has_promotion {
            kpi.promotional_amount += record.amount;
            kpi.promotional_quantity += record.quantity;
        }
    }
    kpi.promotional_share_percent = percent_of(kpi.promotional_amount, kpi.total_amount);
    kpi
}
