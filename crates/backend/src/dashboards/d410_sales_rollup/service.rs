use anyhow::Result;
use contracts::dashboards::d410_sales_rollup::dto::{
    BreakdownRequest, BreakdownResponse, SalesRollupRequest, SalesRollupResponse,
};
use contracts::projections::p909_sales_records::dto::SeriesKind;

use crate::shared::analytics::aggregator::{
    aggregate, group_by_dimensions, rank_by_metric, sales_kpi, summary_stats,
};
use crate::shared::config::QueryConfig;
use crate::shared::sources::{RecordQuery, RecordSource};

/// Rollup of one series by (bucket × dimensions) with summary and KPIs
pub async fn get_sales_rollup(
    source: &dyn RecordSource,
    config: &QueryConfig,
    request: SalesRollupRequest,
) -> Result<SalesRollupResponse> {
    let query = RecordQuery::from_sales_query(&request.query, config.row_cap());
    let records = source.fetch(request.series, &query).await?;
    let granularity = request.query.granularity;

    let rows = aggregate(&records, granularity, &request.dimension_keys, &request.reducers);

    // summary is taken over time buckets only, regardless of dimension keys
    let summary = request.reducers.first().map(|reducer| {
        let series = aggregate(&records, granularity, &[], &[*reducer]);
        summary_stats(&series, &reducer.metric_name())
    });

    Ok(SalesRollupResponse {
        granularity,
        dimension_keys: request.dimension_keys,
        rows,
        summary,
        kpi: sales_kpi(&records),
    })
}

/// Dimension-only breakdown (category, store, region performance, top products)
pub async fn get_breakdown(
    source: &dyn RecordSource,
    config: &QueryConfig,
    request: BreakdownRequest,
) -> Result<BreakdownResponse> {
    let query = RecordQuery::from_sales_query(&request.query, config.row_cap());
    let records = source.fetch(SeriesKind::Actual, &query).await?;

    let rows = group_by_dimensions(&records, &request.dimension_keys, &request.reducers);
    let sort_by = request
        .sort_by
        .clone()
        .or_else(|| request.reducers.first().map(|r| r.metric_name()));
    let rows = match sort_by {
        Some(metric) => rank_by_metric(rows, &metric, request.limit),
        None => rows,
    };

    Ok(BreakdownResponse {
        dimension_keys: request.dimension_keys,
        rows,
    })
}
