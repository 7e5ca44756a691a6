use anyhow::Result;
use contracts::dashboards::d412_promotion_impact::dto::{
    PromotionImpactRequest, PromotionImpactResponse, PromotionImpactStatus,
};
use contracts::projections::p909_sales_records::dto::SeriesKind;

use crate::shared::analytics::promotion::{analyze, partition_counts, promotion_breakdown};
use crate::shared::config::QueryConfig;
use crate::shared::sources::{RecordQuery, RecordSource};

/// Promoted vs non-promoted lift over the actual series.
///
/// An empty partition is reported through `status`, not as an error.
pub async fn get_promotion_impact(
    source: &dyn RecordSource,
    config: &QueryConfig,
    request: PromotionImpactRequest,
) -> Result<PromotionImpactResponse> {
    let mut query = RecordQuery::from_sales_query(&request.query, config.row_cap());
    // both partitions are needed
    query.promotion_only = false;

    let records = source.fetch(SeriesKind::Actual, &query).await?;
    let (promoted_count, non_promoted_count) = partition_counts(&records);

    let (status, rows) = match analyze(&records, &request.metrics) {
        Ok(rows) => (PromotionImpactStatus::Ok, rows),
        Err(e) => {
            tracing::warn!("D412 Dashboard: {}", e);
            (PromotionImpactStatus::InsufficientPartitionData, vec![])
        }
    };

    Ok(PromotionImpactResponse {
        status,
        promoted_count,
        non_promoted_count,
        rows,
        breakdown: promotion_breakdown(&records),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::dashboards::d412_promotion_impact::dto::PromotionMetric;
    use contracts::projections::p909_sales_records::dto::SalesRecord;
    use contracts::shared::period::Granularity;
    use contracts::shared::sales_query::SalesQuery;

    use crate::shared::sources::memory::MemorySource;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(promotion_only: bool) -> PromotionImpactRequest {
        let mut query = SalesQuery::new(date(2007, 1, 1), date(2007, 1, 31), Granularity::Day);
        query.promotion_only = promotion_only;
        PromotionImpactRequest {
            query,
            metrics: PromotionMetric::defaults(),
        }
    }

    fn source() -> MemorySource {
        MemorySource::new(
            vec![
                SalesRecord::new(date(2007, 1, 1), 100.0)
                    .with_quantity(1)
                    .with_dimension("promotion", "No Discount"),
                SalesRecord::new(date(2007, 1, 1), 150.0)
                    .with_quantity(3)
                    .with_promotion(true)
                    .with_dimension("promotion", "European Spring Promotion"),
                SalesRecord::new(date(2007, 1, 2), 200.0)
                    .with_quantity(1)
                    .with_dimension("promotion", "No Discount"),
            ],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_promotion_impact() {
        let response = get_promotion_impact(&source(), &QueryConfig::default(), request(false))
            .await
            .unwrap();

        assert_eq!(response.status, PromotionImpactStatus::Ok);
        assert_eq!(response.promoted_count, 1);
        assert_eq!(response.non_promoted_count, 2);

        let amount = response
            .rows
            .iter()
            .find(|r| r.metric == PromotionMetric::AmountSum)
            .unwrap();
        assert_eq!(amount.promoted_value, 150.0);
        assert_eq!(amount.non_promoted_value, 300.0);
        assert_eq!(amount.lift_percent, Some(-50.0));

        let mean = response
            .rows
            .iter()
            .find(|r| r.metric == PromotionMetric::AmountMean)
            .unwrap();
        assert_eq!(mean.lift_percent, Some(0.0));

        let names: Vec<&str> = response.breakdown.iter().map(|r| r.promotion.as_str()).collect();
        assert_eq!(names, vec!["No Discount", "European Spring Promotion"]);
    }

    #[tokio::test]
    async fn test_promotion_only_flag_is_ignored() {
        let response = get_promotion_impact(&source(), &QueryConfig::default(), request(true))
            .await
            .unwrap();
        assert_eq!(response.status, PromotionImpactStatus::Ok);
        assert_eq!(response.non_promoted_count, 2);
    }

    #[tokio::test]
    async fn test_empty_partition_reports_status() {
        let source = MemorySource::new(
            vec![SalesRecord::new(date(2007, 1, 1), 100.0)],
            vec![],
        );
        let response = get_promotion_impact(&source, &QueryConfig::default(), request(false))
            .await
            .unwrap();
        assert_eq!(response.status, PromotionImpactStatus::InsufficientPartitionData);
        assert_eq!(response.promoted_count, 0);
        assert_eq!(response.non_promoted_count, 1);
        assert!(response.rows.is_empty());
        assert_eq!(response.breakdown.len(), 1);
    }
}
