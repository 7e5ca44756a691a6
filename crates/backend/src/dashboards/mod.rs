pub mod d410_sales_rollup;
pub mod d411_forecast_accuracy;
pub mod d412_promotion_impact;
pub mod d413_period_filter;
