pub mod period;
pub mod sales_query;
pub mod time_filter;
