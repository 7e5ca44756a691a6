pub mod p909_sales_records;
