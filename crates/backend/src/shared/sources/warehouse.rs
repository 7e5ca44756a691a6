use async_trait::async_trait;
use contracts::projections::p909_sales_records::dto::{SalesRecord, SeriesKind};
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement, Value};
use std::collections::BTreeSet;

use super::schema::ColumnMapping;
use super::{RecordQuery, RecordSource, SourceError};
use crate::shared::config::WarehouseConfig;

const SOURCE_NAME: &str = "warehouse";

/// Fact tables reached through a sea-orm connection. Every mapped column is
/// selected as text and parsed by the column mapping.
pub struct WarehouseSource {
    conn: DatabaseConnection,
    actuals_table: String,
    predictions_table: String,
    columns: ColumnMapping,
}

fn db_error(e: DbErr) -> SourceError {
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => SourceError::unavailable(SOURCE_NAME, e),
        other => SourceError::schema(SOURCE_NAME, other),
    }
}

fn quote(backend: DatabaseBackend, ident: &str) -> String {
    match backend {
        DatabaseBackend::MySql => format!("`{}`", ident.replace('`', "``")),
        _ => format!("\"{}\"", ident.replace('"', "\"\"")),
    }
}

fn placeholder(backend: DatabaseBackend, index: usize) -> String {
    match backend {
        DatabaseBackend::Postgres => format!("${}", index),
        _ => "?".to_string(),
    }
}

impl WarehouseSource {
    pub async fn connect(config: &WarehouseConfig, columns: ColumnMapping) -> Result<Self, SourceError> {
        tracing::info!("Connecting to warehouse");
        let conn = Database::connect(&config.url)
            .await
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, e))?;
        Ok(Self::with_connection(conn, config, columns))
    }

    pub fn with_connection(conn: DatabaseConnection, config: &WarehouseConfig, columns: ColumnMapping) -> Self {
        Self {
            conn,
            actuals_table: config.actuals_table.clone(),
            predictions_table: config.predictions_table.clone(),
            columns,
        }
    }

    fn table(&self, series: SeriesKind) -> &str {
        match series {
            SeriesKind::Actual => &self.actuals_table,
            SeriesKind::Predicted => &self.predictions_table,
        }
    }

    /// Column names of `table`; empty when the table does not exist.
    async fn table_columns(&self, table: &str) -> Result<BTreeSet<String>, SourceError> {
        let backend = self.conn.get_database_backend();
        let sql = match backend {
            DatabaseBackend::Sqlite => "SELECT name FROM pragma_table_info(?)".to_string(),
            _ => format!(
                "SELECT column_name AS name FROM information_schema.columns WHERE table_name = {}",
                placeholder(backend, 1)
            ),
        };
        let rows = self
            .conn
            .query_all(Statement::from_sql_and_values(
                backend,
                &sql,
                [Value::from(table.to_string())],
            ))
            .await
            .map_err(db_error)?;

        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<String>("", "name").ok())
            .collect())
    }

    /// SELECT over the mapped columns present in the table, with the date
    /// range and mapped dimension filters pushed down.
    fn select_statement(&self, table: &str, present: &BTreeSet<String>, query: &RecordQuery) -> (Vec<String>, Statement) {
        let backend = self.conn.get_database_backend();
        let selected: Vec<String> = self
            .columns
            .columns()
            .into_iter()
            .filter(|c| present.contains(*c))
            .map(str::to_string)
            .collect();

        let projection = selected
            .iter()
            .map(|c| format!("CAST({q} AS TEXT) AS {q}", q = quote(backend, c)))
            .collect::<Vec<_>>()
            .join(", ");

        let date_col = quote(backend, &self.columns.date);
        let mut values = vec![
            Value::from(query.start_date.format("%Y-%m-%d").to_string()),
            Value::from(query.end_date.format("%Y-%m-%d").to_string()),
        ];
        let mut conditions = vec![format!(
            "substr(CAST({d} AS TEXT), 1, 10) BETWEEN {} AND {}",
            placeholder(backend, 1),
            placeholder(backend, 2),
            d = date_col
        )];

        for (dimension, value) in &query.dimension_filters {
            if let Some(column) = self.columns.dimension_column(dimension) {
                if present.contains(column) {
                    values.push(Value::from(value.clone()));
                    conditions.push(format!(
                        "{} = {}",
                        quote(backend, column),
                        placeholder(backend, values.len())
                    ));
                }
            }
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            projection,
            quote(backend, table),
            conditions.join(" AND "),
            date_col
        );
        tracing::debug!("Warehouse query: {}", sql);
        (selected, Statement::from_sql_and_values(backend, &sql, values))
    }
}

#[async_trait]
impl RecordSource for WarehouseSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(
        &self,
        series: SeriesKind,
        query: &RecordQuery,
    ) -> Result<Vec<SalesRecord>, SourceError> {
        let table = self.table(series);
        let present = self.table_columns(table).await?;
        if present.is_empty() {
            return Err(SourceError::schema(SOURCE_NAME, format!("table '{}' not found", table)));
        }
        if !present.contains(&self.columns.date) || !present.contains(&self.columns.amount) {
            return Err(SourceError::schema(
                SOURCE_NAME,
                format!(
                    "table '{}' lacks required columns '{}' and '{}'",
                    table, self.columns.date, self.columns.amount
                ),
            ));
        }

        let (selected, statement) = self.select_statement(table, &present, query);
        let rows = self.conn.query_all(statement).await.map_err(db_error)?;

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let record = self.columns.map_row(SOURCE_NAME, index + 1, |name| {
                if selected.iter().any(|c| c == name) {
                    row.try_get::<Option<String>>("", name).ok().flatten()
                } else {
                    None
                }
            })?;
            records.push(record);
        }

        let total = records.len();
        let kept = query.apply(records);
        tracing::info!(
            "Warehouse: {} {} records from {} ({} fetched)",
            kept.len(),
            series.code(),
            table,
            total
        );
        Ok(kept)
    }
}
