//! MySQL executor over a `sqlx` pool.

use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlColumn, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, MySql, Row as _, TypeInfo};
use sqlgate_core::mutation::audit::DATETIME_FORMAT;
use sqlgate_core::{CompiledQuery, Error, ExecOutcome, Executor, Row, Scalar};
use tracing::debug;

use crate::config::GatewayConfig;

/// Executes compiled statements against MySQL.
///
/// Every statement acquires its own pooled connection for the duration of
/// the call; batches run inside one transaction that rolls back on drop.
#[derive(Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    /// Wrap an existing pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Open a pool using the gateway configuration.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, sqlx::Error> {
        let pool = MySqlPoolOptions::new()
            .min_connections(config.pool_min_connections)
            .max_connections(config.pool_max_connections)
            .acquire_timeout(config.pool_acquire_timeout)
            .idle_timeout(Some(config.pool_idle_timeout))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn db_error(err: sqlx::Error) -> Error {
    Error::Execution(err.to_string())
}

fn bind_all<'q>(sql: &'q str, values: &'q [Scalar]) -> Query<'q, MySql, MySqlArguments> {
    values.iter().fold(sqlx::query(sql), |query, value| match value {
        Scalar::Null => query.bind(None::<String>),
        Scalar::Bool(b) => query.bind(*b),
        Scalar::Int(i) => query.bind(*i),
        Scalar::Float(f) => query.bind(*f),
        Scalar::Text(s) => query.bind(s.as_str()),
    })
}

fn decode_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_cell(row, column)))
        .collect()
}

fn bytes_to_scalar(bytes: Vec<u8>) -> Scalar {
    match String::from_utf8(bytes) {
        Ok(text) => Scalar::Text(text),
        Err(err) => Scalar::Text(hex::encode(err.into_bytes())),
    }
}

fn decode_cell(row: &MySqlRow, column: &MySqlColumn) -> Scalar {
    let idx = column.ordinal();
    let type_name = column.type_info().name();
    let decoded = match type_name {
        "BOOLEAN" => row.try_get::<Option<bool>, _>(idx).map(|v| v.map(Scalar::Bool)),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(idx).map(|v| v.map(Scalar::Int))
        }
        name if name.ends_with("UNSIGNED") => row.try_get::<Option<u64>, _>(idx).map(|v| {
            v.map(|n| i64::try_from(n)
                .map(Scalar::Int)
                .unwrap_or_else(|_| Scalar::Text(n.to_string())))
        }),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(idx)
            .map(|v| v.map(|f| Scalar::Float(f64::from(f)))),
        "DOUBLE" => row.try_get::<Option<f64>, _>(idx).map(|v| v.map(Scalar::Float)),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .map(|v| v.map(|dt| Scalar::Text(dt.format(DATETIME_FORMAT).to_string()))),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .map(|v| v.map(|d| Scalar::Text(d.to_string()))),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(idx)
            .map(|v| v.map(|t| Scalar::Text(t.to_string()))),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .map(|v| v.map(bytes_to_scalar)),
        _ => row
            .try_get_unchecked::<Option<String>, _>(idx)
            .map(|v| v.map(Scalar::Text)),
    };

    match decoded {
        Ok(value) => value.unwrap_or(Scalar::Null),
        Err(err) => {
            debug!(column = column.name(), type_name, error = %err, "falling back to text decode");
            row.try_get_unchecked::<Option<String>, _>(idx)
                .ok()
                .flatten()
                .map(Scalar::Text)
                .unwrap_or(Scalar::Null)
        }
    }
}

#[async_trait]
impl Executor for MySqlExecutor {
    async fn fetch_all(&self, query: CompiledQuery) -> sqlgate_core::Result<Vec<Row>> {
        let rows = bind_all(&query.sql, &query.values)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn fetch_count(&self, query: CompiledQuery) -> sqlgate_core::Result<u64> {
        let row = bind_all(&query.sql, &query.values)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        let total: i64 = row.try_get("total").map_err(db_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn execute(&self, query: CompiledQuery) -> sqlgate_core::Result<ExecOutcome> {
        let result = bind_all(&query.sql, &query.values)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(ExecOutcome {
            affected_rows: result.rows_affected(),
            last_insert_id: Some(result.last_insert_id()).filter(|id| *id != 0),
        })
    }

    async fn execute_batch(&self, queries: Vec<CompiledQuery>) -> sqlgate_core::Result<Vec<ExecOutcome>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut outcomes = Vec::with_capacity(queries.len());
        for query in &queries {
            let result = bind_all(&query.sql, &query.values)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            outcomes.push(ExecOutcome {
                affected_rows: result.rows_affected(),
                last_insert_id: Some(result.last_insert_id()).filter(|id| *id != 0),
            });
        }
        tx.commit().await.map_err(db_error)?;
        debug!(statements = outcomes.len(), "batch committed");
        Ok(outcomes)
    }

    async fn ping(&self) -> sqlgate_core::Result<()> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        conn.ping().await.map_err(db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_cells() {
        assert_eq!(bytes_to_scalar(b"abc".to_vec()), Scalar::from("abc"));
        assert_eq!(bytes_to_scalar(vec![0xff, 0x00, 0x10]), Scalar::from("ff0010"));
    }

    #[test]
    fn test_bind_all_accepts_every_scalar() {
        let values = vec![
            Scalar::Null,
            Scalar::Bool(true),
            Scalar::Int(1),
            Scalar::Float(1.5),
            Scalar::from("x"),
        ];
        let query = bind_all("SELECT ?, ?, ?, ?, ?", &values);
        assert_eq!(sqlx::Execute::sql(&query), "SELECT ?, ?, ?, ?, ?");
    }
}
