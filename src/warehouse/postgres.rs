//! PostgreSQL warehouse client.
//!
//! Lets the dashboard run against a Postgres copy of the market schema,
//! which is how it is usually developed and tested locally.

use crate::config::ConnectionConfig;
use crate::error::{DashError, Result};
use crate::warehouse::{ColumnInfo, Row, Statement, Table, Value, Warehouse, WarehouseBackend};
use async_trait::async_trait;
use bigdecimal::ToPrimitive;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::types::BigDecimal;
use sqlx::{Column as SqlxColumn, Executor, Postgres, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DEFAULT_PORT: u16 = 5432;

/// Connections kept in the pool. The dashboard issues at most a handful of
/// statements at a time.
const MAX_CONNECTIONS: u32 = 4;

const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL warehouse client.
#[derive(Debug)]
pub struct PostgresWarehouse {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresWarehouse {
    /// Opens a connection pool for the given configuration.
    pub async fn connect(config: &ConnectionConfig, query_timeout: Duration) -> Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(config.host.as_deref().unwrap_or("localhost"))
            .port(config.port.unwrap_or(DEFAULT_PORT));
        if let Some(user) = &config.user_name {
            options = options.username(user);
        }
        if let Some(password) = &config.password {
            options = options.password(password);
        }
        if let Some(database) = &config.database {
            options = options.database(database);
        }
        if let Some(schema) = config.schema.as_deref().filter(|s| !s.is_empty()) {
            options = options.options([("search_path", schema)]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(map_connection_error)?;

        debug!("Connected to Postgres");
        Ok(Self {
            pool,
            query_timeout,
        })
    }

    /// Column metadata for a statement that returned no rows.
    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match (&self.pool).describe(sql).await {
            Ok(describe) => describe
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                warn!("Could not describe empty result: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Warehouse for PostgresWarehouse {
    fn backend(&self) -> WarehouseBackend {
        WarehouseBackend::Postgres
    }

    async fn execute(&self, statement: &Statement) -> Result<Table> {
        let start = Instant::now();

        let query = statement
            .params()
            .iter()
            .fold(sqlx::query(statement.sql()), bind_value);

        let result = tokio::time::timeout(self.query_timeout, query.fetch_all(&self.pool))
            .await
            .map_err(|_| {
                DashError::query(format!(
                    "Query timed out after {} seconds",
                    self.query_timeout.as_secs()
                ))
            })?
            .map_err(|e| DashError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.describe_columns(statement.sql()).await,
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        Ok(Table::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.as_str()),
        Value::Date(d) => query.bind(*d),
        Value::Timestamp(t) => query.bind(*t),
        Value::Bytes(b) => query.bind(b.as_slice()),
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    fn get<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        row.try_get::<Option<T>, _>(index).ok().flatten()
    }

    let value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => get::<bool>(row, index).map(Value::Bool),
        "INT2" | "SMALLINT" => get::<i16>(row, index).map(|v| Value::Int(v as i64)),
        "INT4" | "INT" | "INTEGER" => get::<i32>(row, index).map(|v| Value::Int(v as i64)),
        "INT8" | "BIGINT" => get::<i64>(row, index).map(Value::Int),
        "FLOAT4" | "REAL" => get::<f32>(row, index).map(|v| Value::Float(v as f64)),
        "FLOAT8" | "DOUBLE PRECISION" => get::<f64>(row, index).map(Value::Float),
        "NUMERIC" => get::<BigDecimal>(row, index).map(|d| match d.to_f64() {
            Some(f) => Value::Float(f),
            None => Value::String(d.to_string()),
        }),
        "DATE" => get::<NaiveDate>(row, index).map(Value::Date),
        "TIMESTAMP" => get::<NaiveDateTime>(row, index).map(Value::Timestamp),
        "TIMESTAMPTZ" => {
            get::<DateTime<Utc>>(row, index).map(|t| Value::Timestamp(t.naive_utc()))
        }
        "BYTEA" => get::<Vec<u8>>(row, index).map(Value::Bytes),
        _ => get::<String>(row, index).map(Value::String),
    };

    value.unwrap_or(Value::Null)
}

/// Maps sqlx connection errors to user-facing messages.
///
/// The server's own text can echo the user or database name, so messages are
/// built from the error kind and SQLSTATE only.
fn map_connection_error(error: sqlx::Error) -> DashError {
    warn!(kind = connection_error_kind(&error), "Postgres connection failed");

    let message = match &error {
        sqlx::Error::Database(db_error) => match db_error.code().as_deref() {
            Some("28P01") | Some("28000") => {
                "Authentication failed. Check your credentials.".to_string()
            }
            Some("3D000") => "The configured database does not exist.".to_string(),
            Some("53300") => "The server has too many connections open.".to_string(),
            Some(code) => format!("The server rejected the connection (SQLSTATE {code})."),
            None => "The server rejected the connection.".to_string(),
        },
        sqlx::Error::Io(io_error) => match io_error.kind() {
            std::io::ErrorKind::ConnectionRefused => {
                "Cannot connect to the server. Check that it is running.".to_string()
            }
            std::io::ErrorKind::TimedOut => "Connection to the server timed out.".to_string(),
            _ => "Cannot reach the server. Check the host and network access.".to_string(),
        },
        sqlx::Error::PoolTimedOut => {
            "Connection to the server timed out. It may be overloaded or unreachable.".to_string()
        }
        sqlx::Error::Tls(_) => "TLS negotiation with the server failed.".to_string(),
        sqlx::Error::Configuration(_) => "The connection settings are invalid.".to_string(),
        _ => "Could not connect to the server.".to_string(),
    };
    DashError::connection(message)
}

fn connection_error_kind(error: &sqlx::Error) -> &'static str {
    match error {
        sqlx::Error::Database(_) => "database",
        sqlx::Error::Io(_) => "io",
        sqlx::Error::PoolTimedOut => "pool_timeout",
        sqlx::Error::Tls(_) => "tls",
        sqlx::Error::Configuration(_) => "configuration",
        sqlx::Error::Protocol(_) => "protocol",
        _ => "other",
    }
}

/// Formats a query error with detail and hint when Postgres provides them.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = format!("ERROR: {}", db_error.message());
    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }
    result
}
