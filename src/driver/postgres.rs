//! PostgreSQL driver backend over sqlx.
//!
//! The wire protocol delivers one statement's worth of rows followed by a
//! completion tag, so the adapter materializes the whole execution up front
//! and then replays it through the outcome-cursor protocol.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Either, Row, TypeInfo};
use std::time::Duration;
use tracing::debug;

use super::{
    DriverConnection, DriverError, DriverResult, DriverStatement, PlaceholderStyle, RawResultSet,
};
use crate::error::{BridgeError, Result};
use crate::value::Value;

/// PostgreSQL connection backed by a sqlx pool.
#[derive(Debug)]
pub struct PostgresDriver {
    pool: PgPool,
}

impl PostgresDriver {
    /// Connects to the database at the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|e| BridgeError::connection(e.to_string()))?;
        debug!("connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wraps an existing pool. Primarily useful for testing.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverConnection for PostgresDriver {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    async fn prepare(&self, sql: &str) -> DriverResult<Box<dyn DriverStatement>> {
        Ok(Box::new(PostgresStatement::new(
            self.pool.clone(),
            Some(sql.to_string()),
        )))
    }

    async fn create_statement(&self) -> DriverResult<Box<dyn DriverStatement>> {
        Ok(Box::new(PostgresStatement::new(self.pool.clone(), None)))
    }

    async fn close(&self) -> DriverResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// A parameter staged for the next execution.
enum PgBound {
    Null,
    Int(i32),
    Long(i64),
    Decimal(Decimal),
    Bool(bool),
    Text(String),
}

enum PgOutcome {
    Rows(RawResultSet),
    Update(u64),
}

struct PostgresStatement {
    pool: PgPool,
    sql: Option<String>,
    binds: Vec<PgBound>,
    outcomes: VecDeque<PgOutcome>,
    current: Option<PgOutcome>,
}

impl PostgresStatement {
    fn new(pool: PgPool, sql: Option<String>) -> Self {
        Self {
            pool,
            sql,
            binds: Vec::new(),
            outcomes: VecDeque::new(),
            current: None,
        }
    }

    fn push_bind(&mut self, position: usize, bound: PgBound) -> DriverResult<()> {
        if position != self.binds.len() + 1 {
            return Err(DriverError::new(format!(
                "out-of-order bind: position {position}, expected {}",
                self.binds.len() + 1
            )));
        }
        self.binds.push(bound);
        Ok(())
    }

    async fn run(&mut self, sql: &str) -> DriverResult<bool> {
        let pool = self.pool.clone();
        let mut collected: Vec<PgOutcome> = Vec::new();
        {
            let mut query = sqlx::query(sql);
            for bound in &self.binds {
                query = match bound {
                    // An untyped NULL; the server infers the slot's type.
                    PgBound::Null => query.bind(None::<String>),
                    PgBound::Int(v) => query.bind(*v),
                    PgBound::Long(v) => query.bind(*v),
                    PgBound::Decimal(v) => query.bind(*v),
                    PgBound::Bool(v) => query.bind(*v),
                    PgBound::Text(v) => query.bind(v.clone()),
                };
            }

            let mut stream = query.fetch_many(&pool);
            let mut pending: Option<(Vec<String>, Vec<Vec<Value>>)> = None;
            while let Some(step) = stream.next().await {
                match step.map_err(|e| DriverError::new(e.to_string()))? {
                    Either::Right(row) => {
                        let entry =
                            pending.get_or_insert_with(|| (column_labels(&row), Vec::new()));
                        entry.1.push(convert_row(&row));
                    }
                    Either::Left(done) => match pending.take() {
                        Some((columns, rows)) => {
                            collected.push(PgOutcome::Rows(RawResultSet { columns, rows }));
                        }
                        // A completion tag with no preceding rows: an update
                        // count. A zero-row SELECT also lands here, since the
                        // tag alone cannot be told apart from a write.
                        None => collected.push(PgOutcome::Update(done.rows_affected())),
                    },
                }
            }
            if let Some((columns, rows)) = pending.take() {
                collected.push(PgOutcome::Rows(RawResultSet { columns, rows }));
            }
        }

        debug!(outcomes = collected.len(), "statement executed");
        self.outcomes = collected.into();
        self.current = self.outcomes.pop_front();
        Ok(matches!(self.current, Some(PgOutcome::Rows(_))))
    }
}

#[async_trait]
impl DriverStatement for PostgresStatement {
    fn bind_null(&mut self, position: usize) -> DriverResult<()> {
        self.push_bind(position, PgBound::Null)
    }

    fn bind_int(&mut self, position: usize, value: i32) -> DriverResult<()> {
        self.push_bind(position, PgBound::Int(value))
    }

    fn bind_long(&mut self, position: usize, value: i64) -> DriverResult<()> {
        self.push_bind(position, PgBound::Long(value))
    }

    fn bind_decimal(&mut self, position: usize, value: &str) -> DriverResult<()> {
        let decimal = value
            .parse::<Decimal>()
            .map_err(|e| DriverError::new(format!("invalid decimal literal {value:?}: {e}")))?;
        self.push_bind(position, PgBound::Decimal(decimal))
    }

    fn bind_bool(&mut self, position: usize, value: bool) -> DriverResult<()> {
        self.push_bind(position, PgBound::Bool(value))
    }

    fn bind_string(&mut self, position: usize, value: &str) -> DriverResult<()> {
        self.push_bind(position, PgBound::Text(value.to_string()))
    }

    async fn execute(&mut self) -> DriverResult<bool> {
        let sql = self
            .sql
            .clone()
            .ok_or_else(|| DriverError::new("statement was created without SQL"))?;
        self.run(&sql).await
    }

    async fn execute_sql(&mut self, sql: &str) -> DriverResult<bool> {
        self.run(sql).await
    }

    async fn result_set(&mut self) -> DriverResult<RawResultSet> {
        match &self.current {
            Some(PgOutcome::Rows(rs)) => Ok(rs.clone()),
            _ => Err(DriverError::new("no result set at cursor")),
        }
    }

    async fn more_results(&mut self) -> DriverResult<bool> {
        self.current = self.outcomes.pop_front();
        Ok(matches!(self.current, Some(PgOutcome::Rows(_))))
    }

    async fn update_count(&mut self) -> DriverResult<Option<u64>> {
        match &self.current {
            Some(PgOutcome::Update(count)) => Ok(Some(*count)),
            _ => Ok(None),
        }
    }

    async fn generated_keys(&mut self) -> DriverResult<Vec<i64>> {
        // PostgreSQL has no generated-keys channel; inserted ids come back
        // through RETURNING clauses as ordinary result sets.
        Ok(Vec::new())
    }

    async fn close(&mut self) -> DriverResult<()> {
        // Server-side resources are released with the pooled connection.
        Ok(())
    }
}

fn column_labels(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

fn convert_row(row: &PgRow) -> Vec<Value> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(i32::from(v)))
            .unwrap_or(Value::Null),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Long)
            .unwrap_or(Value::Null),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(f64::from(v)))
            .unwrap_or(Value::Null),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        // Exact decimals surface as their textual form to avoid float drift.
        "NUMERIC" | "DECIMAL" => row
            .try_get::<Option<Decimal>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),

        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),

        // Everything else decodes through its text form when possible.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
