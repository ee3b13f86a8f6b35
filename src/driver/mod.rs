//! Database driver abstraction.
//!
//! Models the standard relational driver call sequence behind two
//! object-safe traits: create or prepare a statement, bind typed
//! parameters, execute, walk the interleaved result-set/update-count
//! outcomes, read generated keys, close. The execution core only ever
//! talks to these traits; backends plug in underneath.

mod mock;
mod postgres;

pub use mock::{BoundParam, MockConnection, ScriptedOutcome};
pub use postgres::PostgresDriver;

use async_trait::async_trait;
use thiserror::Error;

use crate::value::Value;

/// A failure reported by a driver backend.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct DriverError(String);

impl DriverError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result type for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Positional placeholder syntax understood by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `?` for every slot (JDBC/MySQL style).
    #[default]
    QuestionMark,
    /// `$1`, `$2`, ... (PostgreSQL style).
    Dollar,
}

impl PlaceholderStyle {
    /// Renders the placeholder for the given 1-based position.
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::QuestionMark => "?".to_string(),
            Self::Dollar => format!("${position}"),
        }
    }
}

/// One result set as handed over by a backend: ordered column labels plus
/// rows of cell values, before any normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// A live connection capable of producing statements.
///
/// The connection is owned exclusively by one execution for the call's
/// duration; pooling and sharing across executions live outside this crate.
#[async_trait]
pub trait DriverConnection: Send + Sync {
    /// The placeholder syntax this backend expects in prepared SQL.
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Creates a prepared statement for the given SQL. Generated-key
    /// retrieval is always requested; backends without it report no keys.
    async fn prepare(&self, sql: &str) -> DriverResult<Box<dyn DriverStatement>>;

    /// Creates a plain statement for literal SQL execution.
    async fn create_statement(&self) -> DriverResult<Box<dyn DriverStatement>>;

    /// Releases the connection.
    async fn close(&self) -> DriverResult<()>;
}

/// A statement handle with typed parameter binding and an outcome cursor.
///
/// After `execute`, the statement is positioned on the first outcome.
/// `more_results` advances the cursor; `update_count` returns `None` once
/// the driver has no further outcome to report.
#[async_trait]
pub trait DriverStatement: Send {
    fn bind_null(&mut self, position: usize) -> DriverResult<()>;
    fn bind_int(&mut self, position: usize, value: i32) -> DriverResult<()>;
    fn bind_long(&mut self, position: usize, value: i64) -> DriverResult<()>;
    /// Binds an exact decimal from its textual form.
    fn bind_decimal(&mut self, position: usize, value: &str) -> DriverResult<()>;
    fn bind_bool(&mut self, position: usize, value: bool) -> DriverResult<()>;
    fn bind_string(&mut self, position: usize, value: &str) -> DriverResult<()>;

    /// Executes the prepared SQL. Returns true if the first outcome is a
    /// result set.
    async fn execute(&mut self) -> DriverResult<bool>;

    /// Executes literal SQL on a plain statement, with generated-key
    /// retrieval requested. Returns true if the first outcome is a result
    /// set.
    async fn execute_sql(&mut self, sql: &str) -> DriverResult<bool>;

    /// Returns the result set at the current cursor position.
    async fn result_set(&mut self) -> DriverResult<RawResultSet>;

    /// Advances to the next outcome. Returns true if it is a result set.
    async fn more_results(&mut self) -> DriverResult<bool>;

    /// The update count at the current cursor position, or `None` when the
    /// current outcome is a result set or the cursor is exhausted.
    async fn update_count(&mut self) -> DriverResult<Option<u64>>;

    /// Keys generated by the statement's writes, in order. Empty when the
    /// backend provides none.
    async fn generated_keys(&mut self) -> DriverResult<Vec<i64>>;

    /// Releases the statement.
    async fn close(&mut self) -> DriverResult<()>;
}
