//! Scripted mock driver for testing.
//!
//! Plays back a preset sequence of outcomes through the statement cursor
//! protocol and records every bind call, so tests can assert both what was
//! sent to the driver and what came back out of the harvester.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    DriverConnection, DriverError, DriverResult, DriverStatement, PlaceholderStyle, RawResultSet,
};
use crate::value::Value;

/// One scripted outcome: a result set or an update count with its keys.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Rows(RawResultSet),
    Update { count: u64, generated_keys: Vec<i64> },
}

impl ScriptedOutcome {
    /// A result-set outcome from column labels and cell rows.
    pub fn rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self::Rows(RawResultSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// An update outcome with no generated keys.
    pub fn update(count: u64) -> Self {
        Self::Update {
            count,
            generated_keys: Vec::new(),
        }
    }

    /// An update outcome with generated keys.
    pub fn update_with_keys(count: u64, generated_keys: Vec<i64>) -> Self {
        Self::Update {
            count,
            generated_keys,
        }
    }

    fn is_rows(&self) -> bool {
        matches!(self, Self::Rows(_))
    }
}

/// A parameter as received by the driver's typed bind methods.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParam {
    Null,
    Int(i32),
    Long(i64),
    Decimal(String),
    Bool(bool),
    Text(String),
}

/// A mock connection that hands out statements playing back a script.
pub struct MockConnection {
    script: Vec<ScriptedOutcome>,
    style: PlaceholderStyle,
    fail_bind: bool,
    fail_execute: bool,
    /// Parameters bound on any statement of this connection, in bind order.
    pub bound: Arc<Mutex<Vec<BoundParam>>>,
    /// SQL strings passed to `execute_sql`.
    pub executed_sql: Arc<Mutex<Vec<String>>>,
    /// Set when `close` is called on the connection.
    pub connection_closed: Arc<AtomicBool>,
    /// Set when `close` is called on a statement.
    pub statement_closed: Arc<AtomicBool>,
}

impl MockConnection {
    /// Creates a mock connection with an empty outcome script.
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    /// Creates a mock connection replaying the given outcomes in order.
    pub fn with_script(script: Vec<ScriptedOutcome>) -> Self {
        Self {
            script,
            style: PlaceholderStyle::QuestionMark,
            fail_bind: false,
            fail_execute: false,
            bound: Arc::new(Mutex::new(Vec::new())),
            executed_sql: Arc::new(Mutex::new(Vec::new())),
            connection_closed: Arc::new(AtomicBool::new(false)),
            statement_closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Overrides the placeholder style reported to the resolver.
    pub fn with_style(mut self, style: PlaceholderStyle) -> Self {
        self.style = style;
        self
    }

    /// Makes every bind call fail.
    pub fn failing_bind(mut self) -> Self {
        self.fail_bind = true;
        self
    }

    /// Makes every execute call fail.
    pub fn failing_execute(mut self) -> Self {
        self.fail_execute = true;
        self
    }
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriverConnection for MockConnection {
    fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }

    async fn prepare(&self, _sql: &str) -> DriverResult<Box<dyn DriverStatement>> {
        Ok(Box::new(self.statement()))
    }

    async fn create_statement(&self) -> DriverResult<Box<dyn DriverStatement>> {
        Ok(Box::new(self.statement()))
    }

    async fn close(&self) -> DriverResult<()> {
        self.connection_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl MockConnection {
    fn statement(&self) -> MockStatement {
        MockStatement {
            queue: self.script.iter().cloned().collect(),
            current: None,
            fail_bind: self.fail_bind,
            fail_execute: self.fail_execute,
            bound: Arc::clone(&self.bound),
            executed_sql: Arc::clone(&self.executed_sql),
            closed: Arc::clone(&self.statement_closed),
        }
    }
}

struct MockStatement {
    queue: VecDeque<ScriptedOutcome>,
    current: Option<ScriptedOutcome>,
    fail_bind: bool,
    fail_execute: bool,
    bound: Arc<Mutex<Vec<BoundParam>>>,
    executed_sql: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockStatement {
    fn record(&mut self, param: BoundParam) -> DriverResult<()> {
        if self.fail_bind {
            return Err(DriverError::new("scripted bind failure"));
        }
        self.bound.lock().expect("bind log lock poisoned").push(param);
        Ok(())
    }

    fn start(&mut self) -> DriverResult<bool> {
        if self.fail_execute {
            return Err(DriverError::new("scripted execute failure"));
        }
        self.current = self.queue.pop_front();
        Ok(self.current.as_ref().is_some_and(ScriptedOutcome::is_rows))
    }
}

#[async_trait]
impl DriverStatement for MockStatement {
    fn bind_null(&mut self, _position: usize) -> DriverResult<()> {
        self.record(BoundParam::Null)
    }

    fn bind_int(&mut self, _position: usize, value: i32) -> DriverResult<()> {
        self.record(BoundParam::Int(value))
    }

    fn bind_long(&mut self, _position: usize, value: i64) -> DriverResult<()> {
        self.record(BoundParam::Long(value))
    }

    fn bind_decimal(&mut self, _position: usize, value: &str) -> DriverResult<()> {
        self.record(BoundParam::Decimal(value.to_string()))
    }

    fn bind_bool(&mut self, _position: usize, value: bool) -> DriverResult<()> {
        self.record(BoundParam::Bool(value))
    }

    fn bind_string(&mut self, _position: usize, value: &str) -> DriverResult<()> {
        self.record(BoundParam::Text(value.to_string()))
    }

    async fn execute(&mut self) -> DriverResult<bool> {
        self.start()
    }

    async fn execute_sql(&mut self, sql: &str) -> DriverResult<bool> {
        self.executed_sql
            .lock()
            .expect("sql log lock poisoned")
            .push(sql.to_string());
        self.start()
    }

    async fn result_set(&mut self) -> DriverResult<RawResultSet> {
        match &self.current {
            Some(ScriptedOutcome::Rows(rs)) => Ok(rs.clone()),
            _ => Err(DriverError::new("no result set at cursor")),
        }
    }

    async fn more_results(&mut self) -> DriverResult<bool> {
        self.current = self.queue.pop_front();
        Ok(self.current.as_ref().is_some_and(ScriptedOutcome::is_rows))
    }

    async fn update_count(&mut self) -> DriverResult<Option<u64>> {
        match &self.current {
            Some(ScriptedOutcome::Update { count, .. }) => Ok(Some(*count)),
            _ => Ok(None),
        }
    }

    async fn generated_keys(&mut self) -> DriverResult<Vec<i64>> {
        match &self.current {
            Some(ScriptedOutcome::Update { generated_keys, .. }) => Ok(generated_keys.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
