//! Query execution pipeline.
//!
//! One call resolves the definition, obtains a statement, binds, executes,
//! drains all outcomes, and releases the statement and connection on every
//! exit path. The call owns its connection exclusively and runs on the
//! caller's task with no internal parallelism; timeouts and cancellation
//! belong to the driver or the caller.

mod bind;
mod harvest;
mod hints;
mod resolve;

pub use harvest::GENERATED_KEYS_KEY;
pub use hints::{HintKind, HintMessage};
pub use resolve::{resolve, ExecutionInput, StatementMode};

use std::time::Instant;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::command::QueryDefinition;
use crate::driver::{DriverConnection, DriverStatement};
use crate::error::{BridgeError, Result};
use crate::value::RequestParams;

/// The normalized result of one execution: a bare outcome when exactly one
/// was produced, else the ordered outcome array, plus any advisory hints.
#[derive(Debug, Clone, Serialize)]
pub struct QueryExecutionResult {
    pub data: JsonValue,
    pub hint_messages: Vec<HintMessage>,
}

/// Executes one query definition against the given connection.
///
/// The connection is taken by value and closed before returning, success or
/// failure. Errors are never retried: the statement may contain writes, and
/// this crate offers no idempotency contract.
pub async fn execute(
    conn: Box<dyn DriverConnection>,
    definition: &QueryDefinition,
    params: &RequestParams,
    mode: StatementMode,
) -> Result<QueryExecutionResult> {
    let input = resolve(definition, mode, params, conn.placeholder_style());
    if !input.prepared {
        warn!("literal statement mode substitutes parameter values into SQL text unescaped");
    }

    let started = Instant::now();
    let result = run_statement(conn.as_ref(), &input).await;
    if let Err(e) = conn.close().await {
        warn!("connection close failed: {e}");
    }
    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        prepared = input.prepared,
        "query execution finished"
    );
    result
}

async fn run_statement(
    conn: &dyn DriverConnection,
    input: &ExecutionInput,
) -> Result<QueryExecutionResult> {
    let mut stmt = if input.prepared {
        conn.prepare(&input.sql).await
    } else {
        conn.create_statement().await
    }
    .map_err(BridgeError::query_execution)?;

    let outcome = drive(stmt.as_mut(), input).await;
    if let Err(e) = stmt.close().await {
        debug!("statement close failed: {e}");
    }
    outcome
}

async fn drive(
    stmt: &mut dyn DriverStatement,
    input: &ExecutionInput,
) -> Result<QueryExecutionResult> {
    let first_is_result_set = if input.prepared {
        bind::bind_parameters(stmt, input)?;
        stmt.execute().await.map_err(BridgeError::query_execution)?
    } else {
        stmt.execute_sql(&input.sql)
            .await
            .map_err(BridgeError::query_execution)?
    };
    debug!(sql = %input.sql, "statement executed");

    let harvested = harvest::drain(stmt, first_is_result_set)
        .await
        .map_err(BridgeError::query_execution)?;
    Ok(QueryExecutionResult {
        data: harvested.data,
        hint_messages: harvested.hints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockConnection, ScriptedOutcome};
    use crate::value::Value;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn params(entries: &[(&str, Value)]) -> RequestParams {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_execute_prepared_template() {
        let conn = MockConnection::with_script(vec![ScriptedOutcome::rows(
            &["id"],
            vec![vec![Value::Int(1)]],
        )]);
        let bound = conn.bound.clone();

        let result = execute(
            Box::new(conn),
            &QueryDefinition::template("SELECT * FROM t WHERE id = {{id}}"),
            &params(&[("id", Value::Int(1))]),
            StatementMode::Prepared,
        )
        .await
        .unwrap();

        assert_eq!(result.data, json!([{"id": 1}]));
        assert_eq!(bound.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_literal_sends_rendered_sql() {
        let conn = MockConnection::with_script(vec![ScriptedOutcome::update(1)]);
        let executed = conn.executed_sql.clone();
        let bound = conn.bound.clone();

        execute(
            Box::new(conn),
            &QueryDefinition::template("DELETE FROM t WHERE id = {{id}}"),
            &params(&[("id", Value::Int(9))]),
            StatementMode::Literal,
        )
        .await
        .unwrap();

        assert_eq!(
            *executed.lock().unwrap(),
            vec!["DELETE FROM t WHERE id = 9".to_string()]
        );
        assert!(bound.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resources_released_on_success() {
        let conn = MockConnection::with_script(vec![ScriptedOutcome::update(0)]);
        let connection_closed = conn.connection_closed.clone();
        let statement_closed = conn.statement_closed.clone();

        execute(
            Box::new(conn),
            &QueryDefinition::template("DELETE FROM t"),
            &params(&[]),
            StatementMode::Prepared,
        )
        .await
        .unwrap();

        assert!(connection_closed.load(Ordering::SeqCst));
        assert!(statement_closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_resources_released_on_execute_failure() {
        let conn = MockConnection::new().failing_execute();
        let connection_closed = conn.connection_closed.clone();
        let statement_closed = conn.statement_closed.clone();

        let err = execute(
            Box::new(conn),
            &QueryDefinition::template("SELECT 1"),
            &params(&[]),
            StatementMode::Prepared,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BridgeError::QueryExecution(_)));
        assert!(connection_closed.load(Ordering::SeqCst));
        assert!(statement_closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_bind_failure_aborts_before_execution() {
        let conn = MockConnection::new().failing_bind();
        let executed = conn.executed_sql.clone();
        let connection_closed = conn.connection_closed.clone();

        let err = execute(
            Box::new(conn),
            &QueryDefinition::template("SELECT {{a}}"),
            &params(&[("a", Value::Int(1))]),
            StatementMode::Prepared,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BridgeError::PreparedStatementBind { .. }));
        assert!(executed.lock().unwrap().is_empty());
        assert!(connection_closed.load(Ordering::SeqCst));
    }
}
