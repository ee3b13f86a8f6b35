//! Typed parameter binding onto a prepared statement.

use crate::driver::DriverStatement;
use crate::error::{BridgeError, Result};
use crate::value::Value;

use super::resolve::ExecutionInput;

/// Binds every value of the input at its 1-based position, dispatching on
/// the value's kind to the narrowest driver type.
///
/// Any failure, including an unsupported kind, aborts the execution with a
/// `PreparedStatementBind` error naming the parameter and its kind; no
/// partial binding is retried or skipped.
pub fn bind_parameters(stmt: &mut dyn DriverStatement, input: &ExecutionInput) -> Result<()> {
    for (index, value) in input.bind_values.iter().enumerate() {
        bind_one(stmt, index + 1, value).map_err(|detail| BridgeError::PreparedStatementBind {
            parameter: input.parameter_label(index),
            kind: value.kind().to_string(),
            detail,
        })?;
    }
    Ok(())
}

fn bind_one(
    stmt: &mut dyn DriverStatement,
    position: usize,
    value: &Value,
) -> std::result::Result<(), String> {
    let bound = match value {
        Value::Null => stmt.bind_null(position),
        Value::Int(v) => stmt.bind_int(position, *v),
        Value::Long(v) => stmt.bind_long(position, *v),
        // Stringified before parsing so the driver sees the exact decimal,
        // not a binary-float approximation.
        Value::Float(v) => stmt.bind_decimal(position, &v.to_string()),
        Value::Bool(v) => stmt.bind_bool(position, *v),
        Value::Array(_) | Value::Object(_) => {
            let text = serde_json::to_string(&value.to_json()).map_err(|e| e.to_string())?;
            stmt.bind_string(position, &text)
        }
        Value::String(v) => stmt.bind_string(position, v),
        Value::Bytes(_) => {
            return Err(format!("no SQL binding for values of kind {}", value.kind()));
        }
    };
    bound.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{BoundParam, DriverConnection, MockConnection};
    use std::collections::BTreeMap;

    fn input(values: Vec<Value>) -> ExecutionInput {
        ExecutionInput {
            prepared: true,
            sql: String::new(),
            bind_values: values,
            bind_names: Vec::new(),
        }
    }

    async fn bind_all(conn: &MockConnection, values: Vec<Value>) -> Result<Vec<BoundParam>> {
        let mut stmt = conn
            .prepare("")
            .await
            .map_err(BridgeError::query_execution)?;
        bind_parameters(stmt.as_mut(), &input(values))?;
        let bound = conn.bound.lock().unwrap().clone();
        Ok(bound)
    }

    #[tokio::test]
    async fn test_each_kind_binds_at_its_driver_type() {
        let conn = MockConnection::new();
        let mut object = BTreeMap::new();
        object.insert("a".to_string(), Value::Int(1));

        let bound = bind_all(
            &conn,
            vec![
                Value::Null,
                Value::Int(5),
                Value::Long(1 << 40),
                Value::Float(2.5),
                Value::Bool(true),
                Value::Object(object),
                Value::from("text"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(
            bound,
            vec![
                BoundParam::Null,
                BoundParam::Int(5),
                BoundParam::Long(1 << 40),
                BoundParam::Decimal("2.5".to_string()),
                BoundParam::Bool(true),
                BoundParam::Text(r#"{"a":1}"#.to_string()),
                BoundParam::Text("text".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_array_binds_as_json_text() {
        let conn = MockConnection::new();
        let bound = bind_all(&conn, vec![Value::Array(vec![Value::Int(1), Value::Int(2)])])
            .await
            .unwrap();
        assert_eq!(bound, vec![BoundParam::Text("[1,2]".to_string())]);
    }

    #[tokio::test]
    async fn test_unsupported_kind_fails_with_kind_name() {
        let conn = MockConnection::new();
        let err = bind_all(&conn, vec![Value::Bytes(vec![0xde, 0xad])])
            .await
            .unwrap_err();

        match err {
            BridgeError::PreparedStatementBind {
                parameter, kind, ..
            } => {
                assert_eq!(parameter, "#1");
                assert_eq!(kind, "Bytes");
            }
            other => panic!("expected bind error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_driver_rejection_wraps_with_parameter_name() {
        let conn = MockConnection::new().failing_bind();
        let mut stmt = conn.prepare("").await.unwrap();
        let mut failing = input(vec![Value::Int(1)]);
        failing.bind_names = vec!["id".to_string()];

        let err = bind_parameters(stmt.as_mut(), &failing).unwrap_err();
        match err {
            BridgeError::PreparedStatementBind {
                parameter, detail, ..
            } => {
                assert_eq!(parameter, "id");
                assert!(detail.contains("scripted bind failure"));
            }
            other => panic!("expected bind error, got {other:?}"),
        }
    }
}
