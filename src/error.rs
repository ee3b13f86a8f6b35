//! Error types for sqlbridge.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for sqlbridge operations.
///
/// The two execution-core kinds are `PreparedStatementBind` (raised before
/// any statement runs) and `QueryExecution` (raised during statement
/// creation, execution, or result draining). Neither is retried internally:
/// write statements cannot be safely re-run without an idempotency contract.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A bind value's kind has no supported SQL mapping, or the driver
    /// rejected a bind call. Aborts the execution before the statement runs.
    #[error("Bind error: parameter {parameter} ({kind}): {detail}")]
    PreparedStatementBind {
        /// The parameter name, or `#<position>` when no name is known.
        parameter: String,
        /// The offending value's kind name (e.g. `Bytes`).
        kind: String,
        detail: String,
    },

    /// Statement creation, execution, or result draining failed.
    #[error("Query execution error: {0}")]
    QueryExecution(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Creates a query execution error from the underlying driver cause.
    pub fn query_execution(cause: impl ToString) -> Self {
        Self::QueryExecution(cause.to_string())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::PreparedStatementBind { .. } => "Bind Error",
            Self::QueryExecution(_) => "Query Error",
            Self::Connection(_) => "Connection Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_bind() {
        let err = BridgeError::PreparedStatementBind {
            parameter: "blob".to_string(),
            kind: "Bytes".to_string(),
            detail: "no SQL binding for values of kind Bytes".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Bind error: parameter blob (Bytes): no SQL binding for values of kind Bytes"
        );
        assert_eq!(err.category(), "Bind Error");
    }

    #[test]
    fn test_error_display_query_execution() {
        let err = BridgeError::query_execution("relation \"users\" does not exist");
        assert_eq!(
            err.to_string(),
            "Query execution error: relation \"users\" does not exist"
        );
        assert_eq!(err.category(), "Query Error");
    }

    #[test]
    fn test_error_display_connection() {
        let err = BridgeError::connection("Cannot connect to localhost:5432");
        assert_eq!(
            err.to_string(),
            "Connection error: Cannot connect to localhost:5432"
        );
        assert_eq!(err.category(), "Connection Error");
    }

    #[test]
    fn test_error_display_config() {
        let err = BridgeError::config("missing field 'database' in connections.default");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing field 'database' in connections.default"
        );
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BridgeError>();
    }
}
