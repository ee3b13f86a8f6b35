//! sqlbridge - a generic SQL execution core.
//!
//! Bridges user-authored query definitions (raw `{{name}}` templates or
//! structured GUI commands) and a relational database driver: resolves the
//! executable SQL, binds parameters by value kind, executes, and normalizes
//! interleaved result sets and update counts into one JSON-shaped result.

pub mod cli;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod exec;
pub mod rows;
pub mod template;
pub mod value;

pub use command::{GuiCommand, QueryDefinition, RenderedCommand};
pub use error::{BridgeError, Result};
pub use exec::{execute, ExecutionInput, HintKind, HintMessage, QueryExecutionResult, StatementMode};
pub use value::{RequestParams, Value};
