//! Query authoring models.
//!
//! A query arrives either as a raw `{{name}}` template or as a structured
//! GUI-built command. Both funnel into the same `{sql, ordered bind values}`
//! shape, so the execution path never branches on which kind it received.

use std::fmt;

use crate::driver::PlaceholderStyle;
use crate::value::{RequestParams, Value};

/// The output of rendering a structured command: positional SQL plus its
/// bind values in slot order.
#[derive(Debug, Clone, Default)]
pub struct RenderedCommand {
    pub sql: String,
    pub bind_values: Vec<Value>,
}

/// A structurally built command that renders its own SQL.
///
/// Implementations own placeholder extraction and ordering; the executor
/// treats the rendered output as opaque. Commands always execute through
/// prepared binding, regardless of the caller's statement-mode preference.
pub trait GuiCommand: Send + Sync {
    /// Renders the command against the request parameters, emitting
    /// placeholders in the given style.
    fn render(&self, params: &RequestParams, style: PlaceholderStyle) -> RenderedCommand;
}

/// A user-authored query definition. Immutable once constructed.
pub enum QueryDefinition {
    /// A raw SQL template with `{{name}}` placeholders.
    Template(String),
    /// A structured command rendering itself into SQL.
    Command(Box<dyn GuiCommand>),
}

impl QueryDefinition {
    /// Creates a raw-template definition.
    pub fn template(sql: impl Into<String>) -> Self {
        Self::Template(sql.into())
    }

    /// Creates a structured-command definition.
    pub fn command(command: impl GuiCommand + 'static) -> Self {
        Self::Command(Box::new(command))
    }
}

impl fmt::Debug for QueryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(sql) => f.debug_tuple("Template").field(sql).finish(),
            Self::Command(_) => f.write_str("Command(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCommand;

    impl GuiCommand for FixedCommand {
        fn render(&self, params: &RequestParams, style: PlaceholderStyle) -> RenderedCommand {
            RenderedCommand {
                sql: format!("INSERT INTO t (a) VALUES ({})", style.placeholder(1)),
                bind_values: vec![params.get("a").cloned().unwrap_or(Value::Null)],
            }
        }
    }

    #[test]
    fn test_command_renders_with_style() {
        let mut params = RequestParams::new();
        params.insert("a".to_string(), Value::Int(9));

        let rendered = FixedCommand.render(&params, PlaceholderStyle::Dollar);
        assert_eq!(rendered.sql, "INSERT INTO t (a) VALUES ($1)");
        assert_eq!(rendered.bind_values, vec![Value::Int(9)]);
    }

    #[test]
    fn test_definition_debug() {
        let def = QueryDefinition::template("SELECT 1");
        assert_eq!(format!("{def:?}"), "Template(\"SELECT 1\")");

        let def = QueryDefinition::command(FixedCommand);
        assert_eq!(format!("{def:?}"), "Command(..)");
    }
}
