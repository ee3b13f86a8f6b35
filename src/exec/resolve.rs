//! Resolution of a query definition into its executable form.

use crate::command::QueryDefinition;
use crate::driver::PlaceholderStyle;
use crate::template;
use crate::value::{RequestParams, Value};

/// How parameters reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementMode {
    /// Values are bound through a prepared statement, separate from the SQL
    /// text. The default, and forced whenever a structured command is used.
    #[default]
    Prepared,

    /// Values are substituted into the SQL text without escaping. Unsafe by
    /// construction; only for callers whose SQL cannot be parameterized,
    /// such as dynamic identifiers.
    Literal,
}

/// The executable form of one query: SQL plus its ordered bind values.
/// Derived once per execution and never mutated.
#[derive(Debug, Clone, Default)]
pub struct ExecutionInput {
    /// Whether the SQL carries positional placeholders to bind.
    pub prepared: bool,
    pub sql: String,
    pub bind_values: Vec<Value>,
    /// Parameter names parallel to `bind_values`, for error reporting.
    /// Empty when a structured command rendered the SQL.
    pub bind_names: Vec<String>,
}

impl ExecutionInput {
    /// A label for the bind slot at `index`: the parameter name when known,
    /// otherwise the 1-based position.
    pub fn parameter_label(&self, index: usize) -> String {
        self.bind_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{}", index + 1))
    }
}

/// Resolves a definition and parameters into an `ExecutionInput`.
///
/// A structured command renders itself once and always binds prepared. A
/// raw template is either rewritten to positional placeholders with its
/// values looked up in order (absent names bind as null), or, in literal
/// mode, substituted textually with an empty bind list.
pub fn resolve(
    definition: &QueryDefinition,
    mode: StatementMode,
    params: &RequestParams,
    style: PlaceholderStyle,
) -> ExecutionInput {
    match definition {
        QueryDefinition::Command(command) => {
            let rendered = command.render(params, style);
            ExecutionInput {
                prepared: true,
                sql: rendered.sql,
                bind_values: rendered.bind_values,
                bind_names: Vec::new(),
            }
        }
        QueryDefinition::Template(text) => match mode {
            StatementMode::Prepared => {
                let names = template::keys_in_order(text);
                let bind_values = names
                    .iter()
                    .map(|name| params.get(name).cloned().unwrap_or(Value::Null))
                    .collect();
                ExecutionInput {
                    prepared: true,
                    sql: template::to_positional(text, style),
                    bind_values,
                    bind_names: names,
                }
            }
            StatementMode::Literal => ExecutionInput {
                prepared: false,
                sql: template::render_literal(text, params),
                bind_values: Vec::new(),
                bind_names: Vec::new(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{GuiCommand, RenderedCommand};

    fn params(entries: &[(&str, Value)]) -> RequestParams {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_prepared_template_binds_in_order() {
        let definition = QueryDefinition::template("SELECT * FROM t WHERE a = {{a}} AND b = {{b}}");
        let input = resolve(
            &definition,
            StatementMode::Prepared,
            &params(&[("a", Value::Int(1)), ("b", Value::from("x"))]),
            PlaceholderStyle::QuestionMark,
        );

        assert!(input.prepared);
        assert_eq!(input.sql, "SELECT * FROM t WHERE a = ? AND b = ?");
        assert_eq!(input.bind_values, vec![Value::Int(1), Value::from("x")]);
        assert_eq!(input.bind_names, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_name_yields_two_slots() {
        let definition = QueryDefinition::template("SELECT {{id}} WHERE x = {{id}}");
        let input = resolve(
            &definition,
            StatementMode::Prepared,
            &params(&[("id", Value::Int(7))]),
            PlaceholderStyle::QuestionMark,
        );

        assert_eq!(input.bind_values, vec![Value::Int(7), Value::Int(7)]);
        assert_eq!(input.bind_names, vec!["id", "id"]);
    }

    #[test]
    fn test_absent_parameter_binds_null() {
        let definition = QueryDefinition::template("SELECT {{missing}}");
        let input = resolve(
            &definition,
            StatementMode::Prepared,
            &params(&[]),
            PlaceholderStyle::QuestionMark,
        );

        assert_eq!(input.bind_values, vec![Value::Null]);
    }

    #[test]
    fn test_literal_mode_substitutes_text() {
        let definition = QueryDefinition::template("SELECT * FROM t WHERE id = {{id}}");
        let input = resolve(
            &definition,
            StatementMode::Literal,
            &params(&[("id", Value::Int(3))]),
            PlaceholderStyle::Dollar,
        );

        assert!(!input.prepared);
        assert_eq!(input.sql, "SELECT * FROM t WHERE id = 3");
        assert!(input.bind_values.is_empty());
    }

    struct TwoSlotCommand;

    impl GuiCommand for TwoSlotCommand {
        fn render(&self, params: &RequestParams, style: PlaceholderStyle) -> RenderedCommand {
            RenderedCommand {
                sql: format!(
                    "UPDATE t SET a = {} WHERE id = {}",
                    style.placeholder(1),
                    style.placeholder(2)
                ),
                bind_values: vec![
                    params.get("a").cloned().unwrap_or(Value::Null),
                    params.get("id").cloned().unwrap_or(Value::Null),
                ],
            }
        }
    }

    #[test]
    fn test_command_forces_prepared() {
        let definition = QueryDefinition::command(TwoSlotCommand);
        // Literal mode requested, but a structured command always binds.
        let input = resolve(
            &definition,
            StatementMode::Literal,
            &params(&[("a", Value::from("v")), ("id", Value::Int(1))]),
            PlaceholderStyle::Dollar,
        );

        assert!(input.prepared);
        assert_eq!(input.sql, "UPDATE t SET a = $1 WHERE id = $2");
        assert_eq!(input.bind_values, vec![Value::from("v"), Value::Int(1)]);
        assert!(input.bind_names.is_empty());
    }

    #[test]
    fn test_parameter_label_falls_back_to_position() {
        let input = ExecutionInput {
            prepared: true,
            sql: String::new(),
            bind_values: vec![Value::Null],
            bind_names: Vec::new(),
        };
        assert_eq!(input.parameter_label(0), "#1");

        let named = ExecutionInput {
            bind_names: vec!["id".to_string()],
            ..input
        };
        assert_eq!(named.parameter_label(0), "id");
    }
}
