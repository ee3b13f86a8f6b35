//! Draining and normalizing execution outcomes.
//!
//! One execution can produce any interleaving of result sets and update
//! counts. The cursor over them is an explicit three-state machine; every
//! outcome is folded into a JSON value, and a single outcome is returned
//! bare so single-statement callers stay ergonomic.

use serde_json::{Map, Value as JsonValue};

use crate::driver::{DriverResult, DriverStatement};
use crate::rows;

use super::hints::{duplicate_column_hints, HintMessage};

/// Reserved column label marking the driver's "no generated keys" row.
pub const GENERATED_KEYS_KEY: &str = "GENERATED_KEYS";

/// The drained and normalized outcome of one execution.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub data: JsonValue,
    pub hints: Vec<HintMessage>,
}

/// Cursor position over the statement's remaining outcomes.
#[derive(Clone, Copy)]
enum Cursor {
    ResultSet,
    UpdateCount(u64),
    Done,
}

/// Drains every outcome the statement reports, starting from the position
/// established by `execute`.
pub async fn drain(
    stmt: &mut dyn DriverStatement,
    first_is_result_set: bool,
) -> DriverResult<Harvest> {
    let mut outcomes: Vec<JsonValue> = Vec::new();
    let mut hints: Vec<HintMessage> = Vec::new();

    let mut cursor = if first_is_result_set {
        Cursor::ResultSet
    } else {
        match stmt.update_count().await? {
            Some(count) => Cursor::UpdateCount(count),
            None => Cursor::Done,
        }
    };

    loop {
        match cursor {
            Cursor::ResultSet => {
                let raw = stmt.result_set().await?;
                let labels = rows::column_labels(&raw);
                let parsed = rows::parse_rows(raw);
                // A write-only statement on some drivers wraps its generated
                // keys in a result set instead of an update count; that
                // sentinel is internal and never reaches the caller.
                if !is_generated_keys_sentinel(&parsed) {
                    hints.extend(duplicate_column_hints(&labels));
                    outcomes.push(JsonValue::Array(
                        parsed.into_iter().map(JsonValue::Object).collect(),
                    ));
                }
            }
            Cursor::UpdateCount(count) => {
                outcomes.push(write_summary(stmt, count).await?);
            }
            Cursor::Done => break,
        }
        cursor = advance(stmt).await?;
    }

    let data = if outcomes.len() == 1 {
        outcomes.remove(0)
    } else {
        JsonValue::Array(outcomes)
    };
    Ok(Harvest { data, hints })
}

/// Fetches the next outcome: a result set if one remains, else the next
/// update count, else the end of the execution.
async fn advance(stmt: &mut dyn DriverStatement) -> DriverResult<Cursor> {
    if stmt.more_results().await? {
        return Ok(Cursor::ResultSet);
    }
    match stmt.update_count().await? {
        Some(count) => Ok(Cursor::UpdateCount(count)),
        None => Ok(Cursor::Done),
    }
}

/// Builds the summary object for a write outcome.
async fn write_summary(stmt: &mut dyn DriverStatement, count: u64) -> DriverResult<JsonValue> {
    let mut summary = Map::new();
    summary.insert("affectedRows".to_string(), JsonValue::from(count));
    let keys = stmt.generated_keys().await?;
    if !keys.is_empty() {
        summary.insert("generatedKeys".to_string(), JsonValue::from(keys));
    }
    Ok(JsonValue::Object(summary))
}

fn is_generated_keys_sentinel(parsed: &[Map<String, JsonValue>]) -> bool {
    match parsed {
        [only] => only.len() == 1 && only.contains_key(GENERATED_KEYS_KEY),
        _ => false,
    }
}
