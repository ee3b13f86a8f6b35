//! Result-set parsing.
//!
//! Turns a driver's raw result set into JSON row objects keyed by column
//! label, preserving row order.

use serde_json::{Map, Value as JsonValue};

use crate::driver::RawResultSet;

/// Returns the ordered column labels of a result set.
pub fn column_labels(result_set: &RawResultSet) -> Vec<String> {
    result_set.columns.clone()
}

/// Parses a result set into one JSON object per row.
///
/// Cells are paired with labels positionally; when the driver reports two
/// columns under the same label, the later cell wins within a row object
/// (the duplicate-column hint flags this to the caller).
pub fn parse_rows(result_set: RawResultSet) -> Vec<Map<String, JsonValue>> {
    let RawResultSet { columns, rows } = result_set;
    rows.into_iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(label, cell)| (label.clone(), cell.to_json()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn test_parse_rows() {
        let rs = RawResultSet {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec![Value::Int(1), Value::from("Alice")],
                vec![Value::Int(2), Value::Null],
            ],
        };

        let rows = parse_rows(rs);
        assert_eq!(rows.len(), 2);
        assert_eq!(JsonValue::Object(rows[0].clone()), json!({"id": 1, "name": "Alice"}));
        assert_eq!(JsonValue::Object(rows[1].clone()), json!({"id": 2, "name": null}));
    }

    #[test]
    fn test_parse_rows_empty() {
        let rs = RawResultSet {
            columns: vec!["id".to_string()],
            rows: Vec::new(),
        };
        assert!(parse_rows(rs).is_empty());
    }

    #[test]
    fn test_column_labels() {
        let rs = RawResultSet {
            columns: vec!["a".to_string(), "a".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(column_labels(&rs), vec!["a", "a"]);
    }
}
