//! Advisory hints derived from result metadata.

use std::collections::HashMap;

use serde::Serialize;

/// The kind tag of an advisory hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HintKind {
    DuplicateColumn,
}

impl HintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateColumn => "DUPLICATE_COLUMN",
        }
    }
}

/// An advisory message riding alongside a result. Never alters the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintMessage {
    pub kind: HintKind,
    pub detail: String,
}

/// Flags column labels that collide after the driver's own disambiguation,
/// e.g. two joined tables both surfacing a `name` column.
pub fn duplicate_column_hints(labels: &[String]) -> Vec<HintMessage> {
    let colliding = identical_columns(labels);
    if colliding.is_empty() {
        return Vec::new();
    }
    vec![HintMessage {
        kind: HintKind::DuplicateColumn,
        detail: colliding.join("/"),
    }]
}

/// Every occurrence of a label that appears more than once, in order.
fn identical_columns(labels: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_default() += 1;
    }
    labels
        .iter()
        .filter(|label| counts[label.as_str()] > 1)
        .cloned()
        .collect()
}
