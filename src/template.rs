//! Placeholder scanning for raw SQL templates.
//!
//! Templates mark parameters with `{{name}}`. Scanning yields every
//! occurrence in order, repeats included, so the same name used twice
//! produces two bind slots.

use std::sync::LazyLock;

use regex::Regex;

use crate::driver::PlaceholderStyle;
use crate::value::{RequestParams, Value};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").expect("placeholder pattern is valid"));

/// Returns the parameter names referenced by the template, in order of
/// appearance, with duplicate occurrences preserved.
pub fn keys_in_order(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Rewrites every placeholder into the driver's positional syntax,
/// numbering occurrences from 1.
pub fn to_positional(template: &str, style: PlaceholderStyle) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for (index, found) in PLACEHOLDER.find_iter(template).enumerate() {
        out.push_str(&template[last..found.start()]);
        out.push_str(&style.placeholder(index + 1));
        last = found.end();
    }
    out.push_str(&template[last..]);
    out
}

/// Substitutes every placeholder with its parameter's textual form.
///
/// Values are inserted without quoting or escaping; this is the literal
/// statement mode's renderer and is not injection-safe. A parameter that is
/// absent from the map renders as an empty string.
pub fn render_literal(template: &str, params: &RequestParams) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(found) = caps.get(0) else { continue };
        out.push_str(&template[last..found.start()]);
        if let Some(value) = params.get(&caps[1]) {
            out.push_str(&value.substitution_text());
        }
        last = found.end();
    }
    out.push_str(&template[last..]);
    out
}
