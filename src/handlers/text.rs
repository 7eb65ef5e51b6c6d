//! Parsing helpers shared by the handlers.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FLAT_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("Invalid object regex"));

/// Non-empty, trimmed lines.
pub(crate) fn lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Intact `{...}` objects without nested braces, parsed one by one.
///
/// Used after a full JSON parse failed, so a truncated array still yields
/// the entries that arrived complete.
pub(crate) fn recover_flat_objects(raw: &str) -> Vec<Value> {
    FLAT_OBJECT_RE
        .find_iter(raw)
        .filter_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object)
        .collect()
}

/// Whether a line looks like JSON rather than tabular text.
pub(crate) fn looks_like_json(line: &str) -> bool {
    line.starts_with(['{', '}', '[', ']', '"'])
}

/// String field of a JSON object.
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str()
}
