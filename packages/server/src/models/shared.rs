use serde_json::Value;

use crate::error::AppError;

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Validate a trimmed display name (1-`max` Unicode characters), returning it trimmed.
pub fn validate_name(field: &'static str, name: &str, max: usize) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > max {
        return Err(AppError::invalid_field(
            field,
            format!("Name must be 1-{max} characters"),
        ));
    }
    Ok(name.to_string())
}

/// Trim an optional text value, treating blank input as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an id list submitted as a JSON array, e.g. `[1, 2]` or `["1", "2"]`.
///
/// Blank input is an empty list.
pub fn parse_id_list(field: &'static str, raw: &str) -> Result<Vec<i32>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let invalid = || AppError::invalid_field(field, "Must be a JSON array of positive integer ids");

    let Value::Array(items) = serde_json::from_str::<Value>(raw).map_err(|_| invalid())? else {
        return Err(invalid());
    };

    items
        .iter()
        .map(|item| {
            let id = match item {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            id.and_then(|id| i32::try_from(id).ok())
                .filter(|id| *id > 0)
                .ok_or_else(invalid)
        })
        .collect()
}

/// Parse a boolean form value. Accepts `true`/`false`, `1`/`0` and `on`/`off`.
pub fn parse_bool(field: &'static str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(AppError::invalid_field(field, "Must be true or false")),
    }
}
