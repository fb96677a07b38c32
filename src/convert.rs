//! Argument helpers for tool handlers.
//!
//! Every helper checks the JSON type of the argument it reads. Optional
//! arguments fall back to their declared default when absent or null, but a
//! value of the wrong type is always rejected.

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

fn invalid(name: &str, reason: &str) -> McpError {
    McpError::InvalidArg {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn present<'a>(args: &'a Map<String, JsonValue>, name: &str) -> Option<&'a JsonValue> {
    args.get(name).filter(|v| !v.is_null())
}

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    match present(args, name) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(name, "Expected a string")),
        None => Err(McpError::MissingArg(name.to_string())),
    }
}

/// Helper to get a string argument with a default.
pub fn get_string_or(args: &Map<String, JsonValue>, name: &str, default: &str) -> Result<String> {
    match present(args, name) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(name, "Expected a string")),
        None => Ok(default.to_string()),
    }
}

/// Helper to get a non-negative integer argument with a default.
pub fn get_u64_or(args: &Map<String, JsonValue>, name: &str, default: u64) -> Result<u64> {
    match present(args, name) {
        Some(v) => v
            .as_u64()
            .ok_or_else(|| invalid(name, "Expected a non-negative integer")),
        None => Ok(default),
    }
}

/// Helper to get an optional array-of-strings argument.
pub fn get_optional_string_array(
    args: &Map<String, JsonValue>,
    name: &str,
) -> Result<Option<Vec<String>>> {
    let Some(value) = present(args, name) else {
        return Ok(None);
    };
    let arr = value
        .as_array()
        .ok_or_else(|| invalid(name, "Expected an array of strings"))?;

    arr.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(name, "Expected an array of strings"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Check that a schema or table name is a plain SQL identifier.
///
/// Names are interpolated unquoted, so anything beyond
/// `[A-Za-z_][A-Za-z0-9_$]*` is refused.
pub fn check_identifier(name: &str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(invalid(name, "Expected a plain SQL identifier"))
    }
}
