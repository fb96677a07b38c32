//! Row extraction from upstream tool output.
//!
//! Supabase's MCP server returns query results either as plain JSON or as a
//! (sometimes JSON-encoded) prose block with the payload fenced by
//! `<untrusted-data-ID>` ... `</untrusted-data-ID>` tags. Extraction never
//! fails: anything that cannot be located or parsed yields no rows.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::debug;

fn open_tag() -> &'static Regex {
    static OPEN_TAG: OnceLock<Regex> = OnceLock::new();
    OPEN_TAG.get_or_init(|| {
        Regex::new(r"<untrusted-data-([a-f0-9-]+)>").expect("open tag pattern is valid")
    })
}

/// Extract the row payload from raw upstream text.
///
/// Always returns a sequence. A bare JSON value is wrapped in a one-element
/// vector, and unparseable input yields an empty vector.
pub fn extract_json_rows(raw: &str) -> Vec<JsonValue> {
    debug!(len = raw.len(), "extracting rows from upstream text");

    let text: Cow<'_, str> = match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Array(rows)) => {
            debug!(rows = rows.len(), "direct parse yielded an array");
            return rows;
        }
        Ok(JsonValue::String(inner)) => {
            // One level of double encoding: the string may itself be an array.
            if let Ok(JsonValue::Array(rows)) = serde_json::from_str::<JsonValue>(&inner) {
                debug!(rows = rows.len(), "decoded double-encoded array");
                return rows;
            }
            debug!("direct parse yielded a string, scanning for wrapper");
            Cow::Owned(inner)
        }
        Ok(other) => return vec![other],
        Err(err) => {
            debug!(error = %err, "direct parse failed, scanning for wrapper");
            Cow::Borrowed(raw)
        }
    };

    let Some(region) = find_wrapped_array(&text) else {
        debug!("no untrusted-data block found");
        return Vec::new();
    };

    match serde_json::from_str::<JsonValue>(region) {
        Ok(JsonValue::Array(rows)) => {
            debug!(rows = rows.len(), "parsed untrusted-data block");
            rows
        }
        Ok(other) => vec![other],
        Err(err) => {
            debug!(error = %err, "untrusted-data block is not valid JSON");
            Vec::new()
        }
    }
}

/// Locate the first array literal fenced by matching untrusted-data tags.
///
/// An opening tag only counts when it is followed (after whitespace) by `[`
/// and a closing tag carrying the same ID appears later. Tags quoted in prose
/// are skipped this way, as are blocks whose closing ID differs.
pub fn find_wrapped_array(text: &str) -> Option<&str> {
    for caps in open_tag().captures_iter(text) {
        let (Some(tag), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let body = &text[tag.end()..];
        let trimmed = body.trim_start();
        if !trimmed.starts_with('[') {
            continue;
        }
        let start = tag.end() + (body.len() - trimmed.len());

        let close = format!("</untrusted-data-{}>", id.as_str());
        let after = start + 1;
        // At least one character must sit between `[` and the closing tag.
        let offset = match text[after..].find(&close) {
            Some(0) => text[after + 1..].find(&close).map(|o| o + 1),
            found => found,
        };
        let Some(offset) = offset else {
            continue;
        };

        return Some(text[start..after + offset].trim_end());
    }
    None
}
