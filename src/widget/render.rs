//! Plain-text renderings of widget payloads.

use serde_json::Value as JsonValue;

use super::{count_label, table_type_variant, BadgeVariant};
use super::table::{format_cell, TableState};

/// Cells wider than this are truncated with an ellipsis.
const MAX_CELL_WIDTH: usize = 40;

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

/// Render rows as an aligned text grid.
///
/// Missing fields render like nulls. Returns `empty_message` when there are
/// no rows.
pub fn render_table(columns: &[String], rows: &[&JsonValue], empty_message: &str) -> String {
    if rows.is_empty() {
        return empty_message.to_string();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| truncate(&format_cell(row.get(c).unwrap_or(&JsonValue::Null))))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| pad(v, *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(columns)];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.extend(cells.iter().map(|r| line(r)));
    out.join("\n")
}

fn empty_message(state: &TableState) -> &'static str {
    if state.search_term.is_empty() {
        "No data to display"
    } else {
        "No matching results found"
    }
}

/// Text view for the `table-viewer` widget.
///
/// `dashboard_url` is printed under the heading when present.
pub fn render_table_viewer(
    table_name: &str,
    schema: &str,
    columns: &[String],
    rows: &[JsonValue],
    state: &TableState,
    dashboard_url: Option<&str>,
) -> String {
    let mut out = format!("{}.{} ({})", schema, table_name, count_label(rows.len(), "row"));
    if let Some(url) = dashboard_url {
        out.push_str(&format!("\nOpen in Supabase: {}", url));
    }
    out.push_str("\n\n");
    out.push_str(&render_table(columns, &state.apply(rows), empty_message(state)));
    out
}

/// Text view for the `query-results` widget.
pub fn render_query_results(
    query: &str,
    columns: &[String],
    rows: &[JsonValue],
    state: &TableState,
) -> String {
    let mut out = format!(
        "Query Results ({})\n\n{}\n\n{}",
        count_label(rows.len(), "row"),
        query.trim(),
        render_table(columns, &state.apply(rows), empty_message(state))
    );
    if !columns.is_empty() {
        out.push_str(&format!("\n\n{} column(s)", columns.len()));
    }
    out
}

/// Text view for the `schema-explorer` widget.
pub fn render_table_list(schemas: &[String], tables: &[JsonValue]) -> String {
    let mut out = format!(
        "Tables in {} ({})",
        schemas.join(", "),
        count_label(tables.len(), "table")
    );
    if tables.is_empty() {
        out.push_str("\n\nNo tables found");
        return out;
    }

    out.push('\n');
    for table in tables {
        let name = table.get("name").and_then(JsonValue::as_str).unwrap_or("?");
        out.push_str("\n- ");
        match table.get("schema").and_then(JsonValue::as_str) {
            Some(schema) => out.push_str(&format!("{}.{}", schema, name)),
            None => out.push_str(name),
        }
        if let Some(kind) = table.get("table_type").and_then(JsonValue::as_str) {
            match table_type_variant(kind) {
                BadgeVariant::Default => out.push_str(&format!(" [{}]", kind)),
                variant => out.push_str(&format!(" [{}: {}]", kind, variant.as_str())),
            }
        }
        if let Some(count) = table.get("rows").and_then(JsonValue::as_u64) {
            out.push_str(&format!(" ({})", count_label(count as usize, "row")));
        }
    }
    out
}
