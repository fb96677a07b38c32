//! Client-side table state: search, sort, and cell formatting.

use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use serde_json::Value as JsonValue;

/// Sort direction for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Column being sorted
    pub column: String,
    /// Direction of the sort
    pub direction: SortDirection,
}

/// Per-render view state of a data table.
///
/// Nothing here is persisted; callers reset it whenever the payload changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    /// Case-insensitive substring filter
    pub search_term: String,
    /// Current sort, if any column was clicked
    pub sort: Option<SortKey>,
}

impl TableState {
    /// Fresh state: no filter, no sort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the search term.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Handle a click on a column header.
    ///
    /// Clicking the sorted column flips its direction; clicking another
    /// column sorts by it ascending.
    pub fn toggle_sort(&mut self, column: &str) {
        match &mut self.sort {
            Some(key) if key.column == column => key.direction = key.direction.flip(),
            _ => {
                self.sort = Some(SortKey {
                    column: column.to_string(),
                    direction: SortDirection::Ascending,
                })
            }
        }
    }

    /// Clear search and sort.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Filter then sort `rows` according to this state.
    pub fn apply<'a>(&self, rows: &'a [JsonValue]) -> Vec<&'a JsonValue> {
        let needle = self.search_term.to_lowercase();
        let mut visible: Vec<&JsonValue> = rows
            .iter()
            .filter(|row| needle.is_empty() || matches_search(row, &needle))
            .collect();

        if let Some(key) = &self.sort {
            // sort_by is stable, so ties keep payload order in both directions.
            visible.sort_by(|a, b| {
                let ord = compare_values(a.get(&key.column), b.get(&key.column));
                match key.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        visible
    }
}

/// String form of a field as used for searching.
pub fn search_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether any field of `row` contains `needle_lower` (already lowercased).
pub fn matches_search(row: &JsonValue, needle_lower: &str) -> bool {
    match row {
        JsonValue::Object(fields) => fields
            .values()
            .any(|v| search_text(v).to_lowercase().contains(needle_lower)),
        other => search_text(other).to_lowercase().contains(needle_lower),
    }
}

/// Compare two raw field values.
///
/// Numbers compare numerically, strings lexically and booleans with
/// `false < true`. Missing fields, nulls, and values of different kinds are
/// neither less nor greater, so they keep their relative order.
pub fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            }
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn date_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("valid pattern"),
            Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("valid pattern"),
            Regex::new(r"^\d{2}/\d{2}/\d{4}").expect("valid pattern"),
        ]
    })
}

/// Whether a string looks like a date (ISO 8601, `YYYY-MM-DD` or `MM/DD/YYYY`).
pub fn is_date_like(value: &str) -> bool {
    date_patterns().iter().any(|p| p.is_match(value))
}

fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    // Postgres renders timestamptz as `2024-01-15 10:30:00.123+00`.
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Display form of a cell.
///
/// Nulls render as `-`, objects and arrays as compact JSON, and date-like
/// strings as `Jan 5, 2024` (midnight) or `Jan 5, 2024 14:30`.
pub fn format_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "-".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
        JsonValue::String(s) => {
            if is_date_like(s) {
                if let Some(dt) = parse_date_time(s) {
                    return if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
                        dt.format("%b %-d, %Y").to_string()
                    } else {
                        dt.format("%b %-d, %Y %H:%M").to_string()
                    };
                }
            }
            s.clone()
        }
    }
}

/// Column names of a payload: the keys of its first record.
pub fn columns_of(rows: &[JsonValue]) -> Vec<String> {
    rows.first()
        .and_then(JsonValue::as_object)
        .map(|fields| fields.keys().cloned().collect())
        .unwrap_or_default()
}
