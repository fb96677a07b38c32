//! Widget presentation layer.
//!
//! Pure functions from a shaped payload to a view. Tool results carry the
//! payload for graphical hosts and a text rendering for everyone else.

pub mod render;
pub mod table;

pub use render::{render_query_results, render_table, render_table_list, render_table_viewer};
pub use table::{
    columns_of, compare_values, format_cell, SortDirection, SortKey, TableState,
};

use serde::{Deserialize, Serialize};

/// Binds a tool to the widget that displays its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetBinding {
    /// Widget name (e.g., "table-viewer")
    pub name: String,
    /// Status text while the tool runs
    pub invoking: String,
    /// Status text once the tool finished
    pub invoked: String,
}

impl WidgetBinding {
    /// Create a widget binding.
    pub fn new(name: &str, invoking: &str, invoked: &str) -> Self {
        Self {
            name: name.to_string(),
            invoking: invoking.to_string(),
            invoked: invoked.to_string(),
        }
    }

    /// URI of the widget template.
    pub fn template_uri(&self) -> String {
        format!("ui://widget/{}.html", self.name)
    }

    /// Status line for the given state.
    pub fn status(&self, status: WidgetStatus) -> &str {
        match status {
            WidgetStatus::Pending => &self.invoking,
            WidgetStatus::Ready => &self.invoked,
        }
    }
}

/// Whether a widget is waiting on its tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetStatus {
    /// Tool call in flight
    Pending,
    /// Result available
    Ready,
}

/// Badge styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    /// Neutral
    Default,
    /// Accent
    Primary,
    /// Positive
    Success,
    /// Attention
    Warning,
}

impl BadgeVariant {
    /// Lowercase name, as used in the widget's class names.
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeVariant::Default => "default",
            BadgeVariant::Primary => "primary",
            BadgeVariant::Success => "success",
            BadgeVariant::Warning => "warning",
        }
    }
}

/// Badge style for a Postgres table type.
pub fn table_type_variant(table_type: &str) -> BadgeVariant {
    match table_type {
        "BASE TABLE" => BadgeVariant::Primary,
        "VIEW" => BadgeVariant::Success,
        "FOREIGN TABLE" => BadgeVariant::Warning,
        _ => BadgeVariant::Default,
    }
}

/// Count with a naively pluralized noun: `1 row`, `0 rows`.
pub fn count_label(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
