//! SQL query tool.
//!
//! Tools: execute-sql

use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::convert::get_string_arg;
use crate::error::{McpError, Result};
use crate::extract::extract_json_rows;
use crate::schema;
use crate::session::McpSession;
use crate::tools::{report, ToolDef, ToolResponse};
use crate::widget::{columns_of, render_query_results, TableState, WidgetBinding};

/// Run a SQL query.
pub const EXECUTE_SQL: &str = "execute-sql";

fn query_results() -> WidgetBinding {
    WidgetBinding::new("query-results", "Executing SQL query...", "Query completed")
}

/// Get all SQL tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![ToolDef::new(
        EXECUTE_SQL,
        "Execute read-only SQL queries on your Supabase database",
        schema!(object {
            required: { "query": string => "SQL query to execute" }
        }),
    )
    .with_widget(query_results())
    .read_only()]
}

/// Dispatch a SQL tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<ToolResponse> {
    match name {
        EXECUTE_SQL => Ok(execute_sql(session, &args)
            .await
            .unwrap_or_else(|e| report(name, "Error executing SQL query", e))),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

async fn execute_sql(session: &McpSession, args: &Map<String, JsonValue>) -> Result<ToolResponse> {
    let query = get_string_arg(args, "query")?;
    if query.trim().is_empty() {
        return Err(McpError::InvalidArg {
            name: "query".to_string(),
            reason: "Query must not be empty".to_string(),
        });
    }

    let mut upstream_args = Map::new();
    upstream_args.insert("query".to_string(), JsonValue::String(query.clone()));
    let result = session.call_tool("execute_sql", upstream_args).await?;

    let results = result.first_text().map(extract_json_rows).unwrap_or_default();
    let columns = columns_of(&results);
    debug!(rows = results.len(), "query finished");

    let binding = query_results();
    Ok(ToolResponse::widget(
        &binding,
        render_query_results(&query, &columns, &results, &TableState::new()),
        json!({
            "query": query,
            "results": results,
            "rowCount": results.len(),
            "columns": columns,
            "projectRef": session.project_ref(),
        }),
        json!({
            "query": query,
            "results": results,
            "rowCount": results.len(),
        }),
    ))
}
