//! Table browsing tools.
//!
//! Tools: list-tables, show-table

use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::convert::{
    check_identifier, get_optional_string_array, get_string_arg, get_string_or, get_u64_or,
};
use crate::error::{McpError, Result};
use crate::extract::extract_json_rows;
use crate::schema;
use crate::session::McpSession;
use crate::tools::{report, ToolDef, ToolResponse};
use crate::widget::{
    columns_of, render_table_list, render_table_viewer, TableState, WidgetBinding,
};

/// List all tables.
pub const LIST_TABLES: &str = "list-tables";
/// Preview rows of one table.
pub const SHOW_TABLE: &str = "show-table";

const DEFAULT_SCHEMA: &str = "public";
const DEFAULT_LIMIT: u64 = 100;

fn schema_explorer() -> WidgetBinding {
    WidgetBinding::new(
        "schema-explorer",
        "Loading database tables...",
        "Tables loaded successfully",
    )
}

fn table_viewer() -> WidgetBinding {
    WidgetBinding::new("table-viewer", "Loading table data...", "Table data loaded")
}

/// Get all table tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            LIST_TABLES,
            "List all tables in your Supabase database",
            schema!(object {
                optional: {
                    "schemas": array_string = [DEFAULT_SCHEMA] => "Schemas to include (default: public)"
                }
            }),
        )
        .with_widget(schema_explorer())
        .read_only(),
        ToolDef::new(
            SHOW_TABLE,
            "Display data from a specific table",
            schema!(object {
                required: { "tableName": string => "Name of the table to display" },
                optional: {
                    "schema": string = DEFAULT_SCHEMA => "Schema name",
                    "limit": integer = DEFAULT_LIMIT => "Maximum number of rows to fetch"
                }
            }),
        )
        .with_widget(table_viewer())
        .read_only(),
    ]
}

/// Dispatch a table tool call.
pub async fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<ToolResponse> {
    match name {
        LIST_TABLES => Ok(list_tables(session, &args)
            .await
            .unwrap_or_else(|e| report(name, "Error listing tables", e))),
        SHOW_TABLE => Ok(show_table(session, &args)
            .await
            .unwrap_or_else(|e| report(name, "Error loading table data", e))),
        _ => Err(McpError::UnknownTool(name.to_string())),
    }
}

async fn list_tables(session: &McpSession, args: &Map<String, JsonValue>) -> Result<ToolResponse> {
    let schemas = get_optional_string_array(args, "schemas")?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_SCHEMA.to_string()]);

    let mut upstream_args = Map::new();
    upstream_args.insert("schemas".to_string(), json!(schemas));
    let result = session.call_tool("list_tables", upstream_args).await?;

    let tables = result.first_text().map(extract_json_rows).unwrap_or_default();
    debug!(tables = tables.len(), "listed tables");

    let names: Vec<JsonValue> = tables
        .iter()
        .map(|t| json!({ "name": t.get("name").cloned().unwrap_or(JsonValue::Null) }))
        .collect();

    let binding = schema_explorer();
    Ok(ToolResponse::widget(
        &binding,
        render_table_list(&schemas, &tables),
        json!({
            "tables": tables,
            "schemas": schemas,
            "projectRef": session.project_ref(),
        }),
        json!({ "tables": names }),
    ))
}

/// Build the preview query for a table.
pub fn preview_query(schema: &str, table_name: &str, limit: u64) -> String {
    format!("SELECT * FROM {}.{} LIMIT {}", schema, table_name, limit)
}

/// Link to the table in the Supabase dashboard's table editor.
pub fn dashboard_url(project_ref: &str, table_name: &str) -> String {
    format!(
        "https://supabase.com/dashboard/project/{}/editor/{}",
        project_ref, table_name
    )
}

async fn show_table(session: &McpSession, args: &Map<String, JsonValue>) -> Result<ToolResponse> {
    let table_name = get_string_arg(args, "tableName")?;
    let schema = get_string_or(args, "schema", DEFAULT_SCHEMA)?;
    let limit = get_u64_or(args, "limit", DEFAULT_LIMIT)?;
    check_identifier("tableName", &table_name)?;
    check_identifier("schema", &schema)?;

    let query = preview_query(&schema, &table_name, limit);
    let mut upstream_args = Map::new();
    upstream_args.insert("query".to_string(), JsonValue::String(query));
    let result = session.call_tool("execute_sql", upstream_args).await?;

    let rows = result.first_text().map(extract_json_rows).unwrap_or_default();
    let columns = columns_of(&rows);
    debug!(table = %table_name, rows = rows.len(), "loaded table preview");

    let link = session
        .project_ref()
        .map(|project_ref| dashboard_url(project_ref, &table_name));

    let binding = table_viewer();
    Ok(ToolResponse::widget(
        &binding,
        render_table_viewer(
            &table_name,
            &schema,
            &columns,
            &rows,
            &TableState::new(),
            link.as_deref(),
        ),
        json!({
            "tableName": table_name,
            "schema": schema,
            "rows": rows,
            "columns": columns,
            "totalRows": rows.len(),
            "projectRef": session.project_ref(),
            "dashboardUrl": link,
        }),
        json!({
            "tableName": table_name,
            "schema": schema,
            "columns": columns,
            "totalRows": rows.len(),
            "projectRef": session.project_ref(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_query() {
        assert_eq!(
            preview_query("public", "users", 10),
            "SELECT * FROM public.users LIMIT 10"
        );
    }

    #[test]
    fn test_dashboard_url() {
        assert_eq!(
            dashboard_url("proj123", "users"),
            "https://supabase.com/dashboard/project/proj123/editor/users"
        );
    }

    #[tokio::test]
    async fn test_show_table_without_upstream_reports_error() {
        let mut args = Map::new();
        args.insert("tableName".to_string(), json!("users"));

        let response = dispatch(&McpSession::disconnected(), SHOW_TABLE, args)
            .await
            .unwrap();
        assert!(response.is_error);
        assert_eq!(
            response.text(),
            Some("Error loading table data: Supabase client not initialized")
        );
    }

    #[tokio::test]
    async fn test_bad_identifier_is_rejected() {
        let mut args = Map::new();
        args.insert("tableName".to_string(), json!("users; delete from users"));

        let response = dispatch(&McpSession::disconnected(), SHOW_TABLE, args)
            .await
            .unwrap();
        assert!(response.is_error);
        assert!(response.text().unwrap().contains("invalid argument 'tableName'"));
    }
}
