//! Tool registry and result types.
//!
//! Provides the infrastructure for registering and dispatching MCP tools.
//! Every tool proxies exactly one upstream call and shapes the rows it gets
//! back into a widget payload.

pub mod sql;
pub mod tables;

use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use crate::error::{McpError, Result};
use crate::session::McpSession;
use crate::upstream::Content;
use crate::widget::{WidgetBinding, WidgetStatus};

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone)]
pub struct ToolDef {
    /// Tool name (e.g., "show-table")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    pub input_schema: JsonValue,
    /// Widget that renders the result, if any
    pub widget: Option<WidgetBinding>,
    /// Whether the tool only reads data
    pub read_only: bool,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            widget: None,
            read_only: false,
        }
    }

    /// Attach a widget binding.
    pub fn with_widget(mut self, widget: WidgetBinding) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Mark the tool as read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Entry for the tools/list response.
    pub fn to_json(&self) -> JsonValue {
        let mut tool = serde_json::json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
            "annotations": { "readOnlyHint": self.read_only }
        });
        if let Some(widget) = &self.widget {
            tool["_meta"] = serde_json::json!({
                "openai/outputTemplate": widget.template_uri(),
                "openai/toolInvocation/invoking": widget.status(WidgetStatus::Pending),
                "openai/toolInvocation/invoked": widget.status(WidgetStatus::Ready),
                "openai/widgetAccessible": true
            });
        }
        tool
    }
}

/// Widget name and props carried in a tool result.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetPayload {
    /// Widget name
    pub name: String,
    /// Props handed to the widget
    pub props: JsonValue,
}

/// Result of a tool call, in MCP `tools/call` shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    /// Content blocks shown to the model
    pub content: Vec<Content>,
    /// Structured output
    pub structured_content: Option<JsonValue>,
    /// Widget rendering of the result
    pub widget: Option<WidgetPayload>,
    /// Whether this reports a failure
    pub is_error: bool,
}

impl ToolResponse {
    /// A widget result with its text rendering, props and structured output.
    pub fn widget(binding: &WidgetBinding, text: String, props: JsonValue, output: JsonValue) -> Self {
        Self {
            content: vec![Content::text(text)],
            structured_content: Some(output),
            widget: Some(WidgetPayload {
                name: binding.name.clone(),
                props,
            }),
            is_error: false,
        }
    }

    /// A reported error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            structured_content: None,
            widget: None,
            is_error: true,
        }
    }

    /// Text of the first content block.
    pub fn text(&self) -> Option<&str> {
        self.content.first().and_then(Content::as_text)
    }

    /// Serialize to the MCP result object.
    pub fn to_json(&self) -> JsonValue {
        let mut result = serde_json::json!({
            "content": self.content,
            "isError": self.is_error
        });
        if let Some(output) = &self.structured_content {
            result["structuredContent"] = output.clone();
        }
        if let Some(widget) = &self.widget {
            result["_meta"] = serde_json::json!({
                "mcp-use/widget": {
                    "name": widget.name,
                    "props": widget.props
                }
            });
        }
        result
    }
}

/// Convert a handler failure into a reported error result.
pub(crate) fn report(tool: &str, context: &str, err: McpError) -> ToolResponse {
    warn!(tool, error = %err, validation = err.is_validation(), "tool call failed");
    ToolResponse::error(format!("{}: {}", context, err))
}

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create a new registry with all tools registered.
    pub fn new() -> Self {
        let mut tools = Vec::new();

        tools.extend(tables::tools());
        tools.extend(sql::tools());

        Self { tools }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Look up a tool definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Dispatch a tool call to the appropriate handler.
    ///
    /// Handler failures come back as `Ok` results flagged `is_error`; only an
    /// unknown tool name is an `Err`.
    pub async fn dispatch(
        &self,
        session: &McpSession,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<ToolResponse> {
        match name {
            tables::LIST_TABLES | tables::SHOW_TABLE => tables::dispatch(session, name, args).await,
            sql::EXECUTE_SQL => sql::dispatch(session, name, args).await,
            _ => Err(McpError::UnknownTool(name.to_string())),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper macro for creating JSON Schema for tool input parameters.
///
/// Every property carries a description; optional properties may declare a
/// default with `= value`.
#[macro_export]
macro_rules! schema {
    (object {
        $(required: { $($req_name:literal : $req_type:tt => $req_desc:literal),* $(,)? } $(,)?)?
        $(optional: { $($opt_name:literal : $opt_type:tt $(= $opt_default:expr)? => $opt_desc:literal),* $(,)? })?
    }) => {{
        #[allow(unused_mut)]
        let mut required: Vec<&str> = Vec::new();
        #[allow(unused_mut)]
        let mut props = serde_json::Map::new();
        $($(
            required.push($req_name);
            props.insert($req_name.to_string(), $crate::schema!(@prop $req_type, $req_desc));
        )*)?
        $($(
            #[allow(unused_mut)]
            let mut prop = $crate::schema!(@prop $opt_type, $opt_desc);
            $(prop["default"] = serde_json::json!($opt_default);)?
            props.insert($opt_name.to_string(), prop);
        )*)?

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    (@prop $ty:tt, $desc:literal) => {{
        let mut prop = $crate::schema!(@type $ty);
        prop["description"] = serde_json::json!($desc);
        prop
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type number) => { serde_json::json!({"type": "number"}) };
    (@type integer) => { serde_json::json!({"type": "integer", "minimum": 0}) };
    (@type boolean) => { serde_json::json!({"type": "boolean"}) };
    (@type array_string) => { serde_json::json!({"type": "array", "items": {"type": "string"}}) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_macro() {
        let schema = schema!(object {
            required: { "tableName": string => "Name of the table" },
            optional: {
                "schema": string = "public" => "Schema name",
                "tags": array_string => "Tags"
            }
        });
        assert_eq!(schema["required"], json!(["tableName"]));
        assert_eq!(schema["properties"]["schema"]["default"], json!("public"));
        assert_eq!(schema["properties"]["tableName"]["description"], json!("Name of the table"));
        assert!(schema["properties"]["tags"].get("default").is_none());
    }

    #[test]
    fn test_schema_macro_empty() {
        let schema = schema!(object {});
        assert_eq!(schema["required"], json!([]));
        assert_eq!(schema["properties"], json!({}));
    }

    #[test]
    fn test_registry_lists_widget_tools() {
        let registry = ToolRegistry::new();
        let names: Vec<&str> = registry.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["list-tables", "show-table", "execute-sql"]);
        assert!(registry.tools().iter().all(|t| t.read_only && t.widget.is_some()));
    }

    #[test]
    fn test_tool_def_json() {
        let registry = ToolRegistry::new();
        let tool = registry.get("show-table").unwrap().to_json();
        assert_eq!(tool["annotations"]["readOnlyHint"], json!(true));
        assert_eq!(tool["_meta"]["openai/outputTemplate"], json!("ui://widget/table-viewer.html"));
        assert_eq!(tool["inputSchema"]["properties"]["limit"]["default"], json!(100));
        assert_eq!(
            tool["_meta"]["openai/toolInvocation/invoking"],
            json!("Loading table data...")
        );
        assert_eq!(tool["_meta"]["openai/toolInvocation/invoked"], json!("Table data loaded"));
    }

    #[test]
    fn test_error_response_json() {
        let json = ToolResponse::error("Error executing SQL query: boom").to_json();
        assert_eq!(json["isError"], json!(true));
        assert_eq!(json["content"][0]["type"], json!("text"));
        assert_eq!(json["content"][0]["text"], json!("Error executing SQL query: boom"));
        assert!(json.get("structuredContent").is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .dispatch(&McpSession::disconnected(), "drop-database", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::UnknownTool(_)));
    }
}
