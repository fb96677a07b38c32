//! MCP server implementation.
//!
//! Handles JSON-RPC 2.0 over stdio according to the MCP protocol specification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::error::{rpc_codes, McpError, Result};
use crate::resources;
use crate::session::McpSession;
use crate::tools::ToolRegistry;

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server information.
const SERVER_NAME: &str = "supabase-widgets-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always "2.0"
    pub jsonrpc: String,
    /// Request id; absent for notifications
    pub id: Option<JsonValue>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<JsonValue>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0"
    pub jsonrpc: String,
    /// Id of the request this answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// JSON-RPC error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Extra error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<JsonValue>, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<JsonValue>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Create an error response from an McpError.
    pub fn from_error(id: Option<JsonValue>, err: McpError) -> Self {
        Self::error(id, err.rpc_code(), err.to_string())
    }
}

/// MCP server.
pub struct McpServer {
    session: McpSession,
    registry: ToolRegistry,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server with the given session.
    pub fn new(session: McpSession) -> Self {
        Self {
            session,
            registry: ToolRegistry::new(),
            initialized: false,
        }
    }

    /// Whether the client has sent `initialize`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server, reading from stdin and writing to stdout.
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC on arbitrary streams until EOF.
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                // EOF - client disconnected
                info!("client disconnected");
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // Parse the request
            let response = match serde_json::from_str::<JsonRpcRequest>(line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => Some(JsonRpcResponse::error(
                    None,
                    rpc_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                )),
            };

            // Notifications get no response
            let Some(response) = response else {
                continue;
            };

            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request.
    ///
    /// Returns `None` for notifications (requests without an id).
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Validate JSON-RPC version
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                rpc_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version".to_string(),
            ));
        }

        if request.id.is_none() {
            debug!(method = %request.method, "notification");
            return None;
        }

        debug!(method = %request.method, "request");

        // Route to appropriate handler
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            "resources/list" => self.handle_resources_list(request),
            "resources/read" => self.handle_resources_read(request).await,
            _ => JsonRpcResponse::error(
                request.id,
                rpc_codes::METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
            ),
        };
        Some(response)
    }

    /// Handle the initialize request.
    fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        self.initialized = true;
        info!(upstream = self.session.is_connected(), "client initialized");

        JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    /// Handle the tools/list request.
    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<JsonValue> = self.registry.tools().iter().map(|t| t.to_json()).collect();

        JsonRpcResponse::success(request.id, serde_json::json!({ "tools": tools }))
    }

    /// Handle the tools/call request.
    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        // Extract name and arguments from params
        let params = match &request.params {
            Some(JsonValue::Object(obj)) => obj,
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing params object".to_string(),
                )
            }
        };

        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing 'name' in params".to_string(),
                )
            }
        };

        let arguments = match params.get("arguments") {
            Some(JsonValue::Object(obj)) => obj.clone(),
            Some(JsonValue::Null) | None => Map::new(),
            _ => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "'arguments' must be an object".to_string(),
                )
            }
        };

        // Dispatch the tool call
        match self.registry.dispatch(&self.session, &name, arguments).await {
            Ok(response) => JsonRpcResponse::success(request.id, response.to_json()),
            Err(err) => JsonRpcResponse::from_error(request.id, err),
        }
    }

    /// Handle the resources/list request.
    fn handle_resources_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let resources: Vec<JsonValue> =
            resources::resources().iter().map(|r| r.to_json()).collect();

        JsonRpcResponse::success(request.id, serde_json::json!({ "resources": resources }))
    }

    /// Handle the resources/read request.
    async fn handle_resources_read(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let uri = match request
            .params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(|v| v.as_str())
        {
            Some(uri) => uri.to_string(),
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    rpc_codes::INVALID_PARAMS,
                    "Missing 'uri' in params".to_string(),
                )
            }
        };

        match resources::read(&self.session, &uri).await {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(err) => JsonRpcResponse::from_error(request.id, err),
        }
    }
}
