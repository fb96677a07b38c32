//! Streamable-HTTP client for Supabase's hosted MCP server.
//!
//! Each JSON-RPC message is POSTed to the endpoint. The server answers with
//! either a JSON body or a short SSE stream carrying the response.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, info};

use super::{CallToolResult, Upstream};
use crate::config::UpstreamConfig;
use crate::error::{McpError, Result};

/// Protocol version offered during the handshake.
const PROTOCOL_VERSION: &str = "2025-03-26";

const SESSION_HEADER: &str = "mcp-session-id";

const CLIENT_NAME: &str = "supabase-widgets-mcp";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// An initialized session with the upstream server.
///
/// Immutable after [`HttpUpstream::connect`]; calls only read the session id.
pub struct HttpUpstream {
    client: Client,
    endpoint: Url,
    access_token: String,
    session_id: Option<String>,
    next_id: AtomicU64,
}

impl HttpUpstream {
    /// Connect and perform the MCP initialize handshake.
    pub async fn connect(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let mut upstream = Self {
            client,
            endpoint: config.endpoint()?,
            access_token: config.access_token.clone(),
            session_id: None,
            next_id: AtomicU64::new(0),
        };

        let (result, session_id) = upstream
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": CLIENT_NAME,
                        "version": CLIENT_VERSION
                    }
                }),
            )
            .await?;
        upstream.session_id = session_id;

        info!(
            server = %result.pointer("/serverInfo/name").and_then(|v| v.as_str()).unwrap_or("unknown"),
            protocol = %result.get("protocolVersion").and_then(|v| v.as_str()).unwrap_or("unknown"),
            session = upstream.session_id.is_some(),
            "upstream session initialized"
        );

        upstream.notify("notifications/initialized").await?;
        Ok(upstream)
    }

    /// Upstream-assigned session id, if the server issued one.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn post(&self, body: &JsonValue) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.access_token)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(body);
        if let Some(session_id) = &self.session_id {
            builder = builder.header(SESSION_HEADER, session_id);
        }
        builder
    }

    /// Send a request and wait for its response.
    ///
    /// Returns the JSON-RPC `result` and any session id header on the response.
    async fn request(&self, method: &str, params: JsonValue) -> Result<(JsonValue, Option<String>)> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        let response = self.post(&body).send().await?;
        let status = response.status();
        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let is_sse = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));
        let text = response.text().await?;

        if !status.is_success() {
            return Err(McpError::Upstream(format!(
                "upstream returned {}: {}",
                status,
                text.trim()
            )));
        }

        let message = if is_sse {
            parse_sse_response(&text, id)?
        } else {
            serde_json::from_str(&text)
                .map_err(|e| McpError::Upstream(format!("malformed upstream response: {}", e)))?
        };

        Ok((rpc_result(message)?, session_id))
    }

    /// Send a notification; only the HTTP status is checked.
    async fn notify(&self, method: &str) -> Result<()> {
        let body = json!({ "jsonrpc": "2.0", "method": method });
        let response = self.post(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(McpError::Upstream(format!(
                "upstream rejected {}: {}",
                method, status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, JsonValue>,
    ) -> Result<CallToolResult> {
        let started = Instant::now();
        let (result, _) = self
            .request(
                "tools/call",
                json!({ "name": name, "arguments": arguments }),
            )
            .await?;
        debug!(tool = name, elapsed_ms = started.elapsed().as_millis() as u64, "upstream call finished");

        serde_json::from_value(result)
            .map_err(|e| McpError::Upstream(format!("malformed tools/call result: {}", e)))
    }
}

/// Pull the result out of a JSON-RPC response, surfacing `error` objects.
fn rpc_result(message: JsonValue) -> Result<JsonValue> {
    if let Some(error) = message.get("error") {
        let text = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(McpError::Upstream(text));
    }
    Ok(message.get("result").cloned().unwrap_or(JsonValue::Null))
}

/// Find the JSON-RPC response with the given id in an SSE body.
///
/// Events are separated by blank lines; multiple `data:` lines in one event
/// are joined with newlines. Events that are not JSON, or carry another id,
/// are skipped.
pub fn parse_sse_response(body: &str, id: u64) -> Result<JsonValue> {
    let mut data = String::new();
    let mut events = Vec::new();

    for line in body.lines() {
        if line.is_empty() {
            if !data.is_empty() {
                events.push(std::mem::take(&mut data));
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if !data.is_empty() {
        events.push(data);
    }

    events
        .iter()
        .filter_map(|event| serde_json::from_str::<JsonValue>(event).ok())
        .find(|message| message.get("id").and_then(|v| v.as_u64()) == Some(id))
        .ok_or_else(|| McpError::Upstream(format!("no response for request {} in event stream", id)))
}
