//! MCP session management.
//!
//! Holds the long-lived upstream handle that every handler calls through.

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::{McpError, Result};
use crate::upstream::{CallToolResult, Upstream};

/// MCP session state.
///
/// Created once at startup and shared read-only by all handlers. The upstream
/// handle is optional so the server can keep answering (with errors) when the
/// initial connection failed.
#[derive(Clone, Default)]
pub struct McpSession {
    /// Upstream Supabase MCP session
    upstream: Option<Arc<dyn Upstream>>,
    /// Project reference echoed in widget payloads
    project_ref: Option<String>,
}

impl McpSession {
    /// Create a session backed by an upstream connection.
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream: Some(upstream),
            project_ref: None,
        }
    }

    /// Create a session with no upstream; every call reports
    /// [`McpError::UpstreamUnavailable`].
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Attach the project reference shown in widgets.
    pub fn with_project_ref(mut self, project_ref: Option<String>) -> Self {
        self.project_ref = project_ref;
        self
    }

    /// Get the project reference, if configured.
    pub fn project_ref(&self) -> Option<&str> {
        self.project_ref.as_deref()
    }

    /// Whether an upstream session is attached.
    pub fn is_connected(&self) -> bool {
        self.upstream.is_some()
    }

    /// Issue exactly one upstream tool call.
    ///
    /// An upstream result flagged `isError` is returned as
    /// [`McpError::Upstream`] carrying its text.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, JsonValue>,
    ) -> Result<CallToolResult> {
        let upstream = self.upstream.as_ref().ok_or(McpError::UpstreamUnavailable)?;

        debug!(tool = name, "calling upstream");
        let result = upstream.call_tool(name, arguments).await?;

        if result.is_error {
            let message = result
                .first_text()
                .unwrap_or("upstream tool reported an error")
                .to_string();
            warn!(tool = name, %message, "upstream tool error");
            return Err(McpError::Upstream(message));
        }

        Ok(result)
    }
}
