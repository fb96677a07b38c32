//! Upstream connection settings.

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{McpError, Result};

/// Supabase's hosted MCP endpoint.
pub const DEFAULT_UPSTREAM_URL: &str = "https://mcp.supabase.com/mcp";

/// Default per-request timeout for upstream calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the upstream session.
#[derive(Clone)]
pub struct UpstreamConfig {
    /// Base URL of the upstream MCP endpoint
    pub url: String,
    /// Supabase personal access token, sent as a bearer token
    pub access_token: String,
    /// Project to scope the upstream server to
    pub project_ref: Option<String>,
    /// Ask the upstream server to reject writes
    pub read_only: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Create a read-only configuration for the default endpoint.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_UPSTREAM_URL.to_string(),
            access_token: access_token.into(),
            project_ref: None,
            read_only: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Full endpoint URL with project and read-only query parameters.
    pub fn endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url).map_err(|e| McpError::InvalidArg {
            name: "upstream-url".to_string(),
            reason: e.to_string(),
        })?;

        if self.project_ref.is_some() || self.read_only {
            let mut query = url.query_pairs_mut();
            if let Some(project_ref) = &self.project_ref {
                query.append_pair("project_ref", project_ref);
            }
            if self.read_only {
                query.append_pair("read_only", "true");
            }
        }

        Ok(url)
    }
}

// Keeps the access token out of logs.
impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("url", &self.url)
            .field("access_token", &"<redacted>")
            .field("project_ref", &self.project_ref)
            .field("read_only", &self.read_only)
            .field("timeout", &self.timeout)
            .finish()
    }
}
