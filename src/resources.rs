//! Resource handling.
//!
//! One read-only resource is exposed:
//! - `supabase://project-url` - the project's API base URL as plain text

use serde_json::{json, Map, Value as JsonValue};
use tracing::warn;

use crate::error::{McpError, Result};
use crate::session::McpSession;

/// URI of the project URL resource.
pub const PROJECT_URL_URI: &str = "supabase://project-url";

/// A resource definition for the MCP resources/list response.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    /// Resource URI
    pub uri: &'static str,
    /// Resource name
    pub name: &'static str,
    /// Resource description
    pub description: &'static str,
    /// MIME type of the contents
    pub mime_type: &'static str,
}

impl ResourceDef {
    /// Entry for the resources/list response.
    pub fn to_json(&self) -> JsonValue {
        json!({
            "uri": self.uri,
            "name": self.name,
            "description": self.description,
            "mimeType": self.mime_type
        })
    }
}

/// All resources served.
pub fn resources() -> Vec<ResourceDef> {
    vec![ResourceDef {
        uri: PROJECT_URL_URI,
        name: "get-project-url",
        description: "Get the API URL for your Supabase project",
        mime_type: "text/plain",
    }]
}

/// Read a resource, returning the MCP `resources/read` result.
///
/// Upstream failures are reported as [`McpError::Upstream`] with the message
/// prefixed by what was being read.
pub async fn read(session: &McpSession, uri: &str) -> Result<JsonValue> {
    match uri {
        PROJECT_URL_URI => {
            let url = project_url(session).await.map_err(|e| {
                warn!(uri, error = %e, "resource read failed");
                McpError::Upstream(format!("Error getting project URL: {}", e))
            })?;
            Ok(json!({
                "contents": [{
                    "uri": PROJECT_URL_URI,
                    "mimeType": "text/plain",
                    "text": url
                }]
            }))
        }
        _ => Err(McpError::UnknownResource(uri.to_string())),
    }
}

async fn project_url(session: &McpSession) -> Result<String> {
    let result = session.call_tool("get_project_url", Map::new()).await?;
    Ok(result.first_text().unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_list() {
        let list = resources();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].to_json()["uri"], json!("supabase://project-url"));
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let err = read(&McpSession::disconnected(), "supabase://nope").await.unwrap_err();
        assert!(matches!(err, McpError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_read_without_upstream() {
        let err = read(&McpSession::disconnected(), PROJECT_URL_URI).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error getting project URL: Supabase client not initialized"
        );
    }
}
