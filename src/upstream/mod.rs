//! Upstream session boundary.
//!
//! The proxy only ever needs one thing from Supabase's hosted MCP server:
//! invoke a named tool with an argument object and get content blocks back.

mod http;

pub use http::{parse_sse_response, HttpUpstream};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;

/// A content block in an MCP tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text.
    Text {
        /// The text payload
        text: String,
    },
    /// Base64-encoded image.
    Image {
        /// Base64 data
        data: String,
        /// MIME type of the image
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Base64-encoded audio.
    Audio {
        /// Base64 data
        data: String,
        /// MIME type of the audio
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Embedded resource.
    Resource {
        /// The resource contents as sent
        resource: JsonValue,
    },
    /// Any block type this proxy does not understand.
    #[serde(other)]
    Other,
}

impl Content {
    /// Create a text content block.
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    /// The text of this block, if it is a text block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Result of an upstream `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Content blocks, in order
    #[serde(default)]
    pub content: Vec<Content>,
    /// Whether the upstream tool reported an error
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Create a successful result with a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
        }
    }

    /// Text of the first content block, if that block is text.
    ///
    /// Later blocks are never consulted.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(Content::as_text)
    }
}

/// A live session with the upstream MCP server.
///
/// Implementations are shared read-only between handlers; they must not
/// require `&mut self` to issue calls.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Invoke the named upstream tool.
    async fn call_tool(&self, name: &str, arguments: Map<String, JsonValue>)
        -> Result<CallToolResult>;
}
