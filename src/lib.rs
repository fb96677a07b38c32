//! # supabase-widgets-mcp
//!
//! MCP server that proxies a read-only subset of Supabase's hosted MCP server
//! and shapes the results for table widgets.
//!
//! Supabase's server answers with prose-wrapped, sometimes double-encoded
//! JSON. This crate unwraps those responses into plain rows and republishes
//! them through a handful of tools over JSON-RPC 2.0 on stdin/stdout.
//!
//! ## Tools
//!
//! - `list-tables` - tables in one or more schemas (`schema-explorer` widget)
//! - `show-table` - preview rows of a table (`table-viewer` widget)
//! - `execute-sql` - run a query (`query-results` widget)
//!
//! The project URL is served as the `supabase://project-url` resource.
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "supabase-widgets": {
//!       "command": "/path/to/supabase-widgets-mcp",
//!       "env": {
//!         "SUPABASE_ACCESS_TOKEN": "sbp_...",
//!         "MCP_USE_OAUTH_SUPABASE_PROJECT_ID": "abcdefghijklmnop"
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! Handlers only depend on the [`Upstream`] trait, so they can be driven
//! without a network connection:
//!
//! ```no_run
//! use std::sync::Arc;
//! use supabase_widgets_mcp::{HttpUpstream, McpServer, McpSession, UpstreamConfig};
//!
//! # async fn run() -> supabase_widgets_mcp::Result<()> {
//! let config = UpstreamConfig::new("sbp_token");
//! let upstream = HttpUpstream::connect(&config).await?;
//! let mut server = McpServer::new(McpSession::new(Arc::new(upstream)));
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod convert;
mod error;
mod extract;
mod resources;
mod server;
mod session;
mod tools;
pub mod upstream;
pub mod widget;

pub use config::{UpstreamConfig, DEFAULT_TIMEOUT, DEFAULT_UPSTREAM_URL};
pub use error::{McpError, Result};
pub use extract::{extract_json_rows, find_wrapped_array};
pub use resources::PROJECT_URL_URI;
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::McpSession;
pub use tools::{ToolDef, ToolRegistry, ToolResponse, WidgetPayload};
pub use upstream::{CallToolResult, Content, HttpUpstream, Upstream};
