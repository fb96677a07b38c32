//! MCP server proxying Supabase's hosted MCP server.
//!
//! Run with `SUPABASE_ACCESS_TOKEN=... supabase-widgets-mcp --project-ref <ref>`.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use supabase_widgets_mcp::{
    HttpUpstream, McpServer, McpSession, UpstreamConfig, DEFAULT_UPSTREAM_URL,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// MCP server exposing Supabase tables and queries with widgets.
///
/// Proxies a read-only subset of Supabase's hosted MCP server.
/// Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "supabase-widgets-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Supabase personal access token.
    /// Generate one at https://supabase.com/dashboard/account/tokens
    #[arg(long, env = "SUPABASE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Project reference to scope the upstream server to.
    #[arg(long, env = "MCP_USE_OAUTH_SUPABASE_PROJECT_ID")]
    project_ref: Option<String>,

    /// Upstream MCP endpoint.
    #[arg(long, env = "SUPABASE_MCP_URL", default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// Allow the upstream server to run writes.
    /// By default the upstream session is opened read-only.
    #[arg(long)]
    allow_writes: bool,

    /// Timeout for each upstream request, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::from_default_env()
            .add_directive("supabase_widgets_mcp=debug".parse().expect("valid directive"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = UpstreamConfig {
        url: args.upstream_url,
        access_token: args.access_token,
        project_ref: args.project_ref,
        read_only: !args.allow_writes,
        timeout: Duration::from_secs(args.timeout_secs),
    };

    // A failed connect leaves the server up; every tool then reports the
    // missing upstream session instead.
    let session = match HttpUpstream::connect(&config).await {
        Ok(upstream) => {
            info!("Supabase MCP session ready");
            McpSession::new(Arc::new(upstream))
        }
        Err(e) => {
            error!(error = %e, "failed to connect to Supabase MCP server");
            McpSession::disconnected()
        }
    }
    .with_project_ref(config.project_ref.clone());

    let mut server = McpServer::new(session);

    if let Err(e) = server.run().await {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
