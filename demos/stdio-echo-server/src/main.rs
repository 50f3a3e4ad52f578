//! Minimal runnable server: wires `mcp-coordinator`'s dispatch loop to
//! `mcp-stdio-transport`'s stdio pipes and a handful of trivial handlers.
//! Exists so the crates in this workspace can be driven end to end (see
//! `demos/stdio-echo-server/README` — there isn't one; run it with an MCP
//! client, or feed it line-delimited JSON-RPC frames directly on stdin).

mod cli;
mod handlers;

use std::sync::Arc;

use clap::Parser;
use mcp_coordinator::MessageCoordinatorBuilder;
use mcp_stdio_transport::StdioTransport;
use mcp_types::CallToolRequest;
use mcp_types::InitializeRequest;
use mcp_types::InitializedNotification;
use mcp_types::ListToolsRequest;
use mcp_types::PingRequest;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let env_filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    let config = cli.coordinator_config();
    let transport = Arc::new(StdioTransport::with_capacity(config.inbound_channel_capacity));
    let coordinator = MessageCoordinatorBuilder::new()
        .config(config)
        .request_handler::<PingRequest, _, _>(handlers::ping)
        .request_handler::<InitializeRequest, _, _>(handlers::initialize)
        .request_handler::<ListToolsRequest, _, _>(handlers::list_tools)
        .request_handler::<CallToolRequest, _, _>(handlers::call_tool)
        .notification_handler::<InitializedNotification, _, _>(|client, _params| async move {
            tracing::info!(%client, "client finished the initialize handshake");
        })
        .build(transport);

    coordinator.start();
    tracing::info!("stdio-echo-server listening on stdin");

    tokio::select! {
        _ = coordinator.wait_until_idle() => {
            tracing::info!("transport exhausted, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    coordinator.stop().await;
    Ok(())
}
