use clap::Parser;

/// `stdio-echo-server` — a minimal MCP server that answers `initialize`,
/// `ping`, and `tools/list`/`tools/call` for a single `echo` tool over
/// stdio, to exercise `mcp-coordinator` end to end.
#[derive(Parser, Debug, Clone)]
#[command(name = "stdio-echo-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level filter, e.g. `info`, `debug`, `mcp_coordinator=trace`.
    /// Overrides `RUST_LOG` when set.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Default per-request timeout, in milliseconds, applied to requests
    /// this server itself sends to the client (e.g. handlers that call back
    /// into the peer, like `sampling`) when they don't pick their own.
    #[arg(long, default_value_t = 30_000)]
    pub request_timeout_ms: u64,

    /// Bound on in-flight decoded stdin frames buffered between the reader
    /// task and the coordinator's inbound loop.
    #[arg(long, default_value_t = 128)]
    pub inbound_channel_capacity: usize,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn coordinator_config(&self) -> mcp_coordinator::CoordinatorConfig {
        mcp_coordinator::CoordinatorConfig {
            default_request_timeout: std::time::Duration::from_millis(self.request_timeout_ms),
            inbound_channel_capacity: self.inbound_channel_capacity,
        }
    }
}
