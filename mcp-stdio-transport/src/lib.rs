//! Concrete [`mcp_coordinator::Transport`] implementations over
//! line-delimited JSON on stdio.
//!
//! Two shapes are provided:
//!
//! - [`StdioTransport`]: reads the current process's own stdin and writes
//!   its own stdout. This is what a server binds to — see
//!   `demos/stdio-echo-server`.
//! - [`ChildProcessTransport`]: spawns a subprocess and talks to it over its
//!   stdin/stdout. This is what a client-side [`mcp_session::ClientSession`]
//!   binds to when it wants to drive a server subprocess.
//!
//! Both transports have exactly one peer — stdio has no notion of multiple
//! clients — so both assign that peer a single, fixed [`ClientId`].

mod child;
mod stdio;

pub use child::ChildProcessTransport;
pub use stdio::StdioTransport;
pub use stdio::stdio_peer;
