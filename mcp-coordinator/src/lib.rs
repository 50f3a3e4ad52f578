//! Transport-agnostic runtime that multiplexes MCP/JSON-RPC requests,
//! responses, and notifications between a server process and many
//! concurrent clients: the Message Coordinator, its Client Manager, and the
//! `Transport` contract a concrete wire (stdio, HTTP, WebSocket, an
//! in-process test double) implements to be driven by it.
//!
//! See `mcp-types` for the wire types this crate dispatches, and
//! `mcp-stdio-transport` / `mcp-session` for a runnable end-to-end setup.

mod client_manager;
mod config;
mod coordinator;
mod error;
mod handler;
mod transport;
mod wire;

pub use config::CoordinatorConfig;
pub use coordinator::MessageCoordinator;
pub use coordinator::MessageCoordinatorBuilder;
pub use error::CoordinatorError;
pub use handler::BoxedParams;
pub use handler::HandlerResult;
pub use handler::NotificationHandler;
pub use handler::RequestHandler;
pub use transport::ClientId;
pub use transport::ClientMessage;
pub use transport::Transport;
