use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

/// Opaque identifier assigned by the transport. Equality defines identity;
/// the coordinator never inspects its structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClientId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ClientId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One decoded inbound frame, tagged with which client it arrived from.
#[derive(Debug, Clone)]
pub struct ClientMessage {
    pub client_id: ClientId,
    pub payload: Value,
}

/// The transport contract the coordinator consumes. Implementations own the
/// actual wire (stdio, a socket, an HTTP long-poll channel, an in-process
/// test double) and hand the coordinator only decoded JSON values.
///
/// `next_message` rather than a `Stream` associated type keeps this
/// object-safe so the coordinator can hold a `Box<dyn Transport>`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Waits for and returns the next inbound frame. Returns `Ok(None)` when
    /// the transport has been exhausted (peer disconnected, end of input);
    /// this is the normal way the inbound loop terminates.
    async fn next_message(
        &self,
    ) -> std::result::Result<Option<ClientMessage>, Box<dyn std::error::Error + Send + Sync>>;

    /// Sends a fully-serialized JSON-RPC frame to the given client.
    async fn send(
        &self,
        client_id: &ClientId,
        payload: Value,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Idempotent teardown of the underlying connection(s).
    async fn close(&self);
}
