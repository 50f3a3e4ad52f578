use mcp_types::RequestId;

/// Failures the coordinator itself can raise, as distinct from JSON-RPC
/// error responses (those are just data — see [`crate::wire::error_response`]).
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("coordinator is not running")]
    NotRunning,

    #[error("transport send failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("request {request_id} to client {client_id} timed out")]
    Timeout {
        client_id: String,
        request_id: RequestId,
    },

    #[error("client {client_id} was torn down before request {request_id} completed")]
    ClientTornDown {
        client_id: String,
        request_id: RequestId,
    },

    #[error("peer returned a JSON-RPC error: {code} {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },
}
