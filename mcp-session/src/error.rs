/// Failures `ClientSession::initialize` can resolve to. `Clone` so that
/// every caller sharing an in-flight handshake (see [`crate::ClientSession`])
/// can receive its own copy of the same terminal outcome.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(
        "server protocol version {server:?} does not match the client's supported {client:?}"
    )]
    ProtocolVersionMismatch { client: String, server: String },

    #[error("initialize request timed out")]
    Timeout,

    #[error("session was torn down before initialize completed")]
    TornDown,

    #[error("coordinator error: {0}")]
    Coordinator(String),
}
