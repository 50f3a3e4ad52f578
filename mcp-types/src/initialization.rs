use serde::Deserialize;
use serde::Serialize;

use crate::common::ClientCapabilities;
use crate::common::Implementation;
use crate::common::ServerCapabilities;
use crate::mcp_notification;
use crate::mcp_request;
use crate::meta::Meta;

/// The only protocol revision this crate speaks. A mismatch here is a
/// disconnect-worthy error, not a recoverable one.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeRequestParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

/// Sent by the client immediately after a successful `initialize` response,
/// carrying no payload: its arrival is what flips a session from "handshake
/// in flight" to "ready for everything else".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InitializedNotificationParams {
    #[serde(rename = "_meta", default, skip_serializing_if = "Meta::is_empty")]
    pub metadata: Meta,
}

mcp_request!(
    InitializeRequest,
    "initialize",
    InitializeRequestParams,
    InitializeResult
);
mcp_notification!(
    InitializedNotification,
    "notifications/initialized",
    InitializedNotificationParams
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_request_round_trips() {
        let raw = serde_json::json!({
            "protocolVersion": LATEST_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {"name": "demo-client", "version": "0.1.0"},
        });
        let params: InitializeRequestParams = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(params.protocol_version, LATEST_PROTOCOL_VERSION);
        assert_eq!(params.client_info.name, "demo-client");
        assert_eq!(serde_json::to_value(&params).unwrap(), raw);
    }
}
