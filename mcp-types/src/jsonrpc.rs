use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// `Result` here means the JSON value carried by a `JSONRPCResponse.result`
/// field, not `std::result::Result`. Code inside this crate that needs the
/// standard type spells it out via `std::result::Result`.
pub type Result = Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Integer(i64),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Integer(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressToken {
    String(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JSONRPCRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JSONRPCNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JSONRPCResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Result,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JSONRPCErrorError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JSONRPCError {
    pub jsonrpc: String,
    pub id: RequestId,
    pub error: JSONRPCErrorError,
}

/// A decoded JSON-RPC frame. Which variant a raw object maps to is decided
/// solely by which of `method` / `id` / `result` / `error` are present
/// (JSON-RPC 2.0 §1); `#[serde(untagged)]` tries each struct in turn, and
/// each struct's *required* fields happen to disambiguate exactly that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JSONRPCMessage {
    Request(JSONRPCRequest),
    Notification(JSONRPCNotification),
    Response(JSONRPCResponse),
    Error(JSONRPCError),
}

impl From<JSONRPCRequest> for JSONRPCMessage {
    fn from(value: JSONRPCRequest) -> Self {
        JSONRPCMessage::Request(value)
    }
}

impl From<JSONRPCNotification> for JSONRPCMessage {
    fn from(value: JSONRPCNotification) -> Self {
        JSONRPCMessage::Notification(value)
    }
}

impl From<JSONRPCResponse> for JSONRPCMessage {
    fn from(value: JSONRPCResponse) -> Self {
        JSONRPCMessage::Response(value)
    }
}

impl From<JSONRPCError> for JSONRPCMessage {
    fn from(value: JSONRPCError) -> Self {
        JSONRPCMessage::Error(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn classifies_request_by_method_and_id() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        let msg: JSONRPCMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            JSONRPCMessage::Request(JSONRPCRequest {
                jsonrpc: JSONRPC_VERSION.into(),
                id: RequestId::Integer(1),
                method: "ping".into(),
                params: None,
            })
        );
    }

    #[test]
    fn classifies_notification_by_method_without_id() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let msg: JSONRPCMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            JSONRPCMessage::Notification(JSONRPCNotification {
                jsonrpc: JSONRPC_VERSION.into(),
                method: "notifications/initialized".into(),
                params: None,
            })
        );
    }

    #[test]
    fn classifies_response_by_id_and_result() {
        let raw = r#"{"jsonrpc":"2.0","id":"0","result":{"ok":true}}"#;
        let msg: JSONRPCMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            JSONRPCMessage::Response(JSONRPCResponse {
                jsonrpc: JSONRPC_VERSION.into(),
                id: RequestId::String("0".into()),
                result: json!({"ok": true}),
            })
        );
    }

    #[test]
    fn classifies_error_by_id_and_error() {
        let raw = r#"{"jsonrpc":"2.0","id":7,"error":{"code":-32601,"message":"No handler"}}"#;
        let msg: JSONRPCMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(
            msg,
            JSONRPCMessage::Error(JSONRPCError {
                jsonrpc: JSONRPC_VERSION.into(),
                id: RequestId::Integer(7),
                error: JSONRPCErrorError {
                    code: -32601,
                    message: "No handler".into(),
                    data: None,
                },
            })
        );
    }

    #[test]
    fn unknown_shape_fails_to_classify() {
        let raw = r#"{"jsonrpc":"2.0","foo":"bar"}"#;
        let parsed = serde_json::from_str::<JSONRPCMessage>(raw);
        assert!(parsed.is_err());
    }
}
