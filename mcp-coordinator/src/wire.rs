//! Builders for the four JSON-RPC frame shapes, used both by the inbound
//! loop (building responses) and by `send_request`/`send_notification`
//! (building outbound requests and notifications).

use mcp_types::JSONRPCError;
use mcp_types::JSONRPCErrorError;
use mcp_types::JSONRPCNotification;
use mcp_types::JSONRPCRequest;
use mcp_types::JSONRPCResponse;
use mcp_types::JSONRPC_VERSION;
use mcp_types::RequestId;
use serde_json::Value;

pub fn request(id: RequestId, method: &str, params: Option<Value>) -> Value {
    let request = JSONRPCRequest {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        method: method.to_string(),
        params,
    };
    serde_json::to_value(request).expect("JSONRPCRequest always serializes")
}

pub fn notification(method: &str, params: Option<Value>) -> Value {
    let notification = JSONRPCNotification {
        jsonrpc: JSONRPC_VERSION.to_string(),
        method: method.to_string(),
        params,
    };
    serde_json::to_value(notification).expect("JSONRPCNotification always serializes")
}

pub fn response(id: RequestId, result: Value) -> Value {
    let response = JSONRPCResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result,
    };
    serde_json::to_value(response).expect("JSONRPCResponse always serializes")
}

pub fn error_response(id: RequestId, error: JSONRPCErrorError) -> Value {
    let error = JSONRPCError {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        error,
    };
    serde_json::to_value(error).expect("JSONRPCError always serializes")
}

pub fn method_not_found(method: &str) -> JSONRPCErrorError {
    JSONRPCErrorError {
        code: mcp_types::METHOD_NOT_FOUND_ERROR_CODE,
        message: format!("No handler for method: {method}"),
        data: None,
    }
}

/// Builds the `INVALID_PARAMS` response for a request whose params failed
/// the handler's `parse` step, carrying the underlying reason in `data` per
/// spec §4.2.
pub fn invalid_params(method: &str, err: &mcp_types::UnionParseError) -> JSONRPCErrorError {
    JSONRPCErrorError {
        code: mcp_types::INVALID_PARAMS_ERROR_CODE,
        message: format!("invalid params for method {method:?}"),
        data: Some(serde_json::json!({ "reason": err.to_string() })),
    }
}

pub fn internal_error(echoed_request: Value) -> JSONRPCErrorError {
    JSONRPCErrorError {
        code: mcp_types::INTERNAL_ERROR_CODE,
        message: "handler task failed".to_string(),
        data: Some(serde_json::json!({ "request": echoed_request })),
    }
}

pub fn duplicate_request_id(request_id: &RequestId) -> JSONRPCErrorError {
    JSONRPCErrorError {
        code: mcp_types::INVALID_REQUEST_ERROR_CODE,
        message: format!("duplicate request id: {request_id}"),
        data: None,
    }
}
