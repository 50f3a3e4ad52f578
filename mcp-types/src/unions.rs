//! Method registry: maps a JSON-RPC method name plus its `params` value onto
//! the strongly typed request/notification it represents, and back. This is
//! what a `MessageParser` consults once it has classified an incoming
//! [`crate::jsonrpc::JSONRPCMessage`] as a request or notification but before
//! it knows which one.

use serde_json::Value;

use crate::ModelContextProtocolNotification;
use crate::ModelContextProtocolRequest;
use crate::common::CancelledNotification;
use crate::common::CancelledNotificationParams;
use crate::common::PingRequest;
use crate::common::PingRequestParams;
use crate::common::ProgressNotification;
use crate::common::ProgressNotificationParams;
use crate::completion::CompleteRequest;
use crate::completion::CompleteRequestParams;
use crate::initialization::InitializeRequest;
use crate::initialization::InitializeRequestParams;
use crate::initialization::InitializedNotification;
use crate::initialization::InitializedNotificationParams;
use crate::logging::LoggingMessageNotification;
use crate::logging::LoggingMessageNotificationParams;
use crate::logging::SetLevelRequest;
use crate::logging::SetLevelRequestParams;
use crate::prompts::GetPromptRequest;
use crate::prompts::GetPromptRequestParams;
use crate::prompts::ListPromptsRequest;
use crate::prompts::ListPromptsRequestParams;
use crate::prompts::PromptListChangedNotification;
use crate::prompts::PromptListChangedNotificationParams;
use crate::roots::ListRootsRequest;
use crate::roots::ListRootsRequestParams;
use crate::roots::RootsListChangedNotification;
use crate::roots::RootsListChangedNotificationParams;
use crate::sampling::CreateMessageRequest;
use crate::sampling::CreateMessageRequestParams;
use crate::resources::ListResourceTemplatesRequest;
use crate::resources::ListResourceTemplatesRequestParams;
use crate::resources::ListResourcesRequest;
use crate::resources::ListResourcesRequestParams;
use crate::resources::ReadResourceRequest;
use crate::resources::ReadResourceRequestParams;
use crate::resources::ResourceListChangedNotification;
use crate::resources::ResourceListChangedNotificationParams;
use crate::resources::ResourceUpdatedNotification;
use crate::resources::ResourceUpdatedNotificationParams;
use crate::resources::SubscribeRequest;
use crate::resources::SubscribeRequestParams;
use crate::resources::UnsubscribeRequest;
use crate::resources::UnsubscribeRequestParams;
use crate::tools::CallToolRequest;
use crate::tools::CallToolRequestParams;
use crate::tools::ListToolsRequest;
use crate::tools::ListToolsRequestParams;
use crate::tools::ToolListChangedNotification;
use crate::tools::ToolListChangedNotificationParams;

/// Failure to match a `(method, params)` pair against any variant of a
/// request/notification union.
#[derive(Debug, thiserror::Error)]
pub enum UnionParseError {
    #[error("unknown method {0:?}")]
    UnknownMethod(String),
    #[error("invalid params for method {method:?}: {source}")]
    InvalidParams {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Deserializes a method's raw `params` value into its typed params,
/// absent `params` standing in for `{}`. This is the Message Parser's
/// `parse_request`/`parse_notification` constructor-lookup step (spec §4.2)
/// applied to a single already-known method — the four registry enums
/// below use it to implement `from_method_and_params`, and
/// `mcp-coordinator`'s handler registry uses it directly so a request is
/// validated before it is ever tracked or dispatched to a handler task.
pub fn parse_method_params<T: serde::de::DeserializeOwned>(
    method: &str,
    params: Option<Value>,
) -> std::result::Result<T, UnionParseError> {
    let value = params.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).map_err(|source| UnionParseError::InvalidParams {
        method: method.to_string(),
        source,
    })
}

/// Macro shared by the four registry enums below: each arm pairs a request
/// or notification marker type from [`crate::mcp_request`] /
/// [`crate::mcp_notification`] with the params struct it carries.
macro_rules! method_union {
    (
        $(#[$attr:meta])*
        $name:ident { $( $variant:ident($params:ty) => $method:path ),+ $(,)? }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $( $variant($params), )+
        }

        impl $name {
            pub fn method(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => <$method>::METHOD, )+
                }
            }

            pub fn from_method_and_params(
                method: &str,
                params: Option<Value>,
            ) -> std::result::Result<Self, UnionParseError> {
                match method {
                    $( m if m == <$method>::METHOD => {
                        Ok(Self::$variant(parse_method_params(method, params)?))
                    } )+
                    other => Err(UnionParseError::UnknownMethod(other.to_string())),
                }
            }

            pub fn into_params_value(self) -> std::result::Result<Option<Value>, serde_json::Error> {
                match self {
                    $( Self::$variant(p) => {
                        let value = serde_json::to_value(p)?;
                        Ok(if value == Value::Object(Default::default()) { None } else { Some(value) })
                    } )+
                }
            }
        }
    };
}

method_union! {
    /// Requests a client may send to a server.
    ClientRequest {
        Initialize(InitializeRequestParams) => InitializeRequest,
        Ping(PingRequestParams) => PingRequest,
        ListResources(ListResourcesRequestParams) => ListResourcesRequest,
        ListResourceTemplates(ListResourceTemplatesRequestParams) => ListResourceTemplatesRequest,
        ReadResource(ReadResourceRequestParams) => ReadResourceRequest,
        Subscribe(SubscribeRequestParams) => SubscribeRequest,
        Unsubscribe(UnsubscribeRequestParams) => UnsubscribeRequest,
        ListPrompts(ListPromptsRequestParams) => ListPromptsRequest,
        GetPrompt(GetPromptRequestParams) => GetPromptRequest,
        ListTools(ListToolsRequestParams) => ListToolsRequest,
        CallTool(CallToolRequestParams) => CallToolRequest,
        SetLevel(SetLevelRequestParams) => SetLevelRequest,
        Complete(CompleteRequestParams) => CompleteRequest,
    }
}

method_union! {
    /// Requests a server may send to a client.
    ServerRequest {
        Ping(PingRequestParams) => PingRequest,
        CreateMessage(CreateMessageRequestParams) => CreateMessageRequest,
        ListRoots(ListRootsRequestParams) => ListRootsRequest,
    }
}

method_union! {
    /// Notifications a client may send to a server.
    ClientNotification {
        Initialized(InitializedNotificationParams) => InitializedNotification,
        Cancelled(CancelledNotificationParams) => CancelledNotification,
        Progress(ProgressNotificationParams) => ProgressNotification,
        RootsListChanged(RootsListChangedNotificationParams) => RootsListChangedNotification,
    }
}

method_union! {
    /// Notifications a server may send to a client.
    ServerNotification {
        Cancelled(CancelledNotificationParams) => CancelledNotification,
        Progress(ProgressNotificationParams) => ProgressNotification,
        LoggingMessage(LoggingMessageNotificationParams) => LoggingMessageNotification,
        ResourceUpdated(ResourceUpdatedNotificationParams) => ResourceUpdatedNotification,
        ResourceListChanged(ResourceListChangedNotificationParams) => ResourceListChangedNotification,
        ToolListChanged(ToolListChangedNotificationParams) => ToolListChangedNotification,
        PromptListChanged(PromptListChangedNotificationParams) => PromptListChangedNotification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_request_dispatches_call_tool_by_method() {
        let params = serde_json::json!({"name": "echo", "arguments": {"text": "hi"}});
        let request =
            ClientRequest::from_method_and_params("tools/call", Some(params)).unwrap();
        assert!(matches!(request, ClientRequest::CallTool(_)));
        assert_eq!(request.method(), "tools/call");
    }

    #[test]
    fn client_request_rejects_unknown_method() {
        let err = ClientRequest::from_method_and_params("not/a/method", None).unwrap_err();
        assert!(matches!(err, UnionParseError::UnknownMethod(_)));
    }

    #[test]
    fn ping_request_has_no_params_on_the_wire() {
        let request = ClientRequest::Ping(PingRequestParams::default());
        assert_eq!(request.into_params_value().unwrap(), None);
    }

    #[test]
    fn server_notification_dispatches_logging_message() {
        let params = serde_json::json!({"level": "info", "data": "hello"});
        let notification =
            ServerNotification::from_method_and_params("notifications/message", Some(params))
                .unwrap();
        assert!(matches!(notification, ServerNotification::LoggingMessage(_)));
    }
}
