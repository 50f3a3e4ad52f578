use serde::Serialize;
use serde::de::DeserializeOwned;

/// A JSON-RPC method that expects a response. The method name is known at
/// the type level, and the `Params`/`Result` pair is the contract a handler
/// registered for `METHOD` must satisfy.
pub trait ModelContextProtocolRequest {
    const METHOD: &'static str;
    type Params: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Result: Serialize + DeserializeOwned + Send + Sync + 'static;
}

/// A JSON-RPC method with no response (fire-and-forget).
pub trait ModelContextProtocolNotification {
    const METHOD: &'static str;
    type Params: Serialize + DeserializeOwned + Send + Sync + 'static;
}

/// Declares a zero-sized marker type implementing
/// [`ModelContextProtocolRequest`] for one MCP method.
#[macro_export]
macro_rules! mcp_request {
    ($name:ident, $method:literal, $params:ty, $result:ty) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::ModelContextProtocolRequest for $name {
            const METHOD: &'static str = $method;
            type Params = $params;
            type Result = $result;
        }
    };
}

/// Declares a zero-sized marker type implementing
/// [`ModelContextProtocolNotification`] for one MCP method.
#[macro_export]
macro_rules! mcp_notification {
    ($name:ident, $method:literal, $params:ty) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::ModelContextProtocolNotification for $name {
            const METHOD: &'static str = $method;
            type Params = $params;
        }
    };
}
