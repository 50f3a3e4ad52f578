use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use mcp_types::JSONRPCErrorError;
use mcp_types::ModelContextProtocolNotification;
use mcp_types::ModelContextProtocolRequest;
use mcp_types::UnionParseError;
use serde_json::Value;

use crate::transport::ClientId;

/// What a registered request handler returns: a typed `Result` serialized
/// to JSON, or an already-structured JSON-RPC error. Handlers never panic
/// across this boundary on purpose — a panic is caught by the coordinator
/// and turned into `INTERNAL_ERROR` — but they can return `Err` directly
/// for expected failures (e.g. "unknown tool name").
pub type HandlerResult<T> = std::result::Result<T, JSONRPCErrorError>;

/// A handler's params, validated and boxed by [`RequestHandler::parse`] so
/// the coordinator can carry them across the synchronous track-then-spawn
/// boundary without parsing `Value` twice. [`RequestHandler::handle`]
/// downcasts this back to its own `R::Params`.
pub type BoxedParams = Box<dyn Any + Send>;

/// The coordinator dispatches purely on method name and raw `params`; it
/// never needs to know a handler's `Params`/`Result` types beyond what
/// `parse` validates for it. Use [`typed_request_handler`] to register an
/// ergonomic, strongly-typed function instead of implementing this by hand.
///
/// Split into `parse` and `handle` so the coordinator can run the Message
/// Parser step (spec §4.2: "on constructor failure return
/// `Error(INVALID_PARAMS)` with the underlying reason in `data`") and
/// reject a malformed request *before* it is tracked in the inbound table
/// or its handler task is spawned (spec §3: an `InboundEntry` is created
/// only for a well-formed request).
#[async_trait]
pub trait RequestHandler: Send + Sync {
    fn parse(&self, params: Option<Value>) -> Result<BoxedParams, UnionParseError>;

    async fn handle(&self, client_id: ClientId, params: BoxedParams) -> HandlerResult<Value>;
}

#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn handle(&self, client_id: ClientId, params: Option<Value>);
}

struct TypedRequestHandler<R, F> {
    func: F,
    _marker: PhantomData<fn() -> R>,
}

#[async_trait]
impl<R, F, Fut> RequestHandler for TypedRequestHandler<R, F>
where
    R: ModelContextProtocolRequest,
    F: Fn(ClientId, R::Params) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult<R::Result>> + Send,
{
    fn parse(&self, params: Option<Value>) -> Result<BoxedParams, UnionParseError> {
        let parsed: R::Params = mcp_types::parse_method_params(R::METHOD, params)?;
        Ok(Box::new(parsed))
    }

    async fn handle(&self, client_id: ClientId, params: BoxedParams) -> HandlerResult<Value> {
        let params = *params
            .downcast::<R::Params>()
            .expect("coordinator only ever hands handle() what this handler's parse() produced");
        let result = (self.func)(client_id, params).await?;
        serde_json::to_value(result).map_err(|err| JSONRPCErrorError {
            code: mcp_types::INTERNAL_ERROR_CODE,
            message: format!("failed to serialize handler result: {err}"),
            data: None,
        })
    }
}

/// Wraps a strongly-typed async function as a [`RequestHandler`] for method
/// `R::METHOD`, ready to hand to `MessageCoordinator::register_request_handler`.
pub fn typed_request_handler<R, F, Fut>(func: F) -> Arc<dyn RequestHandler>
where
    R: ModelContextProtocolRequest + 'static,
    F: Fn(ClientId, R::Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R::Result>> + Send + 'static,
{
    Arc::new(TypedRequestHandler::<R, F> {
        func,
        _marker: PhantomData,
    })
}

struct TypedNotificationHandler<N, F> {
    func: F,
    _marker: PhantomData<fn() -> N>,
}

#[async_trait]
impl<N, F, Fut> NotificationHandler for TypedNotificationHandler<N, F>
where
    N: ModelContextProtocolNotification,
    F: Fn(ClientId, N::Params) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn handle(&self, client_id: ClientId, params: Option<Value>) {
        let params: N::Params = match params {
            Some(value) => match serde_json::from_value(value) {
                Ok(params) => params,
                Err(err) => {
                    tracing::warn!(method = N::METHOD, %err, "dropping malformed notification");
                    return;
                }
            },
            None => match serde_json::from_value(Value::Object(Default::default())) {
                Ok(params) => params,
                Err(err) => {
                    tracing::warn!(method = N::METHOD, %err, "dropping malformed notification");
                    return;
                }
            },
        };
        (self.func)(client_id, params).await;
    }
}

pub fn typed_notification_handler<N, F, Fut>(func: F) -> Arc<dyn NotificationHandler>
where
    N: ModelContextProtocolNotification + 'static,
    F: Fn(ClientId, N::Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(TypedNotificationHandler::<N, F> {
        func,
        _marker: PhantomData,
    })
}
