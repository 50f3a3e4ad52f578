use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use mcp_types::CancelledNotification;
use mcp_types::JSONRPCMessage;
use mcp_types::ModelContextProtocolNotification;
use mcp_types::ModelContextProtocolRequest;
use mcp_types::RequestId;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::client_manager::ClientManager;
use crate::client_manager::OutboundOutcome;
use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::handler::NotificationHandler;
use crate::handler::RequestHandler;
use crate::handler::typed_notification_handler;
use crate::handler::typed_request_handler;
use crate::transport::ClientId;
use crate::transport::ClientMessage;
use crate::transport::Transport;
use crate::wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Stopping,
}

/// The per-server runtime described by this crate: owns the inbound
/// dispatch loop, the method-to-handler registry, and (via
/// [`ClientManager`]) every client's pending-in/pending-out tables.
///
/// Construct with [`MessageCoordinator::new`], register handlers, then
/// [`MessageCoordinator::start`]. Cloning is cheap — it's a handle to the
/// same shared state — so a coordinator is typically wrapped in `Arc` and
/// shared between the task that calls `start`/`stop` and the tasks that
/// call `send_request`/`send_notification`.
pub struct MessageCoordinator {
    transport: Arc<dyn Transport>,
    clients: Arc<ClientManager>,
    request_handlers: Arc<HashMap<&'static str, Arc<dyn RequestHandler>>>,
    notification_handlers: Arc<HashMap<&'static str, Arc<dyn NotificationHandler>>>,
    config: CoordinatorConfig,
    state: Arc<StdMutex<State>>,
    loop_handle: Arc<StdMutex<Option<JoinHandle<()>>>>,
    idle_notify: Arc<Notify>,
}

impl Clone for MessageCoordinator {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            clients: self.clients.clone(),
            request_handlers: self.request_handlers.clone(),
            notification_handlers: self.notification_handlers.clone(),
            config: self.config,
            state: self.state.clone(),
            loop_handle: self.loop_handle.clone(),
            idle_notify: self.idle_notify.clone(),
        }
    }
}

/// Registers handlers before the coordinator starts. Handlers cannot be
/// added after `build()`; the registry is immutable for the coordinator's
/// lifetime, matching the "registered callbacks" framing of the inbound
/// dispatch loop.
pub struct MessageCoordinatorBuilder {
    request_handlers: HashMap<&'static str, Arc<dyn RequestHandler>>,
    notification_handlers: HashMap<&'static str, Arc<dyn NotificationHandler>>,
    config: CoordinatorConfig,
}

impl MessageCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            request_handlers: HashMap::new(),
            notification_handlers: HashMap::new(),
            config: CoordinatorConfig::default(),
        }
    }

    /// Overrides the default `CoordinatorConfig` (default request timeout,
    /// suggested inbound channel capacity). Defaults to
    /// `CoordinatorConfig::default()` if never called.
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn request_handler<R, F, Fut>(mut self, func: F) -> Self
    where
        R: ModelContextProtocolRequest + 'static,
        F: Fn(ClientId, R::Params) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = crate::handler::HandlerResult<R::Result>>
            + Send
            + 'static,
    {
        self.request_handlers
            .insert(R::METHOD, typed_request_handler::<R, F, Fut>(func));
        self
    }

    pub fn notification_handler<N, F, Fut>(mut self, func: F) -> Self
    where
        N: ModelContextProtocolNotification + 'static,
        F: Fn(ClientId, N::Params) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.notification_handlers
            .insert(N::METHOD, typed_notification_handler::<N, F, Fut>(func));
        self
    }

    pub fn build(self, transport: Arc<dyn Transport>) -> MessageCoordinator {
        MessageCoordinator {
            transport,
            clients: Arc::new(ClientManager::new()),
            request_handlers: Arc::new(self.request_handlers),
            notification_handlers: Arc::new(self.notification_handlers),
            config: self.config,
            state: Arc::new(StdMutex::new(State::Idle)),
            loop_handle: Arc::new(StdMutex::new(None)),
            idle_notify: Arc::new(Notify::new()),
        }
    }
}

impl Default for MessageCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCoordinator {
    /// Starts the inbound loop if idle. A no-op if already running —
    /// calling `start` twice is not an error.
    pub fn start(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == State::Running {
            return;
        }
        *state = State::Running;
        drop(state);

        let coordinator = self.clone();
        let handle = tokio::spawn(async move { coordinator.run_inbound_loop().await });
        *self.loop_handle.lock().unwrap() = Some(handle);
    }

    /// Cancels the inbound loop, awaits its termination, and tears down
    /// every client. A no-op if not running. Safe to call repeatedly.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if *state != State::Running {
                return;
            }
            *state = State::Stopping;
        }

        let handle = self.loop_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }

        self.clients.cleanup_all_clients();
        self.transport.close().await;
        *self.state.lock().unwrap() = State::Idle;
        self.idle_notify.notify_waiters();
    }

    /// Whether the inbound loop is currently running (as opposed to idle or
    /// winding down). Exposed so callers that share a coordinator with a
    /// single fixed peer (see `mcp-session`) can observe teardown without
    /// polling `send_request`/`send_notification` for the `NotRunning`
    /// error.
    pub fn is_running(&self) -> bool {
        *self.state.lock().unwrap() == State::Running
    }

    /// Resolves once the coordinator reaches `Idle`, whether that's because
    /// `stop()` was called or because the transport's stream was exhausted
    /// (peer disconnected, stdin hit EOF) and the inbound loop wound itself
    /// down. A no-op wait if already idle when called.
    pub async fn wait_until_idle(&self) {
        loop {
            let notified = self.idle_notify.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    async fn run_inbound_loop(&self) {
        loop {
            match self.transport.next_message().await {
                Ok(Some(message)) => self.dispatch_message(message).await,
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(%err, "transport stream failed, terminating inbound loop");
                    break;
                }
            }
        }
        self.clients.cleanup_all_clients();
        *self.state.lock().unwrap() = State::Idle;
        self.idle_notify.notify_waiters();
    }

    async fn dispatch_message(&self, message: ClientMessage) {
        let ClientMessage { client_id, payload } = message;
        self.clients.register_client(&client_id);

        let parsed: Result<JSONRPCMessage, _> = serde_json::from_value(payload);
        let Ok(message) = parsed else {
            tracing::warn!(%client_id, "dropping frame that matched no JSON-RPC shape");
            return;
        };

        match message {
            JSONRPCMessage::Request(request) => self.dispatch_request(client_id, request).await,
            JSONRPCMessage::Notification(notification) => {
                self.dispatch_notification(client_id, notification).await
            }
            JSONRPCMessage::Response(response) => {
                let found = self.clients.resolve_request_to_client(
                    &client_id,
                    &response.id,
                    OutboundOutcome::Result(response.result),
                );
                if !found {
                    tracing::warn!(
                        %client_id,
                        id = %response.id,
                        "dropping response with no pending outbound request"
                    );
                }
            }
            JSONRPCMessage::Error(error) => {
                let found = self.clients.resolve_request_to_client(
                    &client_id,
                    &error.id,
                    OutboundOutcome::Error(error.error),
                );
                if !found {
                    tracing::warn!(
                        %client_id,
                        id = %error.id,
                        "dropping error response with no pending outbound request"
                    );
                }
            }
        }
    }

    async fn dispatch_request(&self, client_id: ClientId, request: mcp_types::JSONRPCRequest) {
        let mcp_types::JSONRPCRequest {
            id, method, params, ..
        } = request;

        // Peer-initiated cancellation of one of *our* inbound requests is
        // routed as a notification (see `dispatch_notification`); this
        // branch only ever sees method-bearing requests that expect a
        // reply.
        let Some(handler) = self.request_handlers.get(method.as_str()).cloned() else {
            self.send_raw(
                &client_id,
                wire::error_response(id.clone(), wire::method_not_found(&method)),
            )
            .await;
            return;
        };

        let echo = serde_json::json!({ "id": id, "method": method, "params": params });

        // Message Parser step (spec §4.2): validate params *before* this
        // request is tracked or a handler task exists for it at all. An
        // ill-formed request never creates an `InboundEntry` (spec §3).
        let parsed_params = match handler.parse(params) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.send_raw(
                    &client_id,
                    wire::error_response(id.clone(), wire::invalid_params(&method, &err)),
                )
                .await;
                return;
            }
        };

        // Reserve the request id synchronously, strictly before spawning
        // anything: a duplicate id is rejected here, before the handler
        // (and any side effects in its pre-first-`.await` prologue) ever
        // runs.
        let tracked = self
            .clients
            .begin_track_request_from_client(&client_id, id.clone(), echo.clone());
        if !tracked {
            self.send_raw(
                &client_id,
                wire::error_response(id.clone(), wire::duplicate_request_id(&id)),
            )
            .await;
            return;
        }

        let client_id_for_task = client_id.clone();
        let handler_task: JoinHandle<crate::handler::HandlerResult<Value>> =
            tokio::spawn(
                async move { handler.handle(client_id_for_task, parsed_params).await },
            );
        self.clients
            .attach_inbound_task(&client_id, &id, handler_task.abort_handle());

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator
                .await_inbound_completion(client_id, id, handler_task, echo)
                .await;
        });
    }

    /// Awaits the handler task spawned by [`Self::dispatch_request`] and
    /// sends its outcome back to the transport. If the entry was already
    /// removed by a peer `notifications/cancelled` (see
    /// `dispatch_notification`), the task was aborted out from under us and
    /// no response is owed — cancellation is silent by design.
    async fn await_inbound_completion(
        &self,
        client_id: ClientId,
        request_id: RequestId,
        handler_task: JoinHandle<crate::handler::HandlerResult<Value>>,
        echo: Value,
    ) {
        let outcome = handler_task.await;

        if self
            .clients
            .untrack_request_from_client(&client_id, &request_id)
            .is_none()
        {
            return;
        }

        let payload = match outcome {
            Ok(Ok(value)) => wire::response(request_id, value),
            Ok(Err(handler_error)) => {
                let disconnect = mcp_types::is_disconnect_code(handler_error.code);
                let payload = wire::error_response(request_id.clone(), handler_error);
                self.send_raw(&client_id, payload).await;
                if disconnect {
                    self.clients.cleanup_client(&client_id);
                }
                return;
            }
            Err(join_err) if join_err.is_cancelled() => return,
            Err(join_err) => {
                tracing::error!(%join_err, "handler task panicked");
                wire::error_response(request_id, wire::internal_error(echo))
            }
        };
        self.send_raw(&client_id, payload).await;
    }

    async fn dispatch_notification(
        &self,
        client_id: ClientId,
        notification: mcp_types::JSONRPCNotification,
    ) {
        if notification.method == CancelledNotification::METHOD {
            if let Some(params) = notification.params {
                if let Ok(params) =
                    serde_json::from_value::<mcp_types::CancelledNotificationParams>(params)
                {
                    self.clients
                        .cancel_request_from_client(&client_id, &params.request_id);
                }
            }
            return;
        }

        let Some(handler) = self
            .notification_handlers
            .get(notification.method.as_str())
            .cloned()
        else {
            tracing::debug!(
                method = %notification.method,
                "dropping notification with no registered handler"
            );
            return;
        };

        let params = notification.params;
        let handle =
            tokio::spawn(async move { handler.handle(client_id, params).await });
        tokio::spawn(async move {
            if let Err(err) = handle.await {
                tracing::error!(%err, "notification handler task failed");
            }
        });
    }

    async fn send_raw(&self, client_id: &ClientId, payload: Value) {
        if let Err(err) = self.transport.send(client_id, payload).await {
            tracing::warn!(%client_id, %err, "failed to send frame");
        }
    }

    /// Sends a typed request and awaits its reply with the given timeout.
    /// On timeout, sends the peer a `notifications/cancelled` for this
    /// request id before returning the timeout error.
    pub async fn send_request<R: ModelContextProtocolRequest>(
        &self,
        client_id: &ClientId,
        params: R::Params,
        timeout: Duration,
    ) -> Result<R::Result, CoordinatorError> {
        if !self.is_running() {
            return Err(CoordinatorError::NotRunning);
        }

        let request_id = RequestId::String(uuid::Uuid::new_v4().to_string());
        let params_value = serde_json::to_value(&params).ok().and_then(|value| {
            if value == Value::Object(Default::default()) {
                None
            } else {
                Some(value)
            }
        });
        let echo = serde_json::json!({ "id": request_id, "method": R::METHOD, "params": params_value });

        let (tx, rx) = oneshot::channel();
        self.clients
            .track_request_to_client(client_id, request_id.clone(), echo, tx);

        let frame = wire::request(request_id.clone(), R::METHOD, params_value);
        if let Err(err) = self.transport.send(client_id, frame).await {
            self.clients
                .untrack_request_to_client(client_id, &request_id);
            return Err(CoordinatorError::Transport(err));
        }

        let outcome = tokio::time::timeout(timeout, rx).await;
        self.clients
            .untrack_request_to_client(client_id, &request_id);

        match outcome {
            Ok(Ok(OutboundOutcome::Result(value))) => {
                serde_json::from_value(value).map_err(|err| CoordinatorError::Remote {
                    code: mcp_types::INTERNAL_ERROR_CODE,
                    message: format!("malformed result for {}: {err}", R::METHOD),
                    data: None,
                })
            }
            Ok(Ok(OutboundOutcome::Error(error))) => Err(CoordinatorError::Remote {
                code: error.code,
                message: error.message,
                data: error.data,
            }),
            Ok(Ok(OutboundOutcome::Cancelled(_reason))) => Err(CoordinatorError::ClientTornDown {
                client_id: client_id.to_string(),
                request_id,
            }),
            Ok(Err(_recv_error)) => Err(CoordinatorError::ClientTornDown {
                client_id: client_id.to_string(),
                request_id,
            }),
            Err(_elapsed) => {
                let cancel = mcp_types::CancelledNotificationParams::new(
                    request_id.clone(),
                    "Request timed out",
                );
                let frame = wire::notification(
                    CancelledNotification::METHOD,
                    serde_json::to_value(cancel).ok(),
                );
                self.send_raw(client_id, frame).await;
                Err(CoordinatorError::Timeout {
                    client_id: client_id.to_string(),
                    request_id,
                })
            }
        }
    }

    /// The `CoordinatorConfig` this coordinator was built with (either an
    /// explicit `MessageCoordinatorBuilder::config` or the default).
    pub fn config(&self) -> CoordinatorConfig {
        self.config
    }

    /// Convenience over [`Self::send_request`] that applies
    /// `config().default_request_timeout` instead of requiring the caller
    /// to pick a timeout for every call.
    pub async fn send_request_with_default_timeout<R: ModelContextProtocolRequest>(
        &self,
        client_id: &ClientId,
        params: R::Params,
    ) -> Result<R::Result, CoordinatorError> {
        self.send_request::<R>(client_id, params, self.config.default_request_timeout)
            .await
    }

    pub async fn send_notification<N: ModelContextProtocolNotification>(
        &self,
        client_id: &ClientId,
        params: N::Params,
    ) -> Result<(), CoordinatorError> {
        if !self.is_running() {
            return Err(CoordinatorError::NotRunning);
        }
        let params_value = serde_json::to_value(&params).ok().and_then(|value| {
            if value == Value::Object(Default::default()) {
                None
            } else {
                Some(value)
            }
        });
        let frame = wire::notification(N::METHOD, params_value);
        self.transport
            .send(client_id, frame)
            .await
            .map_err(CoordinatorError::Transport)
    }

    pub fn cancel_request_from_client(&self, client_id: &ClientId, request_id: &RequestId) -> bool {
        self.clients.cancel_request_from_client(client_id, request_id)
    }
}
