use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::future::FutureExt;
use futures::future::Shared;
use mcp_coordinator::ClientId;
use mcp_coordinator::CoordinatorError;
use mcp_coordinator::MessageCoordinator;
use mcp_types::Implementation;
use mcp_types::InitializeRequest;
use mcp_types::InitializeRequestParams;
use mcp_types::InitializeResult;
use mcp_types::InitializedNotification;
use mcp_types::InitializedNotificationParams;
use mcp_types::LATEST_PROTOCOL_VERSION;
use tokio::sync::Mutex;

use crate::error::SessionError;

type InitFuture = BoxFuture<'static, Result<InitializeResult, SessionError>>;
type SharedInit = Shared<InitFuture>;

enum InitState {
    NotStarted,
    InFlight(SharedInit),
    Done(InitializeResult),
    Failed(SessionError),
}

/// Client-side facade binding one [`MessageCoordinator`] to a single fixed
/// peer and exposing the ergonomic `initialize` handshake.
///
/// Concurrent or serial callers share one in-flight future and observe
/// exactly one `initialize` request on the wire; any failure before the
/// peer's result is accepted tears the session down without sending
/// `notifications/initialized`, and leaves no pending request behind.
pub struct ClientSession {
    coordinator: MessageCoordinator,
    peer: ClientId,
    client_info: Implementation,
    state: Arc<Mutex<InitState>>,
}

impl ClientSession {
    pub fn new(coordinator: MessageCoordinator, peer: ClientId, client_info: Implementation) -> Self {
        Self {
            coordinator,
            peer,
            client_info,
            state: Arc::new(Mutex::new(InitState::NotStarted)),
        }
    }

    /// The peer this session is bound to.
    pub fn peer(&self) -> &ClientId {
        &self.peer
    }

    /// Performs (or joins) the `initialize` handshake. Idempotent: once a
    /// call has reached a terminal outcome, every later call — including
    /// ones that arrive after this returns — replays that same outcome
    /// without sending anything else on the wire.
    pub async fn initialize(&self, timeout: Duration) -> Result<InitializeResult, SessionError> {
        let shared = {
            let mut state = self.state.lock().await;
            match &*state {
                InitState::Done(result) => return Ok(result.clone()),
                InitState::Failed(err) => return Err(err.clone()),
                InitState::InFlight(shared) => shared.clone(),
                InitState::NotStarted => {
                    let fut: InitFuture = Self::run_initialize(
                        self.coordinator.clone(),
                        self.peer.clone(),
                        self.client_info.clone(),
                        timeout,
                    )
                    .boxed();
                    let shared = fut.shared();
                    *state = InitState::InFlight(shared.clone());
                    shared
                }
            }
        };

        let outcome = shared.await;

        // Only the caller that finds the state still `InFlight` commits the
        // terminal result; every other caller already returned early above
        // once the state had moved to `Done`/`Failed`, so there is no race
        // to overwrite a later, different invocation's state.
        let mut state = self.state.lock().await;
        if matches!(&*state, InitState::InFlight(_)) {
            *state = match &outcome {
                Ok(result) => InitState::Done(result.clone()),
                Err(err) => InitState::Failed(err.clone()),
            };
        }
        outcome
    }

    /// Runs the handshake end to end. Any failure path here — transport
    /// error, timeout, or a protocol version mismatch — tears the whole
    /// session down (`coordinator.stop()`) before returning, matching the
    /// "no `initialized` is sent, pending-requests table ends empty,
    /// transport is closed" behavior required of a failed handshake.
    async fn run_initialize(
        coordinator: MessageCoordinator,
        peer: ClientId,
        client_info: Implementation,
        timeout: Duration,
    ) -> Result<InitializeResult, SessionError> {
        let params = InitializeRequestParams {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: Default::default(),
            client_info,
            metadata: Default::default(),
        };

        let result = match coordinator
            .send_request::<InitializeRequest>(&peer, params, timeout)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                coordinator.stop().await;
                return Err(translate_coordinator_error(err));
            }
        };

        if result.protocol_version != LATEST_PROTOCOL_VERSION {
            tracing::warn!(
                client = LATEST_PROTOCOL_VERSION,
                server = %result.protocol_version,
                "protocol version mismatch, tearing down session"
            );
            coordinator.stop().await;
            return Err(SessionError::ProtocolVersionMismatch {
                client: LATEST_PROTOCOL_VERSION.to_string(),
                server: result.protocol_version,
            });
        }

        if let Err(err) = coordinator
            .send_notification::<InitializedNotification>(
                &peer,
                InitializedNotificationParams::default(),
            )
            .await
        {
            coordinator.stop().await;
            return Err(translate_coordinator_error(err));
        }

        Ok(result)
    }
}

fn translate_coordinator_error(err: CoordinatorError) -> SessionError {
    match err {
        CoordinatorError::Timeout { .. } => SessionError::Timeout,
        CoordinatorError::NotRunning | CoordinatorError::ClientTornDown { .. } => {
            SessionError::TornDown
        }
        other => SessionError::Coordinator(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use mcp_coordinator::ClientMessage;
    use mcp_coordinator::MessageCoordinatorBuilder;
    use mcp_coordinator::Transport;
    use mcp_types::ModelContextProtocolRequest;
    use tokio::sync::mpsc;

    use super::*;

    /// Stands in for a real peer: whenever the coordinator sends an
    /// `initialize` request, immediately synthesizes a matching response
    /// and feeds it back in as if it had arrived over the wire. Counts how
    /// many distinct `initialize` requests it actually saw, so tests can
    /// assert the handshake is observed exactly once on the wire.
    struct ScriptedTransport {
        incoming_tx: mpsc::UnboundedSender<ClientMessage>,
        incoming_rx: Mutex<mpsc::UnboundedReceiver<ClientMessage>>,
        initialize_calls: AtomicUsize,
        response: serde_json::Value,
    }

    impl ScriptedTransport {
        fn new(response: serde_json::Value) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            Self {
                incoming_tx: tx,
                incoming_rx: Mutex::new(rx),
                initialize_calls: AtomicUsize::new(0),
                response,
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn next_message(
            &self,
        ) -> Result<Option<ClientMessage>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(self.incoming_rx.lock().await.recv().await)
        }

        async fn send(
            &self,
            client_id: &ClientId,
            payload: serde_json::Value,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            if payload.get("method").and_then(serde_json::Value::as_str)
                == Some(InitializeRequest::METHOD)
            {
                self.initialize_calls.fetch_add(1, Ordering::SeqCst);
                let id = payload.get("id").cloned().unwrap_or(serde_json::Value::Null);
                let response = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": self.response,
                });
                let _ = self.incoming_tx.send(ClientMessage {
                    client_id: client_id.clone(),
                    payload: response,
                });
            }
            Ok(())
        }

        async fn close(&self) {}
    }

    fn sample_initialize_result() -> serde_json::Value {
        serde_json::json!({
            "protocolVersion": LATEST_PROTOCOL_VERSION,
            "capabilities": {},
            "serverInfo": {"name": "demo-server", "version": "0.1.0"},
        })
    }

    #[tokio::test]
    async fn initialize_is_idempotent_across_concurrent_callers() {
        let transport = Arc::new(ScriptedTransport::new(sample_initialize_result()));
        let coordinator = MessageCoordinatorBuilder::new().build(transport.clone());
        coordinator.start();

        let client_info = Implementation {
            name: "demo-client".into(),
            version: "0.1.0".into(),
        };
        let session = Arc::new(ClientSession::new(
            coordinator.clone(),
            ClientId::new("peer"),
            client_info,
        ));

        let a = {
            let session = session.clone();
            tokio::spawn(async move { session.initialize(Duration::from_secs(5)).await })
        };
        let b = {
            let session = session.clone();
            tokio::spawn(async move { session.initialize(Duration::from_secs(5)).await })
        };

        let (result_a, result_b) = tokio::join!(a, b);
        let result_a = result_a.unwrap().expect("first caller succeeds");
        let result_b = result_b.unwrap().expect("second caller joins the same result");
        assert_eq!(result_a, result_b);
        assert_eq!(transport.initialize_calls.load(Ordering::SeqCst), 1);

        // A later, fully serial call also replays the cached result without
        // touching the wire again.
        let result_c = session.initialize(Duration::from_secs(5)).await.unwrap();
        assert_eq!(result_c, result_a);
        assert_eq!(transport.initialize_calls.load(Ordering::SeqCst), 1);

        coordinator.stop().await;
    }

    #[tokio::test]
    async fn protocol_version_mismatch_fails_without_notification() {
        let mismatched = serde_json::json!({
            "protocolVersion": "2024-01-01",
            "capabilities": {},
            "serverInfo": {"name": "demo-server", "version": "0.1.0"},
        });
        let transport = Arc::new(ScriptedTransport::new(mismatched));
        let coordinator = MessageCoordinatorBuilder::new().build(transport.clone());
        coordinator.start();

        let client_info = Implementation {
            name: "demo-client".into(),
            version: "0.1.0".into(),
        };
        let session = ClientSession::new(coordinator.clone(), ClientId::new("peer"), client_info);

        let err = session
            .initialize(Duration::from_secs(5))
            .await
            .expect_err("mismatched protocol version must fail");
        assert!(matches!(err, SessionError::ProtocolVersionMismatch { .. }));
        assert!(
            !coordinator.is_running(),
            "a failed handshake must tear the session down"
        );
        assert_eq!(
            transport.initialize_calls.load(Ordering::SeqCst),
            1,
            "no notifications/initialized should follow a mismatch, only the request itself"
        );

        // Repeating the call replays the same failure rather than retrying.
        let second = session.initialize(Duration::from_secs(5)).await;
        assert_eq!(second.unwrap_err(), err);

        coordinator.stop().await;
    }

    #[tokio::test]
    async fn initialize_timeout_tears_down_session_and_leaves_outbound_table_empty() {
        struct SilentTransport {
            incoming_tx: mpsc::UnboundedSender<ClientMessage>,
            incoming_rx: Mutex<mpsc::UnboundedReceiver<ClientMessage>>,
        }

        #[async_trait]
        impl Transport for SilentTransport {
            async fn next_message(
                &self,
            ) -> Result<Option<ClientMessage>, Box<dyn std::error::Error + Send + Sync>> {
                Ok(self.incoming_rx.lock().await.recv().await)
            }

            // Never replies: every send just disappears, simulating a peer
            // that never answers the `initialize` request.
            async fn send(
                &self,
                _client_id: &ClientId,
                _payload: serde_json::Value,
            ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                Ok(())
            }

            async fn close(&self) {}
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(SilentTransport {
            incoming_tx: tx,
            incoming_rx: Mutex::new(rx),
        });
        let coordinator = MessageCoordinatorBuilder::new().build(transport.clone());
        coordinator.start();

        let client_info = Implementation {
            name: "demo-client".into(),
            version: "0.1.0".into(),
        };
        let session = ClientSession::new(coordinator.clone(), ClientId::new("peer"), client_info);

        let err = session
            .initialize(Duration::from_millis(10))
            .await
            .expect_err("a peer that never replies must time out");
        assert_eq!(err, SessionError::Timeout);
        assert!(
            !coordinator.is_running(),
            "a timed-out handshake must tear the session down"
        );
    }

    #[test]
    fn session_error_messages_are_stable() {
        let err = SessionError::ProtocolVersionMismatch {
            client: "2025-06-18".into(),
            server: "2024-01-01".into(),
        };
        assert!(err.to_string().contains("2024-01-01"));
    }
}
