//! End-to-end scenarios against an in-process mock [`Transport`], pinning
//! the wire traces this crate's dispatch loop must produce: unknown
//! method, handler panic, peer-sent cancellation, outbound timeout, and the
//! per-client inbound/outbound table invariants.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_coordinator::ClientId;
use mcp_coordinator::ClientMessage;
use mcp_coordinator::MessageCoordinatorBuilder;
use mcp_coordinator::Transport;
use mcp_types::CancelledNotification;
use mcp_types::CancelledNotificationParams;
use mcp_types::EmptyResult;
use mcp_types::ModelContextProtocolNotification;
use mcp_types::ModelContextProtocolRequest;
use mcp_types::PingRequest;
use mcp_types::PingRequestParams;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

mcp_types::mcp_request!(
    SlowPingRequest,
    "tests/slow-ping",
    PingRequestParams,
    EmptyResult
);

/// A [`Transport`] driven entirely by channels: a test feeds inbound frames
/// in through `push`, and reads what the coordinator sent back off
/// `outgoing_rx`. Has exactly the shape the coordinator needs and nothing
/// more — no real I/O.
struct MockTransport {
    incoming_tx: mpsc::UnboundedSender<ClientMessage>,
    incoming_rx: Mutex<mpsc::UnboundedReceiver<ClientMessage>>,
    outgoing_tx: mpsc::UnboundedSender<(ClientId, Value)>,
}

impl MockTransport {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(ClientId, Value)>) {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                incoming_tx,
                incoming_rx: Mutex::new(incoming_rx),
                outgoing_tx,
            }),
            outgoing_rx,
        )
    }

    fn push(&self, client_id: &ClientId, payload: Value) {
        self.incoming_tx
            .send(ClientMessage {
                client_id: client_id.clone(),
                payload,
            })
            .expect("test is still holding the receiver");
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn next_message(
        &self,
    ) -> Result<Option<ClientMessage>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.incoming_rx.lock().await.recv().await)
    }

    async fn send(
        &self,
        client_id: &ClientId,
        payload: Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.outgoing_tx
            .send((client_id.clone(), payload))
            .map_err(|err| -> Box<dyn std::error::Error + Send + Sync> { err.to_string().into() })
    }

    async fn close(&self) {}
}

async fn recv_within(
    rx: &mut mpsc::UnboundedReceiver<(ClientId, Value)>,
    millis: u64,
) -> (ClientId, Value) {
    tokio::time::timeout(Duration::from_millis(millis), rx.recv())
        .await
        .expect("frame arrived before the deadline")
        .expect("transport channel is still open")
}

#[tokio::test]
async fn unknown_method_replies_with_method_not_found() {
    let (transport, mut outgoing) = MockTransport::new();
    let coordinator = MessageCoordinatorBuilder::new().build(transport.clone());
    coordinator.start();

    let client = ClientId::new("c1");
    transport.push(
        &client,
        serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "does/not/exist"}),
    );

    let (to, frame) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(to, client);
    assert_eq!(frame["id"], serde_json::json!(7));
    assert_eq!(frame["error"]["code"], serde_json::json!(-32601));
    assert!(
        frame["error"]["message"]
            .as_str()
            .unwrap()
            .contains("does/not/exist")
    );

    coordinator.stop().await;
}

#[tokio::test]
async fn handler_panic_is_reported_as_internal_error_with_echoed_request() {
    let (transport, mut outgoing) = MockTransport::new();
    let coordinator = MessageCoordinatorBuilder::new()
        .request_handler::<PingRequest, _, _>(|_client, _params| async move {
            panic!("boom");
            #[allow(unreachable_code)]
            Ok(EmptyResult::default())
        })
        .build(transport.clone());
    coordinator.start();

    let client = ClientId::new("c1");
    transport.push(
        &client,
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
    );

    let (_to, frame) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(frame["error"]["code"], serde_json::json!(-32603));
    assert_eq!(frame["error"]["data"]["request"]["id"], serde_json::json!(1));
    assert_eq!(
        frame["error"]["data"]["request"]["method"],
        serde_json::json!("ping")
    );

    coordinator.stop().await;
}

#[tokio::test]
async fn peer_cancellation_suppresses_the_response() {
    let (transport, mut outgoing) = MockTransport::new();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let release_rx = Arc::new(Mutex::new(Some(release_rx)));

    let coordinator = MessageCoordinatorBuilder::new()
        .request_handler::<SlowPingRequest, _, _>(move |_client, _params| {
            let release_rx = release_rx.clone();
            async move {
                if let Some(rx) = release_rx.lock().await.take() {
                    let _ = rx.await;
                }
                Ok(EmptyResult::default())
            }
        })
        .build(transport.clone());
    coordinator.start();

    let client = ClientId::new("c1");
    transport.push(
        &client,
        serde_json::json!({"jsonrpc": "2.0", "id": "X", "method": "tests/slow-ping"}),
    );

    // Give the handler task a moment to register in the inbound table
    // before cancelling it.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let cancel = CancelledNotificationParams::new(
        mcp_types::RequestId::String("X".to_string()),
        "user",
    );
    transport.push(
        &client,
        serde_json::json!({
            "jsonrpc": "2.0",
            "method": CancelledNotification::METHOD,
            "params": serde_json::to_value(cancel).unwrap(),
        }),
    );

    // Letting the never-released handler run would hang forever; the
    // cancellation must have aborted it well before this deadline, and no
    // response for "X" is ever sent.
    let never_responds =
        tokio::time::timeout(Duration::from_millis(200), outgoing.recv()).await;
    assert!(never_responds.is_err(), "cancelled request must not reply");

    drop(release_tx); // silence the unused-variable-ish "never read" lint
    coordinator.stop().await;
}

#[tokio::test]
async fn duplicate_inbound_request_id_gets_a_wire_error_not_a_second_handler_run() {
    let (transport, mut outgoing) = MockTransport::new();
    let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();
    let gate_rx = Arc::new(Mutex::new(Some(gate_rx)));

    let coordinator = MessageCoordinatorBuilder::new()
        .request_handler::<PingRequest, _, _>(move |_client, _params| {
            let gate_rx = gate_rx.clone();
            async move {
                if let Some(rx) = gate_rx.lock().await.take() {
                    let _ = rx.await;
                }
                Ok(EmptyResult::default())
            }
        })
        .build(transport.clone());
    coordinator.start();

    let client = ClientId::new("c1");
    let frame = serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});
    transport.push(&client, frame.clone());
    tokio::time::sleep(Duration::from_millis(20)).await;
    transport.push(&client, frame);

    let (_to, dup_error) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(dup_error["error"]["code"], serde_json::json!(-32600));

    gate_tx.send(()).unwrap();
    let (_to, ok_response) = recv_within(&mut outgoing, 1000).await;
    assert!(ok_response.get("result").is_some());

    coordinator.stop().await;
}

#[tokio::test]
async fn duplicate_inbound_request_id_never_runs_the_handlers_pre_await_prologue() {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    let (transport, mut outgoing) = MockTransport::new();
    let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();
    let gate_rx = Arc::new(Mutex::new(Some(gate_rx)));
    let runs = Arc::new(AtomicUsize::new(0));

    let coordinator = {
        let runs = runs.clone();
        MessageCoordinatorBuilder::new()
            .request_handler::<PingRequest, _, _>(move |_client, _params| {
                // Synchronous work before the first `.await`: a duplicate
                // id must never reach here, not even once.
                runs.fetch_add(1, Ordering::SeqCst);
                let gate_rx = gate_rx.clone();
                async move {
                    if let Some(rx) = gate_rx.lock().await.take() {
                        let _ = rx.await;
                    }
                    Ok(EmptyResult::default())
                }
            })
            .build(transport.clone())
    };
    coordinator.start();

    let client = ClientId::new("c1");
    let frame = serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});
    transport.push(&client, frame.clone());
    tokio::time::sleep(Duration::from_millis(20)).await;
    transport.push(&client, frame);

    let (_to, dup_error) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(dup_error["error"]["code"], serde_json::json!(-32600));
    assert_eq!(
        runs.load(Ordering::SeqCst),
        1,
        "the duplicate must never have been spawned, even partway"
    );

    gate_tx.send(()).unwrap();
    let (_to, ok_response) = recv_within(&mut outgoing, 1000).await;
    assert!(ok_response.get("result").is_some());

    coordinator.stop().await;
}

#[tokio::test]
async fn invalid_params_reports_the_reason_and_never_tracks_an_inbound_entry() {
    let (transport, mut outgoing) = MockTransport::new();
    let coordinator = MessageCoordinatorBuilder::new()
        .request_handler::<PingRequest, _, _>(|_client, _params| async move {
            Ok(EmptyResult::default())
        })
        .build(transport.clone());
    coordinator.start();

    let client = ClientId::new("c1");
    // `ping` takes `PingRequestParams` (an object); send a string instead,
    // so the handler's `parse` step must fail.
    transport.push(
        &client,
        serde_json::json!({"jsonrpc": "2.0", "id": 9, "method": "ping", "params": "not-an-object"}),
    );

    let (_to, frame) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(frame["id"], serde_json::json!(9));
    assert_eq!(frame["error"]["code"], serde_json::json!(-32602));
    assert!(
        frame["error"]["data"]["reason"]
            .as_str()
            .is_some_and(|reason| reason.contains("ping")),
        "the underlying parse failure must be echoed in `data`, got {frame:?}"
    );

    coordinator.stop().await;
}

#[tokio::test]
async fn send_request_times_out_and_notifies_the_peer_of_the_cancellation() {
    let (transport, mut outgoing) = MockTransport::new();
    let coordinator = MessageCoordinatorBuilder::new().build(transport.clone());
    coordinator.start();

    let client = ClientId::new("c1");
    let err = coordinator
        .send_request::<PingRequest>(&client, PingRequestParams::default(), Duration::from_millis(20))
        .await
        .expect_err("no peer ever replies");
    assert!(matches!(err, mcp_coordinator::CoordinatorError::Timeout { .. }));

    let (to, frame) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(to, client);
    assert_eq!(
        frame["method"],
        serde_json::json!(CancelledNotification::METHOD)
    );
    assert!(frame.get("id").is_none(), "a notification carries no id");

    coordinator.stop().await;
}

#[tokio::test]
async fn send_request_fails_fast_when_coordinator_is_not_running() {
    let (transport, _outgoing) = MockTransport::new();
    let coordinator = MessageCoordinatorBuilder::new().build(transport);

    let err = coordinator
        .send_request::<PingRequest>(
            &ClientId::new("c1"),
            PingRequestParams::default(),
            Duration::from_secs(1),
        )
        .await
        .expect_err("coordinator was never started");
    assert!(matches!(err, mcp_coordinator::CoordinatorError::NotRunning));
}

#[tokio::test]
async fn stop_is_idempotent_and_start_after_stop_works_again() {
    let (transport, mut outgoing) = MockTransport::new();
    let coordinator = MessageCoordinatorBuilder::new().build(transport.clone());

    coordinator.stop().await; // stop while idle: no-op, must not panic or hang
    coordinator.start();
    coordinator.start(); // start while running: no-op

    let client = ClientId::new("c1");
    transport.push(
        &client,
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
    );
    let (_to, frame) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(frame["error"]["code"], serde_json::json!(-32601));

    coordinator.stop().await;
    coordinator.stop().await; // stop twice: no-op
}

#[tokio::test]
async fn orphan_response_is_dropped_without_disturbing_other_pending_requests() {
    let (transport, mut outgoing) = MockTransport::new();
    let coordinator = MessageCoordinatorBuilder::new().build(transport.clone());
    coordinator.start();

    let client = ClientId::new("c1");

    // A response for a request id nothing is waiting on: must be logged and
    // dropped, not panic or wedge the inbound loop.
    transport.push(
        &client,
        serde_json::json!({"jsonrpc": "2.0", "id": "no-such-request", "result": {}}),
    );

    // The loop must still be alive and answering other traffic afterward.
    transport.push(
        &client,
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "does/not/exist"}),
    );
    let (_to, frame) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(frame["error"]["code"], serde_json::json!(-32601));

    coordinator.stop().await;
}

#[tokio::test]
async fn send_request_with_default_timeout_uses_the_configured_default() {
    let (transport, mut outgoing) = MockTransport::new();
    let config = mcp_coordinator::CoordinatorConfig {
        default_request_timeout: Duration::from_millis(20),
        inbound_channel_capacity: mcp_coordinator::CoordinatorConfig::default()
            .inbound_channel_capacity,
    };
    let coordinator = MessageCoordinatorBuilder::new()
        .config(config)
        .build(transport.clone());
    coordinator.start();
    assert_eq!(coordinator.config(), config);

    let client = ClientId::new("c1");
    let err = coordinator
        .send_request_with_default_timeout::<PingRequest>(&client, PingRequestParams::default())
        .await
        .expect_err("no peer ever replies");
    assert!(matches!(err, mcp_coordinator::CoordinatorError::Timeout { .. }));

    let (to, frame) = recv_within(&mut outgoing, 1000).await;
    assert_eq!(to, client);
    assert_eq!(
        frame["method"],
        serde_json::json!(CancelledNotification::METHOD)
    );

    coordinator.stop().await;
}
