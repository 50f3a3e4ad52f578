use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use mcp_coordinator::ClientId;
use mcp_coordinator::ClientMessage;
use mcp_coordinator::Transport;
use serde_json::Value;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::io::{self};
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Bound on in-flight decoded frames between the reader task and whatever
/// calls `next_message`.
const CHANNEL_CAPACITY: usize = 128;

/// The one client id [`StdioTransport`] ever reports: stdio has exactly one
/// peer (whoever is on the other end of the pipes), so there is nothing to
/// disambiguate.
pub fn stdio_peer() -> ClientId {
    ClientId::new("stdio")
}

/// A [`Transport`] that reads line-delimited JSON from the current
/// process's stdin and writes line-delimited JSON to its stdout.
///
/// A reader task decodes each line into a [`Value`] and forwards it over a
/// bounded channel; a writer task drains an unbounded channel of outgoing
/// frames to stdout. Both tasks are detached; `close` aborts them.
pub struct StdioTransport {
    peer: ClientId,
    incoming: Mutex<mpsc::Receiver<ClientMessage>>,
    outgoing_tx: mpsc::UnboundedSender<Value>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    closed: AtomicBool,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    /// Same as [`Self::new`] but with an explicit bound on the inbound
    /// channel instead of the built-in default — the value a
    /// `mcp_coordinator::CoordinatorConfig::inbound_channel_capacity` is
    /// meant to drive.
    pub fn with_capacity(capacity: usize) -> Self {
        let peer = stdio_peer();
        let (incoming_tx, incoming_rx) = mpsc::channel::<ClientMessage>(capacity);
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Value>();

        let reader_peer = peer.clone();
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Value>(&line) {
                            Ok(payload) => {
                                let message = ClientMessage {
                                    client_id: reader_peer.clone(),
                                    payload,
                                };
                                if incoming_tx.send(message).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(%err, "dropping unparseable stdin line");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        tracing::error!(%err, "stdin read failed");
                        break;
                    }
                }
            }
            tracing::debug!("stdio reader finished (EOF)");
        });

        let writer_handle = tokio::spawn(async move {
            let mut stdout = io::stdout();
            while let Some(payload) = outgoing_rx.recv().await {
                match serde_json::to_string(&payload) {
                    Ok(line) => {
                        if stdout.write_all(line.as_bytes()).await.is_err() {
                            break;
                        }
                        if stdout.write_all(b"\n").await.is_err() {
                            break;
                        }
                        if stdout.flush().await.is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::error!(%err, "failed to serialize outgoing frame"),
                }
            }
            tracing::debug!("stdio writer finished (channel closed)");
        });

        Self {
            peer,
            incoming: Mutex::new(incoming_rx),
            outgoing_tx,
            reader_handle,
            writer_handle,
            closed: AtomicBool::new(false),
        }
    }

    /// The fixed id this transport reports for every inbound frame.
    pub fn peer(&self) -> &ClientId {
        &self.peer
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn next_message(
        &self,
    ) -> std::result::Result<Option<ClientMessage>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.incoming.lock().await.recv().await)
    }

    async fn send(
        &self,
        client_id: &ClientId,
        payload: Value,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if client_id != &self.peer {
            return Err(format!("stdio transport has no such client: {client_id}").into());
        }
        self.outgoing_tx
            .send(payload)
            .map_err(|err| -> Box<dyn std::error::Error + Send + Sync> { err.to_string().into() })
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reader_handle.abort();
        self.writer_handle.abort();
    }
}
