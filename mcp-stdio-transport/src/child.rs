use std::process::Stdio;
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
use tokio::process::Child;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 128;

/// A [`Transport`] that drives a server subprocess over its stdin/stdout:
/// spawn the child with piped stdio, hand its stdin to a writer task fed by
/// an unbounded channel, and decode its stdout line-by-line on a reader task.
///
/// Unlike the client that inspired it, this transport doesn't correlate
/// requests to responses itself — that pending-map bookkeeping is
/// `mcp-coordinator`'s job. This type only moves bytes.
pub struct ChildProcessTransport {
    peer: ClientId,
    child: Mutex<Child>,
    incoming: Mutex<mpsc::Receiver<ClientMessage>>,
    outgoing_tx: mpsc::UnboundedSender<Value>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    closed: AtomicBool,
}

impl ChildProcessTransport {
    /// Spawns `program` with `args`, wiring its stdio into this transport.
    /// Every decoded line of its stdout is reported under the single fixed
    /// client id `peer`.
    pub fn spawn(
        program: impl AsRef<std::ffi::OsStr>,
        args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>,
        peer: ClientId,
    ) -> std::io::Result<Self> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        let stdin = child
            .stdin
            .take()
            .expect("spawned child with Stdio::piped() stdin");
        let stdout = child
            .stdout
            .take()
            .expect("spawned child with Stdio::piped() stdout");

        let (incoming_tx, incoming_rx) = mpsc::channel::<ClientMessage>(CHANNEL_CAPACITY);
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<Value>();

        let reader_peer = peer.clone();
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
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
                                tracing::warn!(%err, "dropping unparseable child stdout line");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        tracing::error!(%err, "child stdout read failed");
                        break;
                    }
                }
            }
            tracing::debug!("child stdout reader finished (EOF)");
        });

        let writer_handle = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(payload) = outgoing_rx.recv().await {
                match serde_json::to_string(&payload) {
                    Ok(line) => {
                        if stdin.write_all(line.as_bytes()).await.is_err() {
                            break;
                        }
                        if stdin.write_all(b"\n").await.is_err() {
                            break;
                        }
                        if stdin.flush().await.is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::error!(%err, "failed to serialize outgoing frame"),
                }
            }
            tracing::debug!("child stdin writer finished (channel closed)");
        });

        Ok(Self {
            peer,
            child: Mutex::new(child),
            incoming: Mutex::new(incoming_rx),
            outgoing_tx,
            reader_handle,
            writer_handle,
            closed: AtomicBool::new(false),
        })
    }

    pub fn peer(&self) -> &ClientId {
        &self.peer
    }
}

#[async_trait]
impl Transport for ChildProcessTransport {
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
            return Err(format!("child transport has no such client: {client_id}").into());
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
        let mut child = self.child.lock().await;
        let _ = child.start_kill();
    }
}
