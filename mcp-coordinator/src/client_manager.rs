use std::collections::HashMap;
use std::sync::Mutex;

use mcp_types::JSONRPCErrorError;
use mcp_types::RequestId;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::transport::ClientId;

/// What an outbound request eventually resolves to: either the peer's
/// `result`, or a JSON-RPC error, or the reason the wait never got a reply
/// from the peer at all (timeout, client teardown).
#[derive(Debug)]
pub enum OutboundOutcome {
    Result(Value),
    Error(JSONRPCErrorError),
    Cancelled(&'static str),
}

struct InboundEntry {
    /// The original request, kept only to echo back in `INTERNAL_ERROR`
    /// responses when a handler panics or returns an error.
    original_request: Value,
    /// `None` between [`ClientManager::begin_track_request_from_client`]
    /// reserving the request id and [`ClientManager::attach_inbound_task`]
    /// recording the task actually spawned for it — the gap exists so the
    /// duplicate-id check can run, synchronously, strictly before any
    /// handler code (even its pre-first-`.await` prologue) executes.
    task: Option<AbortHandle>,
}

struct OutboundEntry {
    original_request: Value,
    completion: oneshot::Sender<OutboundOutcome>,
}

#[derive(Default)]
struct ClientState {
    inbound: HashMap<RequestId, InboundEntry>,
    outbound: HashMap<RequestId, OutboundEntry>,
}

/// Per-client pending-in / pending-out tables. All operations take a
/// synchronous lock: short critical sections, no suspension points inside
/// the guard, so it's safe to call from the inbound loop and from handler
/// on-completion callbacks alike.
#[derive(Default)]
pub struct ClientManager {
    clients: Mutex<HashMap<ClientId, ClientState>>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_client(&self, client_id: &ClientId) {
        self.clients
            .lock()
            .unwrap()
            .entry(client_id.clone())
            .or_default();
    }

    pub fn has_client(&self, client_id: &ClientId) -> bool {
        self.clients.lock().unwrap().contains_key(client_id)
    }

    /// Reserves an inbound-table slot for `request_id` with no task
    /// attached yet. Returns `false` without mutating state if `request_id`
    /// is already tracked for this client — the caller (the coordinator)
    /// turns that into a duplicate-request wire error *before* spawning any
    /// handler task, so a rejected duplicate never runs, not even partway.
    pub fn begin_track_request_from_client(
        &self,
        client_id: &ClientId,
        request_id: RequestId,
        original_request: Value,
    ) -> bool {
        let mut clients = self.clients.lock().unwrap();
        let state = clients.entry(client_id.clone()).or_default();
        if state.inbound.contains_key(&request_id) {
            return false;
        }
        state.inbound.insert(
            request_id,
            InboundEntry {
                original_request,
                task: None,
            },
        );
        true
    }

    /// Records the task spawned for a request id reserved by
    /// [`Self::begin_track_request_from_client`]. If the entry is already
    /// gone — a peer `notifications/cancelled` or a client teardown raced
    /// ahead of the spawn — the task is aborted immediately instead of
    /// being left to run unobserved.
    pub fn attach_inbound_task(
        &self,
        client_id: &ClientId,
        request_id: &RequestId,
        task: AbortHandle,
    ) {
        let mut clients = self.clients.lock().unwrap();
        match clients
            .get_mut(client_id)
            .and_then(|state| state.inbound.get_mut(request_id))
        {
            Some(entry) => entry.task = Some(task),
            None => task.abort(),
        }
    }

    /// Atomically removes and returns the echoed request for an inbound
    /// entry. Used by the normal completion path once the handler task has
    /// already finished on its own — there's nothing left to abort.
    pub fn untrack_request_from_client(
        &self,
        client_id: &ClientId,
        request_id: &RequestId,
    ) -> Option<Value> {
        let mut clients = self.clients.lock().unwrap();
        let state = clients.get_mut(client_id)?;
        let entry = state.inbound.remove(request_id)?;
        Some(entry.original_request)
    }

    /// Cancels the task backing an inbound entry and removes it. Returns
    /// `true` if an entry was present to cancel. If the entry's task hasn't
    /// been attached yet (the request was only just reserved), removing the
    /// entry is enough: [`Self::attach_inbound_task`] will find it gone and
    /// abort the task the moment it's spawned.
    pub fn cancel_request_from_client(&self, client_id: &ClientId, request_id: &RequestId) -> bool {
        let mut clients = self.clients.lock().unwrap();
        let Some(state) = clients.get_mut(client_id) else {
            return false;
        };
        match state.inbound.remove(request_id) {
            Some(entry) => {
                if let Some(task) = entry.task {
                    task.abort();
                }
                true
            }
            None => false,
        }
    }

    pub fn track_request_to_client(
        &self,
        client_id: &ClientId,
        request_id: RequestId,
        original_request: Value,
        completion: oneshot::Sender<OutboundOutcome>,
    ) {
        let mut clients = self.clients.lock().unwrap();
        let state = clients.entry(client_id.clone()).or_default();
        state.outbound.insert(
            request_id,
            OutboundEntry {
                original_request,
                completion,
            },
        );
    }

    pub fn untrack_request_to_client(&self, client_id: &ClientId, request_id: &RequestId) {
        if let Some(state) = self.clients.lock().unwrap().get_mut(client_id) {
            state.outbound.remove(request_id);
        }
    }

    /// Removes the outbound entry and resolves its completion handle
    /// exactly once. A missing entry (already resolved, or never existed)
    /// is a silent no-op with respect to the completion handle, matching
    /// single-resolution semantics; the caller is told via the return value
    /// so it can log the dropped frame (spec §4.4: "if absent, log and
    /// drop").
    pub fn resolve_request_to_client(
        &self,
        client_id: &ClientId,
        request_id: &RequestId,
        outcome: OutboundOutcome,
    ) -> bool {
        let entry = {
            let mut clients = self.clients.lock().unwrap();
            clients
                .get_mut(client_id)
                .and_then(|state| state.outbound.remove(request_id))
        };
        match entry {
            Some(entry) => {
                // The receiver may already be gone (caller stopped awaiting,
                // e.g. after its own timeout fired first); dropping the
                // outcome is fine, there's nobody left to tell.
                let _ = entry.completion.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn original_request_to_client(
        &self,
        client_id: &ClientId,
        request_id: &RequestId,
    ) -> Option<Value> {
        self.clients
            .lock()
            .unwrap()
            .get(client_id)?
            .outbound
            .get(request_id)
            .map(|entry| entry.original_request.clone())
    }

    /// Cancels every inbound task and resolves every outbound completion
    /// handle with [`OutboundOutcome::Cancelled`], then drops the client
    /// entirely.
    pub fn cleanup_client(&self, client_id: &ClientId) {
        let state = self.clients.lock().unwrap().remove(client_id);
        let Some(state) = state else { return };
        for (_, entry) in state.inbound {
            if let Some(task) = entry.task {
                task.abort();
            }
        }
        for (_, entry) in state.outbound {
            let _ = entry
                .completion
                .send(OutboundOutcome::Cancelled("client was torn down"));
        }
    }

    pub fn cleanup_all_clients(&self) {
        let client_ids: Vec<ClientId> = self.clients.lock().unwrap().keys().cloned().collect();
        for client_id in client_ids {
            self.cleanup_client(&client_id);
        }
    }

    #[cfg(test)]
    pub fn inbound_count(&self, client_id: &ClientId) -> usize {
        self.clients
            .lock()
            .unwrap()
            .get(client_id)
            .map(|state| state.inbound.len())
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn outbound_count(&self, client_id: &ClientId) -> usize {
        self.clients
            .lock()
            .unwrap()
            .get(client_id)
            .map(|state| state.outbound.len())
            .unwrap_or(0)
    }
}
