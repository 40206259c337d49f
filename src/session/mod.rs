//! Session Manager (spec §4.E): per-connection state, pending invocations,
//! and elicitation correlation.

pub mod elicitation;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::PhotonError;
use elicitation::PendingElicitation;

/// A raw outbound JSON-RPC frame (request, response, or notification).
/// Built by the protocol core's `jsonrpc` helpers and handed here so a
/// session can queue it for its transport without a dependency on the
/// protocol module.
pub type Frame = Value;

/// Minimum log level a session has requested via `logging/setLevel`
/// (spec §4.F). Ord derives from declaration order, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub elicitation: bool,
    pub sampling: bool,
}

pub struct InvocationHandle {
    pub invocation_id: Uuid,
    pub tool_name: String,
    pub cancelled: Arc<AtomicBool>,
}

pub struct Session {
    pub session_id: Uuid,
    pub outbound: UnboundedSender<Frame>,
    pub protocol_version: RwLock<Option<String>>,
    pub client_capabilities: RwLock<ClientCapabilities>,
    pub min_log_level: RwLock<LogLevel>,
    subscriptions: RwLock<HashSet<String>>,
    invocations: RwLock<HashMap<Uuid, InvocationHandle>>,
    elicitations: RwLock<HashMap<Uuid, PendingElicitation>>,
}

impl Session {
    pub fn send(&self, frame: Frame) {
        let _ = self.outbound.send(frame);
    }

    pub fn subscribe(&self, channel: &str) {
        self.subscriptions.write().insert(channel.to_string());
    }

    pub fn unsubscribe(&self, channel: &str) {
        self.subscriptions.write().remove(channel);
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.subscriptions.read().contains(channel)
    }

    pub fn open_invocation(&self, tool_name: String) -> (Uuid, Arc<AtomicBool>) {
        let invocation_id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.invocations.write().insert(
            invocation_id,
            InvocationHandle {
                invocation_id,
                tool_name,
                cancelled: cancelled.clone(),
            },
        );
        (invocation_id, cancelled)
    }

    pub fn close_invocation(&self, invocation_id: Uuid) {
        self.invocations.write().remove(&invocation_id);
    }

    pub fn cancel_invocation(&self, invocation_id: Uuid) -> bool {
        if let Some(handle) = self.invocations.read().get(&invocation_id) {
            handle.cancelled.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub fn begin_elicitation(
        &self,
        form_schema: Value,
        timeout: Duration,
    ) -> (Uuid, oneshot::Receiver<Result<Value, PhotonError>>) {
        let (pending, rx) = elicitation::begin(form_schema, timeout);
        let id = pending.elicitation_id;
        self.elicitations.write().insert(id, pending);
        (id, rx)
    }

    pub fn complete_elicitation(&self, id: Uuid, value: Value) -> bool {
        let completed = self
            .elicitations
            .read()
            .get(&id)
            .map(|p| p.complete(value))
            .unwrap_or(false);
        if completed {
            self.elicitations.write().remove(&id);
        }
        completed
    }

    pub fn decline_elicitation(&self, id: Uuid) -> bool {
        let declined = self.elicitations.read().get(&id).map(|p| p.decline()).unwrap_or(false);
        if declined {
            self.elicitations.write().remove(&id);
        }
        declined
    }

    /// Cancels every outstanding invocation and rejects every pending
    /// elicitation, used on disconnect (spec §4.E, §9 Cancellation).
    fn teardown(&self) {
        for handle in self.invocations.read().values() {
            handle.cancelled.store(true, Ordering::SeqCst);
        }
        for pending in self.elicitations.read().values() {
            pending.cancel();
        }
        self.elicitations.write().clear();
    }
}

pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn create_session(&self, outbound: UnboundedSender<Frame>) -> Arc<Session> {
        let session = Arc::new(Session {
            session_id: Uuid::new_v4(),
            outbound,
            protocol_version: RwLock::new(None),
            client_capabilities: RwLock::new(ClientCapabilities::default()),
            min_log_level: RwLock::new(LogLevel::Info),
            subscriptions: RwLock::new(HashSet::new()),
            invocations: RwLock::new(HashMap::new()),
            elicitations: RwLock::new(HashMap::new()),
        });
        self.sessions.write().insert(session.session_id, session.clone());
        session
    }

    pub fn get(&self, session_id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().get(&session_id).cloned()
    }

    /// Tears down a session's in-flight work then drops it (spec §3
    /// "Session ... destroyed on disconnect").
    pub fn remove_session(&self, session_id: Uuid) {
        if let Some(session) = self.sessions.write().remove(&session_id) {
            session.teardown();
        }
    }

    pub fn sessions_subscribed_to(&self, channel: &str) -> Vec<Arc<Session>> {
        self.sessions
            .read()
            .values()
            .filter(|s| s.is_subscribed(channel))
            .cloned()
            .collect()
    }

    pub fn all_sessions(&self) -> Vec<Arc<Session>> {
        self.sessions.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_cancels_invocations_and_rejects_elicitations() {
        let manager = SessionManager::new();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let session = manager.create_session(tx);
        let (_id, cancelled) = session.open_invocation("demo/echo".to_string());

        manager.remove_session(session.session_id);
        assert!(cancelled.load(Ordering::SeqCst));
        assert!(manager.get(session.session_id).is_none());
    }

    #[test]
    fn cancel_invocation_sets_flag() {
        let manager = SessionManager::new();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let session = manager.create_session(tx);
        let (id, cancelled) = session.open_invocation("demo/echo".to_string());
        assert!(session.cancel_invocation(id));
        assert!(cancelled.load(Ordering::SeqCst));
    }
}
