//! Invocation Context (spec §3 "Invocation Context", §4.D step 3): the
//! ambient surface a running method uses to emit progress/log/publish,
//! request input, and observe cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::loader::runtime::HostBridge;
use crate::protocol::jsonrpc;
use crate::session::{Session, SessionManager};

use super::state::InvocationState;

pub struct InvocationContext {
    pub invocation_id: Uuid,
    pub session: Arc<Session>,
    pub session_manager: Arc<SessionManager>,
    pub tool_name: String,
    pub started_at: DateTime<Utc>,
    pub cancelled: Arc<AtomicBool>,
    pub elicitation_timeout: Duration,
    state: parking_lot::Mutex<InvocationState>,
}

impl InvocationContext {
    pub fn new(
        invocation_id: Uuid,
        session: Arc<Session>,
        session_manager: Arc<SessionManager>,
        tool_name: String,
        cancelled: Arc<AtomicBool>,
        elicitation_timeout: Duration,
    ) -> Self {
        Self {
            invocation_id,
            session,
            session_manager,
            tool_name,
            started_at: Utc::now(),
            cancelled,
            elicitation_timeout,
            state: parking_lot::Mutex::new(InvocationState::Accepted),
        }
    }

    pub fn state(&self) -> InvocationState {
        *self.state.lock()
    }

    /// Attempts the transition, per the state machine in spec §4.D.
    /// Returns `false` (and leaves the state unchanged) on an illegal
    /// transition rather than panicking, since a race between cancellation
    /// and completion is expected, not exceptional.
    pub fn transition(&self, next: InvocationState) -> bool {
        let mut state = self.state.lock();
        if state.can_transition_to(next) {
            *state = next;
            true
        } else {
            false
        }
    }
}

impl HostBridge for InvocationContext {
    fn progress(&self, value: f64, total: Option<f64>, message: Option<String>) {
        if self.state() != InvocationState::Running {
            return;
        }
        let mut params = serde_json::json!({
            "invocationId": self.invocation_id,
            "progress": value,
        });
        if let Some(total) = total {
            params["total"] = serde_json::json!(total);
        }
        if let Some(message) = message {
            params["message"] = serde_json::json!(message);
        }
        self.session.send(jsonrpc::notification("notifications/progress", params));
    }

    fn log(&self, level: String, message: String) {
        if self.state() != InvocationState::Running {
            return;
        }
        if !level_meets_minimum(&level, *self.session.min_log_level.read()) {
            return;
        }
        let params = serde_json::json!({
            "level": level,
            "data": message,
            "invocationId": self.invocation_id,
        });
        self.session.send(jsonrpc::notification("notifications/message", params));
    }

    fn publish(&self, channel: String, event: String, data: Value) {
        crate::broker::publish(&self.session_manager, &channel, &event, data);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn elicitation_timeout(&self) -> Duration {
        self.elicitation_timeout
    }

    fn elicit(&self, form_schema: Value, timeout: Duration) -> anyhow::Result<Value> {
        if !self.session.client_capabilities.read().elicitation {
            anyhow::bail!("client did not advertise the elicitation capability");
        }

        let (elicitation_id, rx) = self.session.begin_elicitation(form_schema.clone(), timeout);
        let request = jsonrpc::request(
            serde_json::json!(elicitation_id.to_string()),
            "elicitation/create",
            form_schema,
        );
        self.session.send(request);

        let result = futures::executor::block_on(rx)
            .map_err(|_| anyhow::anyhow!("elicitation sender dropped"))?;
        result.map_err(|e| anyhow::anyhow!(e.to_string()))
    }
}

fn level_meets_minimum(level: &str, minimum: crate::session::LogLevel) -> bool {
    use crate::session::LogLevel::*;
    let rank = |l: &str| match l {
        "debug" => Debug,
        "info" => Info,
        "notice" => Notice,
        "warning" => Warning,
        "error" => Error,
        "critical" => Critical,
        "alert" => Alert,
        "emergency" => Emergency,
        _ => Info,
    };
    rank(level) >= minimum
}
