//! MCP Protocol Core (spec §4.F): JSON-RPC 2.0 framing and the MCP method
//! set.

pub mod jsonrpc;
pub mod methods;

use serde_json::Value;
use tracing::{debug, warn};

pub use methods::MethodContext;

/// Dispatches one decoded JSON-RPC frame. Returns `Some(response)` for a
/// request (has an `id`); `None` for a notification (no reply expected).
pub async fn dispatch(ctx: &MethodContext, frame: Value) -> Option<Value> {
    let method = frame.get("method").and_then(|m| m.as_str());
    let Some(method) = method else {
        let id = frame.get("id").cloned().unwrap_or(Value::Null);
        return Some(jsonrpc::error_response(id, jsonrpc::PARSE_ERROR, "missing 'method'", None));
    };
    let params = frame.get("params").cloned().unwrap_or(Value::Null);

    match frame.get("id").cloned() {
        Some(id) => {
            debug!(session_id = %ctx.session.session_id, %method, "request");
            Some(methods::handle_request(ctx, id, method, params).await)
        }
        None => {
            debug!(session_id = %ctx.session.session_id, %method, "notification");
            methods::handle_notification(ctx, method, params);
            None
        }
    }
}

/// Parses one line/frame of wire bytes into a JSON-RPC value, per the
/// stdio/IPC wire format (spec §6: "UTF-8 JSON objects").
pub fn parse_frame(bytes: &[u8]) -> Option<Value> {
    match serde_json::from_slice(bytes) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "malformed JSON-RPC frame");
            None
        }
    }
}
