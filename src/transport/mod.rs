//! Transport Layer (spec §4.G): three transports behind one shared idea —
//! a session gets a frame in, and frames (replies, notifications) go back
//! out on its `outbound` queue. Each transport module owns how bytes get
//! in and out; dispatch through the protocol core is shared.

pub mod http_sse;
pub mod ipc;
pub mod stdio;

use std::sync::Arc;

use serde_json::Value;

use crate::host::PhotonHost;
use crate::protocol;
use crate::session::Session;

/// Feeds one decoded frame through the protocol core for `session`,
/// returning the reply frame for a request (`None` for a notification).
pub async fn dispatch_one(host: &PhotonHost, session: Arc<Session>, frame: Value) -> Option<Value> {
    let ctx = host.method_context(session);
    protocol::dispatch(&ctx, frame).await
}
