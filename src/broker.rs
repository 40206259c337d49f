//! Channel Broker (spec §4.H): intra-process pub/sub. No persistence;
//! delivery is best-effort and fire-and-forget.

use regex::Regex;
use serde_json::Value;

use crate::protocol::jsonrpc;
use crate::session::SessionManager;

/// Publishes `{channel, event, data, timestamp}` to every session
/// subscribed to `channel`, via `notifications/channel_event`.
pub fn publish(sessions: &SessionManager, channel: &str, event: &str, data: Value) {
    let params = serde_json::json!({
        "channel": channel,
        "event": event,
        "data": data,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    let frame = jsonrpc::notification("notifications/channel_event", params);

    for session in sessions.sessions_subscribed_to(channel) {
        session.send(frame.clone());
    }
}

/// A channel name following the `"{toolName}:added|removed|updated|changed"`
/// convention (spec §4.H) that the UI layer auto-subscribes to so a tool
/// returning a collection can stream incremental mutations.
pub fn auto_subscribe_channel_for(tool_name: &str, event: &str) -> Option<String> {
    let re = Regex::new(r"^(added|removed|updated|changed)$").expect("static regex compiles");
    re.is_match(event)
        .then(|| format!("{tool_name}:{event}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_well_known_mutation_events() {
        assert_eq!(
            auto_subscribe_channel_for("demo/list", "added"),
            Some("demo/list:added".to_string())
        );
        assert_eq!(auto_subscribe_channel_for("demo/list", "weird"), None);
    }
}
