//! MCP method handlers (spec §4.F).

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::instance::PhotonInstance;
use crate::invocation::{self, ToolCallResult};
use crate::session::{LogLevel, Session, SessionManager};

use super::jsonrpc::{self, INVALID_PARAMS, METHOD_NOT_FOUND};

pub const PROTOCOL_VERSION: &str = "2025-03-26";

pub struct MethodContext {
    pub instance: Arc<PhotonInstance>,
    pub session: Arc<Session>,
    pub session_manager: Arc<SessionManager>,
    pub elicitation_timeout: Duration,
}

/// Dispatches one JSON-RPC request (has an `id`) to its handler, returning
/// the response frame. Unknown methods get `MethodNotFound` (spec §4.F).
pub async fn handle_request(ctx: &MethodContext, id: Value, method: &str, params: Value) -> Value {
    match method {
        "initialize" => initialize(ctx, id, params),
        "tools/list" => tools_list(ctx, id),
        "tools/call" => tools_call(ctx, id, params).await,
        "prompts/list" => prompts_list(ctx, id),
        "prompts/get" => prompts_get(ctx, id, params).await,
        "resources/list" => resources_list(ctx, id),
        "resources/read" => resources_read(ctx, id, params),
        "logging/setLevel" => logging_set_level(ctx, id, params),
        _ => jsonrpc::error_response(id, METHOD_NOT_FOUND, &format!("unknown method '{method}'"), None),
    }
}

/// Dispatches one JSON-RPC notification (no `id`, no reply expected).
pub fn handle_notification(ctx: &MethodContext, method: &str, params: Value) {
    match method {
        "notifications/initialized" => {}
        "notifications/cancelled" => notifications_cancelled(ctx, params),
        "elicitation/complete" => elicitation_complete(ctx, params),
        _ => {}
    }
}

fn initialize(ctx: &MethodContext, id: Value, params: Value) -> Value {
    if let Some(version) = params.get("protocolVersion").and_then(|v| v.as_str()) {
        *ctx.session.protocol_version.write() = Some(version.to_string());
    }
    if let Some(caps) = params.get("capabilities") {
        let mut capabilities = ctx.session.client_capabilities.write();
        capabilities.elicitation = caps.get("elicitation").is_some();
        capabilities.sampling = caps.get("sampling").is_some();
    }

    jsonrpc::success_response(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": true},
                "resources": {},
                "prompts": {},
                "logging": {},
                "elicitation": {},
            },
            "serverInfo": {
                "name": "photon-runtime",
                "version": env!("CARGO_PKG_VERSION"),
            },
        }),
    )
}

fn tools_list(ctx: &MethodContext, id: Value) -> Value {
    let tools: Vec<Value> = ctx
        .instance
        .catalog_snapshot()
        .tools
        .iter()
        .filter(|t| !t.flags.internal)
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "inputSchema": t.input_schema,
            })
        })
        .collect();
    jsonrpc::success_response(id, json!({ "tools": tools }))
}

fn prompts_list(ctx: &MethodContext, id: Value) -> Value {
    let prompts: Vec<Value> = ctx
        .instance
        .catalog_snapshot()
        .prompts
        .iter()
        .filter(|p| !p.flags.internal)
        .map(|p| {
            json!({
                "name": p.name,
                "description": p.description,
                "arguments": p.input_schema,
            })
        })
        .collect();
    jsonrpc::success_response(id, json!({ "prompts": prompts }))
}

fn resources_list(ctx: &MethodContext, id: Value) -> Value {
    let resources: Vec<Value> = ctx
        .instance
        .catalog_snapshot()
        .resources
        .iter()
        .map(|r| {
            json!({
                "uri": r.uri_template,
                "name": r.name,
                "description": r.description,
                "mimeType": r.mime_type,
            })
        })
        .collect();
    jsonrpc::success_response(id, json!({ "resources": resources }))
}

fn resources_read(ctx: &MethodContext, id: Value, params: Value) -> Value {
    let uri = match params.get("uri").and_then(|v| v.as_str()) {
        Some(u) => u,
        None => return jsonrpc::error_response(id, INVALID_PARAMS, "missing 'uri'", None),
    };

    let Some((resource, bindings)) = ctx.instance.resource(uri) else {
        return jsonrpc::error_response(id, INVALID_PARAMS, &format!("no resource matches '{uri}'"), None);
    };
    let method_name = resource.method_name.clone();
    let mime_type = resource.mime_type.clone();

    let args = json!(bindings);
    let bridge: Arc<dyn crate::loader::runtime::HostBridge> = Arc::new(crate::loader::runtime::NullBridge);
    match ctx.instance.call_method(&method_name, &args, bridge) {
        Ok(value) => {
            let mut content = json!({ "uri": uri, "mimeType": mime_type });
            match value {
                Value::String(text) => content["text"] = json!(text),
                other => content["text"] = json!(serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string())),
            }
            jsonrpc::success_response(id, json!({ "contents": [content] }))
        }
        Err(e) => jsonrpc::error_response(id, INVALID_PARAMS, &e.to_string(), None),
    }
}

async fn tools_call(ctx: &MethodContext, id: Value, params: Value) -> Value {
    call_member(ctx, id, params, true).await
}

async fn prompts_get(ctx: &MethodContext, id: Value, params: Value) -> Value {
    call_member(ctx, id, params, false).await
}

/// Shared body of `tools/call` and `prompts/get`. `announce_mutation`
/// distinguishes the two: a tool call is assumed to mutate user-visible
/// state (spec §4.F), a prompt render is not.
async fn call_member(ctx: &MethodContext, id: Value, params: Value, announce_mutation: bool) -> Value {
    let name = match params.get("name").and_then(|v| v.as_str()) {
        Some(n) => n.to_string(),
        None => return jsonrpc::error_response(id, INVALID_PARAMS, "missing 'name'", None),
    };
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let result = invocation::invoke(
        ctx.instance.clone(),
        ctx.session.clone(),
        ctx.session_manager.clone(),
        name,
        arguments,
        ctx.elicitation_timeout,
        announce_mutation,
    )
    .await;

    tool_call_result_response(id, result)
}

fn tool_call_result_response(id: Value, result: ToolCallResult) -> Value {
    let content: Vec<Value> = result
        .content
        .iter()
        .map(|c| serde_json::to_value(c).unwrap_or(Value::Null))
        .collect();
    let mut body = json!({
        "content": content,
        "isError": result.is_error,
    });
    if let Some(structured) = result.structured_content {
        body["structuredContent"] = structured;
    }
    if let Some(code) = result.error_code {
        body["errorCode"] = json!(code);
    }
    jsonrpc::success_response(id, body)
}

fn logging_set_level(ctx: &MethodContext, id: Value, params: Value) -> Value {
    let level = params.get("level").and_then(|v| v.as_str()).unwrap_or("info");
    let parsed = match level {
        "debug" => LogLevel::Debug,
        "notice" => LogLevel::Notice,
        "warning" => LogLevel::Warning,
        "error" => LogLevel::Error,
        "critical" => LogLevel::Critical,
        "alert" => LogLevel::Alert,
        "emergency" => LogLevel::Emergency,
        _ => LogLevel::Info,
    };
    *ctx.session.min_log_level.write() = parsed;
    jsonrpc::success_response(id, json!({}))
}

fn notifications_cancelled(ctx: &MethodContext, params: Value) {
    if let Some(id) = params.get("invocationId").and_then(|v| v.as_str()) {
        if let Ok(uuid) = uuid::Uuid::parse_str(id) {
            ctx.session.cancel_invocation(uuid);
        }
    }
}

fn elicitation_complete(ctx: &MethodContext, params: Value) {
    let Some(id_str) = params.get("elicitationId").and_then(|v| v.as_str()) else {
        return;
    };
    let Ok(id) = uuid::Uuid::parse_str(id_str) else {
        return;
    };
    match params.get("action").and_then(|v| v.as_str()) {
        Some("decline") => {
            ctx.session.decline_elicitation(id);
        }
        _ => {
            let value = params.get("value").cloned().unwrap_or(Value::Null);
            ctx.session.complete_elicitation(id, value);
        }
    }
}

pub fn announce_tools_changed(session: &Session) {
    session.send(jsonrpc::notification("notifications/tools/list_changed", json!({})));
}

/// Reports a reload failure the same way any other error-level log line is
/// reported (spec §7 "LoadError": "Emitted to subscribed sessions as a
/// `notifications/message` at error level").
pub fn announce_reload_failed(session: &Session, message: &str) {
    session.send(jsonrpc::notification(
        "notifications/message",
        json!({ "level": "error", "data": message }),
    ));
}

/// Signals that a photon's user-visible state changed: a successful reload,
/// or a tool call that mutated state (spec §4.F: "after methods that mutate
/// user-visible state").
pub fn announce_state_changed(sessions: &SessionManager, photon_name: &str) {
    for session in sessions.all_sessions() {
        session.send(jsonrpc::notification(
            "notifications/photon_state_changed",
            json!({ "photon": photon_name }),
        ));
    }
}

