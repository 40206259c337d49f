//! Invocation Engine (spec §4.D): validates arguments, runs the target
//! method with a scoped [`InvocationContext`], and coerces the result.

pub mod coerce;
pub mod context;
pub mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PhotonError;
use crate::instance::PhotonInstance;
use crate::model::Tool;
use crate::protocol::methods::announce_state_changed;
use crate::session::{Session, SessionManager};

use coerce::{coerce, coerce_error, CoercedResult};
use context::InvocationContext;
use state::InvocationState;

/// Grace window after a cancellation signal before an invocation's result
/// is discarded outright (spec §9 Open Questions, pinned in SPEC_FULL.md
/// §11 at 2 seconds).
pub const CANCELLATION_GRACE: Duration = Duration::from_secs(2);

pub struct ToolCallResult {
    pub content: Vec<coerce::ContentBlock>,
    pub structured_content: Option<Value>,
    pub is_error: bool,
    pub error_code: Option<&'static str>,
}

impl ToolCallResult {
    fn from_coerced(result: CoercedResult, is_error: bool) -> Self {
        Self {
            content: result.content,
            structured_content: result.structured_content,
            is_error,
            error_code: None,
        }
    }

    fn from_error(error: &PhotonError) -> Self {
        let coerced = coerce_error(&error.to_string());
        Self {
            content: coerced.content,
            structured_content: None,
            is_error: true,
            error_code: Some(error.code()),
        }
    }
}

fn resolve_tool<'a>(instance: &'a PhotonInstance, name: &str) -> Option<&'a Tool> {
    instance.tool(name).or_else(|| instance.prompt(name))
}

/// Converts numeric-looking string arguments to numbers, but only for
/// properties the schema declares as `number` (spec §4.D step 2).
fn coerce_numeric_strings(schema: &Value, args: &mut Value) {
    let (Some(properties), Some(obj)) = (schema.get("properties").and_then(|p| p.as_object()), args.as_object_mut()) else {
        return;
    };
    for (name, prop_schema) in properties {
        let wants_number = prop_schema.get("type").and_then(|t| t.as_str()) == Some("number");
        if !wants_number {
            continue;
        }
        if let Some(Value::String(s)) = obj.get(name) {
            if let Ok(n) = s.parse::<f64>() {
                if let Some(num) = serde_json::Number::from_f64(n) {
                    obj.insert(name.clone(), Value::Number(num));
                }
            }
        }
    }
}

fn validate_arguments(schema: &Value, args: &Value) -> Result<(), PhotonError> {
    let compiled = JSONSchema::compile(schema)
        .map_err(|e| PhotonError::internal(format!("invalid tool schema: {e}")))?;

    if let Err(mut errors) = compiled.validate(args) {
        if let Some(first) = errors.next() {
            return Err(PhotonError::InvalidArguments {
                property: first.instance_path.to_string(),
                message: first.to_string(),
            });
        }
    }
    Ok(())
}

/// Executes one `tools/call` (or `prompts/get`), end to end, per the
/// contract in spec §4.D.
pub async fn invoke(
    instance: Arc<PhotonInstance>,
    session: Arc<Session>,
    session_manager: Arc<SessionManager>,
    tool_name: String,
    mut arguments: Value,
    elicitation_timeout: Duration,
    announce_mutation: bool,
) -> ToolCallResult {
    let tool = match resolve_tool(&instance, &tool_name) {
        Some(t) => t.clone(),
        None => return ToolCallResult::from_error(&PhotonError::NotFound(tool_name)),
    };

    if !instance.is_configured() {
        return ToolCallResult::from_error(&PhotonError::NotConfigured {
            missing: instance.missing_config().to_vec(),
        });
    }

    coerce_numeric_strings(&tool.input_schema, &mut arguments);
    if let Err(e) = validate_arguments(&tool.input_schema, &arguments) {
        return ToolCallResult::from_error(&e);
    }

    let photon_name = instance.photon_name.clone();
    let (invocation_id, cancelled) = session.open_invocation(tool_name.clone());
    let context = Arc::new(InvocationContext::new(
        invocation_id,
        session.clone(),
        session_manager.clone(),
        tool_name.clone(),
        cancelled.clone(),
        elicitation_timeout,
    ));
    context.transition(InvocationState::Running);

    info!(invocation_id = %invocation_id, tool = %tool_name, "invocation started");

    let method_name = tool.method_name.clone();
    let bridge_context = context.clone();
    let join_handle = tokio::task::spawn_blocking(move || {
        instance.call_method(&method_name, &arguments, bridge_context)
    });

    let outcome = run_with_cancellation(join_handle, cancelled).await;
    session.close_invocation(invocation_id);

    match outcome {
        RunOutcome::Value(Ok(value)) => {
            context.transition(InvocationState::Completed);
            if announce_mutation {
                announce_state_changed(&session_manager, &photon_name);
            }
            let coerced = coerce(&value, tool.output_format, tool.linked_ui.as_deref());
            ToolCallResult::from_coerced(coerced, false)
        }
        RunOutcome::Value(Err(e)) => {
            context.transition(InvocationState::Errored);
            let coerced = coerce_error(&e.to_string());
            ToolCallResult::from_coerced(coerced, true)
        }
        RunOutcome::Cancelled => {
            context.transition(InvocationState::Cancelled);
            warn!(invocation_id = %invocation_id, "invocation cancelled");
            ToolCallResult::from_error(&PhotonError::Cancelled)
        }
    }
}

enum RunOutcome {
    Value(anyhow::Result<Value>),
    Cancelled,
}

/// Races the running method against cancellation plus a grace window
/// (spec §4.D step 7, §5 "Cancellation").
async fn run_with_cancellation(
    join_handle: tokio::task::JoinHandle<anyhow::Result<Value>>,
    cancelled: Arc<AtomicBool>,
) -> RunOutcome {
    let mut join_handle = join_handle;
    loop {
        tokio::select! {
            result = &mut join_handle => {
                return RunOutcome::Value(result.unwrap_or_else(|e| Err(anyhow::anyhow!(e))));
            }
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if cancelled.load(Ordering::SeqCst) {
                    match tokio::time::timeout(CANCELLATION_GRACE, &mut join_handle).await {
                        Ok(result) => {
                            return RunOutcome::Value(result.unwrap_or_else(|e| Err(anyhow::anyhow!(e))));
                        }
                        Err(_) => return RunOutcome::Cancelled,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_numeric_strings_when_schema_declares_number() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "count": { "type": "number" } }
        });
        let mut args = serde_json::json!({ "count": "42" });
        coerce_numeric_strings(&schema, &mut args);
        assert_eq!(args["count"], serde_json::json!(42.0));
    }

    #[test]
    fn leaves_string_typed_properties_alone() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "id": { "type": "string" } }
        });
        let mut args = serde_json::json!({ "id": "42" });
        coerce_numeric_strings(&schema, &mut args);
        assert_eq!(args["id"], serde_json::json!("42"));
    }

    #[test]
    fn validate_arguments_rejects_missing_required_property() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"]
        });
        let err = validate_arguments(&schema, &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, PhotonError::InvalidArguments { .. }));
    }
}
