//! Embedded JS execution for a loaded photon.
//!
//! The analyzer and the protocol core never need to run user code; this is
//! the one place that does. A `PhotonRuntime` owns one QuickJS runtime and
//! context per loaded photon, evaluates the type-stripped source once to
//! define the class, instantiates it with the resolved configuration
//! record, and thereafter calls its methods by name.
//!
//! The ambient invocation context (progress/log/elicit/publish/cancelled,
//! spec §4.D) is bound into the JS global scope as plain functions rather
//! than passed as a parameter, matching how a single-object-parameter
//! method signature (`echo({message})`) leaves no second slot free; the
//! design note in spec §9 allows either an ambient surface or an explicit
//! parameter, and user photons are written against the ambient `ctx`
//! global by convention.
//!
//! `elicit` is the one ambient operation that suspends. QuickJS here runs
//! synchronously on a dedicated blocking thread (spawned via
//! `tokio::task::spawn_blocking` by the invocation engine), so suspension
//! is implemented as a plain blocking channel receive with a deadline —
//! there is no event loop to yield back to.

use std::sync::mpsc;
use std::time::Duration;

use rquickjs::{Context, Ctx, Function, Object, Runtime, Value};
use serde_json::Value as JsonValue;

/// Host-side operations a running method can trigger, bridged into JS.
/// Implemented by the invocation engine's context (spec §4.D).
pub trait HostBridge: Send + Sync {
    fn progress(&self, value: f64, total: Option<f64>, message: Option<String>);
    fn log(&self, level: String, message: String);
    fn publish(&self, channel: String, event: String, data: JsonValue);
    fn is_cancelled(&self) -> bool;
    /// Blocks the calling (dedicated) thread until the client replies,
    /// cancels, or the deadline elapses.
    fn elicit(&self, form_schema: JsonValue, timeout: Duration) -> anyhow::Result<JsonValue>;
    /// The deadline `elicit` should be called with when triggered from the
    /// ambient JS binding, which has no other way to learn the configured
    /// timeout (spec §9 Open Questions, pinned per-call in SPEC_FULL.md §11).
    fn elicitation_timeout(&self) -> Duration;
}

pub struct PhotonRuntime {
    runtime: Runtime,
    context: Context,
}

fn js_to_json(ctx: &Ctx, value: Value) -> anyhow::Result<JsonValue> {
    let stringify: Function = ctx.globals().get("JSON").and_then(|j: Object| j.get("stringify"))?;
    let text: String = stringify.call((value,))?;
    Ok(serde_json::from_str(&text)?)
}

fn json_to_js<'js>(ctx: &Ctx<'js>, value: &JsonValue) -> anyhow::Result<Value<'js>> {
    let parse: Function = ctx.globals().get("JSON").and_then(|j: Object| j.get("parse"))?;
    let text = serde_json::to_string(value)?;
    Ok(parse.call((text,))?)
}

impl PhotonRuntime {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = Runtime::new()?;
        let context = Context::full(&runtime)?;
        Ok(Self { runtime, context })
    }

    /// Evaluates the compiled (type-stripped) source and instantiates
    /// `class_name` with `config`, storing the instance in the global
    /// scope for subsequent `call_method` invocations.
    pub fn instantiate(
        &self,
        compiled_js: &str,
        class_name: &str,
        config: &JsonValue,
    ) -> anyhow::Result<()> {
        self.context.with(|ctx| -> anyhow::Result<()> {
            ctx.eval::<(), _>(compiled_js.as_bytes())
                .map_err(|e| anyhow::anyhow!("script evaluation failed: {e}"))?;

            let class: Function = ctx
                .globals()
                .get(class_name)
                .map_err(|_| anyhow::anyhow!("class '{class_name}' was not defined by the source"))?;

            let config_value = json_to_js(&ctx, config)?;
            let instance: Value = class
                .construct((config_value,))
                .map_err(|e| anyhow::anyhow!("constructor threw: {e}"))?;
            ctx.globals().set("__photonInstance", instance)?;
            Ok(())
        })
    }

    /// Calls `method_name` on the instantiated object with `args`, bridging
    /// the ambient context functions for the duration of the call.
    pub fn call_method(
        &self,
        method_name: &str,
        args: &JsonValue,
        bridge: std::sync::Arc<dyn HostBridge>,
    ) -> anyhow::Result<JsonValue> {
        self.context.with(|ctx| -> anyhow::Result<JsonValue> {
            bind_ambient_context(&ctx, bridge)?;

            let instance: Object = ctx.globals().get("__photonInstance")?;
            let method: Function = instance.get(method_name).map_err(|_| {
                anyhow::anyhow!("method '{method_name}' is not defined on the photon instance")
            })?;
            let args_value = json_to_js(&ctx, args)?;
            let photon_ctx: Value = ctx.globals().get("__photonCtx")?;

            let result: Value = method
                .call((rquickjs::function::This(instance), args_value, photon_ctx))
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            if result.is_undefined() {
                Ok(JsonValue::Null)
            } else {
                js_to_json(&ctx, result)
            }
        })
    }
}

fn bind_ambient_context(ctx: &Ctx, bridge: std::sync::Arc<dyn HostBridge>) -> anyhow::Result<()> {
    let photon_ctx = Object::new(ctx.clone())?;

    let b = bridge.clone();
    photon_ctx.set(
        "progress",
        Function::new(ctx.clone(), move |value: f64, total: Option<f64>, message: Option<String>| {
            b.progress(value, total, message);
        })?,
    )?;

    let b = bridge.clone();
    photon_ctx.set(
        "log",
        Function::new(ctx.clone(), move |level: String, message: String| {
            b.log(level, message);
        })?,
    )?;

    let b = bridge.clone();
    photon_ctx.set(
        "publish",
        Function::new(ctx.clone(), move |ctx: Ctx, channel: String, event: String, data: Value| {
            let data = js_to_json(&ctx, data).unwrap_or(JsonValue::Null);
            b.publish(channel, event, data);
        })?,
    )?;

    let b = bridge.clone();
    photon_ctx.set(
        "cancelled",
        Function::new(ctx.clone(), move || -> bool { b.is_cancelled() })?,
    )?;

    let b = bridge.clone();
    photon_ctx.set(
        "elicit",
        Function::new(ctx.clone(), move |ctx: Ctx, schema: Value| -> Value {
            let schema_json = js_to_json(&ctx, schema).unwrap_or(JsonValue::Null);
            let result = match b.elicit(schema_json, b.elicitation_timeout()) {
                Ok(v) => v,
                Err(e) => serde_json::json!({ "__photonError": e.to_string() }),
            };
            json_to_js(&ctx, &result)
                .unwrap_or_else(|_| json_to_js(&ctx, &JsonValue::Null).expect("serializing null never fails"))
        })?,
    )?;

    ctx.globals().set("__photonCtx", photon_ctx)?;
    Ok(())
}

/// A stand-in for an elicitation reply channel used outside of full
/// session wiring, e.g. in tests that drive a photon without a live
/// transport.
pub struct NullBridge;

impl HostBridge for NullBridge {
    fn progress(&self, _value: f64, _total: Option<f64>, _message: Option<String>) {}
    fn log(&self, _level: String, _message: String) {}
    fn publish(&self, _channel: String, _event: String, _data: JsonValue) {}
    fn is_cancelled(&self) -> bool {
        false
    }
    fn elicit(&self, _form_schema: JsonValue, _timeout: Duration) -> anyhow::Result<JsonValue> {
        anyhow::bail!("elicitation is not available outside of a session")
    }
    fn elicitation_timeout(&self) -> Duration {
        Duration::from_secs(120)
    }
}

/// Used by a channel-backed bridge to park the calling thread until a
/// reply, cancellation, or timeout arrives.
pub fn recv_with_deadline<T>(rx: &mpsc::Receiver<T>, timeout: Duration) -> anyhow::Result<T> {
    rx.recv_timeout(timeout)
        .map_err(|_| anyhow::anyhow!("elicitation timed out or the sender was dropped"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiate_and_call_simple_method() {
        let runtime = PhotonRuntime::new().unwrap();
        let source = "class Demo { constructor(config) { this.config = config; } echo(args) { return 'Echo: ' + args.message; } }";
        runtime
            .instantiate(source, "Demo", &serde_json::json!({}))
            .unwrap();
        let result = runtime
            .call_method(
                "echo",
                &serde_json::json!({ "message": "hi" }),
                std::sync::Arc::new(NullBridge),
            )
            .unwrap();
        assert_eq!(result, serde_json::json!("Echo: hi"));
    }
}
