//! JSON-RPC 2.0 frame construction (spec §4.F, §6). Deliberately
//! dependency-free (only `serde_json`) so other modules — notably the
//! invocation engine, which emits progress/log/elicitation frames — can
//! build frames without depending on the rest of the protocol core.

use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params,
    })
}

pub fn request(id: Value, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "method": method,
        "params": params,
    })
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

pub fn error_response(id: Value, code: i64, message: &str, data: Option<Value>) -> Value {
    let mut error = json!({ "code": code, "message": message });
    if let Some(data) = data {
        error["data"] = data;
    }
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": error,
    })
}

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const PARSE_ERROR: i64 = -32700;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_has_no_id() {
        let frame = notification("notifications/progress", json!({}));
        assert!(frame.get("id").is_none());
    }

    #[test]
    fn error_response_carries_code_and_message() {
        let frame = error_response(json!(1), METHOD_NOT_FOUND, "nope", None);
        assert_eq!(frame["error"]["code"], json!(METHOD_NOT_FOUND));
    }
}
