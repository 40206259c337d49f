//! End-to-end "echo" scenario (spec §8): load a minimal photon, dispatch
//! `initialize`, `tools/list`, and `tools/call` through the protocol core
//! exactly as a transport would, and check the wire-shaped response.

use std::collections::HashMap;
use std::sync::Arc;

use photon_runtime::config::RuntimeConfig;
use photon_runtime::PhotonHost;

const ECHO_SOURCE: &str = r#"
/**
 * A minimal photon that echoes its input back.
 */
export default class Echo {
    constructor(config) {}

    /**
     * Echoes a message back to the caller.
     * @param message text to echo
     */
    echo({ message }: { message: string }) {
        return "Echo: " + message;
    }
}
"#;

fn host_for(source: &str, dir: &tempfile::TempDir) -> Arc<PhotonHost> {
    let source_path = dir.path().join("echo.ts");
    std::fs::write(&source_path, source).unwrap();
    let config = RuntimeConfig::new().with_cache_dir(dir.path().join("cache"));
    Arc::new(PhotonHost::load("echo".to_string(), source_path, config, HashMap::new()).unwrap())
}

#[tokio::test]
async fn initialize_then_list_then_call_echo() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_for(ECHO_SOURCE, &dir);

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let session = host.sessions.create_session(tx);

    let init = photon_runtime::transport::dispatch_one(
        &host,
        session.clone(),
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "protocolVersion": "2025-03-26", "capabilities": {} },
        }),
    )
    .await
    .unwrap();
    assert_eq!(init["result"]["serverInfo"]["name"], "photon-runtime");

    let list = photon_runtime::transport::dispatch_one(
        &host,
        session.clone(),
        serde_json::json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
    )
    .await
    .unwrap();
    let tools = list["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "echo/echo");

    let call = photon_runtime::transport::dispatch_one(
        &host,
        session,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "echo/echo", "arguments": { "message": "hi" } },
        }),
    )
    .await
    .unwrap();

    assert_eq!(call["result"]["isError"], false);
    let content = call["result"]["content"].as_array().unwrap();
    assert_eq!(content[0]["text"], "Echo: hi");
}

#[tokio::test]
async fn unknown_tool_name_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_for(ECHO_SOURCE, &dir);
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let session = host.sessions.create_session(tx);

    let call = photon_runtime::transport::dispatch_one(
        &host,
        session,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "echo/doesNotExist", "arguments": {} },
        }),
    )
    .await
    .unwrap();

    assert_eq!(call["result"]["isError"], true);
    assert_eq!(call["result"]["errorCode"], "NotFound");
}
