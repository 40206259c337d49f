//! End-to-end "progress & cancel" scenario (spec §8, §4.D, §9 Cancellation):
//! a long-running tool reports progress, observes a cancellation signal
//! mid-flight via the ambient `ctx.cancelled()`, and returns early.

use std::collections::HashMap;
use std::sync::Arc;

use photon_runtime::config::RuntimeConfig;
use photon_runtime::PhotonHost;

const WORKER_SOURCE: &str = r#"
/**
 * A photon with one long-running, cooperatively-cancellable tool.
 */
export default class Worker {
    constructor(config) {}

    /**
     * Counts upward, reporting progress, until cancelled or done.
     */
    count(args, ctx) {
        for (let i = 0; i < 50000000; i++) {
            if (i % 100000 === 0) {
                ctx.progress(i, 50000000, "counting");
                if (ctx.cancelled()) {
                    return "cancelled-early";
                }
            }
        }
        return "completed";
    }
}
"#;

#[tokio::test]
async fn cancellation_signal_interrupts_a_running_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("worker.ts");
    std::fs::write(&source_path, WORKER_SOURCE).unwrap();
    let config = RuntimeConfig::new().with_cache_dir(dir.path().join("cache"));
    let host = Arc::new(
        PhotonHost::load("worker".to_string(), source_path, config, HashMap::new()).unwrap(),
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let session = host.sessions.create_session(tx);

    let call_host = host.clone();
    let call_session = session.clone();
    let call_task = tokio::spawn(async move {
        photon_runtime::transport::dispatch_one(
            &call_host,
            call_session,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": { "name": "worker/count", "arguments": {} },
            }),
        )
        .await
        .unwrap()
    });

    let first_progress = loop {
        let frame = rx.recv().await.expect("progress notification arrives before completion");
        if frame["method"] == "notifications/progress" {
            break frame;
        }
    };
    let invocation_id = first_progress["params"]["invocationId"].as_str().unwrap().to_string();

    photon_runtime::transport::dispatch_one(
        &host,
        session,
        serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/cancelled",
            "params": { "invocationId": invocation_id },
        }),
    )
    .await;

    let result = call_task.await.unwrap();
    assert_eq!(result["result"]["isError"], false);
    let content = result["result"]["content"].as_array().unwrap();
    assert_eq!(content[0]["text"], "cancelled-early");
}
