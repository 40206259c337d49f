//! End-to-end "elicitation" scenario (spec §8, §3 "Pending Elicitation",
//! §4.D `elicit`): a tool suspends mid-call to request structured input
//! from the client, which replies via `elicitation/complete`.

use std::collections::HashMap;
use std::sync::Arc;

use photon_runtime::config::RuntimeConfig;
use photon_runtime::PhotonHost;

const GREETER_SOURCE: &str = r#"
/**
 * A photon whose tool asks the caller for a name before greeting them.
 */
export default class Greeter {
    constructor(config) {}

    /**
     * Greets whoever the client names in response to the elicitation.
     */
    greet(args, ctx) {
        const reply = ctx.elicit({
            type: "object",
            properties: { name: { type: "string" } },
            required: ["name"],
        });
        if (reply && reply.__photonError) {
            throw new Error(reply.__photonError);
        }
        return "Hello, " + reply.name + "!";
    }
}
"#;

#[tokio::test]
async fn tool_call_suspends_for_elicitation_then_resumes_on_reply() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("greeter.ts");
    std::fs::write(&source_path, GREETER_SOURCE).unwrap();
    let config = RuntimeConfig::new().with_cache_dir(dir.path().join("cache"));
    let host = Arc::new(
        PhotonHost::load("greeter".to_string(), source_path, config, HashMap::new()).unwrap(),
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let session = host.sessions.create_session(tx);
    session.client_capabilities.write().elicitation = true;

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
                "params": { "name": "greeter/greet", "arguments": {} },
            }),
        )
        .await
        .unwrap()
    });

    let elicit_request = loop {
        let frame = rx.recv().await.expect("elicitation request arrives");
        if frame["method"] == "elicitation/create" {
            break frame;
        }
    };
    assert_eq!(elicit_request["params"]["properties"]["name"]["type"], "string");

    let elicitation_id = uuid::Uuid::parse_str(elicit_request["id"].as_str().unwrap()).unwrap();
    assert!(session.complete_elicitation(elicitation_id, serde_json::json!({ "name": "Ada" })));

    let result = call_task.await.unwrap();
    assert_eq!(result["result"]["isError"], false);
    let content = result["result"]["content"].as_array().unwrap();
    assert_eq!(content[0]["text"], "Hello, Ada!");
}

#[tokio::test]
async fn elicit_without_capability_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("greeter.ts");
    std::fs::write(&source_path, GREETER_SOURCE).unwrap();
    let config = RuntimeConfig::new().with_cache_dir(dir.path().join("cache"));
    let host = Arc::new(
        PhotonHost::load("greeter".to_string(), source_path, config, HashMap::new()).unwrap(),
    );

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let session = host.sessions.create_session(tx);

    let result = photon_runtime::transport::dispatch_one(
        &host,
        session,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "greeter/greet", "arguments": {} },
        }),
    )
    .await
    .unwrap();

    assert_eq!(result["result"]["isError"], true);
}
