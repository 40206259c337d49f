//! End-to-end "hot reload" scenario (spec §8, §4.I File Watcher, §4.B
//! `reload`): editing the loaded source swaps the instance and notifies
//! every session; a syntactically broken edit leaves the previous
//! instance live and reports the failure instead.

use std::collections::HashMap;
use std::sync::Arc;

use photon_runtime::config::RuntimeConfig;
use photon_runtime::PhotonHost;

const V1_SOURCE: &str = r#"
/**
 * @version 1.0.0
 */
export default class Demo {
    constructor(config) {}

    /** Echoes a message. */
    echo({ message }: { message: string }) {
        return "v1: " + message;
    }
}
"#;

const V2_SOURCE: &str = r#"
/**
 * @version 2.0.0
 */
export default class Demo {
    constructor(config) {}

    /** Echoes a message, differently. */
    echo({ message }: { message: string }) {
        return "v2: " + message;
    }
}
"#;

const BROKEN_SOURCE: &str = r#"
export default class Demo {
    constructor(config) {}
    echo({ message {
"#;

fn host_at(dir: &tempfile::TempDir) -> (Arc<PhotonHost>, std::path::PathBuf) {
    let source_path = dir.path().join("demo.ts");
    std::fs::write(&source_path, V1_SOURCE).unwrap();
    let config = RuntimeConfig::new().with_cache_dir(dir.path().join("cache"));
    let host = Arc::new(
        PhotonHost::load("demo".to_string(), source_path.clone(), config, HashMap::new()).unwrap(),
    );
    (host, source_path)
}

#[test]
fn successful_reload_swaps_instance_and_notifies_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let (host, source_path) = host_at(&dir);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let session = host.sessions.create_session(tx);

    assert_eq!(host.current_instance().catalog_snapshot().version, "1.0.0");

    std::fs::write(&source_path, V2_SOURCE).unwrap();
    host.reload().expect("v2 source is well-formed");

    assert_eq!(host.current_instance().catalog_snapshot().version, "2.0.0");

    let frame = rx.try_recv().expect("tools/list_changed was sent");
    assert_eq!(frame["method"], "notifications/tools/list_changed");
    drop(session);
}

#[test]
fn broken_reload_keeps_previous_instance_and_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (host, source_path) = host_at(&dir);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let session = host.sessions.create_session(tx);

    std::fs::write(&source_path, BROKEN_SOURCE).unwrap();
    let result = host.reload();
    assert!(result.is_err());

    assert_eq!(host.current_instance().catalog_snapshot().version, "1.0.0");

    let frame = rx.try_recv().expect("reload failure was reported");
    assert_eq!(frame["method"], "notifications/message");
    assert_eq!(frame["params"]["level"], "error");
    drop(session);
}
