//! End-to-end "integrity mismatch" scenario (spec §8, §4.J "Fetch"): a
//! marketplace source declares a content hash that does not match the
//! bytes actually served, and the fetch fails closed with `IntegrityError`.

use std::sync::Arc;

use photon_runtime::config::store::{ConfigStore, MarketplaceListDoc, MarketplaceSourceRecord};
use photon_runtime::error::PhotonError;
use photon_runtime::marketplace::{Candidate, ManifestEntry, MarketplaceManager};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn declared_hash_mismatching_served_bytes_fails_install() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "name": "demo",
            "version": "1.0.0",
            "description": "a demo photon",
            "sourcePath": "photon.ts",
            "contentHash": "0000000000000000000000000000000000000000000000000000000000000",
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photon.ts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("export default class Demo {}"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path()));
    store
        .save_marketplace(&MarketplaceListDoc {
            sources: vec![MarketplaceSourceRecord {
                name: "alpha".to_string(),
                origin: server.uri(),
                enabled: true,
                extra: Default::default(),
            }],
        })
        .unwrap();

    let manager = MarketplaceManager::new(store, 3600).unwrap();
    manager.refresh_all(true).await;

    let candidate = Candidate {
        source_name: "alpha".to_string(),
        entry: ManifestEntry {
            name: "demo".to_string(),
            version: "1.0.0".to_string(),
            description: "a demo photon".to_string(),
            source_path: "photon.ts".to_string(),
            content_hash: "0000000000000000000000000000000000000000000000000000000000000".to_string(),
            assets: Vec::new(),
            author: None,
            license: None,
        },
    };

    let err = manager.install(&candidate).await.unwrap_err();
    match err {
        PhotonError::IntegrityError { name, declared, computed } => {
            assert_eq!(name, "demo");
            assert_eq!(declared, "0000000000000000000000000000000000000000000000000000000000000");
            assert_ne!(computed, declared);
        }
        other => panic!("expected IntegrityError, got {other:?}"),
    }
}
