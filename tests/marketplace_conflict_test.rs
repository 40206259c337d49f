//! End-to-end "marketplace conflict" scenario (spec §8, §4.J Marketplace
//! Manager): two enabled sources both offer the same photon name; the
//! manager reports the conflict and recommends the highest version.

use std::sync::Arc;

use photon_runtime::config::store::{ConfigStore, MarketplaceListDoc, MarketplaceSourceRecord};
use photon_runtime::marketplace::{MarketplaceManager, Resolution};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manifest_body(name: &str, version: &str) -> serde_json::Value {
    serde_json::json!([{
        "name": name,
        "version": version,
        "description": "a demo photon",
        "sourcePath": "photon.ts",
        "contentHash": "irrelevant-for-this-scenario",
    }])
}

#[tokio::test]
async fn two_sources_offering_the_same_name_resolve_to_a_conflict() {
    let alpha = MockServer::start().await;
    let beta = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body("demo", "1.2.0")))
        .mount(&alpha)
        .await;
    Mock::given(method("GET"))
        .and(path("/manifest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body("demo", "1.3.0")))
        .mount(&beta)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ConfigStore::new(dir.path()));
    store
        .save_marketplace(&MarketplaceListDoc {
            sources: vec![
                MarketplaceSourceRecord {
                    name: "alpha".to_string(),
                    origin: alpha.uri(),
                    enabled: true,
                    extra: Default::default(),
                },
                MarketplaceSourceRecord {
                    name: "beta".to_string(),
                    origin: beta.uri(),
                    enabled: true,
                    extra: Default::default(),
                },
            ],
        })
        .unwrap();

    let manager = MarketplaceManager::new(store, 3600).unwrap();
    let failures = manager.refresh_all(true).await;
    assert!(failures.is_empty());

    match manager.resolve("demo").unwrap() {
        Resolution::Conflict { candidates, recommendation } => {
            assert_eq!(candidates.len(), 2);
            assert_eq!(recommendation.source_name, "beta");
            assert_eq!(recommendation.entry.version, "1.3.0");
        }
        other => panic!("expected a conflict, got {other:?}"),
    }

    match manager.resolve("alpha:demo").unwrap() {
        Resolution::Unique(candidate) => assert_eq!(candidate.entry.version, "1.2.0"),
        other => panic!("expected the scoped form to force a single source, got {other:?}"),
    }
}
