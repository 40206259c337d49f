//! Marketplace Manager (spec §4.J): enumerates configured sources, fetches
//! and caches their manifests, resolves bare names across sources, and
//! records install metadata through the Configuration Store.

pub mod fetch;
pub mod manifest;
pub mod resolve;
pub mod source;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use reqwest::Client;

use crate::config::store::{ConfigStore, InstallRecordDoc};
use crate::error::PhotonError;

pub use manifest::{ManifestEntry, SourceManifest};
pub use resolve::{Candidate, Resolution};

pub struct MarketplaceManager {
    store: Arc<ConfigStore>,
    client: Client,
    refresh_ttl: ChronoDuration,
    manifests: RwLock<HashMap<String, SourceManifest>>,
}

impl MarketplaceManager {
    pub fn new(store: Arc<ConfigStore>, refresh_ttl_secs: u64) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(StdDuration::from_secs(30)).build()?;
        Ok(Self {
            store,
            client,
            refresh_ttl: ChronoDuration::seconds(refresh_ttl_secs as i64),
            manifests: RwLock::new(HashMap::new()),
        })
    }

    /// Enabled sources from the configuration store, in persisted order.
    pub fn enabled_sources(&self) -> Vec<(String, String)> {
        self.store
            .load_marketplace()
            .sources
            .into_iter()
            .filter(|s| s.enabled)
            .map(|s| (s.name, s.origin))
            .collect()
    }

    /// Fetches a source's manifest unless a fresh one is already cached;
    /// `force` always refetches (spec §4.J "Refresh policy").
    pub async fn refresh(&self, source_name: &str, origin: &str, force: bool) -> Result<(), PhotonError> {
        if !force {
            if let Some(cached) = self.manifests.read().get(source_name) {
                if !cached.is_stale(self.refresh_ttl) {
                    return Ok(());
                }
            }
        }
        let fetched = fetch::fetch_manifest(&self.client, source_name, origin).await?;
        self.manifests.write().insert(source_name.to_string(), fetched);
        Ok(())
    }

    /// Refreshes every enabled source, tolerating individual failures so a
    /// partial outage still permits resolution from healthy sources
    /// (spec §4.J "Failure").
    pub async fn refresh_all(&self, force: bool) -> Vec<(String, PhotonError)> {
        let mut failures = Vec::new();
        for (name, origin) in self.enabled_sources() {
            if let Err(e) = self.refresh(&name, &origin, force).await {
                failures.push((name, e));
            }
        }
        failures
    }

    /// Resolves a bare name, or a `marketplaceName:name` scoped form,
    /// against currently cached manifests.
    pub fn resolve(&self, query: &str) -> Result<Resolution, PhotonError> {
        let manifests = self.manifests.read();
        if let Some((source_name, name)) = query.split_once(':') {
            let entries = manifests
                .get(source_name)
                .ok_or_else(|| PhotonError::NotFound(source_name.to_string()))?;
            return match resolve::resolve_scoped(source_name, name, &entries.entries) {
                Some(candidate) => Ok(Resolution::Unique(candidate)),
                None => Err(PhotonError::NotFound(name.to_string())),
            };
        }

        let sources: Vec<(&str, &[ManifestEntry])> =
            manifests.iter().map(|(name, m)| (name.as_str(), m.entries.as_slice())).collect();
        Ok(resolve::resolve(query, sources.into_iter()))
    }

    /// Fetches, verifies, and records an install for `candidate` (spec
    /// §4.J "Fetch"). Returns the verified source text.
    pub async fn install(&self, candidate: &Candidate) -> Result<String, PhotonError> {
        let origin = self
            .enabled_sources()
            .into_iter()
            .find(|(name, _)| name == &candidate.source_name)
            .map(|(_, origin)| origin)
            .ok_or_else(|| PhotonError::NotFound(candidate.source_name.clone()))?;

        let content = fetch::fetch_source_content(&self.client, &origin, &candidate.entry).await?;

        let mut registry = self.store.load_install_registry();
        registry.installs.retain(|r| r.photon_name != candidate.entry.name);
        registry.installs.push(InstallRecordDoc {
            photon_name: candidate.entry.name.clone(),
            source_marketplace: candidate.source_name.clone(),
            installed_version: candidate.entry.version.clone(),
            installed_at: Utc::now().to_rfc3339(),
            content_hash: candidate.entry.content_hash.clone(),
            icon: None,
            description: None,
            method_descriptions: HashMap::new(),
            extra: HashMap::new(),
        });
        self.store.save_install_registry(&registry)?;

        Ok(content)
    }
}
