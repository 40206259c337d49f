//! Marketplace manifest shape (spec §3 "Manifest entry", §4.J).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(rename = "sourcePath")]
    pub source_path: String,
    #[serde(rename = "contentHash")]
    pub content_hash: String,
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
}

/// A fetched source manifest, cached with the time it was retrieved so
/// the manager can honor the refresh TTL (spec §4.J "Refresh policy").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceManifest {
    pub entries: Vec<ManifestEntry>,
    pub fetched_at: DateTime<Utc>,
}

impl SourceManifest {
    pub fn is_stale(&self, ttl: chrono::Duration) -> bool {
        Utc::now() - self.fetched_at > ttl
    }

    pub fn find(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}
