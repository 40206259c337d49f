//! Version Checker / Upgrader (spec §4.K): compares an installed photon's
//! recorded version against the newest one its source offers, detects
//! local modification via content hash, and upgrades in place when safe.

use std::path::Path;

use chrono::Utc;
use semver::Version;
use uuid::Uuid;

use crate::config::store::{ConfigStore, InstallRecordDoc};
use crate::error::PhotonError;
use crate::marketplace::fetch::sha256_hex;
use crate::marketplace::{Candidate, MarketplaceManager, Resolution};

#[derive(Debug, Clone)]
pub struct UpgradeCheck {
    pub photon_name: String,
    pub installed_version: String,
    pub latest_version: String,
    pub has_update: bool,
    pub is_locally_modified: bool,
}

#[derive(Debug, Clone)]
pub enum UpgradeOutcome {
    NoUpdate,
    BlockedByLocalModification,
    Upgraded { new_version: String },
}

fn parse(raw: &str) -> Version {
    Version::parse(raw).unwrap_or(Version::new(0, 0, 0))
}

fn local_content_hash(source_path: &Path) -> Result<String, PhotonError> {
    let bytes = std::fs::read(source_path)
        .map_err(|e| PhotonError::internal(format!("reading {}: {e}", source_path.display())))?;
    Ok(sha256_hex(&bytes))
}

/// Compares the recorded install against the candidate's manifest entry
/// without mutating anything (spec §4.K, first two sentences).
pub fn check(record: &InstallRecordDoc, candidate: &Candidate, source_path: &Path) -> Result<UpgradeCheck, PhotonError> {
    let installed = parse(&record.installed_version);
    let latest = parse(&candidate.entry.version);
    let local_hash = local_content_hash(source_path)?;

    Ok(UpgradeCheck {
        photon_name: record.photon_name.clone(),
        installed_version: record.installed_version.clone(),
        latest_version: candidate.entry.version.clone(),
        has_update: latest > installed,
        is_locally_modified: local_hash != record.content_hash,
    })
}

/// Overwrites `source_path` with the candidate's content atomically and
/// refreshes the install record atomically, unless the file has been
/// locally modified and `force` is false (spec §4.K).
pub async fn upgrade(
    manager: &MarketplaceManager,
    store: &ConfigStore,
    source_path: &Path,
    force: bool,
) -> Result<UpgradeOutcome, PhotonError> {
    let registry = store.load_install_registry();
    let photon_name = source_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PhotonError::internal("source path has no file stem"))?;
    let record = registry
        .installs
        .iter()
        .find(|r| r.photon_name == photon_name)
        .cloned()
        .ok_or_else(|| PhotonError::NotFound(photon_name.to_string()))?;

    let scoped_query = format!("{}:{}", record.source_marketplace, record.photon_name);
    let candidate = match manager.resolve(&scoped_query)? {
        Resolution::Unique(c) => c,
        Resolution::Conflict { recommendation, .. } => *recommendation,
        Resolution::NotFound => return Err(PhotonError::NotFound(photon_name.to_string())),
    };

    let outcome = check(&record, &candidate, source_path)?;
    if !outcome.has_update {
        return Ok(UpgradeOutcome::NoUpdate);
    }
    if outcome.is_locally_modified && !force {
        return Ok(UpgradeOutcome::BlockedByLocalModification);
    }

    let content = manager.install(&candidate).await?;
    atomic_write_source(source_path, &content)?;

    let mut registry = store.load_install_registry();
    registry.installs.retain(|r| r.photon_name != photon_name);
    registry.installs.push(InstallRecordDoc {
        photon_name: photon_name.to_string(),
        source_marketplace: record.source_marketplace,
        installed_version: candidate.entry.version.clone(),
        installed_at: Utc::now().to_rfc3339(),
        content_hash: candidate.entry.content_hash.clone(),
        icon: record.icon,
        description: record.description,
        method_descriptions: record.method_descriptions,
        extra: record.extra,
    });
    store.save_install_registry(&registry)?;

    Ok(UpgradeOutcome::Upgraded {
        new_version: candidate.entry.version,
    })
}

fn atomic_write_source(path: &Path, contents: &str) -> Result<(), PhotonError> {
    let dir = path.parent().ok_or_else(|| PhotonError::internal("source path has no parent"))?;
    let tmp = dir.join(format!(".tmp-{}", Uuid::new_v4()));
    std::fs::write(&tmp, contents).map_err(|e| PhotonError::internal(format!("writing upgraded source: {e}")))?;
    std::fs::rename(&tmp, path).map_err(|e| PhotonError::internal(format!("installing upgraded source: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::manifest::ManifestEntry;

    fn candidate(version: &str, hash: &str) -> Candidate {
        Candidate {
            source_name: "alpha".to_string(),
            entry: ManifestEntry {
                name: "demo".to_string(),
                version: version.to_string(),
                description: String::new(),
                source_path: "demo.ts".to_string(),
                content_hash: hash.to_string(),
                assets: Vec::new(),
                author: None,
                license: None,
            },
        }
    }

    fn record(version: &str, hash: &str) -> InstallRecordDoc {
        InstallRecordDoc {
            photon_name: "demo".to_string(),
            source_marketplace: "alpha".to_string(),
            installed_version: version.to_string(),
            installed_at: "2024-01-01T00:00:00Z".to_string(),
            content_hash: hash.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn detects_update_and_local_modification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.ts");
        std::fs::write(&path, "export default class Demo {}").unwrap();
        let local_hash = local_content_hash(&path).unwrap();

        let rec = record("1.0.0", &local_hash);
        let cand = candidate("2.0.0", "irrelevant-remote-hash");
        let result = check(&rec, &cand, &path).unwrap();
        assert!(result.has_update);
        assert!(!result.is_locally_modified);

        let rec_modified = record("1.0.0", "stale-hash-from-install-time");
        let result = check(&rec_modified, &cand, &path).unwrap();
        assert!(result.is_locally_modified);
    }
}
