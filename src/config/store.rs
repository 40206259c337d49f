//! Configuration Store (spec §4.L): three flat TOML documents under a
//! per-user config directory, written atomically via temp-file + rename.
//! Reads tolerate missing files (empty defaults); unknown keys round-trip
//! via each document's `extra` flatten field (spec §8 round-trip property).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PhotonError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MarketplaceSourceRecord {
    pub name: String,
    pub origin: String,
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: HashMap<String, toml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MarketplaceListDoc {
    #[serde(default)]
    pub sources: Vec<MarketplaceSourceRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstallRecordDoc {
    pub photon_name: String,
    pub source_marketplace: String,
    pub installed_version: String,
    pub installed_at: String,
    pub content_hash: String,
    /// Runtime-applied metadata edits persisted alongside the install
    /// record (spec §6 "Persisted layout": "metadata overrides for
    /// icon/description/per-method description"), merged into the Photon
    /// Instance's catalog on load (see `instance::InstanceOverrides`).
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub method_descriptions: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: HashMap<String, toml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstallRegistryDoc {
    #[serde(default)]
    pub installs: Vec<InstallRecordDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhotonConfigDoc {
    #[serde(flatten)]
    pub values: HashMap<String, String>,
}

pub struct ConfigStore {
    dir: PathBuf,
}

fn atomic_write(path: &Path, contents: &str) -> Result<(), PhotonError> {
    let dir = path.parent().expect("config path has a parent");
    std::fs::create_dir_all(dir)
        .map_err(|e| PhotonError::internal(format!("creating config dir: {e}")))?;
    let tmp = dir.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
    std::fs::write(&tmp, contents)
        .map_err(|e| PhotonError::internal(format!("writing config: {e}")))?;
    std::fs::rename(&tmp, path).map_err(|e| PhotonError::internal(format!("renaming config: {e}")))?;
    Ok(())
}

fn read_toml_or_default<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => T::default(),
    }
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn marketplace_path(&self) -> PathBuf {
        self.dir.join("marketplace.toml")
    }

    fn install_registry_path(&self) -> PathBuf {
        self.dir.join("installs.toml")
    }

    fn photon_config_path(&self, photon_name: &str) -> PathBuf {
        self.dir.join("photons").join(format!("{photon_name}.toml"))
    }

    pub fn load_marketplace(&self) -> MarketplaceListDoc {
        read_toml_or_default(&self.marketplace_path())
    }

    pub fn save_marketplace(&self, doc: &MarketplaceListDoc) -> Result<(), PhotonError> {
        let text = toml::to_string_pretty(doc).map_err(|e| PhotonError::internal(e.to_string()))?;
        atomic_write(&self.marketplace_path(), &text)
    }

    pub fn load_install_registry(&self) -> InstallRegistryDoc {
        read_toml_or_default(&self.install_registry_path())
    }

    pub fn save_install_registry(&self, doc: &InstallRegistryDoc) -> Result<(), PhotonError> {
        let text = toml::to_string_pretty(doc).map_err(|e| PhotonError::internal(e.to_string()))?;
        atomic_write(&self.install_registry_path(), &text)
    }

    pub fn load_photon_config(&self, photon_name: &str) -> PhotonConfigDoc {
        read_toml_or_default(&self.photon_config_path(photon_name))
    }

    pub fn save_photon_config(&self, photon_name: &str, doc: &PhotonConfigDoc) -> Result<(), PhotonError> {
        let text = toml::to_string_pretty(doc).map_err(|e| PhotonError::internal(e.to_string()))?;
        atomic_write(&self.photon_config_path(photon_name), &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_empty_default() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        assert!(store.load_marketplace().sources.is_empty());
    }

    #[test]
    fn round_trips_marketplace_list_preserving_unknown_keys() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path());

        let mut extra = HashMap::new();
        extra.insert("futureField".to_string(), toml::Value::String("kept".to_string()));

        let doc = MarketplaceListDoc {
            sources: vec![MarketplaceSourceRecord {
                name: "x".to_string(),
                origin: "owner/repo".to_string(),
                enabled: false,
                extra,
            }],
        };
        store.save_marketplace(&doc).unwrap();

        let loaded = store.load_marketplace();
        assert_eq!(loaded.sources.len(), 1);
        assert!(!loaded.sources[0].enabled);
        assert_eq!(
            loaded.sources[0].extra.get("futureField"),
            Some(&toml::Value::String("kept".to_string()))
        );
    }
}
