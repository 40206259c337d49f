//! Ties the loaded photon, the session manager, and the loader together
//! into the one long-lived object every transport dispatches through.
//! Holding this state behind one struct — rather than module-level
//! statics — is what spec §9's "no global mutable state" design note asks
//! for: tests construct their own `PhotonHost` with in-memory stores.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::config::store::ConfigStore;
use crate::config::RuntimeConfig;
use crate::instance::{InstanceOverrides, PhotonInstance};
use crate::loader::{LoadError, Loader};
use crate::protocol::methods::{announce_reload_failed, announce_tools_changed, MethodContext};
use crate::session::{Session, SessionManager};

pub struct PhotonHost {
    pub photon_name: String,
    pub source_path: PathBuf,
    pub config: RuntimeConfig,
    pub sessions: Arc<SessionManager>,
    config_store: Arc<ConfigStore>,
    loader: Loader,
    instance: RwLock<Arc<PhotonInstance>>,
}

/// Looks up `photon_name`'s install record and builds the overrides a
/// Photon Instance merges over its analyzed skeleton (spec §4.C), or the
/// empty overrides when the photon was never installed through the
/// marketplace (e.g. it was loaded from a bare source file).
fn overrides_for(store: &ConfigStore, photon_name: &str) -> InstanceOverrides {
    store
        .load_install_registry()
        .installs
        .into_iter()
        .find(|r| r.photon_name == photon_name)
        .map(|r| InstanceOverrides {
            icon: r.icon,
            description: r.description,
            method_descriptions: r.method_descriptions,
        })
        .unwrap_or_default()
}

impl PhotonHost {
    pub fn load(
        photon_name: String,
        source_path: PathBuf,
        config: RuntimeConfig,
        config_record: std::collections::HashMap<String, String>,
    ) -> Result<Self, LoadError> {
        let loader = Loader::new(config.cache_dir.clone());
        let loaded = loader.load(&source_path, config_record)?;
        let config_store = Arc::new(ConfigStore::new(config.config_dir.clone()));
        let overrides = overrides_for(&config_store, &photon_name);
        let instance = PhotonInstance::new(photon_name.clone(), loaded, overrides);
        Ok(Self {
            photon_name,
            source_path,
            config,
            sessions: Arc::new(SessionManager::new()),
            config_store,
            loader,
            instance: RwLock::new(Arc::new(instance)),
        })
    }

    pub fn current_instance(&self) -> Arc<PhotonInstance> {
        self.instance.read().clone()
    }

    pub fn method_context(&self, session: Arc<Session>) -> MethodContext {
        MethodContext {
            instance: self.current_instance(),
            session,
            session_manager: self.sessions.clone(),
            elicitation_timeout: Duration::from_secs(self.config.elicitation_timeout_secs),
        }
    }

    /// Reloads the current photon (spec §4.I "File Watcher", §4.B
    /// `reload`). On success, swaps the instance and emits
    /// `tools/list_changed` to every session; on failure the previous
    /// instance stays live and subscribers hear about it instead.
    pub fn reload(&self) -> Result<(), LoadError> {
        let previous = self.current_instance();

        match self.loader.reload(&self.source_path, previous.loaded()) {
            Ok(loaded) => {
                let overrides = overrides_for(&self.config_store, &self.photon_name);
                let new_instance = PhotonInstance::new(self.photon_name.clone(), loaded, overrides);
                *self.instance.write() = Arc::new(new_instance);
                for session in self.sessions.all_sessions() {
                    announce_tools_changed(&session);
                }
                Ok(())
            }
            Err(e) => {
                for session in self.sessions.all_sessions() {
                    announce_reload_failed(&session, &e.to_string());
                }
                Err(e)
            }
        }
    }
}
