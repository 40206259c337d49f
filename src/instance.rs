//! Photon Instance (spec §4.C): the loaded user object plus its catalog.
//!
//! Immutable after load; a reload produces a wholesale replacement rather
//! than mutating one in place (spec §3 Lifecycles, §5 Reload safety).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::loader::runtime::HostBridge;
use crate::loader::LoadedPhoton;
use crate::model::PhotonSpec;

/// Per-method metadata edits persisted alongside install records (spec §6
/// "Persisted layout": "metadata overrides for icon/description/per-method
/// description").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceOverrides {
    pub icon: Option<String>,
    pub description: Option<String>,
    pub method_descriptions: HashMap<String, String>,
}

pub struct PhotonInstance {
    pub photon_name: String,
    loaded: LoadedPhoton,
    spec: PhotonSpec,
}

impl PhotonInstance {
    pub fn new(photon_name: String, loaded: LoadedPhoton, overrides: InstanceOverrides) -> Self {
        let spec = build_spec(&photon_name, &loaded, &overrides);
        Self {
            photon_name,
            loaded,
            spec,
        }
    }

    pub fn catalog_snapshot(&self) -> &PhotonSpec {
        &self.spec
    }

    pub fn tool(&self, name: &str) -> Option<&crate::model::Tool> {
        self.spec.tool(name)
    }

    pub fn prompt(&self, name: &str) -> Option<&crate::model::Tool> {
        self.spec.prompt(name)
    }

    pub fn resource(&self, uri: &str) -> Option<(&crate::model::Resource, HashMap<String, String>)> {
        self.spec.resource_match(uri)
    }

    pub fn is_configured(&self) -> bool {
        self.loaded.is_configured()
    }

    pub fn missing_config(&self) -> &[String] {
        &self.loaded.missing_config
    }

    /// Calls `method_name`, which must already have been resolved to an
    /// existing tool/prompt/resource on this instance (spec §4.D step 1).
    pub fn call_method(
        &self,
        method_name: &str,
        args: &JsonValue,
        bridge: Arc<dyn HostBridge>,
    ) -> anyhow::Result<JsonValue> {
        self.loaded.call_method(method_name, args, bridge)
    }

    pub fn source_hash(&self) -> &str {
        &self.loaded.source_hash
    }

    pub(crate) fn loaded(&self) -> &LoadedPhoton {
        &self.loaded
    }
}

fn build_spec(photon_name: &str, loaded: &LoadedPhoton, overrides: &InstanceOverrides) -> PhotonSpec {
    let skeleton = &loaded.skeleton;

    let namespaced = |method_name: &str| format!("{photon_name}/{method_name}");

    let tools = skeleton
        .tools
        .iter()
        .cloned()
        .map(|mut t| {
            t.name = namespaced(&t.method_name);
            if let Some(desc) = overrides.method_descriptions.get(&t.method_name) {
                t.description = desc.clone();
            }
            t
        })
        .collect();

    let prompts = skeleton
        .prompts
        .iter()
        .cloned()
        .map(|mut t| {
            t.name = namespaced(&t.method_name);
            if let Some(desc) = overrides.method_descriptions.get(&t.method_name) {
                t.description = desc.clone();
            }
            t
        })
        .collect();

    let resources = skeleton
        .resources
        .iter()
        .cloned()
        .map(|mut r| {
            r.name = namespaced(&r.method_name);
            r
        })
        .collect();

    PhotonSpec {
        name: photon_name.to_string(),
        display_name: skeleton
            .display_name
            .clone()
            .unwrap_or_else(|| photon_name.to_string()),
        description: overrides
            .description
            .clone()
            .unwrap_or_else(|| skeleton.description.clone()),
        version: skeleton.version.clone().unwrap_or_else(|| "0.0.0".to_string()),
        icon: overrides.icon.clone().or_else(|| skeleton.icon.clone()),
        tools,
        prompts,
        resources,
        config_schema: skeleton.config_schema(),
        source_hash: loaded.source_hash.clone(),
        source_path: loaded.source_path.clone(),
    }
}
