//! Compiler/Loader (spec §4.B): turns one analyzed source file into an
//! executable [`LoadedPhoton`], content-addressed cache included.

pub mod cache;
pub mod compile;
pub mod deps;
pub mod error;
pub mod runtime;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::analyzer;
use crate::model::SpecSkeleton;
pub use error::LoadError;
use runtime::{HostBridge, PhotonRuntime};

pub struct LoadedPhoton {
    pub skeleton: SpecSkeleton,
    pub source_hash: String,
    pub source_path: PathBuf,
    pub config_record: HashMap<String, String>,
    pub missing_config: Vec<String>,
    runtime: Option<PhotonRuntime>,
}

impl LoadedPhoton {
    pub fn is_configured(&self) -> bool {
        self.missing_config.is_empty()
    }

    pub fn call_method(
        &self,
        method_name: &str,
        args: &JsonValue,
        bridge: Arc<dyn HostBridge>,
    ) -> anyhow::Result<JsonValue> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("photon is not configured"))?;
        runtime.call_method(method_name, args, bridge)
    }
}

pub struct Loader {
    cache: cache::CompileCache,
}

fn source_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}

impl Loader {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache: cache::CompileCache::new(cache_root),
        }
    }

    /// Loads `path` fresh, analyzing, compiling (cache permitting), and
    /// instantiating with `config_record` — spec §4.B `load`.
    pub fn load(
        &self,
        path: &Path,
        config_record: HashMap<String, String>,
    ) -> Result<LoadedPhoton, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let skeleton = analyzer::analyze(&source).map_err(|e| LoadError::Analysis {
            path: path.to_path_buf(),
            source: e,
        })?;

        let key = cache::cache_key(&source, &skeleton.dependencies);
        let compiled_js = match self.cache.get(&key) {
            Ok(Some(cached)) => cached,
            Ok(None) | Err(_) => {
                let compiled = compile::strip_types(&source).map_err(|e| LoadError::Compile {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                let _ = self.cache.put(&key, &compiled);
                compiled
            }
        };

        let missing_config: Vec<String> = skeleton
            .config_params
            .iter()
            .filter(|p| p.required && !config_record.contains_key(&p.name))
            .map(|p| p.name.clone())
            .collect();

        let runtime = if missing_config.is_empty() {
            let runtime = PhotonRuntime::new().map_err(|e| LoadError::Compile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            let config_value = serde_json::to_value(&config_record).unwrap_or(JsonValue::Null);
            runtime
                .instantiate(&compiled_js, &skeleton.class_name, &config_value)
                .map_err(|e| LoadError::Instantiation {
                    class_name: skeleton.class_name.clone(),
                    message: e.to_string(),
                })?;
            Some(runtime)
        } else {
            None
        };

        Ok(LoadedPhoton {
            skeleton,
            source_hash: source_hash(&source),
            source_path: path.to_path_buf(),
            config_record,
            missing_config,
            runtime,
        })
    }

    /// Reloads `path` reusing `previous`'s last known configuration (spec
    /// §4.B `reload`).
    pub fn reload(&self, path: &Path, previous: &LoadedPhoton) -> Result<LoadedPhoton, LoadError> {
        self.load(path, previous.config_record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SOURCE: &str = r#"
/**
 * Demo photon.
 */
export default class Demo {
    constructor(config) {}

    /**
     * Echoes a message.
     * @param message text to echo
     */
    echo({ message }: { message: string }) {
        return "Echo: " + message;
    }
}
"#;

    #[test]
    fn loads_and_calls_echo() {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("demo.ts");
        std::fs::write(&source_path, SOURCE).unwrap();

        let loader = Loader::new(dir.path().join("cache"));
        let loaded = loader.load(&source_path, HashMap::new()).unwrap();
        assert!(loaded.is_configured());
        assert_eq!(loaded.skeleton.class_name, "Demo");

        let result = loaded
            .call_method(
                "echo",
                &serde_json::json!({ "message": "hi" }),
                Arc::new(runtime::NullBridge),
            )
            .unwrap();
        assert_eq!(result, serde_json::json!("Echo: hi"));
    }

    #[test]
    fn reload_reuses_last_config() {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("demo.ts");
        std::fs::write(&source_path, SOURCE).unwrap();

        let loader = Loader::new(dir.path().join("cache"));
        let first = loader.load(&source_path, HashMap::new()).unwrap();
        let second = loader.reload(&source_path, &first).unwrap();
        assert_eq!(second.config_record, first.config_record);
    }
}
