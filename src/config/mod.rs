//! Configuration (SPEC_FULL.md §10.3): resolved per-user directories and
//! transport selection, built the way the teacher's `ForgeConfig` is —
//! a small cloneable struct with `with_*` builder methods.

pub mod env;
pub mod store;

use std::path::PathBuf;
use std::time::Duration;

pub use store::ConfigStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Stdio,
    HttpSse,
    Ipc,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub transport: TransportKind,
    pub http_addr: String,
    pub elicitation_timeout_secs: u64,
    pub file_watch_debounce_ms: u64,
    pub marketplace_refresh_ttl_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let base = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        let cache = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            config_dir: base.join("photon"),
            cache_dir: cache.join("photon"),
            transport: TransportKind::Stdio,
            http_addr: "127.0.0.1:7337".to_string(),
            elicitation_timeout_secs: 120,
            file_watch_debounce_ms: 300,
            marketplace_refresh_ttl_secs: 3600,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn elicitation_timeout(&self) -> Duration {
        Duration::from_secs(self.elicitation_timeout_secs)
    }

    pub fn file_watch_debounce(&self) -> Duration {
        Duration::from_millis(self.file_watch_debounce_ms)
    }
}
