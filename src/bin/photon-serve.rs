//! Process entry point. No CLI argument parser lives here by design (spec
//! §1: "out of scope... a thin shell invoking core operations") — this
//! binary only reads the handful of environment variables a process
//! supervisor sets, wires a [`PhotonHost`], and runs the configured
//! transport. Everything else lives in the library crate.

use std::path::PathBuf;
use std::sync::Arc;

use photon_runtime::config::TransportKind;
use photon_runtime::{PhotonHost, RuntimeConfig};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn load_transport() -> RuntimeConfig {
    let mut config = RuntimeConfig::new();
    if let Ok(kind) = std::env::var("PHOTON_TRANSPORT") {
        config = config.with_transport(match kind.as_str() {
            "http" | "http-sse" => TransportKind::HttpSse,
            "ipc" => TransportKind::Ipc,
            _ => TransportKind::Stdio,
        });
    }
    if let Ok(addr) = std::env::var("PHOTON_HTTP_ADDR") {
        config = config.with_http_addr(addr);
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let source_path = std::env::var("PHOTON_SOURCE")
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("PHOTON_SOURCE must name the photon's source file"))?;

    let photon_name = std::env::var("PHOTON_NAME").unwrap_or_else(|_| {
        source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("photon")
            .to_string()
    });

    let config = load_transport();

    let source = std::fs::read_to_string(&source_path)?;
    let skeleton = photon_runtime::analyzer::analyze(&source)
        .map_err(|e| anyhow::anyhow!("analyzing {}: {e}", source_path.display()))?;
    let config_record = photon_runtime::config::env::resolve_from_env(&photon_name, &skeleton.config_params);

    let host = Arc::new(PhotonHost::load(photon_name, source_path, config, config_record)?);
    let _watcher = photon_runtime::watcher::PhotonWatcher::start(host.clone())?;

    match host.config.transport {
        TransportKind::Stdio => photon_runtime::transport::stdio::run(host).await,
        TransportKind::HttpSse => photon_runtime::transport::http_sse::run(host).await,
        TransportKind::Ipc => photon_runtime::transport::ipc::run(host).await,
    }
}
