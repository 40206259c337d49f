//! File Watcher (spec §4.I): debounced reload of the configured photon's
//! source file. Editors often replace a file via create+rename rather
//! than an in-place write, so the watch target is the file's parent
//! directory (non-recursive), filtered down to the exact path before a
//! reload is triggered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, FileIdMap};
use tracing::{error, info, warn};

use crate::host::PhotonHost;
use crate::protocol::methods::announce_state_changed;

pub struct PhotonWatcher {
    _debouncer: Debouncer<RecommendedWatcher, FileIdMap>,
}

impl PhotonWatcher {
    /// Starts watching `host`'s source file. The returned `PhotonWatcher`
    /// must be kept alive for as long as reloads should keep happening;
    /// dropping it stops the underlying OS watch.
    pub fn start(host: Arc<PhotonHost>) -> anyhow::Result<Self> {
        let target = host.source_path.clone();
        let watch_dir = target.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let debounce = host.config.file_watch_debounce();

        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            let Ok(events) = result else {
                warn!("file watcher backend reported an error");
                return;
            };
            let touched = events.iter().any(|e| e.event.paths.iter().any(|p| p == &target));
            if !touched {
                return;
            }

            info!(path = %target.display(), "source file changed; reloading");
            match host.reload() {
                Ok(()) => announce_state_changed(&host.sessions, &host.photon_name),
                Err(e) => error!(error = %e, "hot reload failed; previous instance stays live"),
            }
        })?;

        debouncer.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        info!(path = %watch_dir.display(), "file watcher active");

        Ok(Self { _debouncer: debouncer })
    }
}
