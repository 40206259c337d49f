//! Stdio transport (spec §4.G, §6 "Stdio wire format"): newline-delimited
//! JSON on standard input/output. Standard error is reserved for human
//! logs and never carries framing-relevant bytes — `tracing_subscriber`
//! is initialized against stderr exclusively (SPEC_FULL.md §10.1). One
//! session per process.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::host::PhotonHost;
use crate::protocol;
use crate::transport;

pub async fn run(host: Arc<PhotonHost>) -> anyhow::Result<()> {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let session = host.sessions.create_session(outbound_tx);
    info!(session_id = %session.session_id, "stdio session started");

    let writer_task = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(frame) = outbound_rx.recv().await {
            let mut line = serde_json::to_string(&frame).unwrap_or_default();
            line.push('\n');
            if stdout.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(frame) = protocol::parse_frame(line.as_bytes()) else {
            continue;
        };
        if let Some(reply) = transport::dispatch_one(&host, session.clone(), frame).await {
            session.send(reply);
        }
    }

    host.sessions.remove_session(session.session_id);
    drop(session);
    let _ = writer_task.await;
    error!("stdio stream closed; session ended");
    Ok(())
}
