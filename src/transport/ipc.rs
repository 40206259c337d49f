//! Local IPC transport (spec §4.G, §6): length-prefixed JSON frames over a
//! Unix domain socket, used by the bundled control panel running on the
//! same host. Framing is the only difference from stdio — each frame is
//! preceded by its length as a 4-byte big-endian `u32`; dispatch is the
//! same `transport::dispatch_one` call every transport shares.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::host::PhotonHost;
use crate::protocol;
use crate::transport;

const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

fn socket_path(host: &PhotonHost) -> PathBuf {
    host.config.cache_dir.join("photon.sock")
}

async fn write_frame(stream: &mut (impl AsyncWriteExt + Unpin), frame: &serde_json::Value) -> std::io::Result<()> {
    let bytes = serde_json::to_vec(frame).unwrap_or_default();
    stream.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    stream.write_all(&bytes).await
}

async fn read_frame(stream: &mut (impl AsyncReadExt + Unpin)) -> std::io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "frame too large"));
    }
    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Accepts IPC connections on a local Unix socket under the runtime's
/// cache directory, serving one session per connection until the socket
/// is removed by the process owning this runtime.
pub async fn run(host: Arc<PhotonHost>) -> anyhow::Result<()> {
    let path = socket_path(&host);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&path);

    let listener = UnixListener::bind(&path)?;
    info!(path = %path.display(), "IPC transport listening");

    loop {
        let (stream, _addr) = listener.accept().await?;
        let host = host.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(host, stream).await {
                warn!(error = %e, "IPC connection ended with an error");
            }
        });
    }
}

async fn serve_connection(host: Arc<PhotonHost>, mut stream: UnixStream) -> anyhow::Result<()> {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let session = host.sessions.create_session(outbound_tx);
    info!(session_id = %session.session_id, "IPC session started");

    let (mut reader, mut writer) = stream.split();

    let writer_task = async {
        while let Some(frame) = outbound_rx.recv().await {
            if write_frame(&mut writer, &frame).await.is_err() {
                break;
            }
        }
    };

    let reader_task = async {
        loop {
            let Some(body) = read_frame(&mut reader).await? else {
                break;
            };
            let Some(frame) = protocol::parse_frame(&body) else {
                continue;
            };
            if let Some(reply) = transport::dispatch_one(&host, session.clone(), frame).await {
                session.send(reply);
            }
        }
        Ok::<(), std::io::Error>(())
    };

    tokio::select! {
        _ = writer_task => {}
        res = reader_task => { res?; }
    }

    host.sessions.remove_session(session.session_id);
    error!(session_id = %session.session_id, "IPC connection closed; session ended");
    Ok(())
}
