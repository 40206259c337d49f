//! HTTP+SSE transport (spec §4.G, §6): one POST endpoint for client-to-
//! server frames, one GET endpoint opening a per-session Server-Sent
//! Events stream for server-to-client frames (replies to long-running
//! calls, progress notifications, elicitation requests). `Last-Event-ID`
//! is honored best-effort against a bounded in-memory replay buffer.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::BroadcastStream;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::host::PhotonHost;
use crate::transport;

const REPLAY_CAPACITY: usize = 256;

#[derive(Clone)]
struct BufferedEvent {
    id: u64,
    frame: Value,
}

struct EventStream {
    next_id: AtomicU64,
    replay: Mutex<VecDeque<BufferedEvent>>,
    sender: broadcast::Sender<BufferedEvent>,
}

impl EventStream {
    fn new() -> Self {
        let (sender, _rx) = broadcast::channel(REPLAY_CAPACITY);
        Self {
            next_id: AtomicU64::new(1),
            replay: Mutex::new(VecDeque::with_capacity(REPLAY_CAPACITY)),
            sender,
        }
    }

    fn push(&self, frame: Value) {
        let event = BufferedEvent {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            frame,
        };
        let mut replay = self.replay.lock();
        if replay.len() == REPLAY_CAPACITY {
            replay.pop_front();
        }
        replay.push_back(event.clone());
        let _ = self.sender.send(event);
    }

    fn missed_since(&self, last_event_id: u64) -> Vec<BufferedEvent> {
        self.replay.lock().iter().filter(|e| e.id > last_event_id).cloned().collect()
    }
}

fn to_sse_event(e: &BufferedEvent) -> Event {
    Event::default().id(e.id.to_string()).event("message").data(e.frame.to_string())
}

struct HttpSseState {
    host: Arc<PhotonHost>,
    streams: RwLock<HashMap<Uuid, Arc<EventStream>>>,
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

pub fn router(host: Arc<PhotonHost>) -> Router {
    let state = Arc::new(HttpSseState {
        host,
        streams: RwLock::new(HashMap::new()),
    });

    Router::new()
        .route("/sse", get(open_sse))
        .route("/message", post(post_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn open_sse(
    State(state): State<Arc<HttpSseState>>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let last_event_id: u64 = headers
        .get("Last-Event-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let requested = query
        .session_id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .filter(|id| state.streams.read().contains_key(id));

    let (session_id, event_stream, is_new) = match requested {
        Some(id) => (id, state.streams.read().get(&id).cloned().unwrap(), false),
        None => {
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            let session = state.host.sessions.create_session(outbound_tx);
            let id = session.session_id;
            let event_stream = Arc::new(EventStream::new());
            state.streams.write().insert(id, event_stream.clone());
            spawn_forwarder(outbound_rx, event_stream.clone());
            (id, event_stream, true)
        }
    };

    let initial = if is_new {
        let endpoint = serde_json::json!({
            "sessionId": session_id,
            "messageUrl": format!("/message?sessionId={session_id}"),
        });
        Some(Ok::<_, std::convert::Infallible>(
            Event::default().event("endpoint").data(endpoint.to_string()),
        ))
    } else {
        None
    };
    let initial_stream = stream::iter(initial.into_iter());

    let missed = event_stream.missed_since(last_event_id);
    let replay_stream = stream::iter(missed.into_iter().map(|e| Ok(to_sse_event(&e))));

    let receiver = event_stream.sender.subscribe();
    let live_stream = BroadcastStream::new(receiver)
        .filter_map(|r| async move { r.ok().map(|e| Ok(to_sse_event(&e))) });

    let combined: std::pin::Pin<Box<dyn Stream<Item = Result<Event, std::convert::Infallible>> + Send>> =
        Box::pin(initial_stream.chain(replay_stream).chain(live_stream));

    (
        [
            ("X-Accel-Buffering", "no"),
            ("Cache-Control", "no-cache, no-store, must-revalidate"),
        ],
        Sse::new(combined).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping")),
    )
}

fn spawn_forwarder(mut outbound_rx: mpsc::UnboundedReceiver<Value>, event_stream: Arc<EventStream>) {
    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            event_stream.push(frame);
        }
    });
}

async fn post_message(
    State(state): State<Arc<HttpSseState>>,
    Query(query): Query<SessionQuery>,
    Json(frame): Json<Value>,
) -> Response {
    let Some(session_id) = query.session_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()) else {
        return (StatusCode::BAD_REQUEST, "missing or invalid sessionId").into_response();
    };
    let Some(session) = state.host.sessions.get(session_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match transport::dispatch_one(&state.host, session, frame).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

pub async fn run(host: Arc<PhotonHost>) -> anyhow::Result<()> {
    let addr = host.config.http_addr.clone();
    let app = router(host);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "HTTP+SSE transport listening");
    axum::serve(listener, app).await?;
    Ok(())
}
