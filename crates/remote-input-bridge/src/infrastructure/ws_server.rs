//! BridgeServer: the HTTP + WebSocket listener remote devices connect to.
//!
//! One listener, one port, two behaviours on `/`:
//!
//! - a plain `GET /` returns the input page;
//! - a WebSocket upgrade on `/` starts a connection task that turns every text
//!   frame into exactly one reply.
//!
//! # Per-frame pipeline
//!
//! ```text
//! text frame ─► decode_operation ─► registry.current() ─► ui.call(handler.on_message)
//!     │               │                    │                         │
//!     │          decode error         no handler              HandlerResult
//!     │               ▼                    ▼                         ▼
//!     │      {success:false,..}   {success:false,..}    encode_result ─► text / close
//!     │
//!     └─ any fault on the way (handler fault, panic, UI gone) ─► close 1011
//! ```
//!
//! A connection task awaits each reply before reading the next frame, so
//! frames on one connection are handled strictly in order.  Connections are
//! independent: a fault closes only the connection it happened on.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use remote_input_core::protocol::messages::NO_ACTIVE_HANDLER_MESSAGE;
use remote_input_core::{
    decode_operation, encode_result, CloseCode, ProtocolError, ServerEndpoint, WireReply,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::application::{DispatchError, HandlerFault, SessionHandlerRegistry, UiDispatcher};
use crate::domain::BridgeConfig;
use crate::infrastructure::network::{
    find_available_port, resolve_host_ip, NetworkError, SystemInterfaces,
};

/// Page served at `GET /` when no `page_path` is configured.
pub const EMBEDDED_PAGE: &str = include_str!("../../assets/input.html");

/// Reason sent to open connections when the server stops.
const SHUTDOWN_REASON: &str = "bridge server stopped";

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for starting the bridge server.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The configured page could not be read.
    #[error("failed to read page {path}: {source}")]
    Page {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Server ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct ServerState {
    registry: SessionHandlerRegistry,
    ui: UiDispatcher,
    page: Arc<str>,
    stop: watch::Receiver<bool>,
}

/// A running listener.  Its endpoint never changes once started.
///
/// Dropping the server stops it too, without waiting.
pub struct BridgeServer {
    endpoint: ServerEndpoint,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl BridgeServer {
    /// Resolves the host address, picks a port, and starts listening.
    ///
    /// `config.host_ip` skips discovery.  The port is the first free one in
    /// `config.port_range()`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Network`] if no address or port can be found, or the
    ///   listener cannot be bound.
    /// - [`BridgeError::Page`] if `config.page_path` cannot be read.
    pub async fn start(
        config: &BridgeConfig,
        registry: SessionHandlerRegistry,
        ui: UiDispatcher,
    ) -> Result<Self, BridgeError> {
        let host_ip = match config.host_ip {
            Some(ip) => {
                info!("using configured host address {ip}");
                ip
            }
            None => resolve_host_ip(&SystemInterfaces)?,
        };
        let port = find_available_port(host_ip, config.port_range())?;
        let page = load_page(config.page_path.as_deref())?;

        Ok(Self::bind(ServerEndpoint::new(host_ip, port), page, registry, ui).await?)
    }

    /// Binds `endpoint` and serves `page` plus the WebSocket protocol on it.
    ///
    /// Port `0` binds an ephemeral port; [`endpoint`](Self::endpoint) then
    /// reports the port actually bound.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Bind`] if the listener cannot be bound.
    pub async fn bind(
        endpoint: ServerEndpoint,
        page: Arc<str>,
        registry: SessionHandlerRegistry,
        ui: UiDispatcher,
    ) -> Result<Self, NetworkError> {
        let addr = endpoint.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NetworkError::Bind { addr, source })?;
        let bound = listener
            .local_addr()
            .map_err(|source| NetworkError::Bind { addr, source })?;
        let endpoint = ServerEndpoint::new(endpoint.host_ip, bound.port());

        let (stop, stop_rx) = watch::channel(false);
        let state = ServerState {
            registry,
            ui,
            page,
            stop: stop_rx.clone(),
        };
        let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();

        let mut shutdown = stop_rx;
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop_requested(&mut shutdown).await })
                .await
        });

        info!("bridge server listening at {}", endpoint.url());
        Ok(Self {
            endpoint,
            stop,
            task: Some(task),
        })
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        self.endpoint
    }

    /// Stops accepting connections, closes the open ones, and waits for the
    /// listener task to finish.
    pub async fn shutdown(mut self) {
        self.stop.send_replace(true);
        let Some(task) = self.task.take() else {
            return;
        };
        match timeout(SHUTDOWN_TIMEOUT, task).await {
            Ok(Ok(Ok(()))) => info!("bridge server stopped"),
            Ok(Ok(Err(e))) => error!("bridge server failed: {e}"),
            Ok(Err(e)) => error!("bridge server task aborted: {e}"),
            Err(_) => warn!("bridge server did not stop within {SHUTDOWN_TIMEOUT:?}"),
        }
    }
}

impl Drop for BridgeServer {
    fn drop(&mut self) {
        self.stop.send_replace(true);
    }
}

/// Reads the page at `path`, or returns the embedded page.
///
/// # Errors
///
/// Returns [`BridgeError::Page`] if `path` cannot be read.
pub fn load_page(path: Option<&Path>) -> Result<Arc<str>, BridgeError> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map(Arc::from)
            .map_err(|source| BridgeError::Page {
                path: path.to_path_buf(),
                source,
            }),
        None => Ok(Arc::from(EMBEDDED_PAGE)),
    }
}

fn build_router(state: ServerState) -> Router {
    Router::new().route("/", get(serve_root)).with_state(state)
}

async fn serve_root(
    State(state): State<ServerState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(upgrade) => upgrade.on_upgrade(move |socket| handle_socket(socket, peer, state)),
        Err(_) => {
            debug!("serving page to {peer}");
            Html(state.page.to_string()).into_response()
        }
    }
}

// ── Per-connection loop ───────────────────────────────────────────────────────

async fn handle_socket(mut socket: WebSocket, peer: SocketAddr, state: ServerState) {
    info!("remote connection opened: {peer}");
    let mut stop = state.stop.clone();

    loop {
        let received = tokio::select! {
            received = socket.recv() => received,
            () = stop_requested(&mut stop) => {
                let _ = socket.send(close_message(CloseCode::Normal, SHUTDOWN_REASON)).await;
                break;
            }
        };
        let message = match received {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                warn!("connection {peer}: receive failed: {e}");
                break;
            }
            None => break,
        };

        let reply = match message {
            Message::Text(text) => process_frame(&state.registry, &state.ui, text.as_str()).await,
            Message::Binary(_) => reject(ProtocolError::UnsupportedFrame("binary")),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => break,
        };

        match reply {
            WireReply::Text(json) => {
                if let Err(e) = socket.send(Message::Text(json.into())).await {
                    warn!("connection {peer}: send failed: {e}");
                    break;
                }
            }
            WireReply::Close { code, reason } => {
                info!("closing connection {peer}: {code:?} {reason:?}");
                let _ = socket.send(close_message(code, &reason)).await;
                break;
            }
        }
    }

    info!("remote connection closed: {peer}");
}

/// Resolves once the server is told to stop, or once the server is gone.
///
/// The borrowed value is released before this returns, so callers may await
/// again in the same arm.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

fn close_message(code: CloseCode, reason: &str) -> Message {
    Message::Close(Some(CloseFrame {
        code: code.as_u16(),
        reason: reason.to_string().into(),
    }))
}

// ── Frame processing ──────────────────────────────────────────────────────────

/// A failure while answering one frame; closes that connection.
#[derive(Debug, Error)]
enum FrameFault {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Handler(#[from] HandlerFault),
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

/// Computes the reply to one inbound text frame.
///
/// Never fails: decode errors and the no-handler case become error replies,
/// and faults become an internal-error close.
pub async fn process_frame(
    registry: &SessionHandlerRegistry,
    ui: &UiDispatcher,
    payload: &str,
) -> WireReply {
    match answer_frame(registry, ui, payload).await {
        Ok(reply) => reply,
        Err(fault) => {
            warn!("frame handling faulted: {fault}");
            WireReply::fault(&fault.to_string())
        }
    }
}

async fn answer_frame(
    registry: &SessionHandlerRegistry,
    ui: &UiDispatcher,
    payload: &str,
) -> Result<WireReply, FrameFault> {
    debug!("inbound frame: {payload}");
    let operation = match decode_operation(payload) {
        Ok(operation) => operation,
        Err(e) => {
            warn!("rejecting frame: {e}");
            return Ok(WireReply::error(&e.to_string())?);
        }
    };

    let Some(handler) = registry.current() else {
        debug!("no active handler for {} frame", operation.kind());
        return Ok(WireReply::error(NO_ACTIVE_HANDLER_MESSAGE)?);
    };

    let kind = operation.kind();
    let result = ui.call(move || handler.on_message(operation)).await??;
    debug!("{kind} handled: {result:?}");
    Ok(encode_result(&result)?)
}

fn reject(error: ProtocolError) -> WireReply {
    warn!("rejecting frame: {error}");
    WireReply::error(&error.to_string()).unwrap_or_else(|e| WireReply::fault(&e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
