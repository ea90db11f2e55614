//! IPC Server for the countdown daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for countdown commands
//! - The daemon loop that owns the runtime

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};

use crate::types::{CountdownConfig, IpcRequest, IpcResponse, ResponseData, StartParams};

use super::clock::{ClockSource, FrameClock};
use super::runtime::{spawn_event_logger, Command, CountdownRuntime};
use super::timer::{CountdownEngine, Transition};

// ============================================================================
// Constants
// ============================================================================

/// Default socket path, relative to the home directory
pub const DEFAULT_SOCKET_PATH: &str = ".countdown/countdown.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Returns `~/.countdown/countdown.sock`.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("ホームディレクトリが見つかりません")?;
    Ok(home.join(DEFAULT_SOCKET_PATH))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// Client closed the connection without sending a request
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// The daemon loop is gone
    #[error("Daemon is shutting down")]
    ShuttingDown,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE + 1];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the countdown runtime it owns.
pub struct RequestHandler<C: ClockSource> {
    runtime: CountdownRuntime<C>,
}

impl<C: ClockSource> RequestHandler<C> {
    /// Creates a new request handler around the given runtime.
    pub fn new(runtime: CountdownRuntime<C>) -> Self {
        Self { runtime }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub fn handle(&mut self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start { params } => self.handle_start(params),
            IpcRequest::Pause => self.dispatch(
                Command::Pause,
                "カウントダウンを一時停止しました",
                "カウントダウンは実行されていません（変更なし）",
            ),
            IpcRequest::Resume => self.dispatch(
                Command::Resume,
                "カウントダウンを再開しました",
                "カウントダウンは一時停止していません（変更なし）",
            ),
            IpcRequest::Cancel => self.dispatch(
                Command::Cancel,
                "カウントダウンをキャンセルしました",
                "カウントダウンは既に停止しています（変更なし）",
            ),
            IpcRequest::Status => self.handle_status(),
        }
    }

    /// Handles the start command.
    fn handle_start(&mut self, params: StartParams) -> IpcResponse {
        let duration_ms = match params.duration_secs {
            Some(secs) => {
                let config = self.runtime.engine().config().clone().with_duration_secs(secs);
                if let Err(e) = config.validate() {
                    return IpcResponse::error(e.to_string());
                }
                Some(config.duration_ms_signed())
            }
            None => None,
        };

        self.dispatch(
            Command::Start { duration_ms },
            "カウントダウンを開始しました",
            "カウントダウンは既に動作中です（変更なし）",
        )
    }

    fn dispatch(&mut self, command: Command, applied: &str, unchanged: &str) -> IpcResponse {
        match self.runtime.apply(command) {
            Ok(transition) => self.respond(transition, applied, unchanged),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn respond(&self, transition: Transition, applied: &str, unchanged: &str) -> IpcResponse {
        let changed = transition.changed();
        let message = if changed { applied } else { unchanged };
        IpcResponse::success(
            message,
            Some(ResponseData::from_state(self.runtime.state(), changed)),
        )
    }

    /// Handles the status command.
    fn handle_status(&self) -> IpcResponse {
        IpcResponse::success(
            "",
            Some(ResponseData::from_state(self.runtime.state(), false)),
        )
    }

    /// Returns the runtime.
    pub fn runtime(&self) -> &CountdownRuntime<C> {
        &self.runtime
    }

    /// Returns the runtime mutably (for the daemon loop's tick branch).
    pub fn runtime_mut(&mut self) -> &mut CountdownRuntime<C> {
        &mut self.runtime
    }
}

// ============================================================================
// Daemon loop
// ============================================================================

type PendingRequest = (IpcRequest, oneshot::Sender<IpcResponse>);

/// Reads one request, hands it to the owner loop, and writes back its reply.
async fn handle_connection(
    mut stream: UnixStream,
    requests: mpsc::Sender<PendingRequest>,
) -> Result<()> {
    let request = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("invalid request: {:#}", e);
            let response = IpcResponse::error(format!("不正なリクエストです: {}", e));
            return IpcServer::send_response(&mut stream, &response).await;
        }
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    requests
        .send((request, reply_tx))
        .await
        .map_err(|_| IpcError::ShuttingDown)?;
    let response = reply_rx.await.map_err(|_| IpcError::ShuttingDown)?;

    IpcServer::send_response(&mut stream, &response).await
}

/// Runs the daemon loop until `shutdown` completes.
///
/// Connections are read on their own tasks; every request and every clock
/// frame is applied here, in arrival order.
pub async fn serve<C, F>(server: &IpcServer, handler: &mut RequestHandler<C>, shutdown: F) -> Result<()>
where
    C: ClockSource,
    F: Future<Output = ()>,
{
    let (request_tx, mut request_rx) = mpsc::channel::<PendingRequest>(32);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            accepted = server.accept() => {
                match accepted {
                    Ok(stream) => {
                        let requests = request_tx.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, requests).await {
                                tracing::warn!("connection failed: {:#}", e);
                            }
                        });
                    }
                    Err(e) => tracing::warn!("{:#}", e),
                }
            }
            Some((request, reply)) = request_rx.recv() => {
                tracing::debug!(?request, "request");
                let response = handler.handle(request);
                // The client may have gone away; nothing to do then
                let _ = reply.send(response);
            }
            now_ms = handler.runtime_mut().next_tick() => {
                if let Err(e) = handler.runtime_mut().on_tick(now_ms) {
                    tracing::warn!("tick failed: {:#}", e);
                }
            }
        }
    }

    Ok(())
}

/// Binds the socket and runs the daemon until Ctrl-C.
pub async fn run_daemon(socket_path: &Path, config: CountdownConfig) -> Result<()> {
    config.validate()?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let logger = spawn_event_logger(event_rx);

    let clock = FrameClock::new(Duration::from_millis(config.frame_interval_ms));
    let engine = CountdownEngine::new(config, event_tx);
    let mut handler = RequestHandler::new(CountdownRuntime::new(engine, clock));

    let server = IpcServer::new(socket_path)?;
    tracing::info!(socket = %server.socket_path().display(), "daemon listening");

    serve(&server, &mut handler, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    // Dropping the handler closes the event channel
    drop(handler);
    let _ = logger.await;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
