//! IPC Client for communicating with the countdown daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::cli::commands::StartArgs;
use crate::daemon::ipc::default_socket_path;
use crate::types::{IpcRequest, IpcResponse, StartParams};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(default_socket_path()?))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Sends a start command to the daemon.
    pub async fn start(&self, args: &StartArgs) -> Result<IpcResponse> {
        let request = IpcRequest::Start {
            params: StartParams {
                duration_secs: args.duration,
            },
        };
        self.send_request_with_retry(&request).await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Pause).await
    }

    /// Sends a resume command to the daemon.
    pub async fn resume(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Resume).await
    }

    /// Sends a cancel command to the daemon.
    pub async fn cancel(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Cancel).await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    /// Sends a request to the daemon with retry logic.
    ///
    /// Only transport failures are retried. An error status from the daemon
    /// is returned at once. Retrying is safe: every command is a no-op when
    /// repeated.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            match self.send_request(request).await {
                Ok(response) if !response.is_success() => {
                    anyhow::bail!("{}", response.message);
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!("リクエスト失敗 (試行 {}/{}): {}", attempt, MAX_RETRIES, e);
                    last_error = Some(e);

                    if attempt < MAX_RETRIES {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("リクエストが送信されませんでした")))
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'countdown daemon' を起動してください")?;

        let request_json =
            serde_json::to_string(request).context("リクエストのシリアライズに失敗しました")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("書き込みがタイムアウトしました")?
        .context("リクエストの送信に失敗しました")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("フラッシュがタイムアウトしました")?
            .context("フラッシュに失敗しました")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("シャットダウンに失敗しました")?;

        // The daemon closes the connection after its single response
        let mut buffer = Vec::new();
        let mut limited = (&mut stream).take(MAX_RESPONSE_SIZE);
        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            limited.read_to_end(&mut buffer),
        )
        .await
        .context("読み込みがタイムアウトしました")?
        .context("レスポンスの受信に失敗しました")?;

        if buffer.is_empty() {
            anyhow::bail!("Daemonからの応答がありませんでした");
        }

        serde_json::from_slice(&buffer).context("レスポンスのパースに失敗しました")
    }
}

// ============================================================================
// Tests
// ============================================================================
