//! Integration tests for Daemon-CLI IPC communication.
//!
//! These tests run the real daemon loop on a temporary socket with a manual
//! clock, and drive it through the CLI's `IpcClient`:
//! - Command flow through start, pause, resume and cancel
//! - No-op commands reported as unchanged
//! - Expiry driven by clock frames
//! - Connection error handling

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use countdown::cli::client::IpcClient;
use countdown::cli::commands::StartArgs;
use countdown::daemon::clock::ManualClock;
use countdown::daemon::ipc::{serve, IpcServer, RequestHandler};
use countdown::daemon::runtime::CountdownRuntime;
use countdown::daemon::timer::{CountdownEngine, CountdownEvent};
use countdown::types::{CountdownConfig, CountdownMode};

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a temporary socket path for testing.
fn create_temp_socket_path() -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("integration_test.sock");
    // Keep the directory so it's not deleted
    std::mem::forget(dir);
    path
}

/// A daemon loop running on a background task.
struct TestDaemon {
    client: IpcClient,
    clock: ManualClock,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<RequestHandler<ManualClock>>,
    /// Held so event delivery never fails
    _events: mpsc::UnboundedReceiver<CountdownEvent>,
}

impl TestDaemon {
    fn spawn(config: CountdownConfig) -> Self {
        let socket_path = create_temp_socket_path();
        let server = IpcServer::new(&socket_path).unwrap();

        let (event_tx, events) = mpsc::unbounded_channel();
        let clock = ManualClock::new();
        let engine = CountdownEngine::new(config, event_tx);
        let mut handler = RequestHandler::new(CountdownRuntime::new(engine, clock.clone()));

        let (stop, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            serve(&server, &mut handler, async {
                let _ = stop_rx.await;
            })
            .await
            .unwrap();
            handler
        });

        Self {
            client: IpcClient::with_socket_path(socket_path),
            clock,
            stop,
            handle,
            _events: events,
        }
    }

    /// Moves the clock to `now_ms` and delivers one frame.
    async fn frame(&self, now_ms: i64) {
        self.clock.set(now_ms);
        self.clock.fire();
        // Let the daemon loop apply the frame
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    async fn shutdown(self) -> RequestHandler<ManualClock> {
        let _ = self.stop.send(());
        self.handle.await.unwrap()
    }
}

// ============================================================================
// Command Flow
// ============================================================================

#[tokio::test]
async fn test_start_pause_resume_cancel_flow() {
    let daemon = TestDaemon::spawn(CountdownConfig::default());

    let response = daemon.client.start(&StartArgs::default()).await.unwrap();
    assert_eq!(response.message, "カウントダウンを開始しました");
    let data = response.data.unwrap();
    assert_eq!(data.mode, Some(CountdownMode::Running));
    assert_eq!(data.remaining_ms, Some(15_000));

    daemon.frame(5_000).await;
    let data = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(data.remaining_ms, Some(10_000));

    let response = daemon.client.pause().await.unwrap();
    assert_eq!(response.message, "カウントダウンを一時停止しました");
    assert_eq!(response.data.unwrap().remaining_ms, Some(10_000));

    // frames are not delivered while paused
    daemon.frame(12_000).await;
    let data = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(data.mode, Some(CountdownMode::Paused));
    assert_eq!(data.remaining_ms, Some(10_000));

    daemon.clock.set(20_000);
    let response = daemon.client.resume().await.unwrap();
    assert_eq!(response.message, "カウントダウンを再開しました");

    daemon.frame(21_000).await;
    let data = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(data.mode, Some(CountdownMode::Running));
    assert_eq!(data.remaining_ms, Some(9_000));
    assert_eq!(data.total_ms, Some(15_000));

    let response = daemon.client.cancel().await.unwrap();
    assert_eq!(response.message, "カウントダウンをキャンセルしました");
    assert_eq!(response.data.unwrap().mode, Some(CountdownMode::Stopped));

    let clock = daemon.clock.clone();
    let handler = daemon.shutdown().await;
    assert!(!handler.runtime().is_subscribed());
    assert_eq!(clock.subscribe_count(), 2);
    assert_eq!(clock.cancel_count(), 2);
}

#[tokio::test]
async fn test_start_with_custom_duration() {
    let daemon = TestDaemon::spawn(CountdownConfig::default());

    let args = StartArgs { duration: Some(90) };
    let data = daemon.client.start(&args).await.unwrap().data.unwrap();

    assert_eq!(data.total_ms, Some(90_000));
    assert_eq!(data.remaining_ms, Some(90_000));

    daemon.shutdown().await;
}

// ============================================================================
// No-op Commands
// ============================================================================

#[tokio::test]
async fn test_noop_commands_are_reported_unchanged() {
    let daemon = TestDaemon::spawn(CountdownConfig::default());

    let response = daemon.client.pause().await.unwrap();
    assert_eq!(response.status, "success");
    assert!(response.message.contains("変更なし"));
    assert!(!response.data.unwrap().changed);

    let response = daemon.client.resume().await.unwrap();
    assert!(response.message.contains("変更なし"));

    daemon.client.start(&StartArgs::default()).await.unwrap();
    let response = daemon.client.start(&StartArgs::default()).await.unwrap();
    assert_eq!(response.message, "カウントダウンは既に動作中です（変更なし）");

    let handler = daemon.shutdown().await;
    assert!(handler.runtime().state().is_running());
}

#[tokio::test]
async fn test_invalid_duration_is_an_error() {
    let daemon = TestDaemon::spawn(CountdownConfig::default());

    // Bypasses clap's range check on purpose
    let args = StartArgs { duration: Some(0) };
    let result = daemon.client.start(&args).await;

    let message = result.unwrap_err().to_string();
    assert!(message.contains("24時間"), "unexpected error: {}", message);

    let handler = daemon.shutdown().await;
    assert!(handler.runtime().state().is_stopped());
}

// ============================================================================
// Expiry
// ============================================================================

#[tokio::test]
async fn test_expiry_stops_and_unsubscribes() {
    let daemon = TestDaemon::spawn(CountdownConfig::default().with_duration_secs(1));

    daemon.client.start(&StartArgs::default()).await.unwrap();
    daemon.frame(1_000).await;
    let data = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(data.mode, Some(CountdownMode::Running));
    assert_eq!(data.remaining_ms, Some(0));

    daemon.frame(1_001).await;
    let data = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(data.mode, Some(CountdownMode::Stopped));

    assert_eq!(daemon.clock.active_subscriptions(), 0);
    assert_eq!(daemon.clock.cancel_count(), 1);

    // a new countdown can start after expiry
    let data = daemon
        .client
        .start(&StartArgs::default())
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(data.changed);
    assert_eq!(daemon.clock.active_subscriptions(), 1);

    daemon.shutdown().await;
}

// ============================================================================
// Connection Errors
// ============================================================================

#[tokio::test]
async fn test_connection_error_without_daemon() {
    let client = IpcClient::with_socket_path(create_temp_socket_path());

    let result = client.status().await;

    let message = format!("{:#}", result.unwrap_err());
    assert!(
        message.contains("Daemonに接続できません"),
        "unexpected error: {}",
        message
    );
}
