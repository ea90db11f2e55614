//! Component tests for the runtime on a real frame clock.
//!
//! These run against wall-clock time with short countdowns and a fast frame
//! interval, so each test takes well under a second.

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use countdown::daemon::clock::FrameClock;
use countdown::daemon::runtime::{Command, CountdownRuntime};
use countdown::daemon::timer::{CountdownEngine, CountdownEvent};
use countdown::render::{present, Control};
use countdown::types::{CountdownConfig, CountdownMode};

fn create_runtime(
    duration_ms: u64,
) -> (
    CountdownRuntime<FrameClock>,
    mpsc::UnboundedReceiver<CountdownEvent>,
) {
    let config = CountdownConfig {
        duration_ms,
        frame_interval_ms: 5,
    };
    let (tx, rx) = mpsc::unbounded_channel();
    let clock = FrameClock::new(Duration::from_millis(config.frame_interval_ms));
    (CountdownRuntime::new(CountdownEngine::new(config, tx), clock), rx)
}

/// Applies frames until the countdown leaves the running mode.
async fn run_until_not_running(runtime: &mut CountdownRuntime<FrameClock>) -> Vec<i64> {
    let mut remaining = Vec::new();
    while runtime.state().is_running() {
        let now_ms = timeout(Duration::from_secs(2), runtime.next_tick())
            .await
            .expect("frame within timeout");
        runtime.on_tick(now_ms).unwrap();
        remaining.push(runtime.state().remaining_ms);
    }
    remaining
}

#[tokio::test]
async fn test_countdown_expires_on_real_clock() {
    let (mut runtime, mut rx) = create_runtime(150);

    runtime.apply(Command::Start { duration_ms: None }).unwrap();
    assert!(runtime.is_subscribed());

    let remaining = run_until_not_running(&mut runtime).await;

    assert_eq!(runtime.state().mode, CountdownMode::Stopped);
    assert!(!runtime.is_subscribed());
    assert!(remaining.windows(2).all(|w| w[0] >= w[1]), "{:?}", remaining);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events.first(),
        Some(&CountdownEvent::Started { duration_ms: 150 })
    );
    assert_eq!(events.last(), Some(&CountdownEvent::Expired));
    assert!(events
        .iter()
        .any(|e| matches!(e, CountdownEvent::Tick { .. })));
}

#[tokio::test]
async fn test_pause_halts_frames_and_resume_keeps_remaining() {
    let (mut runtime, _rx) = create_runtime(10_000);

    runtime.apply(Command::Start { duration_ms: None }).unwrap();
    for _ in 0..3 {
        let now_ms = runtime.next_tick().await;
        runtime.on_tick(now_ms).unwrap();
    }

    runtime.apply(Command::Pause).unwrap();
    let frozen = runtime.state().remaining_ms;
    assert!(!runtime.is_subscribed());

    let waited = timeout(Duration::from_millis(100), runtime.next_tick()).await;
    assert!(waited.is_err(), "frame delivered while paused");

    runtime.apply(Command::Resume).unwrap();
    let now_ms = runtime.next_tick().await;
    runtime.on_tick(now_ms).unwrap();

    // the 100 ms spent paused is not counted
    let remaining = runtime.state().remaining_ms;
    assert!(remaining <= frozen);
    assert!(remaining > frozen - 50, "{} vs {}", remaining, frozen);
    assert_eq!(runtime.state().total_ms, 10_000);
}

#[tokio::test]
async fn test_presentation_through_lifecycle() {
    let (mut runtime, _rx) = create_runtime(10_000);

    let p = present(runtime.state());
    assert_eq!(p.primary, Control::Start);
    assert!(!p.secondary_enabled);

    runtime.apply(Command::Start { duration_ms: None }).unwrap();
    let p = present(runtime.state());
    assert_eq!(p.primary, Control::Cancel);
    assert_eq!(p.remaining_secs, Some(10));

    runtime.apply(Command::Pause).unwrap();
    assert_eq!(present(runtime.state()).secondary, Control::Continue);

    runtime.apply(Command::Cancel).unwrap();
    let p = present(runtime.state());
    assert_eq!(p.mode_label, "stopped");
    assert_eq!(p.gauge_percent, None);
}
