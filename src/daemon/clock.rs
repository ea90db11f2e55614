//! Clock sources for the countdown.
//!
//! A clock source has two jobs:
//! - Stamp commands with the current time (`now_ms`)
//! - Deliver one timestamp per display frame to a subscriber until the
//!   returned [`Subscription`] is cancelled
//!
//! Timestamps are milliseconds since the clock's own epoch and never decrease.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::types::DEFAULT_FRAME_INTERVAL_MS;

/// Callback invoked with each frame timestamp.
pub type TickCallback = Box<dyn FnMut(i64) + Send + 'static>;

/// Source of frame timestamps.
pub trait ClockSource {
    /// Returns the current timestamp in this clock's domain.
    fn now_ms(&self) -> i64;

    /// Starts delivering frame timestamps to `on_tick`.
    ///
    /// At most one callback is pending at a time. Delivery stops when the
    /// returned subscription is cancelled or dropped.
    fn subscribe(&self, on_tick: TickCallback) -> Subscription;
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle for an active clock subscription.
///
/// Cancelling consumes the handle, so a subscription cannot be cancelled
/// twice. Dropping an uncancelled handle cancels it.
#[must_use = "dropping a subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    /// Wraps the action that stops delivery.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops further delivery.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

// ============================================================================
// FrameClock
// ============================================================================

/// Tokio-driven clock that ticks at a fixed frame interval.
#[derive(Debug, Clone)]
pub struct FrameClock {
    epoch: Instant,
    frame_interval: Duration,
}

impl FrameClock {
    /// Creates a clock whose epoch is now.
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            frame_interval,
        }
    }

    /// Returns the frame interval.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS))
    }
}

fn millis_since(epoch: Instant, at: Instant) -> i64 {
    i64::try_from(at.saturating_duration_since(epoch).as_millis()).unwrap_or(i64::MAX)
}

impl ClockSource for FrameClock {
    fn now_ms(&self) -> i64 {
        millis_since(self.epoch, Instant::now())
    }

    /// Spawns the frame task on the current tokio runtime.
    fn subscribe(&self, mut on_tick: TickCallback) -> Subscription {
        let epoch = self.epoch;
        let period = self.frame_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            // Late frames are dropped rather than delivered in a burst
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                let at = ticker.tick().await;
                on_tick(millis_since(epoch, at.into_std()));
            }
        });

        Subscription::new(move || handle.abort())
    }
}

// ============================================================================
// ManualClock
// ============================================================================

#[derive(Default)]
struct ManualClockInner {
    now_ms: i64,
    next_id: u64,
    subscribers: Vec<(u64, Arc<Mutex<TickCallback>>)>,
    subscribe_count: usize,
    cancel_count: usize,
}

/// Deterministic clock for tests.
///
/// Time only moves when told to, and frames are only delivered by
/// [`fire`](Self::fire). Clones share the same timeline.
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualClockInner>>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClockInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the current time. Earlier values are ignored to keep time monotonic.
    pub fn set(&self, now_ms: i64) {
        let mut inner = self.lock();
        inner.now_ms = inner.now_ms.max(now_ms);
    }

    /// Moves time forward by `delta_ms`.
    pub fn advance(&self, delta_ms: i64) {
        let mut inner = self.lock();
        inner.now_ms = inner.now_ms.saturating_add(delta_ms.max(0));
    }

    /// Delivers the current time to every live subscriber.
    ///
    /// Callbacks run without the clock locked, so they may use the clock.
    /// Returns the number of callbacks invoked.
    pub fn fire(&self) -> usize {
        let (now, callbacks) = {
            let inner = self.lock();
            let callbacks: Vec<_> = inner
                .subscribers
                .iter()
                .map(|(_, on_tick)| Arc::clone(on_tick))
                .collect();
            (inner.now_ms, callbacks)
        };
        for on_tick in &callbacks {
            let mut on_tick = on_tick.lock().unwrap_or_else(PoisonError::into_inner);
            on_tick(now);
        }
        callbacks.len()
    }

    /// Number of subscriptions currently live.
    pub fn active_subscriptions(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Total number of `subscribe` calls.
    pub fn subscribe_count(&self) -> usize {
        self.lock().subscribe_count
    }

    /// Total number of cancellations.
    pub fn cancel_count(&self) -> usize {
        self.lock().cancel_count
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> i64 {
        self.lock().now_ms
    }

    fn subscribe(&self, on_tick: TickCallback) -> Subscription {
        let id = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribe_count += 1;
            inner.subscribers.push((id, Arc::new(Mutex::new(on_tick))));
            id
        };

        let clock = self.clone();
        Subscription::new(move || {
            let mut inner = clock.lock();
            inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
            inner.cancel_count += 1;
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
