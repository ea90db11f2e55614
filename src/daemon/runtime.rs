//! Single-owner countdown runtime.
//!
//! The runtime couples a [`CountdownEngine`] to a [`ClockSource`]:
//! - Commands are stamped with the clock's current time and applied in order
//! - The clock subscription follows the mode: subscribe on entering Running,
//!   cancel on leaving it
//! - Frames are funnelled through a channel back to the owner, so commands and
//!   ticks never interleave

use anyhow::Result;
use tokio::sync::mpsc;

use super::clock::{ClockSource, Subscription};
use super::timer::{CountdownEngine, CountdownEvent, Transition};
use crate::types::CountdownState;

// ============================================================================
// Command
// ============================================================================

/// User command applied to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a countdown; the configured length if `duration_ms` is `None`
    Start {
        /// Length override
        duration_ms: Option<i64>,
    },
    /// Pause a running countdown
    Pause,
    /// Continue a paused countdown
    Resume,
    /// Cancel from any mode
    Cancel,
}

// ============================================================================
// CountdownRuntime
// ============================================================================

/// Owner of the engine, the clock, and the live clock subscription.
pub struct CountdownRuntime<C: ClockSource> {
    engine: CountdownEngine,
    clock: C,
    /// Present exactly while the countdown is running
    subscription: Option<Subscription>,
    /// Bumped on every subscribe; frames from older subscriptions are dropped
    generation: u64,
    tick_tx: mpsc::UnboundedSender<(u64, i64)>,
    tick_rx: mpsc::UnboundedReceiver<(u64, i64)>,
}

impl<C: ClockSource> CountdownRuntime<C> {
    /// Creates a runtime around a stopped engine.
    pub fn new(engine: CountdownEngine, clock: C) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            clock,
            subscription: None,
            generation: 0,
            tick_tx,
            tick_rx,
        }
    }

    /// Applies a command stamped with the clock's current time.
    pub fn apply(&mut self, command: Command) -> Result<Transition> {
        let now_ms = self.clock.now_ms();
        let transition = match command {
            Command::Start { duration_ms: None } => self.engine.start(now_ms),
            Command::Start {
                duration_ms: Some(duration_ms),
            } => self.engine.start_with_duration(now_ms, duration_ms),
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(now_ms),
            Command::Cancel => self.engine.cancel(),
        };
        // Sync even if event delivery failed; the state already moved
        self.sync_after(transition)
    }

    /// Applies one clock frame.
    pub fn on_tick(&mut self, now_ms: i64) -> Result<Transition> {
        let transition = self.engine.tick(now_ms);
        self.sync_after(transition)
    }

    /// Waits for the next frame of the live subscription.
    ///
    /// Pends forever while no subscription is live. Cancel safe.
    pub async fn next_tick(&mut self) -> i64 {
        loop {
            match self.tick_rx.recv().await {
                Some((generation, now_ms)) if generation == self.generation => return now_ms,
                Some(_) => continue,
                // The runtime holds a sender, so the channel never closes
                None => std::future::pending::<()>().await,
            }
        }
    }

    fn sync_after(&mut self, transition: Result<Transition>) -> Result<Transition> {
        let state = *self.engine.get_state();

        if state.is_running() && self.subscription.is_none() {
            self.subscribe();
        } else if !state.is_running() {
            if let Some(subscription) = self.subscription.take() {
                tracing::debug!(mode = state.mode.as_str(), "clock subscription cancelled");
                subscription.cancel();
            }
        }

        transition
    }

    fn subscribe(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let tick_tx = self.tick_tx.clone();

        let subscription = self.clock.subscribe(Box::new(move |now_ms| {
            // Receiver lives as long as the runtime
            let _ = tick_tx.send((generation, now_ms));
        }));

        tracing::debug!(generation, "clock subscription started");
        self.subscription = Some(subscription);
    }

    /// Returns the current countdown state.
    pub fn state(&self) -> &CountdownState {
        self.engine.get_state()
    }

    /// Returns the engine.
    pub fn engine(&self) -> &CountdownEngine {
        &self.engine
    }

    /// Returns the clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns true while a clock subscription is live.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

/// Spawns a task that logs countdown events until the channel closes.
pub fn spawn_event_logger(
    mut event_rx: mpsc::UnboundedReceiver<CountdownEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                CountdownEvent::Tick { remaining_ms } => {
                    tracing::trace!(remaining_ms, "tick");
                }
                CountdownEvent::Started { duration_ms } => {
                    tracing::info!(duration_ms, "countdown started");
                }
                CountdownEvent::Paused { remaining_ms } => {
                    tracing::info!(remaining_ms, "countdown paused");
                }
                CountdownEvent::Resumed => tracing::info!("countdown resumed"),
                CountdownEvent::Cancelled => tracing::info!("countdown cancelled"),
                CountdownEvent::Expired => tracing::info!("countdown expired"),
            }
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
