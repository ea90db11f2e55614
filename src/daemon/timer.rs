//! Countdown engine.
//!
//! This module owns the single mutable slot holding the current
//! [`CountdownState`]:
//! - Applying commands and ticks through the pure transitions
//! - Reporting each transition as a before/after mode pair
//! - Firing events for the surrounding runtime and UI

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::types::{CountdownConfig, CountdownMode, CountdownState};

// ============================================================================
// CountdownEvent
// ============================================================================

/// Countdown events for displays and external integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Countdown started
    Started {
        /// Length of the new countdown
        duration_ms: i64,
    },
    /// Countdown paused
    Paused {
        /// Remaining time frozen by the pause
        remaining_ms: i64,
    },
    /// Countdown continued after a pause
    Resumed,
    /// Countdown cancelled by the user
    Cancelled,
    /// Countdown ran out
    Expired,
    /// Remaining time recomputed from a clock frame
    Tick {
        /// Remaining milliseconds
        remaining_ms: i64,
    },
}

// ============================================================================
// Transition
// ============================================================================

/// Mode before and after applying one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Mode before the input
    pub before: CountdownMode,
    /// Mode after the input
    pub after: CountdownMode,
}

impl Transition {
    /// Returns true if the mode changed.
    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    /// Returns true if this transition entered the running mode.
    pub fn entered_running(&self) -> bool {
        self.before != CountdownMode::Running && self.after == CountdownMode::Running
    }

    /// Returns true if this transition left the running mode.
    pub fn left_running(&self) -> bool {
        self.before == CountdownMode::Running && self.after != CountdownMode::Running
    }
}

// ============================================================================
// CountdownEngine
// ============================================================================

/// Engine that holds the countdown state and emits events.
pub struct CountdownEngine {
    /// Current countdown state
    state: CountdownState,
    /// Configuration applied by `start`
    config: CountdownConfig,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<CountdownEvent>,
}

impl CountdownEngine {
    /// Creates a stopped engine with the given configuration and event channel.
    pub fn new(config: CountdownConfig, event_tx: mpsc::UnboundedSender<CountdownEvent>) -> Self {
        Self {
            state: CountdownState::new(),
            config,
            event_tx,
        }
    }

    /// Starts a countdown of the configured length.
    pub fn start(&mut self, now_ms: i64) -> Result<Transition> {
        let duration_ms = self.config.duration_ms_signed();
        self.start_with_duration(now_ms, duration_ms)
    }

    /// Starts a countdown of `duration_ms`. No-op unless stopped.
    pub fn start_with_duration(&mut self, now_ms: i64, duration_ms: i64) -> Result<Transition> {
        let transition = self.apply(|state| state.start(now_ms, duration_ms));
        if transition.changed() {
            self.emit(CountdownEvent::Started {
                duration_ms: self.state.duration_ms,
            })
                .context("Failed to send started event")?;
        }
        Ok(transition)
    }

    /// Pauses the countdown. No-op unless running.
    pub fn pause(&mut self) -> Result<Transition> {
        let transition = self.apply(CountdownState::pause);
        if transition.changed() {
            self.emit(CountdownEvent::Paused {
                remaining_ms: self.state.remaining_ms,
            })
            .context("Failed to send paused event")?;
        }
        Ok(transition)
    }

    /// Continues a paused countdown. No-op unless paused.
    pub fn resume(&mut self, now_ms: i64) -> Result<Transition> {
        let transition = self.apply(|state| state.resume(now_ms));
        if transition.changed() {
            self.emit(CountdownEvent::Resumed)
                .context("Failed to send resumed event")?;
        }
        Ok(transition)
    }

    /// Cancels the countdown from any mode.
    pub fn cancel(&mut self) -> Result<Transition> {
        let transition = self.apply(CountdownState::cancel);
        if transition.changed() {
            self.emit(CountdownEvent::Cancelled)
                .context("Failed to send cancelled event")?;
        }
        Ok(transition)
    }

    /// Applies one clock frame. No-op unless running.
    pub fn tick(&mut self, now_ms: i64) -> Result<Transition> {
        let transition = self.apply(|state| state.tick(now_ms));

        if transition.left_running() {
            tracing::debug!(now_ms, "countdown expired");
            self.emit(CountdownEvent::Expired)
                .context("Failed to send expired event")?;
        } else if transition.after == CountdownMode::Running {
            self.emit(CountdownEvent::Tick {
                remaining_ms: self.state.remaining_ms,
            })
            .context("Failed to send tick event")?;
        }

        Ok(transition)
    }

    /// Replaces the state with `f(state)` and reports the mode change.
    fn apply(&mut self, f: impl FnOnce(CountdownState) -> CountdownState) -> Transition {
        let before = self.state.mode;
        self.state = f(self.state);
        let transition = Transition {
            before,
            after: self.state.mode,
        };
        if transition.changed() {
            tracing::debug!(
                from = before.as_str(),
                to = transition.after.as_str(),
                remaining_ms = self.state.remaining_ms,
                "countdown transition"
            );
        }
        transition
    }

    fn emit(&self, event: CountdownEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .map_err(|e| anyhow::anyhow!("event receiver closed: {:?}", e.0))
    }

    /// Returns a reference to the current countdown state.
    pub fn get_state(&self) -> &CountdownState {
        &self.state
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &CountdownConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
