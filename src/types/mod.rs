//! Core data types for the countdown timer.
//!
//! This module defines the data structures used for:
//! - The countdown state machine (mode and timing fields)
//! - Timer configuration with validation
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

/// Countdown length used when nothing else is configured (15 seconds).
pub const DEFAULT_DURATION_MS: u64 = 15_000;

/// Default frame interval of the clock source (~60 Hz).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Longest countdown accepted by [`CountdownConfig::validate`] (24 hours).
pub const MAX_DURATION_MS: u64 = 24 * 60 * 60 * 1000;

// ============================================================================
// CountdownMode
// ============================================================================

/// Lifecycle phase of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownMode {
    /// Inert; also the initial state
    #[default]
    Stopped,
    /// Clock is progressing
    Running,
    /// Clock was progressing and is frozen
    Paused,
}

impl CountdownMode {
    /// Returns the literal mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CountdownMode::Stopped => "stopped",
            CountdownMode::Running => "running",
            CountdownMode::Paused => "paused",
        }
    }
}

impl std::fmt::Display for CountdownMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CountdownState
// ============================================================================

/// The countdown value.
///
/// Every transition consumes the old state and returns the next one. Invalid
/// transitions return the state unchanged instead of failing.
///
/// While `mode` is [`CountdownMode::Running`], `remaining_ms` is only as fresh
/// as the last [`tick`](Self::tick); the authoritative value is
/// `duration_ms + started_at_ms - now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownState {
    /// Current lifecycle phase
    pub mode: CountdownMode,
    /// Length of the current running segment
    pub duration_ms: i64,
    /// Clock timestamp at which the current running segment began
    pub started_at_ms: i64,
    /// Time left at the last recomputation
    pub remaining_ms: i64,
    /// Session length set by `start`; `resume` does not rebase it
    pub total_ms: i64,
}

impl CountdownState {
    /// Creates a stopped countdown with no timing fields populated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh countdown of `duration_ms` at `now_ms`.
    ///
    /// Negative durations are treated as zero. No-op unless stopped.
    #[must_use]
    pub fn start(self, now_ms: i64, duration_ms: i64) -> Self {
        if self.mode != CountdownMode::Stopped {
            return self;
        }
        let duration_ms = duration_ms.max(0);
        Self {
            mode: CountdownMode::Running,
            duration_ms,
            started_at_ms: now_ms,
            remaining_ms: duration_ms,
            total_ms: duration_ms,
        }
    }

    /// Freezes the countdown at its last computed remaining time.
    ///
    /// No-op unless running.
    #[must_use]
    pub fn pause(self) -> Self {
        if self.mode != CountdownMode::Running {
            return self;
        }
        Self {
            mode: CountdownMode::Paused,
            ..self
        }
    }

    /// Continues a paused countdown from `now_ms`.
    ///
    /// The running segment is rebased: its length becomes whatever was left.
    /// No-op unless paused.
    #[must_use]
    pub fn resume(self, now_ms: i64) -> Self {
        if self.mode != CountdownMode::Paused {
            return self;
        }
        Self {
            mode: CountdownMode::Running,
            started_at_ms: now_ms,
            duration_ms: self.remaining_ms,
            ..self
        }
    }

    /// Stops the countdown from any mode. Timing fields are left as they are.
    #[must_use]
    pub fn cancel(self) -> Self {
        Self {
            mode: CountdownMode::Stopped,
            ..self
        }
    }

    /// Recomputes the remaining time for a clock reading of `now_ms`.
    ///
    /// Expires into [`CountdownMode::Stopped`] once the remaining time would be
    /// negative. A reading from before the segment started leaves the whole
    /// segment remaining. No-op unless running.
    #[must_use]
    pub fn tick(self, now_ms: i64) -> Self {
        if self.mode != CountdownMode::Running {
            return self;
        }
        // i128 holds any i64 sum or difference
        let candidate =
            i128::from(self.duration_ms) + i128::from(self.started_at_ms) - i128::from(now_ms);
        if candidate < 0 {
            return self.cancel();
        }
        let remaining_ms = i64::try_from(candidate).map_or(self.duration_ms, |remaining| {
            remaining.min(self.duration_ms)
        });
        Self {
            remaining_ms,
            ..self
        }
    }

    /// Returns true if the clock is progressing.
    pub fn is_running(&self) -> bool {
        self.mode == CountdownMode::Running
    }

    /// Returns true if the countdown is frozen.
    pub fn is_paused(&self) -> bool {
        self.mode == CountdownMode::Paused
    }

    /// Returns true if the countdown is inert.
    pub fn is_stopped(&self) -> bool {
        self.mode == CountdownMode::Stopped
    }
}

// ============================================================================
// CountdownConfig
// ============================================================================

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Duration outside 1 ms ..= 24 h
    #[error("カウントダウン時間は1ミリ秒から24時間の範囲で指定してください (指定値: {0}ms)")]
    DurationOutOfRange(u64),

    /// Frame interval outside 1 ..= 1000 ms
    #[error("フレーム間隔は1-1000ミリ秒の範囲で指定してください (指定値: {0}ms)")]
    FrameIntervalOutOfRange(u64),
}

fn default_duration_ms() -> u64 {
    DEFAULT_DURATION_MS
}

fn default_frame_interval_ms() -> u64 {
    DEFAULT_FRAME_INTERVAL_MS
}

/// Configuration for the countdown timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownConfig {
    /// Countdown length applied by `start`
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Cadence of the clock source while running
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl CountdownConfig {
    /// Returns the configuration with the given countdown length in seconds.
    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration_ms = secs.saturating_mul(1000);
        self
    }

    /// Returns the configuration with the given frame interval.
    pub fn with_frame_interval_ms(mut self, ms: u64) -> Self {
        self.frame_interval_ms = ms;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms < 1 || self.duration_ms > MAX_DURATION_MS {
            return Err(ConfigError::DurationOutOfRange(self.duration_ms));
        }
        if self.frame_interval_ms < 1 || self.frame_interval_ms > 1000 {
            return Err(ConfigError::FrameIntervalOutOfRange(self.frame_interval_ms));
        }
        Ok(())
    }

    /// Countdown length in the clock's signed millisecond domain.
    pub fn duration_ms_signed(&self) -> i64 {
        i64::try_from(self.duration_ms).unwrap_or(i64::MAX)
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// Parameters for the start command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartParams {
    /// Countdown length in seconds; the daemon's configured length if absent
    #[serde(rename = "durationSecs", skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start a new countdown
    Start {
        /// Start parameters
        #[serde(flatten)]
        params: StartParams,
    },
    /// Pause the running countdown
    Pause,
    /// Continue the paused countdown
    Resume,
    /// Cancel the countdown
    Cancel,
    /// Query the current state
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<CountdownMode>,
    /// Remaining milliseconds
    #[serde(rename = "remainingMs", skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<i64>,
    /// Length of the current running segment
    #[serde(rename = "durationMs", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    /// Session length
    #[serde(rename = "totalMs", skip_serializing_if = "Option::is_none")]
    pub total_ms: Option<i64>,
    /// Whether the request changed the mode
    #[serde(default)]
    pub changed: bool,
}

impl ResponseData {
    /// Creates response data from a countdown state.
    pub fn from_state(state: &CountdownState, changed: bool) -> Self {
        Self {
            mode: Some(state.mode),
            remaining_ms: Some(state.remaining_ms),
            duration_ms: Some(state.duration_ms),
            total_ms: Some(state.total_ms),
            changed,
        }
    }

    /// Rebuilds the countdown state carried by this response.
    ///
    /// `started_at_ms` is not transmitted; it belongs to the daemon's clock.
    pub fn to_state(&self) -> CountdownState {
        CountdownState {
            mode: self.mode.unwrap_or_default(),
            duration_ms: self.duration_ms.unwrap_or(0),
            started_at_ms: 0,
            remaining_ms: self.remaining_ms.unwrap_or(0),
            total_ms: self.total_ms.unwrap_or(0),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if the status is "success".
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
