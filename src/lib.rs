//! Countdown Timer Library
//!
//! This library provides the core functionality for the countdown CLI.
//! It includes:
//! - The countdown state machine (`Stopped`, `Running`, `Paused`)
//! - Clock sources and the subscription-managing runtime
//! - IPC server/client for daemon-CLI communication
//! - Rendering of the countdown into a gauge line
//! - CLI command parsing and display utilities

pub mod cli;
pub mod daemon;
pub mod render;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    CountdownConfig, CountdownMode, CountdownState, IpcRequest, IpcResponse, ResponseData,
    StartParams,
};

pub use daemon::{ClockSource, Command, CountdownEngine, CountdownEvent, CountdownRuntime};

pub use render::{present, Presentation, Renderer, TextRenderer};
