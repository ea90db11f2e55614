//! CLI module for the countdown timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: IPC client for daemon communication
//! - `display`: Output formatting and display logic
//! - `interactive`: Foreground countdown driven from stdin

pub mod client;
pub mod commands;
pub mod display;
pub mod interactive;

pub use client::IpcClient;
pub use commands::{Cli, Commands, StartArgs, TimerArgs};
pub use display::Display;
pub use interactive::{run_interactive, InputKey};
