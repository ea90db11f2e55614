//! Daemon module for the countdown timer.
//!
//! This module contains the core daemon functionality:
//! - `clock`: Clock sources delivering frame timestamps
//! - `timer`: Countdown engine applying the state transitions
//! - `runtime`: Single owner tying the engine to the clock subscription
//! - `ipc`: Unix socket server and the daemon loop

pub mod clock;
pub mod ipc;
pub mod runtime;
pub mod timer;

pub use clock::{ClockSource, FrameClock, ManualClock, Subscription};
pub use ipc::{run_daemon, serve, IpcServer, RequestHandler};
pub use runtime::{Command, CountdownRuntime};
pub use timer::{CountdownEngine, CountdownEvent, Transition};
