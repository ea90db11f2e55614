//! Foreground countdown driven from the terminal.
//!
//! Reads one command per line from stdin and keeps a single status line
//! redrawn in place:
//! - `s`: start, or cancel when not stopped
//! - `p`: pause, or continue when paused
//! - `q`: quit

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::daemon::clock::ClockSource;
use crate::daemon::runtime::{Command, CountdownRuntime};
use crate::render::{Renderer, TextRenderer};
use crate::types::CountdownState;

/// A line typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    /// Start/cancel toggle
    StartCancel,
    /// Pause/continue toggle
    PauseContinue,
    /// Leave the loop
    Quit,
}

impl InputKey {
    /// Parses a typed line. Unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "s" | "start" | "c" | "cancel" => Some(Self::StartCancel),
            "p" | "pause" | "continue" | "resume" => Some(Self::PauseContinue),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }

    /// Resolves the toggle against the current state, like pressing the
    /// button the view currently shows.
    pub fn command_for(&self, state: &CountdownState) -> Option<Command> {
        match self {
            Self::StartCancel if state.is_stopped() => Some(Command::Start { duration_ms: None }),
            Self::StartCancel => Some(Command::Cancel),
            Self::PauseContinue if state.is_paused() => Some(Command::Resume),
            Self::PauseContinue => Some(Command::Pause),
            Self::Quit => None,
        }
    }
}

/// Redraws the status line when it differs from the last one drawn.
struct LineWriter<W> {
    out: W,
    last: Option<String>,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    fn new(out: W) -> Self {
        Self { out, last: None }
    }

    async fn draw(&mut self, line: String) -> Result<()> {
        if self.last.as_deref() == Some(line.as_str()) {
            return Ok(());
        }
        // carriage return + erase line
        self.out
            .write_all(format!("\r\x1b[K{}", line).as_bytes())
            .await
            .context("Failed to write status line")?;
        self.out.flush().await.context("Failed to flush stdout")?;
        self.last = Some(line);
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}

/// Runs the countdown until `q` or end of input.
pub async fn run_interactive<C, R, W>(
    runtime: &mut CountdownRuntime<C>,
    input: R,
    output: W,
    renderer: &TextRenderer,
) -> Result<()>
where
    C: ClockSource,
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut writer = LineWriter::new(output);
    writer.draw(renderer.render(runtime.state())).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match InputKey::parse(&line) {
                    Some(InputKey::Quit) => break,
                    Some(key) => {
                        if let Some(command) = key.command_for(runtime.state()) {
                            runtime.apply(command)?;
                        }
                    }
                    None => tracing::debug!(%line, "ignored input"),
                }
            }
            now_ms = runtime.next_tick() => {
                runtime.on_tick(now_ms)?;
            }
        }
        writer.draw(renderer.render(runtime.state())).await?;
    }

    writer.finish().await
}
