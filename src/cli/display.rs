//! Display utilities for the countdown CLI.
//!
//! This module provides formatted output for:
//! - Command results
//! - Error messages
//! - Status display

use crate::render::{Renderer, TextRenderer};
use crate::types::{CountdownMode, IpcResponse};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a start/pause/resume/cancel command.
    pub fn show_command_result(response: &IpcResponse) {
        for line in Self::command_result_lines(response) {
            println!("{}", line);
        }
    }

    /// Shows the current countdown status.
    pub fn show_status(response: &IpcResponse) {
        for line in Self::status_lines(response) {
            println!("{}", line);
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    fn command_result_lines(response: &IpcResponse) -> Vec<String> {
        let mut lines = vec![response.message.clone()];
        if let Some(data) = &response.data {
            let state = data.to_state();
            if !state.is_stopped() {
                lines.push(format!("  残り時間: {}", Self::format_ms(state.remaining_ms)));
            }
        }
        lines
    }

    fn status_lines(response: &IpcResponse) -> Vec<String> {
        let mut lines = vec![
            "カウントダウン ステータス".to_string(),
            "─────────────────────────────".to_string(),
        ];

        match &response.data {
            Some(data) => {
                let state = data.to_state();
                let mode_display = match state.mode {
                    CountdownMode::Running => "実行中",
                    CountdownMode::Paused => "一時停止中",
                    CountdownMode::Stopped => "停止中",
                };
                lines.push(format!("状態: {}", mode_display));
                if !state.is_stopped() {
                    lines.push(format!("残り時間: {}", Self::format_ms(state.remaining_ms)));
                }
                lines.push(TextRenderer::default().render(&state));
            }
            None => lines.push("カウントダウンは起動していません".to_string()),
        }

        lines
    }

    /// Formats milliseconds as `m:ss`, rounding partial seconds up.
    fn format_ms(ms: i64) -> String {
        let total_seconds = (ms.max(0) as u64).div_ceil(1000);
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
