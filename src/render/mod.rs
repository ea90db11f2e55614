//! Presentation of the countdown state.
//!
//! Rendering is split in two:
//! - [`present`] turns a state into a [`Presentation`], plain data describing
//!   which controls to show, the mode label, the gauge and the seconds left
//! - A [`Renderer`] turns that into something a terminal can show
//!
//! # Example
//!
//! ```
//! use countdown::render::{Renderer, TextRenderer};
//! use countdown::types::CountdownState;
//!
//! let state = CountdownState::new().start(0, 15_000).tick(5_000);
//! let line = TextRenderer::default().render(&state);
//! assert!(line.contains("running"));
//! assert!(line.ends_with("10 s"));
//! ```

use crate::types::{CountdownMode, CountdownState};

/// A button in the countdown view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Start a stopped countdown
    Start,
    /// Cancel a running or paused countdown
    Cancel,
    /// Pause a running countdown
    Pause,
    /// Continue a paused countdown
    Continue,
}

impl Control {
    /// Button caption.
    pub fn label(&self) -> &'static str {
        match self {
            Control::Start => "START",
            Control::Cancel => "CANCEL",
            Control::Pause => "PAUSE",
            Control::Continue => "CONTINUE",
        }
    }
}

/// Everything a view needs to draw one countdown frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    /// Start/cancel toggle
    pub primary: Control,
    /// Pause/continue toggle
    pub secondary: Control,
    /// Whether the pause/continue toggle can be pressed
    pub secondary_enabled: bool,
    /// Literal mode name
    pub mode_label: &'static str,
    /// Share of the session left, in percent; `None` when stopped
    pub gauge_percent: Option<f64>,
    /// Whole seconds left, rounded up; `None` when stopped
    pub remaining_secs: Option<u64>,
}

/// Builds the presentation of `state`.
pub fn present(state: &CountdownState) -> Presentation {
    let (gauge_percent, remaining_secs) = match state.mode {
        CountdownMode::Stopped => (None, None),
        CountdownMode::Running | CountdownMode::Paused => {
            let remaining = state.remaining_ms.max(0);
            let percent = if state.total_ms > 0 {
                100.0 * remaining as f64 / state.total_ms as f64
            } else {
                0.0
            };
            (Some(percent), Some((remaining as u64).div_ceil(1000)))
        }
    };

    Presentation {
        primary: if state.is_stopped() {
            Control::Start
        } else {
            Control::Cancel
        },
        secondary: if state.is_paused() {
            Control::Continue
        } else {
            Control::Pause
        },
        secondary_enabled: !state.is_stopped(),
        mode_label: state.mode.as_str(),
        gauge_percent,
        remaining_secs,
    }
}

/// Turns a countdown state into displayable output.
pub trait Renderer {
    /// Rendered form
    type Output;

    /// Renders `state`. Must be pure.
    fn render(&self, state: &CountdownState) -> Self::Output;
}

/// Renders the whole presentation as plain data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentationRenderer;

impl Renderer for PresentationRenderer {
    type Output = Presentation;

    fn render(&self, state: &CountdownState) -> Presentation {
        present(state)
    }
}

/// Default gauge width in characters.
pub const DEFAULT_GAUGE_WIDTH: usize = 20;

/// Single-line terminal renderer.
///
/// Produces lines such as `[CANCEL] [PAUSE] running |██████████░░░░░░░░░░| 8 s`.
/// Disabled controls are wrapped in parentheses.
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer {
    width: usize,
}

impl TextRenderer {
    /// Creates a renderer with a gauge `width` characters wide.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    /// Formats an already built presentation.
    pub fn format(&self, presentation: &Presentation) -> String {
        let secondary = if presentation.secondary_enabled {
            format!("[{}]", presentation.secondary.label())
        } else {
            format!("({})", presentation.secondary.label())
        };

        // Stopped shows a full meter
        let percent = presentation.gauge_percent.unwrap_or(100.0).clamp(0.0, 100.0);
        let filled = ((percent / 100.0) * self.width as f64).round() as usize;
        let gauge: String = "█".repeat(filled) + &"░".repeat(self.width - filled.min(self.width));

        let mut line = format!(
            "[{}] {} {} |{}|",
            presentation.primary.label(),
            secondary,
            presentation.mode_label,
            gauge
        );
        if let Some(secs) = presentation.remaining_secs {
            line.push_str(&format!(" {} s", secs));
        }
        line
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_GAUGE_WIDTH)
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, state: &CountdownState) -> String {
        self.format(&present(state))
    }
}
