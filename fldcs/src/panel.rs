// skid Copyright (c) 2026 skid contributors.
// Licensed under the MIT License.
// See LICENSE file in repository root for complete license text.

use core::fmt;
use std::error::Error;

/// Number of addressable text lines on a panel.
pub const LINE_COUNT: usize = 8;

/// Bit of the left button region in a panel button mask.
pub const BTN_LEFT: u8 = 0b100;

/// Bit of the center button region in a panel button mask.
pub const BTN_CENTER: u8 = 0b010;

/// Bit of the right button region in a panel button mask.
pub const BTN_RIGHT: u8 = 0b001;

/// The operator-facing display: a handful of addressable text lines and
/// three button regions reported as a bitmask. Implemented for the console
/// by `TermPanel` and in memory by `sim::SimPanel`.
pub trait Panel {
    /// Sets the text shown at the given line.
    fn set_line(&mut self, line: usize, text: &str) -> PanelResult<()>;

    /// Clears the given line.
    fn clear_line(&mut self, line: usize) -> PanelResult<()>;

    /// Reads the currently pressed buttons as a mask of `BTN_LEFT`,
    /// `BTN_CENTER`, and `BTN_RIGHT`.
    fn buttons(&mut self) -> u8;
}

/// A panel rendered to the controlling terminal, for driving the robot
/// tethered. Has no buttons to report.
pub struct TermPanel {
    lines: [Option<String>; LINE_COUNT],
}

impl TermPanel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: std::array::from_fn(|_| None),
        }
    }
}

impl Default for TermPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for TermPanel {
    fn set_line(&mut self, line: usize, text: &str) -> PanelResult<()> {
        let slot = self.lines.get_mut(line).ok_or(PanelError { line })?;

        // Only repaint lines that actually changed, opcontrol rewrites its
        // status line every iteration.
        if slot.as_deref() != Some(text) {
            *slot = Some(text.to_owned());
            println!("[panel {}] {}", line, text);
        }

        Ok(())
    }

    fn clear_line(&mut self, line: usize) -> PanelResult<()> {
        let slot = self.lines.get_mut(line).ok_or(PanelError { line })?;

        if slot.is_some() {
            *slot = None;
            println!("[panel {}]", line);
        }

        Ok(())
    }

    fn buttons(&mut self) -> u8 {
        0
    }
}

/// The panel's center-button toggle: each press alternates one line of the
/// panel between a fixed message and nothing. Owns its pressed flag
/// explicitly rather than hiding it in process-wide state.
pub struct PressToggle {
    line: usize,
    pressed: bool,
}

impl PressToggle {
    /// Message shown on the toggle's line while toggled on.
    pub const TEXT: &'static str = "I was pressed!";

    /// Creates a toggle, off, tied to the given panel line.
    #[must_use]
    pub fn new(line: usize) -> Self {
        Self {
            line,
            pressed: false,
        }
    }

    /// Flips the toggle and updates its line: shown when on, cleared when
    /// off. Two presses round-trip the panel back to where it started.
    pub fn press(&mut self, panel: &mut dyn Panel) -> PanelResult<()> {
        self.pressed = !self.pressed;

        match self.pressed {
            true => panel.set_line(self.line, Self::TEXT),
            false => panel.clear_line(self.line),
        }
    }

    /// Whether the toggle is currently on.
    #[inline]
    #[must_use]
    pub fn pressed(&self) -> bool {
        self.pressed
    }
}

/// Result of a panel operation.
pub type PanelResult<T> = Result<T, PanelError>;

/// A line address beyond the panel's line count.
#[derive(Debug, Clone, Copy)]
pub struct PanelError {
    pub line: usize,
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel line {} out of range", self.line)
    }
}

impl Error for PanelError {}
