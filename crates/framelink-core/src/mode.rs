//! Processing mode — the one value shared across tasks.
//!
//! Control input (an operator keystroke or a speech transcript) is mapped to
//! a [`Mode`] through a fixed alias table, and the relay loop reads a
//! snapshot of the current mode for every frame it processes. The lock is
//! scoped to a single get or set and is never held across I/O or a
//! transform call.

use std::fmt;
use std::sync::{Arc, RwLock};

/// The processing variant applied to every relayed frame until changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    EdgeDetect,
    NightVision,
    Thermal,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Normal,
        Mode::EdgeDetect,
        Mode::NightVision,
        Mode::Thermal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::EdgeDetect => "edge",
            Mode::NightVision => "night",
            Mode::Thermal => "thermal",
        }
    }

    /// Recognized command words for this mode. Single-character entries are
    /// the keystroke shortcuts; the rest are matched as substrings of a
    /// free-form transcript.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Mode::Normal => &["normal", "default", "1"],
            Mode::EdgeDetect => &["edge", "canny", "outline", "2"],
            Mode::NightVision => &["night vision", "night", "green", "dark", "3"],
            Mode::Thermal => &["thermal", "heat", "infrared", "4"],
        }
    }

    /// Map free-form operator text to a mode.
    ///
    /// Pure: the same input always yields the same answer, and a `None`
    /// result must leave the caller's state untouched. Keystroke shortcuts
    /// only match the whole (trimmed) input; word aliases match anywhere in
    /// the text so transcripts like "let's use night vision mode" resolve.
    pub fn parse_command(text: &str) -> Option<Mode> {
        let text = text.trim().to_ascii_lowercase();
        if text.is_empty() {
            return None;
        }
        for mode in Mode::ALL {
            for alias in mode.aliases() {
                let matched = if alias.len() == 1 {
                    text == *alias
                } else {
                    text.contains(alias)
                };
                if matched {
                    return Some(mode);
                }
            }
        }
        None
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("unrecognized mode command: {0:?}")]
    UnrecognizedCommand(String),
}

// ── Mode switch ───────────────────────────────────────────────────────────────

/// Shared handle to the current processing mode.
///
/// Cloneable; every clone refers to the same value. Any number of control
/// sources may call [`set`](Self::set) concurrently — the last completed
/// write wins — while the relay loop reads snapshots with
/// [`get`](Self::get).
#[derive(Clone, Debug, Default)]
pub struct ModeSwitch {
    current: Arc<RwLock<Mode>>,
}

impl ModeSwitch {
    pub fn new(initial: Mode) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    /// Snapshot of the current mode.
    pub fn get(&self) -> Mode {
        // Mode is Copy; a poisoned lock cannot hold a torn value.
        match self.current.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set(&self, mode: Mode) {
        match self.current.write() {
            Ok(mut guard) => *guard = mode,
            Err(poisoned) => *poisoned.into_inner() = mode,
        }
    }

    /// Parse a control command and switch to the resulting mode.
    ///
    /// Unrecognized text is rejected and leaves the current mode unchanged.
    pub fn apply_command(&self, text: &str) -> Result<Mode, ControlError> {
        let mode = Mode::parse_command(text)
            .ok_or_else(|| ControlError::UnrecognizedCommand(text.to_string()))?;
        self.set(mode);
        Ok(mode)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
