//! Trigger input: edge detection over a polled digital line.
//!
//! The debouncer is two-sample edge memory, not a timed filter: it holds
//! only the last observed level and emits one toggle per High→Low
//! transition between consecutive polls. Electrical bounce inside one
//! polling interval is not filtered — acceptable for a low-frequency
//! manual trigger. Polling cadence belongs to the caller (reference:
//! every 100 ms).

use std::fs;
use std::path::PathBuf;

/// One logical toggle of the record trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleEvent;

/// Converts a noisy polled level into one toggle per physical press.
#[derive(Debug)]
pub struct TriggerDebouncer {
    last_level: bool,
}

impl TriggerDebouncer {
    /// Starts with the line remembered as high (pull-up idle).
    pub fn new() -> Self {
        Self { last_level: true }
    }

    /// Feeds one raw sample; emits a toggle only on a falling edge.
    pub fn poll(&mut self, raw_level: bool) -> Option<ToggleEvent> {
        let fell = self.last_level && !raw_level;
        self.last_level = raw_level;
        fell.then_some(ToggleEvent)
    }
}

impl Default for TriggerDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// Samples the raw trigger line.
pub trait TriggerInput {
    fn level(&mut self) -> bool;
}

/// Reads the line level from a sysfs-style GPIO value file ("0" / "1").
///
/// A read failure reads as high: with a pull-up line, an absent input
/// never produces spurious toggles.
pub struct LevelFile {
    path: PathBuf,
}

impl LevelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TriggerInput for LevelFile {
    fn level(&mut self) -> bool {
        match fs::read_to_string(&self.path) {
            Ok(raw) => raw.trim() != "0",
            Err(_) => true,
        }
    }
}
