//! # Telemetry Module
//!
//! Session counters owned by the polling loop, and JSONL logging of the
//! published snapshots.
//!
//! This module handles:
//! - Counting ticks and per-button presses (the press heatmap)
//! - Counting failures the loop absorbed: dropped batches, emit failures,
//!   disconnects
//! - Writing sampled snapshots to rotating JSON Lines files (see [`logger`])

pub mod logger;

pub use logger::{run_logger, TelemetryLogger};

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::controller::{Button, BUTTON_COUNT};
use crate::output::EmitFailures;

/// Virtual press counts per button.
///
/// Serializes as a map holding only buttons pressed at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heatmap([u64; BUTTON_COUNT]);

impl Default for Heatmap {
    fn default() -> Self {
        Self([0; BUTTON_COUNT])
    }
}

impl Heatmap {
    #[must_use]
    pub fn get(&self, button: Button) -> u64 {
        self.0[button.index()]
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

impl Serialize for Heatmap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pressed = Button::ALL.iter().filter(|b| self.get(**b) > 0);
        let mut map = serializer.serialize_map(Some(pressed.clone().count()))?;
        for button in pressed {
            map.serialize_entry(button, &self.get(*button))?;
        }
        map.end()
    }
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub session_start: DateTime<Utc>,
    pub total_ticks: u64,
    pub heatmap: Heatmap,
    pub emit_failures: u64,
    pub dropped_batches: u64,
    pub disconnects: u64,
}

/// Session counters. Mutated only by the polling loop.
#[derive(Debug, Clone)]
pub struct Telemetry {
    session_start: DateTime<Utc>,
    total_ticks: u64,
    heatmap: Heatmap,
    dropped_batches: u64,
    disconnects: u64,
    emit_failures: EmitFailures,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(EmitFailures::default())
    }
}

impl Telemetry {
    /// Starts a session. `emit_failures` is shared with the dispatcher.
    #[must_use]
    pub fn new(emit_failures: EmitFailures) -> Self {
        Self {
            session_start: Utc::now(),
            total_ticks: 0,
            heatmap: Heatmap::default(),
            dropped_batches: 0,
            disconnects: 0,
            emit_failures,
        }
    }

    pub fn record_tick(&mut self) -> u64 {
        self.total_ticks += 1;
        self.total_ticks
    }

    pub fn record_press(&mut self, button: Button) {
        self.heatmap.0[button.index()] += 1;
    }

    pub fn record_dropped_batch(&mut self) {
        self.dropped_batches += 1;
    }

    pub fn record_disconnect(&mut self) {
        self.disconnects += 1;
    }

    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    #[must_use]
    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    #[must_use]
    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            session_start: self.session_start,
            total_ticks: self.total_ticks,
            heatmap: self.heatmap,
            emit_failures: self.emit_failures.count(),
            dropped_batches: self.dropped_batches,
            disconnects: self.disconnects,
        }
    }
}
