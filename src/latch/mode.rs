//! Resolution of a mapping's latch flags into one behavior.
//!
//! Profiles carry independent `sticky`/`toggle`/`turbo`/`burst` flags. The
//! pipeline runs a single [`LatchMode`] per button, picked with this
//! precedence:
//!
//! - hold behavior: sticky > toggle > momentary
//! - pulse behavior: burst > turbo > none
//!
//! A hold behavior and a pulse behavior combine: a sticky turbo button pulses
//! for as long as the latch is engaged.

use crate::profile::{ButtonMapping, PollingRate};

/// How the engaged signal follows the physical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldMode {
    /// Engaged while physically held.
    #[default]
    Momentary,
    /// First press engages, the next press releases.
    Sticky,
    /// Every press flips engagement.
    Toggle,
}

/// How the virtual output follows the engaged signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PulseMode {
    /// Virtual state equals engagement.
    #[default]
    Steady,
    /// On/off pulses while engaged, `half_period` ticks per half cycle.
    Turbo { half_period: u32 },
    /// `count` pulses started by each engagement edge.
    Burst { count: u32, half_period: u32 },
}

/// Resolved latch behavior for one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatchMode {
    pub hold: HoldMode,
    pub pulse: PulseMode,
}

impl LatchMode {
    /// Plain passthrough of the physical state.
    #[must_use]
    pub const fn passthrough() -> Self {
        Self {
            hold: HoldMode::Momentary,
            pulse: PulseMode::Steady,
        }
    }

    /// Resolves the flags of `mapping` for the given poll rate.
    ///
    /// # Errors
    ///
    /// Returns a description when a pulse mode is requested with a rate or
    /// count it cannot run with.
    pub fn from_mapping(mapping: &ButtonMapping, rate: PollingRate) -> Result<Self, String> {
        let hold = if mapping.sticky {
            HoldMode::Sticky
        } else if mapping.toggle {
            HoldMode::Toggle
        } else {
            HoldMode::Momentary
        };

        let pulse = if mapping.burst {
            if mapping.burst_count == 0 {
                return Err(format!("{}: burst_count must be greater than 0", mapping.button));
            }
            PulseMode::Burst {
                count: mapping.burst_count,
                half_period: half_period(mapping.turbo_rate_hz, rate)
                    .ok_or_else(|| invalid_rate(mapping))?,
            }
        } else if mapping.turbo {
            PulseMode::Turbo {
                half_period: half_period(mapping.turbo_rate_hz, rate)
                    .ok_or_else(|| invalid_rate(mapping))?,
            }
        } else {
            PulseMode::Steady
        };

        Ok(Self { hold, pulse })
    }

    /// Names the flags that lost to the precedence order, if any.
    #[must_use]
    pub fn overridden_flags(mapping: &ButtonMapping) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if mapping.sticky && mapping.toggle {
            ignored.push("toggle");
        }
        if mapping.burst && mapping.turbo {
            ignored.push("turbo");
        }
        ignored
    }
}

fn invalid_rate(mapping: &ButtonMapping) -> String {
    format!(
        "{}: turbo_rate_hz {} must be a positive number",
        mapping.button, mapping.turbo_rate_hz
    )
}

/// Ticks per pulse half cycle so the pulse frequency does not depend on the
/// poll rate. Always at least one tick.
#[must_use]
pub fn half_period(pulse_rate_hz: f32, rate: PollingRate) -> Option<u32> {
    if !pulse_rate_hz.is_finite() || pulse_rate_hz <= 0.0 {
        return None;
    }
    let ticks = (rate.hz() as f32 / (2.0 * pulse_rate_hz)).round();
    Some((ticks as u32).max(1))
}
