//! # Latch Module
//!
//! Per-button state machines that turn continuous physical button state into
//! the virtual state the output side acts on.
//!
//! ## States
//!
//! | Phase | Meaning |
//! |-------|---------|
//! | `Idle` | Not virtually pressed |
//! | `Held` | Pressed with no latch behavior |
//! | `StickyEngaged` | Latched on by a press, released by the next press |
//! | `ToggleEngaged` | Flipped on by a press |
//! | `TurboActive` | Pulsing while engaged |
//! | `BurstActive` | Running a fixed pulse train |
//!
//! Only mapped buttons own a [`ButtonLatchState`]. Unmapped buttons pass the
//! physical state straight through.

mod mode;

pub use mode::{half_period, HoldMode, LatchMode, PulseMode};

use serde::Serialize;

use crate::controller::{Button, BUTTON_COUNT};
use crate::profile::ButtonMap;

/// Observable phase of a button, for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchPhase {
    Idle,
    Held,
    StickyEngaged,
    ToggleEngaged,
    TurboActive,
    BurstActive,
}

/// Latch state carried across ticks for one button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLatchState {
    pub virtual_pressed: bool,
    pub sticky_engaged: bool,
    pub toggle_engaged: bool,
    /// Ticks since turbo engaged; 0 whenever disengaged.
    pub turbo_phase: u32,
    pub last_physical: bool,
    last_engaged: bool,
    /// Ticks since the running burst started.
    burst_phase: Option<u32>,
}

impl ButtonLatchState {
    #[must_use]
    pub fn phase(&self) -> LatchPhase {
        if self.burst_phase.is_some() {
            LatchPhase::BurstActive
        } else if self.turbo_phase > 0 {
            LatchPhase::TurboActive
        } else if self.sticky_engaged {
            LatchPhase::StickyEngaged
        } else if self.toggle_engaged {
            LatchPhase::ToggleEngaged
        } else if self.virtual_pressed {
            LatchPhase::Held
        } else {
            LatchPhase::Idle
        }
    }

    /// Advances one tick and returns the new virtual state.
    pub fn step(&mut self, mode: &LatchMode, physical: bool) -> bool {
        let rising = physical && !self.last_physical;
        self.last_physical = physical;

        let engaged = match mode.hold {
            HoldMode::Momentary => physical,
            HoldMode::Sticky => {
                if rising {
                    self.sticky_engaged = !self.sticky_engaged;
                }
                self.sticky_engaged
            }
            HoldMode::Toggle => {
                if rising {
                    self.toggle_engaged = !self.toggle_engaged;
                }
                self.toggle_engaged
            }
        };
        let engage_edge = engaged && !self.last_engaged;
        self.last_engaged = engaged;

        self.virtual_pressed = match mode.pulse {
            PulseMode::Steady => engaged,
            PulseMode::Turbo { half_period } => {
                if engaged {
                    let on = pulse_on(self.turbo_phase, half_period);
                    self.turbo_phase = self.turbo_phase.saturating_add(1);
                    on
                } else {
                    self.turbo_phase = 0;
                    false
                }
            }
            PulseMode::Burst { count, half_period } => {
                let length = burst_length(count, half_period);
                // A shorter burst may have been swapped in mid-run
                if matches!(self.burst_phase, Some(elapsed) if elapsed >= length) {
                    self.burst_phase = None;
                }
                if engage_edge && self.burst_phase.is_none() {
                    self.burst_phase = Some(0);
                }
                match self.burst_phase {
                    Some(elapsed) => {
                        let next = elapsed + 1;
                        self.burst_phase = (next < length).then_some(next);
                        pulse_on(elapsed, half_period)
                    }
                    None => false,
                }
            }
        };

        self.virtual_pressed
    }

    /// Carries engagement over to a new mode after a profile swap.
    fn rebind(&mut self, mode: &LatchMode) {
        let engaged = self.sticky_engaged || self.toggle_engaged;
        self.sticky_engaged = engaged && mode.hold == HoldMode::Sticky;
        self.toggle_engaged = engaged && mode.hold == HoldMode::Toggle;
        if !matches!(mode.pulse, PulseMode::Turbo { .. }) {
            self.turbo_phase = 0;
        }
        if !matches!(mode.pulse, PulseMode::Burst { .. }) {
            self.burst_phase = None;
        }
    }
}

#[inline]
fn pulse_on(phase: u32, half_period: u32) -> bool {
    (phase / half_period.max(1)) % 2 == 0
}

#[inline]
fn burst_length(count: u32, half_period: u32) -> u32 {
    count.saturating_mul(2).saturating_mul(half_period.max(1))
}

/// Latch states for every mapped button of the active profile.
#[derive(Debug, Clone)]
pub struct LatchController {
    states: [Option<ButtonLatchState>; BUTTON_COUNT],
}

impl Default for LatchController {
    fn default() -> Self {
        Self::new()
    }
}

impl LatchController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: [None; BUTTON_COUNT],
        }
    }

    /// Resolves the virtual state of `button` for this tick.
    ///
    /// `mode` is `None` for unmapped buttons, which pass `physical` through
    /// and keep no state.
    pub fn resolve(&mut self, button: Button, mode: Option<&LatchMode>, physical: bool) -> bool {
        match mode {
            Some(mode) => self.states[button.index()]
                .get_or_insert_with(ButtonLatchState::default)
                .step(mode, physical),
            None => {
                self.states[button.index()] = None;
                physical
            }
        }
    }

    #[must_use]
    pub fn state(&self, button: Button) -> Option<&ButtonLatchState> {
        self.states[button.index()].as_ref()
    }

    /// Applies a profile swap: drops state for buttons the new profile does
    /// not map and carries engagement over for the rest.
    pub fn retain_mapped(&mut self, buttons: &ButtonMap, mode_of: impl Fn(Button) -> LatchMode) {
        for button in Button::ALL {
            let slot = &mut self.states[button.index()];
            if !buttons.contains(button) {
                *slot = None;
            } else if let Some(state) = slot.as_mut() {
                state.rebind(&mode_of(button));
            }
        }
    }

    /// Forgets all latch state; every button starts from idle.
    pub fn reset(&mut self) {
        self.states = [None; BUTTON_COUNT];
    }

    /// Phases of all tracked buttons.
    pub fn phases(&self) -> impl Iterator<Item = (Button, LatchPhase)> + '_ {
        Button::ALL
            .into_iter()
            .filter_map(|b| self.states[b.index()].map(|s| (b, s.phase())))
    }
}
