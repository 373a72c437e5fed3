//! # Profile Module
//!
//! The per-user configuration the pipeline runs against: axis shaping,
//! button mappings, polling rate, aim assist and mouse output.
//!
//! Profiles are plain immutable values. The polling loop holds an
//! `Arc<Profile>` for the whole tick and only picks up a new one between
//! ticks (see [`ProfileHandle`]).
//!
//! ## Example (TOML)
//!
//! ```toml
//! name = "Shooter"
//! polling_rate_hz = 1000
//!
//! [axes.right_stick_x]
//! deadzone_inner = 0.08
//! curve = { kind = "exponential", exponent = 2.5 }
//!
//! [[buttons]]
//! button = "circle"
//! output = { kind = "key", code = "KeyC" }
//! turbo = true
//! turbo_rate_hz = 10.0
//! ```

mod handle;

pub use handle::{profile_channel, ProfileHandle, ProfileSource};

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::{Axis, Button};

/// Supported polling rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PollingRate {
    Hz125,
    Hz250,
    Hz500,
    Hz1000,
}

impl PollingRate {
    /// Every supported rate, slowest first.
    pub const ALL: [PollingRate; 4] = [
        PollingRate::Hz125,
        PollingRate::Hz250,
        PollingRate::Hz500,
        PollingRate::Hz1000,
    ];

    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            PollingRate::Hz125 => 125,
            PollingRate::Hz250 => 250,
            PollingRate::Hz500 => 500,
            PollingRate::Hz1000 => 1000,
        }
    }

    /// Time between ticks.
    #[must_use]
    pub const fn period(self) -> Duration {
        Duration::from_micros(1_000_000 / self.hz() as u64)
    }
}

impl Default for PollingRate {
    fn default() -> Self {
        PollingRate::Hz1000
    }
}

impl TryFrom<u32> for PollingRate {
    type Error = String;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        PollingRate::ALL
            .into_iter()
            .find(|rate| rate.hz() == hz)
            .ok_or_else(|| format!("polling rate {} Hz is not one of: 125, 250, 500, 1000", hz))
    }
}

impl From<PollingRate> for u32 {
    fn from(rate: PollingRate) -> Self {
        rate.hz()
    }
}

/// Region around center treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadzoneShape {
    /// Radial threshold on stick magnitude, rescaled radially.
    #[default]
    Circular,
    /// Per-component threshold, rescaled by the larger component.
    Square,
    /// Per-component threshold with no rescale; snaps near-axis input onto the axis.
    Cross,
    /// Per-component threshold, each component rescaled on its own.
    Axial,
}

/// Sign-preserving remap of magnitude after the deadzone.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseCurve {
    #[default]
    Linear,
    Exponential {
        #[serde(default = "default_curve_exponent")]
        exponent: f32,
    },
    SCurve,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingAlgorithm {
    #[default]
    MovingAverage,
    Exponential,
}

/// Post-curve smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smoothing {
    #[serde(default)]
    pub algorithm: SmoothingAlgorithm,
    /// 0.0 = off, 1.0 = heaviest smoothing.
    #[serde(default = "default_smoothing_strength")]
    pub strength: f32,
}

/// Shaping parameters for one stick axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    #[serde(default = "default_deadzone_inner")]
    pub deadzone_inner: f32,

    #[serde(default = "default_deadzone_outer")]
    pub deadzone_outer: f32,

    #[serde(default)]
    pub shape: DeadzoneShape,

    #[serde(default)]
    pub curve: ResponseCurve,

    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,

    #[serde(default)]
    pub smoothing: Option<Smoothing>,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            deadzone_inner: default_deadzone_inner(),
            deadzone_outer: default_deadzone_outer(),
            shape: DeadzoneShape::default(),
            curve: ResponseCurve::default(),
            sensitivity: default_sensitivity(),
            smoothing: None,
        }
    }
}

impl AxisConfig {
    /// Config that passes input through untouched.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            deadzone_inner: 0.0,
            deadzone_outer: 1.0,
            shape: DeadzoneShape::Circular,
            curve: ResponseCurve::Linear,
            sensitivity: 1.0,
            smoothing: None,
        }
    }

    /// Checks the field ranges the shaper depends on.
    ///
    /// An outer deadzone above 1.0 is accepted and clamped by the shaper.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed field.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.deadzone_inner.is_finite() || !(0.0..1.0).contains(&self.deadzone_inner) {
            return Err(format!("deadzone_inner {} must be in [0, 1)", self.deadzone_inner));
        }
        if !self.deadzone_outer.is_finite() || self.deadzone_outer <= self.deadzone_inner {
            return Err(format!(
                "deadzone_outer {} must be greater than deadzone_inner {}",
                self.deadzone_outer, self.deadzone_inner
            ));
        }
        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(format!("sensitivity {} must be a non-negative number", self.sensitivity));
        }
        if let ResponseCurve::Exponential { exponent } = self.curve {
            if !exponent.is_finite() || exponent <= 0.0 {
                return Err(format!("curve exponent {} must be positive", exponent));
            }
        }
        if let Some(smoothing) = self.smoothing {
            if !(0.0..=1.0).contains(&smoothing.strength) {
                return Err(format!("smoothing strength {} must be in [0, 1]", smoothing.strength));
            }
        }
        Ok(())
    }
}

/// Shaping for all four stick axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSet {
    #[serde(default)]
    pub left_stick_x: AxisConfig,
    #[serde(default)]
    pub left_stick_y: AxisConfig,
    #[serde(default)]
    pub right_stick_x: AxisConfig,
    #[serde(default)]
    pub right_stick_y: AxisConfig,
}

impl AxisSet {
    #[must_use]
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::LeftStickX => &self.left_stick_x,
            Axis::LeftStickY => &self.left_stick_y,
            Axis::RightStickX => &self.right_stick_x,
            Axis::RightStickY => &self.right_stick_y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

/// What a mapped button produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ButtonOutput {
    Key { code: String },
    MouseButton { button: MouseButton },
    /// Chord of keys held together while the button is virtually pressed.
    Macro { keys: Vec<String> },
    RadialMenu { menu: String },
    SystemAction { action: String },
}

/// Behavior and output for one physical button.
///
/// The latch flags mirror how profiles are authored; the pipeline resolves
/// them into a single mode with [`crate::latch::LatchMode::from_mapping`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonMapping {
    pub button: Button,
    pub output: ButtonOutput,

    #[serde(default)]
    pub sticky: bool,

    #[serde(default)]
    pub toggle: bool,

    #[serde(default)]
    pub turbo: bool,

    #[serde(default = "default_turbo_rate_hz")]
    pub turbo_rate_hz: f32,

    #[serde(default)]
    pub burst: bool,

    #[serde(default = "default_burst_count")]
    pub burst_count: u32,

    /// Analog level (0..1] at which L2/R2 count as pressed.
    #[serde(default)]
    pub activation_threshold: Option<f32>,
}

impl ButtonMapping {
    /// Plain key mapping with no latch behavior.
    #[must_use]
    pub fn key(button: Button, code: &str) -> Self {
        Self::new(button, ButtonOutput::Key { code: code.to_string() })
    }

    #[must_use]
    pub fn new(button: Button, output: ButtonOutput) -> Self {
        Self {
            button,
            output,
            sticky: false,
            toggle: false,
            turbo: false,
            turbo_rate_hz: default_turbo_rate_hz(),
            burst: false,
            burst_count: default_burst_count(),
            activation_threshold: None,
        }
    }
}

/// Button mappings keyed by button. Duplicate buttons are rejected on load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<ButtonMapping>", into = "Vec<ButtonMapping>")]
pub struct ButtonMap(BTreeMap<Button, ButtonMapping>);

impl ButtonMap {
    #[must_use]
    pub fn get(&self, button: Button) -> Option<&ButtonMapping> {
        self.0.get(&button)
    }

    #[must_use]
    pub fn contains(&self, button: Button) -> bool {
        self.0.contains_key(&button)
    }

    /// Inserts or replaces the mapping for `mapping.button`.
    pub fn insert(&mut self, mapping: ButtonMapping) -> Option<ButtonMapping> {
        self.0.insert(mapping.button, mapping)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ButtonMapping> {
        self.0.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<ButtonMapping>> for ButtonMap {
    type Error = String;

    fn try_from(mappings: Vec<ButtonMapping>) -> Result<Self, Self::Error> {
        let mut map = BTreeMap::new();
        for mapping in mappings {
            let button = mapping.button;
            if map.insert(button, mapping).is_some() {
                return Err(format!("button {} is mapped more than once", button));
            }
        }
        Ok(Self(map))
    }
}

impl From<ButtonMap> for Vec<ButtonMapping> {
    fn from(map: ButtonMap) -> Self {
        map.0.into_values().collect()
    }
}

impl FromIterator<ButtonMapping> for ButtonMap {
    fn from_iter<I: IntoIterator<Item = ButtonMapping>>(iter: I) -> Self {
        let mut map = ButtonMap::default();
        for mapping in iter {
            map.insert(mapping);
        }
        map
    }
}

/// Aim assist and accessibility settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimAssistSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Friction: slow the right stick while a target is visible.
    #[serde(default = "default_true")]
    pub slowdown_enabled: bool,

    #[serde(default = "default_slowdown_factor")]
    pub slowdown_factor: f32,

    /// Magnetism: pull the right stick toward the target.
    #[serde(default)]
    pub snap_to_target: bool,

    /// 0.0..1.0, scaled by the blender's maximum pull.
    #[serde(default = "default_pull_strength")]
    pub pull_strength: f32,

    /// Stick deflection required before magnetism engages.
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f32,

    /// Tremor filter on the right stick, 0.0 = off.
    #[serde(default)]
    pub stabilization_strength: f32,

    /// A target older than this is ignored. 0 disables expiry.
    #[serde(default = "default_target_ttl_ms")]
    pub target_ttl_ms: u64,
}

impl Default for AimAssistSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            slowdown_enabled: true,
            slowdown_factor: default_slowdown_factor(),
            snap_to_target: false,
            pull_strength: default_pull_strength(),
            activation_threshold: default_activation_threshold(),
            stabilization_strength: 0.0,
            target_ttl_ms: default_target_ttl_ms(),
        }
    }
}

impl AimAssistSettings {
    /// Settings that never alter the stick.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Checks that every strength and factor lies in [0, 1].
    ///
    /// # Errors
    ///
    /// Describes the first value out of range.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, value) in [
            ("slowdown_factor", self.slowdown_factor),
            ("pull_strength", self.pull_strength),
            ("activation_threshold", self.activation_threshold),
            ("stabilization_strength", self.stabilization_strength),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} {} must be between 0.0 and 1.0", name, value));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn target_ttl(&self) -> Option<Duration> {
        (self.target_ttl_ms > 0).then(|| Duration::from_millis(self.target_ttl_ms))
    }
}

/// Right stick to mouse movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseOutput {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cursor speed at full deflection, before axis sensitivity.
    #[serde(default = "default_speed_px_per_sec")]
    pub speed_px_per_sec: f32,
}

impl Default for MouseOutput {
    fn default() -> Self {
        Self {
            enabled: true,
            speed_px_per_sec: default_speed_px_per_sec(),
        }
    }
}

/// A complete input profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_profile_name")]
    pub name: String,

    #[serde(default, rename = "polling_rate_hz")]
    pub polling_rate: PollingRate,

    #[serde(default)]
    pub axes: AxisSet,

    #[serde(default)]
    pub buttons: ButtonMap,

    #[serde(default)]
    pub aim_assist: AimAssistSettings,

    #[serde(default)]
    pub mouse: MouseOutput,
}

impl Default for Profile {
    /// The stock layout used when no profile is configured.
    fn default() -> Self {
        let buttons = [
            ButtonMapping::key(Button::Cross, "Space"),
            ButtonMapping::key(Button::Circle, "KeyC"),
            ButtonMapping::key(Button::Square, "KeyR"),
            ButtonMapping::key(Button::Triangle, "KeyF"),
            ButtonMapping::key(Button::L1, "KeyQ"),
            ButtonMapping::key(Button::R1, "KeyE"),
            ButtonMapping {
                activation_threshold: Some(default_trigger_threshold()),
                ..ButtonMapping::new(Button::L2, ButtonOutput::MouseButton { button: MouseButton::Right })
            },
            ButtonMapping {
                activation_threshold: Some(default_trigger_threshold()),
                ..ButtonMapping::new(Button::R2, ButtonOutput::MouseButton { button: MouseButton::Left })
            },
            ButtonMapping::key(Button::Share, "Tab"),
            ButtonMapping::key(Button::Options, "Escape"),
            ButtonMapping::key(Button::L3, "ShiftLeft"),
            ButtonMapping::key(Button::R3, "KeyV"),
            ButtonMapping::key(Button::DpadUp, "Digit1"),
            ButtonMapping::key(Button::DpadRight, "Digit2"),
            ButtonMapping::key(Button::DpadDown, "Digit3"),
            ButtonMapping::key(Button::DpadLeft, "Digit4"),
        ];

        Self {
            name: default_profile_name(),
            polling_rate: PollingRate::default(),
            axes: AxisSet::default(),
            buttons: buttons.into_iter().collect(),
            aim_assist: AimAssistSettings::default(),
            mouse: MouseOutput::default(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_profile_name() -> String { "Default".to_string() }

fn default_deadzone_inner() -> f32 { 0.05 }
fn default_deadzone_outer() -> f32 { 1.0 }
fn default_sensitivity() -> f32 { 1.0 }
fn default_curve_exponent() -> f32 { 2.5 }
fn default_smoothing_strength() -> f32 { 0.5 }

fn default_turbo_rate_hz() -> f32 { 10.0 }
fn default_burst_count() -> u32 { 3 }
fn default_trigger_threshold() -> f32 { 0.3 }

fn default_slowdown_factor() -> f32 { 0.6 }
fn default_pull_strength() -> f32 { 0.5 }
fn default_activation_threshold() -> f32 { 0.1 }
fn default_target_ttl_ms() -> u64 { 250 }

fn default_speed_px_per_sec() -> f32 { 1500.0 }
