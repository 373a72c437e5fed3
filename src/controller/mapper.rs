//! # Controller Event Mapper Module
//!
//! Folds raw evdev events from a DualSense controller into the latest
//! [`RawSample`].
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Range | Sample slot |
//! |------|------------|-------|-------------|
//! | Left Stick X | ABS_X | 0-255 | `axes[0]` |
//! | Left Stick Y | ABS_Y | 0-255 | `axes[1]` |
//! | Right Stick X | ABS_Z | 0-255 | `axes[2]` |
//! | Right Stick Y | ABS_RZ | 0-255 | `axes[3]` |
//! | L2 Trigger | ABS_RX | 0-255 | `triggers[0]` |
//! | R2 Trigger | ABS_RY | 0-255 | `triggers[1]` |
//! | D-Pad X | ABS_HAT0X | -1/0/1 | D-Pad Left/Right |
//! | D-Pad Y | ABS_HAT0Y | -1/0/1 | D-Pad Up/Down |
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code |
//! |--------|------------|
//! | Cross | BTN_SOUTH |
//! | Circle | BTN_EAST |
//! | Square | BTN_WEST |
//! | Triangle | BTN_NORTH |
//! | L1 / R1 | BTN_TL / BTN_TR |
//! | L2 / R2 (click) | BTN_TL2 / BTN_TR2 |
//! | Share / Options | BTN_SELECT / BTN_START |
//! | PS | BTN_MODE |
//! | L3 / R3 | BTN_THUMBL / BTN_THUMBR |
//! | Touchpad | BTN_TOUCH |

use std::sync::Arc;

use evdev::{AbsoluteAxisType, InputEvent, Key};

use super::sample::{Axis, Button, RawSample};

/// Raw axis value range from DualSense controller.
pub const AXIS_MIN: i32 = 0;
/// Raw axis value range from DualSense controller.
pub const AXIS_MAX: i32 = 255;
/// Raw axis center value.
pub const AXIS_CENTER: i32 = 128;

/// Converts raw axis value (0-255) to normalized value (-1.0 to 1.0).
///
/// # Examples
///
/// ```
/// use pad_bridge::controller::mapper::normalize_axis;
///
/// assert!((normalize_axis(0) - (-1.0)).abs() < 0.01);
/// assert!((normalize_axis(128) - 0.0).abs() < 0.01);
/// assert!((normalize_axis(255) - 1.0).abs() < 0.01);
/// ```
#[must_use]
pub fn normalize_axis(raw: i32) -> f32 {
    let clamped = raw.clamp(AXIS_MIN, AXIS_MAX);
    (((clamped as f32) - AXIS_CENTER as f32) / 127.0).clamp(-1.0, 1.0)
}

/// Converts raw trigger value (0-255) to normalized value (0.0 to 1.0).
#[must_use]
pub fn normalize_trigger(raw: i32) -> f32 {
    (raw.clamp(AXIS_MIN, AXIS_MAX) as f32) / AXIS_MAX as f32
}

/// Accumulates evdev events and exposes the resulting sample.
///
/// `EventMapper` is not thread-safe. The evdev reader thread owns one and
/// publishes copies of [`EventMapper::sample`].
#[derive(Debug)]
pub struct EventMapper {
    sample: RawSample,
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::new(None)
    }
}

impl EventMapper {
    /// Creates a mapper for a connected device with all inputs at rest.
    #[must_use]
    pub fn new(device_id: Option<Arc<str>>) -> Self {
        Self {
            sample: RawSample {
                device_id,
                ..RawSample::neutral()
            },
        }
    }

    /// Returns the sample reflecting every event processed so far.
    #[must_use]
    pub fn sample(&self) -> &RawSample {
        &self.sample
    }

    /// Processes a single evdev input event.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            evdev::InputEventKind::AbsAxis(axis) => {
                self.process_axis_event(axis, event.value());
            }
            evdev::InputEventKind::Key(key) => {
                self.process_key_event(key, event.value() != 0);
            }
            _ => {
                // Sync reports and misc events carry no state
            }
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let sample = &mut self.sample;
        match axis {
            AbsoluteAxisType::ABS_X => sample.axes[Axis::LeftStickX.index()] = normalize_axis(value),
            AbsoluteAxisType::ABS_Y => sample.axes[Axis::LeftStickY.index()] = normalize_axis(value),

            // DualSense reports the right stick on ABS_Z / ABS_RZ
            AbsoluteAxisType::ABS_Z => sample.axes[Axis::RightStickX.index()] = normalize_axis(value),
            AbsoluteAxisType::ABS_RZ => sample.axes[Axis::RightStickY.index()] = normalize_axis(value),

            AbsoluteAxisType::ABS_RX => sample.triggers[0] = normalize_trigger(value),
            AbsoluteAxisType::ABS_RY => sample.triggers[1] = normalize_trigger(value),

            AbsoluteAxisType::ABS_HAT0X => {
                sample.buttons.set(Button::DpadLeft, value < 0);
                sample.buttons.set(Button::DpadRight, value > 0);
            }
            AbsoluteAxisType::ABS_HAT0Y => {
                sample.buttons.set(Button::DpadUp, value < 0);
                sample.buttons.set(Button::DpadDown, value > 0);
            }

            _ => {
                // Gyro, accelerometer and touch coordinates are not used
            }
        }
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        let button = match key {
            Key::BTN_SOUTH => Button::Cross,
            Key::BTN_EAST => Button::Circle,
            Key::BTN_WEST => Button::Square,
            Key::BTN_NORTH => Button::Triangle,
            Key::BTN_TL => Button::L1,
            Key::BTN_TR => Button::R1,
            Key::BTN_TL2 => Button::L2,
            Key::BTN_TR2 => Button::R2,
            Key::BTN_SELECT => Button::Share,
            Key::BTN_START => Button::Options,
            Key::BTN_MODE => Button::Ps,
            Key::BTN_THUMBL => Button::L3,
            Key::BTN_THUMBR => Button::R3,
            Key::BTN_TOUCH => Button::Touchpad,
            _ => return,
        };
        self.sample.buttons.set(button, pressed);
    }

}
