//! # Raw Hardware Samples
//!
//! The per-tick hardware snapshot consumed by the input pipeline, the button
//! and axis identities it is indexed by, and the [`SampleProvider`] seam that
//! hardware backends implement.
//!
//! ## Button Indices
//!
//! Buttons follow the standard gamepad layout:
//!
//! | Index | Button | Index | Button |
//! |-------|--------|-------|--------|
//! | 0 | Cross (×) | 9 | Options |
//! | 1 | Circle (○) | 10 | L3 |
//! | 2 | Square (□) | 11 | R3 |
//! | 3 | Triangle (△) | 12 | D-Pad Up |
//! | 4 | L1 | 13 | D-Pad Down |
//! | 5 | R1 | 14 | D-Pad Left |
//! | 6 | L2 | 15 | D-Pad Right |
//! | 7 | R2 | 16 | PS |
//! | 8 | Share | 17 | Touchpad |

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Number of buttons tracked per sample.
pub const BUTTON_COUNT: usize = 18;

/// Number of stick axes per sample.
pub const AXIS_COUNT: usize = 4;

/// A physical controller button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Cross,
    Circle,
    Square,
    Triangle,
    L1,
    R1,
    L2,
    R2,
    Share,
    Options,
    L3,
    R3,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    Ps,
    Touchpad,
}

impl Button {
    /// Every button, in index order.
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::Cross,
        Button::Circle,
        Button::Square,
        Button::Triangle,
        Button::L1,
        Button::R1,
        Button::L2,
        Button::R2,
        Button::Share,
        Button::Options,
        Button::L3,
        Button::R3,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::Ps,
        Button::Touchpad,
    ];

    /// Bit index of this button in a [`ButtonSet`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the analog trigger slot for L2/R2.
    #[must_use]
    pub const fn trigger_slot(self) -> Option<usize> {
        match self {
            Button::L2 => Some(0),
            Button::R2 => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A logical stick axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
}

impl Axis {
    /// Slot of this axis in [`RawSample::axes`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Bitset of pressed buttons, indexed by [`Button::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonSet(u32);

impl ButtonSet {
    /// An empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn contains(self, button: Button) -> bool {
        self.0 & (1 << button.index()) != 0
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.0 |= 1 << button.index();
        } else {
            self.0 &= !(1 << button.index());
        }
    }

    pub fn insert(&mut self, button: Button) {
        self.set(button, true);
    }

    pub fn remove(&mut self, button: Button) {
        self.set(button, false);
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the pressed buttons in index order.
    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        let mut set = ButtonSet::empty();
        for button in iter {
            set.insert(button);
        }
        set
    }
}

/// One hardware read.
///
/// Stick axes are normalized to -1.0..1.0 (0.0 = center) in the order
/// LX, LY, RX, RY. Triggers are normalized to 0.0..1.0 in the order L2, R2.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSample {
    pub buttons: ButtonSet,
    pub axes: [f32; AXIS_COUNT],
    pub triggers: [f32; 2],
    pub connected: bool,
    pub device_id: Option<Arc<str>>,
}

impl RawSample {
    /// A connected sample with everything centered and released.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// A sample reporting that no device is attached.
    #[must_use]
    pub fn disconnected() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_button(mut self, button: Button, pressed: bool) -> Self {
        self.buttons.set(button, pressed);
        self
    }

    #[must_use]
    pub fn with_axis(mut self, axis: Axis, value: f32) -> Self {
        self.axes[axis.index()] = value;
        self
    }

    #[must_use]
    pub fn axis(&self, axis: Axis) -> f32 {
        self.axes[axis.index()]
    }
}

/// Source of raw hardware samples, polled once per tick.
///
/// Implementations must return immediately with the last known state; the
/// polling loop never waits on hardware.
#[cfg_attr(test, mockall::automock)]
pub trait SampleProvider: Send {
    fn sample(&mut self) -> RawSample;
}
