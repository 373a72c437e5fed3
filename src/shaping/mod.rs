//! # Response Shaping Module
//!
//! Turns raw stick positions into shaped values.
//!
//! ## Pipeline
//!
//! 1. **Deadzone**: input near center maps to zero and the remaining range is
//!    rescaled to use the full output range (see [`apply_deadzone`]).
//! 2. **Response curve**: sign-preserving remap of each component
//!    (see [`apply_curve`]).
//! 3. **Smoothing** (optional): rolling filter over recent shaped values.
//!    Runs after the curve so the curve response is not attenuated.
//!
//! ## Usage
//!
//! ```
//! use pad_bridge::profile::AxisConfig;
//! use pad_bridge::shaping::shape;
//!
//! let cfg = AxisConfig { deadzone_inner: 0.1, ..AxisConfig::identity() };
//!
//! assert_eq!(shape(0.05, 0.0, &cfg, &cfg), (0.0, 0.0));
//!
//! let (x, y) = shape(0.5, 0.0, &cfg, &cfg);
//! assert!((x - 0.444).abs() < 0.001);
//! assert_eq!(y, 0.0);
//! ```

mod curve;
mod deadzone;
mod smoothing;

pub use curve::apply_curve;
pub use deadzone::apply_deadzone;
pub use smoothing::{alpha_for, window_for, Smoother, Stabilizer, MAX_WINDOW};

use crate::profile::AxisConfig;

/// Deadzone and curve for a stick pair, without smoothing.
///
/// Both outputs are in -1.0..=1.0.
#[must_use]
pub fn shape(raw_x: f32, raw_y: f32, cfg_x: &AxisConfig, cfg_y: &AxisConfig) -> (f32, f32) {
    let (x, y) = apply_deadzone(raw_x, raw_y, cfg_x, cfg_y);
    (
        apply_curve(x, cfg_x.curve).clamp(-1.0, 1.0),
        apply_curve(y, cfg_y.curve).clamp(-1.0, 1.0),
    )
}

/// Stateful shaper for one stick.
///
/// Holds the smoothing history for both axes. Filters are rebuilt when the
/// smoothing settings they were created with change.
#[derive(Debug, Clone, Default)]
pub struct ResponseShaper {
    smoothers: [Option<Smoother>; 2],
}

impl ResponseShaper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes one sample of the stick.
    pub fn shape(&mut self, raw_x: f32, raw_y: f32, cfg_x: &AxisConfig, cfg_y: &AxisConfig) -> (f32, f32) {
        let (x, y) = shape(raw_x, raw_y, cfg_x, cfg_y);
        (
            Self::smooth(&mut self.smoothers[0], x, cfg_x).clamp(-1.0, 1.0),
            Self::smooth(&mut self.smoothers[1], y, cfg_y).clamp(-1.0, 1.0),
        )
    }

    /// Drops all smoothing history.
    pub fn reset(&mut self) {
        for smoother in self.smoothers.iter_mut().flatten() {
            smoother.reset();
        }
    }

    #[inline]
    fn smooth(slot: &mut Option<Smoother>, value: f32, cfg: &AxisConfig) -> f32 {
        match cfg.smoothing {
            None => {
                *slot = None;
                value
            }
            Some(config) => {
                let stale = slot.as_ref().map_or(true, |s| s.config() != config);
                if stale {
                    *slot = Some(Smoother::new(config));
                }
                slot.as_mut().map_or(value, |s| s.apply(value))
            }
        }
    }
}
