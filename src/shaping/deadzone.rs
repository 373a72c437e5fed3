//! Deadzone stage.
//!
//! Circular deadzones act on the stick as a pair; the other shapes threshold
//! each component on its own. The X axis config supplies the shape (and the
//! radii for the pair-level shapes); per-component shapes use each axis'
//! own radii.

use crate::profile::{AxisConfig, DeadzoneShape};

/// Applies the deadzone configured for a stick pair.
///
/// Output components are in -1.0..=1.0. A zero (or non-finite) input returns
/// `(0.0, 0.0)` without dividing.
#[must_use]
pub fn apply_deadzone(x: f32, y: f32, cfg_x: &AxisConfig, cfg_y: &AxisConfig) -> (f32, f32) {
    let x = finite_or_zero(x);
    let y = finite_or_zero(y);
    let magnitude = (x * x + y * y).sqrt();
    if magnitude == 0.0 {
        return (0.0, 0.0);
    }

    match cfg_x.shape {
        DeadzoneShape::Circular => {
            let (inner, outer) = radii(cfg_x);
            if magnitude < inner {
                return (0.0, 0.0);
            }
            let scale = rescale(magnitude, inner, outer);
            (x / magnitude * scale, y / magnitude * scale)
        }
        DeadzoneShape::Axial => (axial(x, cfg_x), axial(y, cfg_y)),
        DeadzoneShape::Cross => (
            cut(x, cfg_x.deadzone_inner).clamp(-1.0, 1.0),
            cut(y, cfg_y.deadzone_inner).clamp(-1.0, 1.0),
        ),
        DeadzoneShape::Square => {
            let cx = cut(x, cfg_x.deadzone_inner);
            let cy = cut(y, cfg_y.deadzone_inner);
            let chebyshev = cx.abs().max(cy.abs());
            if chebyshev == 0.0 {
                return (0.0, 0.0);
            }
            let (inner, outer) = radii(cfg_x);
            let scale = rescale(chebyshev, inner, outer);
            (cx / chebyshev * scale, cy / chebyshev * scale)
        }
    }
}

/// Inner radius and outer radius clamped to 1.0.
#[inline]
fn radii(cfg: &AxisConfig) -> (f32, f32) {
    (cfg.deadzone_inner, cfg.deadzone_outer.min(1.0))
}

/// Maps `inner..outer` onto `0..1`, saturating past `outer`.
#[inline]
fn rescale(value: f32, inner: f32, outer: f32) -> f32 {
    let span = outer - inner;
    if span <= 0.0 {
        return if value >= outer { 1.0 } else { 0.0 };
    }
    ((value - inner) / span).clamp(0.0, 1.0)
}

/// Zeroes a component below the inner radius.
#[inline]
fn cut(value: f32, inner: f32) -> f32 {
    if value.abs() < inner {
        0.0
    } else {
        value
    }
}

#[inline]
fn axial(value: f32, cfg: &AxisConfig) -> f32 {
    let (inner, outer) = radii(cfg);
    if value.abs() < inner {
        0.0
    } else {
        rescale(value.abs(), inner, outer).copysign(value)
    }
}

#[inline]
fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
