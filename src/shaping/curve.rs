//! Response curves.

use crate::profile::ResponseCurve;

/// Applies a response curve to one post-deadzone component.
///
/// The result keeps the sign of `value` and stays in -1.0..=1.0.
///
/// # Examples
///
/// ```
/// use pad_bridge::profile::ResponseCurve;
/// use pad_bridge::shaping::apply_curve;
///
/// assert_eq!(apply_curve(-0.5, ResponseCurve::Linear), -0.5);
/// assert_eq!(apply_curve(0.01, ResponseCurve::Instant), 1.0);
/// assert!(apply_curve(0.5, ResponseCurve::Exponential { exponent: 2.5 }) < 0.2);
/// ```
#[must_use]
pub fn apply_curve(value: f32, curve: ResponseCurve) -> f32 {
    if value == 0.0 || !value.is_finite() {
        return 0.0;
    }
    let magnitude = value.abs().min(1.0);

    let shaped = match curve {
        ResponseCurve::Linear => magnitude,
        ResponseCurve::Exponential { exponent } => magnitude.powf(exponent),
        ResponseCurve::SCurve => {
            let sq = magnitude * magnitude;
            let rest = 1.0 - magnitude;
            sq / (sq + rest * rest)
        }
        ResponseCurve::Instant => 1.0,
    };

    // Never collapse a non-zero input to zero
    shaped.clamp(f32::MIN_POSITIVE, 1.0).copysign(value)
}
