//! # Aim Assist Module
//!
//! Fuses the latest detected on-screen target with the shaped right stick.
//!
//! ## Effects
//!
//! | Effect | Condition | Result |
//! |--------|-----------|--------|
//! | Friction | target present, slowdown enabled | stick scaled by `slowdown_factor` |
//! | Magnetism | target present, snap enabled, deflection above threshold | pull toward target added |
//!
//! With no target, or with assist disabled, the stick passes through
//! bit-exact. The blend never clamps; values are clamped where they are
//! turned into mouse movement.
//!
//! Targets arrive through a [`TargetHandle`] from whatever detector the host
//! runs. The polling loop only reads the last published value.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::watch;

use crate::profile::AimAssistSettings;

/// Largest offset magnetism can add per axis, at `pull_strength` 1.0 and a
/// target at the screen edge.
pub const MAX_PULL: f32 = 0.5;

/// Detected target position, normalized to the screen: (0,0) top-left,
/// (1,1) bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AimTarget {
    pub x: f32,
    pub y: f32,
}

impl AimTarget {
    /// Builds a target, clamping into the unit square. Non-finite input
    /// yields `None`.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Option<Self> {
        (x.is_finite() && y.is_finite()).then(|| Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        })
    }

    /// Offset from screen center, each component in -1.0..=1.0.
    #[must_use]
    pub fn offset(&self) -> (f32, f32) {
        ((self.x - 0.5) * 2.0, (self.y - 0.5) * 2.0)
    }
}

/// A target together with when it was published.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stamped {
    target: Option<AimTarget>,
    at: Instant,
}

/// Current time on the runtime clock, so paused test time applies.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Creates a linked publisher/reader pair with no target.
#[must_use]
pub fn target_channel() -> (TargetHandle, TargetSource) {
    let (tx, rx) = watch::channel(Stamped {
        target: None,
        at: now(),
    });
    (TargetHandle { tx }, TargetSource { rx })
}

/// Publisher side, last write wins.
#[derive(Debug, Clone)]
pub struct TargetHandle {
    tx: watch::Sender<Stamped>,
}

impl TargetHandle {
    /// Publishes the current detection, or `None` when nothing is on screen.
    pub fn publish(&self, target: Option<AimTarget>) {
        self.publish_at(target, now());
    }

    pub fn publish_at(&self, target: Option<AimTarget>, at: Instant) {
        self.tx.send_replace(Stamped { target, at });
    }

    pub fn clear(&self) {
        self.publish(None);
    }
}

/// Reader side used by the polling loop. Never blocks.
#[derive(Debug, Clone)]
pub struct TargetSource {
    rx: watch::Receiver<Stamped>,
}

impl TargetSource {
    /// The last published target, unless it is older than `ttl`.
    #[must_use]
    pub fn latest(&self, now: Instant, ttl: Option<Duration>) -> Option<AimTarget> {
        let stamped = *self.rx.borrow();
        match ttl {
            Some(ttl) if now.saturating_duration_since(stamped.at) > ttl => None,
            _ => stamped.target,
        }
    }
}

/// Friction and magnetism for the right stick.
#[derive(Debug, Clone, Copy, Default)]
pub struct AimAssistBlender;

impl AimAssistBlender {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Adjusts the shaped right stick toward `target`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pad_bridge::aim::{AimAssistBlender, AimTarget};
    /// use pad_bridge::profile::AimAssistSettings;
    ///
    /// let blender = AimAssistBlender::new();
    /// let settings = AimAssistSettings::default();
    ///
    /// assert_eq!(blender.blend(0.3, -0.7, None, &settings), (0.3, -0.7));
    ///
    /// let target = AimTarget::new(0.5, 0.5);
    /// let (x, _) = blender.blend(0.5, 0.0, target, &settings);
    /// assert!((x - 0.3).abs() < 1e-6);
    /// ```
    #[must_use]
    pub fn blend(
        &self,
        x: f32,
        y: f32,
        target: Option<AimTarget>,
        settings: &AimAssistSettings,
    ) -> (f32, f32) {
        let target = match target {
            Some(target) if settings.enabled => target,
            _ => return (x, y),
        };

        let deflection = (x * x + y * y).sqrt();

        let (mut bx, mut by) = if settings.slowdown_enabled {
            (x * settings.slowdown_factor, y * settings.slowdown_factor)
        } else {
            (x, y)
        };

        if settings.snap_to_target && deflection > settings.activation_threshold {
            let (tx, ty) = target.offset();
            let pull = settings.pull_strength.clamp(0.0, 1.0) * MAX_PULL;
            bx += tx * pull;
            by += ty * pull;
        }

        (bx, by)
    }
}
