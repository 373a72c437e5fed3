//! Post-curve smoothing filters.

use std::collections::VecDeque;

use crate::profile::{Smoothing, SmoothingAlgorithm};

/// Longest moving-average window, reached at strength 1.0.
pub const MAX_WINDOW: usize = 10;

/// Smallest exponential blend weight for the newest sample, reached at strength 1.0.
const MIN_ALPHA: f32 = 0.1;

/// Rolling filter for one axis.
#[derive(Debug, Clone)]
pub struct Smoother {
    config: Smoothing,
    window: usize,
    history: VecDeque<f32>,
    ema: Option<f32>,
}

impl Smoother {
    #[must_use]
    pub fn new(config: Smoothing) -> Self {
        let window = window_for(config.strength);
        Self {
            config,
            window,
            history: VecDeque::with_capacity(window),
            ema: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> Smoothing {
        self.config
    }

    /// Feeds one value and returns the smoothed value.
    pub fn apply(&mut self, value: f32) -> f32 {
        match self.config.algorithm {
            SmoothingAlgorithm::MovingAverage => {
                if self.history.len() == self.window {
                    self.history.pop_front();
                }
                self.history.push_back(value);
                self.history.iter().sum::<f32>() / self.history.len() as f32
            }
            SmoothingAlgorithm::Exponential => {
                let alpha = alpha_for(self.config.strength);
                let next = match self.ema {
                    Some(previous) => alpha * value + (1.0 - alpha) * previous,
                    None => value,
                };
                self.ema = Some(next);
                next
            }
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.ema = None;
    }
}

/// Number of samples averaged for a given strength (1 = no smoothing).
#[must_use]
pub fn window_for(strength: f32) -> usize {
    let strength = strength.clamp(0.0, 1.0);
    1 + (strength * (MAX_WINDOW - 1) as f32).round() as usize
}

/// Weight of the newest sample for a given strength (1.0 = no smoothing).
#[must_use]
pub fn alpha_for(strength: f32) -> f32 {
    1.0 - strength.clamp(0.0, 1.0) * (1.0 - MIN_ALPHA)
}

/// Exponential tremor filter for a whole stick.
///
/// Strength 0.0 passes input through and drops any history.
#[derive(Debug, Clone, Default)]
pub struct Stabilizer {
    state: Option<(f32, f32)>,
}

impl Stabilizer {
    pub fn apply(&mut self, x: f32, y: f32, strength: f32) -> (f32, f32) {
        if strength <= 0.0 {
            self.state = None;
            return (x, y);
        }
        let alpha = alpha_for(strength);
        let next = match self.state {
            Some((px, py)) => (alpha * x + (1.0 - alpha) * px, alpha * y + (1.0 - alpha) * py),
            None => (x, y),
        };
        self.state = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving(strength: f32) -> Smoother {
        Smoother::new(Smoothing {
            algorithm: SmoothingAlgorithm::MovingAverage,
            strength,
        })
    }

    #[test]
    fn test_window_sizes() {
        assert_eq!(window_for(0.0), 1);
        assert_eq!(window_for(1.0), MAX_WINDOW);
        assert_eq!(window_for(0.5), 6);
        assert_eq!(window_for(7.0), MAX_WINDOW);
    }

    #[test]
    fn test_zero_strength_passthrough() {
        let mut s = moving(0.0);
        assert_eq!(s.apply(0.3), 0.3);
        assert_eq!(s.apply(-0.8), -0.8);
    }

    #[test]
    fn test_moving_average_window() {
        // strength 1/3 -> window 4
        let mut s = moving(1.0 / 3.0);
        assert_eq!(s.apply(1.0), 1.0);
        assert_eq!(s.apply(0.0), 0.5);
        s.apply(0.0);
        assert_eq!(s.apply(0.0), 0.25);
        // First sample leaves the window
        assert_eq!(s.apply(0.0), 0.0);
    }

    #[test]
    fn test_exponential_blend() {
        let mut s = Smoother::new(Smoothing {
            algorithm: SmoothingAlgorithm::Exponential,
            strength: 0.5,
        });
        // alpha = 1 - 0.5 * 0.9 = 0.55
        assert_eq!(s.apply(1.0), 1.0);
        assert!((s.apply(0.0) - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut s = moving(1.0);
        s.apply(1.0);
        s.reset();
        assert_eq!(s.apply(0.2), 0.2);
    }

    #[test]
    fn test_stabilizer_disabled() {
        let mut st = Stabilizer::default();
        assert_eq!(st.apply(0.4, -0.2, 0.0), (0.4, -0.2));
    }

    #[test]
    fn test_stabilizer_damps_jitter() {
        let mut st = Stabilizer::default();
        st.apply(0.0, 0.0, 0.8);
        let (x, _) = st.apply(1.0, 0.0, 0.8);
        assert!(x > 0.0 && x < 0.5);
    }
}
