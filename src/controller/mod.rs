//! # Controller Module
//!
//! Hardware-facing side of the pipeline.
//!
//! This module handles:
//! - The [`RawSample`] type and the [`SampleProvider`] pull interface
//! - PS5 DualSense detection and connection via evdev
//! - Folding evdev events into normalized samples
//! - Reconnecting after the controller goes away

pub mod device;
pub mod mapper;
pub mod sample;

pub use device::EvdevSource;
pub use sample::{Axis, Button, ButtonSet, RawSample, SampleProvider, BUTTON_COUNT};
