//! # Pad Bridge Library
//!
//! Turn a PS5 DualSense controller into keyboard and mouse input.
//!
//! Every tick the [`poller::InputPoller`] samples the controller, shapes the
//! sticks, blends in aim assist, resolves latch modes and diffs the result
//! against the outputs already held, producing one [`output::EventBatch`].
//! The [`kernel`] drives the poller from a tokio interval and hands batches
//! to an output task.

pub mod aim;
pub mod config;
pub mod controller;
pub mod error;
pub mod kernel;
pub mod latch;
pub mod output;
pub mod poller;
pub mod profile;
pub mod shaping;
pub mod telemetry;
