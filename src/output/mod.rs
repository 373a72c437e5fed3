//! # Output Module
//!
//! Output events, per-tick batches and their delivery.
//!
//! This module handles:
//! - The [`OutputEvent`] vocabulary handed to the host's injection layer
//! - Resolving a profile's [`ButtonOutput`] into an [`OutputTarget`]
//! - Draining [`EventBatch`]es from the polling loop into an [`OutputSink`]
//!
//! The polling loop never awaits a sink. It hands batches to a bounded
//! channel and a dispatcher task delivers them. A failed delivery is logged
//! and counted, never retried.

mod sink;

pub use sink::{OutputSink, TracingSink};

#[cfg(test)]
pub use sink::mocks;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::profile::{ButtonOutput, MouseButton};

/// One synthesized input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Key { code: Arc<str>, down: bool },
    MouseMove { dx: i32, dy: i32 },
    MouseButton { button: MouseButton, down: bool },
    /// Radial menu and system actions, handled by the host.
    Action { name: Arc<str>, down: bool },
}

impl fmt::Display for OutputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edge = |down: bool| if down { "down" } else { "up" };
        match self {
            OutputEvent::Key { code, down } => write!(f, "key {} {}", code, edge(*down)),
            OutputEvent::MouseMove { dx, dy } => write!(f, "mouse move {:+} {:+}", dx, dy),
            OutputEvent::MouseButton { button, down } => {
                write!(f, "mouse {:?} {}", button, edge(*down))
            }
            OutputEvent::Action { name, down } => write!(f, "action {} {}", name, edge(*down)),
        }
    }
}

/// Everything one tick produced, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventBatch {
    pub tick: u64,
    pub events: Vec<OutputEvent>,
}

impl EventBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A button's output with identifiers shared, ready for per-tick diffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Key(Arc<str>),
    /// Chord pressed in order and released in reverse.
    Chord(Arc<[Arc<str>]>),
    Mouse(MouseButton),
    Action(Arc<str>),
}

impl From<&ButtonOutput> for OutputTarget {
    fn from(output: &ButtonOutput) -> Self {
        match output {
            ButtonOutput::Key { code } => OutputTarget::Key(Arc::from(code.as_str())),
            ButtonOutput::MouseButton { button } => OutputTarget::Mouse(*button),
            ButtonOutput::Macro { keys } => {
                OutputTarget::Chord(keys.iter().map(|k| Arc::from(k.as_str())).collect())
            }
            ButtonOutput::RadialMenu { menu } => {
                OutputTarget::Action(Arc::from(format!("radial_menu:{}", menu)))
            }
            ButtonOutput::SystemAction { action } => {
                OutputTarget::Action(Arc::from(format!("system:{}", action)))
            }
        }
    }
}

impl OutputTarget {
    /// The individual outputs this target holds down, in press order.
    ///
    /// Releases run the same list in reverse.
    #[must_use]
    pub fn parts(&self) -> Vec<HeldOutput> {
        match self {
            OutputTarget::Key(code) => vec![HeldOutput::Key(code.clone())],
            OutputTarget::Chord(keys) => keys.iter().cloned().map(HeldOutput::Key).collect(),
            OutputTarget::Mouse(button) => vec![HeldOutput::Mouse(*button)],
            OutputTarget::Action(name) => vec![HeldOutput::Action(name.clone())],
        }
    }
}

/// One thing the host sees as held: a key, a mouse button or an action.
///
/// Several mapped buttons may resolve to the same part; the host still sees
/// a single press and a single release.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeldOutput {
    Key(Arc<str>),
    Mouse(MouseButton),
    Action(Arc<str>),
}

impl HeldOutput {
    #[must_use]
    pub fn event(&self, down: bool) -> OutputEvent {
        match self {
            HeldOutput::Key(code) => OutputEvent::Key {
                code: code.clone(),
                down,
            },
            HeldOutput::Mouse(button) => OutputEvent::MouseButton {
                button: *button,
                down,
            },
            HeldOutput::Action(name) => OutputEvent::Action {
                name: name.clone(),
                down,
            },
        }
    }
}

/// Shared count of events a sink rejected.
#[derive(Debug, Clone, Default)]
pub struct EmitFailures(Arc<AtomicU64>);

impl EmitFailures {
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Delivers batches to `sink` until every sender is dropped.
pub async fn dispatch<S: OutputSink>(
    mut batches: mpsc::Receiver<EventBatch>,
    mut sink: S,
    failures: EmitFailures,
) {
    while let Some(batch) = batches.recv().await {
        for event in &batch.events {
            if let Err(e) = sink.emit(event).await {
                warn!("Tick {}: failed to emit {}: {}", batch.tick, event, e);
                failures.record();
            }
        }
    }
    debug!("Event channel closed, dispatcher stopping");
}

/// Spawns [`dispatch`] on the current runtime.
pub fn spawn_dispatcher<S: OutputSink + 'static>(
    batches: mpsc::Receiver<EventBatch>,
    sink: S,
    failures: EmitFailures,
) -> JoinHandle<()> {
    tokio::spawn(dispatch(batches, sink, failures))
}
