//! Trait abstraction for output delivery to enable testing

use async_trait::async_trait;
use tracing::info;

use super::OutputEvent;
use crate::error::Result;

/// Destination for synthesized keyboard/mouse events.
///
/// OS-level injection lives behind this trait in the host application.
#[async_trait]
pub trait OutputSink: Send {
    /// Deliver one event
    async fn emit(&mut self, event: &OutputEvent) -> Result<()>;
}

/// Sink that logs every event instead of injecting it.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl OutputSink for TracingSink {
    async fn emit(&mut self, event: &OutputEvent) -> Result<()> {
        info!(target: "pad_bridge::output", "{}", event);
        Ok(())
    }
}
