//! # Kernel Module
//!
//! Runs the [`InputPoller`] on a tokio interval and connects it to the rest
//! of the application.
//!
//! ## Channels
//!
//! | Direction | Channel | Contents |
//! |-----------|---------|----------|
//! | in | `watch` | active [`Profile`] (swapped whole) |
//! | in | `watch` | latest [`AimTarget`](crate::aim::AimTarget) |
//! | in | `watch` | [`RunState`] control |
//! | out | bounded `mpsc` | one [`EventBatch`] per tick with events |
//! | out | `watch` | latest [`StateSnapshot`] |
//!
//! The polling task never awaits a consumer: batches go out with `try_send`
//! and a full channel drops the batch and counts it.
//!
//! ## Stop and Restart
//!
//! Stopping halts polling at once. Nothing is released and latch state is
//! left as it is. Restarting clears latch state and filter history; outputs
//! still held from before the stop are released by the first tick's diff if
//! the buttons are no longer down.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::aim::{target_channel, TargetHandle, TargetSource};
use crate::config::KernelConfig;
use crate::controller::SampleProvider;
use crate::output::{EmitFailures, EventBatch};
use crate::poller::{InputPoller, SessionContext, StateSnapshot};
use crate::profile::{profile_channel, PollingRate, Profile, ProfileHandle};

/// Requested state of the polling task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped,
    Shutdown,
}

/// Control surface for a running kernel.
#[derive(Debug)]
pub struct KernelHandle {
    control: watch::Sender<RunState>,
    profiles: ProfileHandle,
    targets: TargetHandle,
    snapshots: watch::Receiver<Arc<StateSnapshot>>,
    task: JoinHandle<()>,
}

impl KernelHandle {
    pub fn start(&self) {
        self.set_state(RunState::Running);
    }

    pub fn stop(&self) {
        self.set_state(RunState::Stopped);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.control.borrow() == RunState::Running
    }

    /// Profile writer. Swaps take effect on the next tick.
    #[must_use]
    pub fn profiles(&self) -> &ProfileHandle {
        &self.profiles
    }

    /// Target writer for the host's detector.
    #[must_use]
    pub fn targets(&self) -> &TargetHandle {
        &self.targets
    }

    /// A reader of published snapshots.
    #[must_use]
    pub fn snapshots(&self) -> watch::Receiver<Arc<StateSnapshot>> {
        self.snapshots.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Stops the polling task and waits for it to finish.
    pub async fn shutdown(self) {
        self.set_state(RunState::Shutdown);
        if let Err(e) = self.task.await {
            warn!("Polling task ended abnormally: {}", e);
        }
    }

    fn set_state(&self, state: RunState) {
        self.control.send_if_modified(|current| {
            if *current == state || *current == RunState::Shutdown {
                return false;
            }
            info!("Kernel {:?} -> {:?}", current, state);
            *current = state;
            true
        });
    }
}

/// Spawns the polling task on the current runtime.
///
/// Returns the control handle and the receiving end of the event channel,
/// which is closed when the task ends.
pub fn spawn_kernel<P>(
    provider: P,
    profile: Profile,
    config: &KernelConfig,
    emit_failures: EmitFailures,
) -> (KernelHandle, mpsc::Receiver<EventBatch>)
where
    P: SampleProvider + 'static,
{
    let (profiles, profile_source) = profile_channel(profile);
    let (targets, target_source) = target_channel();
    let ctx = SessionContext::new(profile_source, emit_failures);

    let initial = if config.enabled_at_start {
        RunState::Running
    } else {
        RunState::Stopped
    };
    let (control, control_rx) = watch::channel(initial);
    let (snapshot_tx, snapshots) = watch::channel(Arc::new(StateSnapshot::initial(&ctx)));
    let (events_tx, events_rx) = mpsc::channel(config.event_channel_capacity.max(1));

    let task = tokio::spawn(run(
        provider,
        ctx,
        target_source,
        control_rx,
        events_tx,
        snapshot_tx,
    ));

    let handle = KernelHandle {
        control,
        profiles,
        targets,
        snapshots,
        task,
    };
    (handle, events_rx)
}

fn ticker(rate: PollingRate, start: Instant) -> Interval {
    let mut interval = time::interval_at(start, rate.period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Run of consecutive batches lost to a full event channel.
#[derive(Debug, Default)]
struct Overflow {
    run: u64,
}

impl Overflow {
    /// Counts a dropped batch. True only for the first drop of a run.
    fn dropped(&mut self) -> bool {
        self.run += 1;
        self.run == 1
    }

    /// Ends the current run, returning its length if there was one.
    fn delivered(&mut self) -> Option<u64> {
        (self.run > 0).then(|| std::mem::take(&mut self.run))
    }
}

async fn run<P: SampleProvider>(
    mut provider: P,
    mut ctx: SessionContext,
    targets: TargetSource,
    mut control: watch::Receiver<RunState>,
    events: mpsc::Sender<EventBatch>,
    snapshots: watch::Sender<Arc<StateSnapshot>>,
) {
    let mut poller = InputPoller::new(ctx.profile().polling_rate);
    let mut overflow = Overflow::default();
    let mut resumed = false;

    loop {
        let state = *control.borrow_and_update();
        match state {
            RunState::Shutdown => break,
            RunState::Stopped => {
                if control.changed().await.is_err() {
                    break;
                }
                continue;
            }
            RunState::Running => {}
        }

        if resumed {
            ctx.resume();
        }
        resumed = true;
        poller.reset();

        let mut rate = ctx.profile().polling_rate;
        let mut interval = ticker(rate, Instant::now());
        debug!("Polling at {} Hz", rate.hz());

        loop {
            tokio::select! {
                biased;
                changed = control.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
                at = interval.tick() => {
                    if let Some(report) = poller.poll(&mut ctx, &mut provider, &targets, at.into_std()) {
                        if !report.batch.is_empty() {
                            match events.try_send(report.batch) {
                                Ok(()) => {
                                    if let Some(dropped) = overflow.delivered() {
                                        info!("Event channel drained after dropping {} batches", dropped);
                                    }
                                }
                                Err(e) => {
                                    ctx.telemetry_mut().record_dropped_batch();
                                    if overflow.dropped() {
                                        warn!("Dropping event batches: {}", e);
                                    }
                                }
                            }
                        }
                        snapshots.send_replace(Arc::new(report.snapshot));
                    }

                    let current = ctx.profile().polling_rate;
                    if current != rate {
                        info!("Polling rate {} Hz -> {} Hz", rate.hz(), current.hz());
                        rate = current;
                        interval = ticker(rate, at + rate.period());
                    }
                }
            }
        }
    }
    debug!("Polling task stopped");
}
