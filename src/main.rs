//! # Pad Bridge
//!
//! Turn a PS5 DualSense controller into keyboard and mouse input.
//!
//! The application reads the controller through evdev, runs every sample
//! through the active profile and hands the resulting key and mouse events to
//! an output task.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first argument, default `config/default.toml`)
//!    - Set up logging to stderr, plus rolling files when configured
//!    - Start the evdev reader, the polling kernel and the output dispatcher
//!    - Start the JSONL telemetry logger when enabled
//!
//! 2. **Running**
//!    - Log a status line every few seconds
//!    - SIGHUP re-reads the configuration and swaps in its profile
//!
//! 3. **Graceful Shutdown** (Ctrl+C)
//!    - Stop the kernel, drain the dispatcher and close the telemetry file
//!
//! # Examples
//!
//! ```bash
//! RUST_LOG=pad_bridge=debug cargo run --release -- config/default.toml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pad_bridge::config::{Config, LoggingConfig};
use pad_bridge::controller::EvdevSource;
use pad_bridge::kernel::{spawn_kernel, KernelHandle};
use pad_bridge::output::{spawn_dispatcher, EmitFailures, TracingSink};
use pad_bridge::profile::ProfileHandle;
use pad_bridge::telemetry::{run_logger, TelemetryLogger};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Seconds between status log lines
const STATUS_INTERVAL_SECS: u64 = 5;

/// Prefix of the rolling diagnostic log files
const LOG_FILE_PREFIX: &str = "pad-bridge.log";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    // Logging depends on the config, so a missing file is reported after init
    let (config, missing) = if config_path.exists() {
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        (config, false)
    } else {
        (Config::default(), true)
    };

    let _log_guard = init_logging(&config.logging);

    info!("Pad Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    if missing {
        warn!("{} not found, using built-in defaults", config_path.display());
    }
    info!(
        "Profile '{}' at {}Hz, {} button mappings",
        config.profile.name,
        config.profile.polling_rate.hz(),
        config.profile.buttons.len()
    );

    let source = EvdevSource::spawn(
        &config.device.device_path,
        Duration::from_millis(config.device.reconnect_interval_ms),
    )?;

    let emit_failures = EmitFailures::default();
    let (kernel, batches) = spawn_kernel(
        source,
        config.profile.clone(),
        &config.kernel,
        emit_failures.clone(),
    );
    let dispatcher = spawn_dispatcher(batches, TracingSink, emit_failures);

    let telemetry = if config.telemetry.enabled {
        let logger = TelemetryLogger::from_config(&config.telemetry)?;
        let period = Duration::from_millis(config.telemetry.log_interval_ms);
        Some(tokio::spawn(run_logger(logger, kernel.snapshots(), period)))
    } else {
        None
    };

    info!("Press Ctrl+C to exit");
    wait_for_shutdown(&config_path, &kernel).await?;

    info!("Shutting down...");
    kernel.shutdown().await;
    dispatcher.await?;
    if let Some(task) = telemetry {
        task.await?;
    }
    info!("Pad Bridge stopped");

    Ok(())
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must outlive every
/// log call.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    guard
}

/// Runs until Ctrl+C, logging status and serving profile reloads.
async fn wait_for_shutdown(config_path: &Path, kernel: &KernelHandle) -> Result<()> {
    #[cfg(unix)]
    let mut hangup = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut status = interval(Duration::from_secs(STATUS_INTERVAL_SECS));
    status.set_missed_tick_behavior(MissedTickBehavior::Skip);
    status.tick().await;

    loop {
        #[cfg(unix)]
        tokio::select! {
            result = &mut ctrl_c => return result.map_err(Into::into),
            _ = hangup.recv() => reload_profile(config_path, kernel.profiles()),
            _ = status.tick() => log_status(kernel),
        }

        #[cfg(not(unix))]
        tokio::select! {
            result = &mut ctrl_c => return result.map_err(Into::into),
            _ = status.tick() => log_status(kernel),
        }
    }
}

/// Swaps in the profile from `config_path`; a bad file leaves the current one.
fn reload_profile(config_path: &Path, profiles: &ProfileHandle) {
    match Config::load(config_path) {
        Ok(config) => {
            info!("Reloaded profile '{}' from {}", config.profile.name, config_path.display());
            profiles.replace(config.profile);
        }
        Err(e) => warn!("Ignoring reload of {}: {}", config_path.display(), e),
    }
}

fn log_status(kernel: &KernelHandle) {
    let snapshot = kernel.snapshot();
    info!(
        "Tick {} | {} at {}Hz | connected: {} | presses: {} | emit failures: {} | dropped batches: {}",
        snapshot.tick,
        snapshot.profile,
        snapshot.polling_rate_hz,
        snapshot.connected,
        snapshot.telemetry.heatmap.total(),
        snapshot.telemetry.emit_failures,
        snapshot.telemetry.dropped_batches
    );
}
