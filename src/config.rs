//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section is optional; a missing section takes its defaults. The
//! `[profile]` section holds the startup [`Profile`].
//!
//! ```toml
//! [device]
//! device_path = "/dev/input/event5"
//!
//! [kernel]
//! event_channel_capacity = 256
//!
//! [telemetry]
//! log_dir = "./logs"
//!
//! [profile]
//! name = "Shooter"
//! polling_rate_hz = 500
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PadBridgeError, Result};
use crate::profile::Profile;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub kernel: KernelConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub profile: Profile,
}

/// Controller device configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// Empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Polling loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct KernelConfig {
    /// Batches buffered between the polling loop and the output dispatcher
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    #[serde(default = "default_enabled_at_start")]
    pub enabled_at_start: bool,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Diagnostic log configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Write daily rolling log files here in addition to stderr
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            enabled_at_start: default_enabled_at_start(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_event_channel_capacity() -> usize { 256 }
fn default_enabled_at_start() -> bool { true }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 100 }
fn default_log_format() -> String { "jsonl".to_string() }

fn invalid(message: impl Into<String>) -> PadBridgeError {
    PadBridgeError::InvalidConfig(message.into())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails (including duplicate button mappings and
    ///   unsupported polling rates)
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pad_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Per-axis and per-button problems are not checked here. They fall back
    /// to identity shaping or passthrough when the profile is applied.
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.device.reconnect_interval_ms == 0 || self.device.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.kernel.event_channel_capacity == 0 {
            return Err(invalid("event_channel_capacity must be greater than 0"));
        }

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        if matches!(self.logging.log_dir.as_deref(), Some("")) {
            return Err(invalid("logging log_dir cannot be empty"));
        }

        // Validate profile-wide settings
        if self.profile.name.trim().is_empty() {
            return Err(invalid("profile name cannot be empty"));
        }

        self.profile.aim_assist.validate().map_err(invalid)?;

        let speed = self.profile.mouse.speed_px_per_sec;
        if !speed.is_finite() || speed < 0.0 {
            return Err(invalid("speed_px_per_sec must be a non-negative number"));
        }

        Ok(())
    }
}
