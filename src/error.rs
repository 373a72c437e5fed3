//! # Error Types
//!
//! Custom error types for Pad Bridge using `thiserror`.
//!
//! Only setup paths (config loading, device discovery, file logging) return
//! these errors. The polling loop handles its failures locally and reports
//! them through telemetry instead.

use thiserror::Error;

/// Main error type for Pad Bridge
#[derive(Debug, Error)]
pub enum PadBridgeError {
    /// TOML parsing errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration parsed but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Controller device errors
    #[error("Controller error: {0}")]
    Device(String),

    /// No supported controller could be found
    #[error("No supported controller found")]
    DeviceNotFound,

    /// An output sink rejected an event
    #[error("Emit error: {0}")]
    Emit(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Pad Bridge
pub type Result<T> = std::result::Result<T, PadBridgeError>;
