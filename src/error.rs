//! Custom error types for profile decoding and sensor communication.
//!
//! `ParseError` covers everything the ICC decoder can report; `SensorError`
//! covers device discovery, the startup query sequence and measurements;
//! `SettingsError` covers the settings file.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for ICC profile decoding.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The profile file could not be read.
    #[error("failed to load profile {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No decoding backend is available for this operation.
    #[error("no support")]
    NoSupport,

    /// The buffer is not a well-formed ICC profile.
    #[error("malformed profile: {message}")]
    Malformed { message: String },
}

impl ParseError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ParseError::Malformed {
            message: message.into(),
        }
    }
}

/// Error type for colorimeter operations.
#[derive(Error, Debug)]
pub enum SensorError {
    /// Sensor not found during enumeration.
    #[error("ColorMunki not found. Check USB connection and permissions.")]
    DeviceNotFound,

    /// The device (or the current dial position) cannot do what was asked.
    #[error("{0}")]
    NoSupport(String),

    /// USB communication error on a specific request.
    #[error("USB error on request {request:#04x}: {message}")]
    Io { request: u8, message: String },

    /// A synchronous request ran past its deadline.
    #[error("Timeout waiting for reply to request {request:#04x}")]
    Timeout { request: u8 },

    /// Invalid or malformed response from device.
    #[error("Invalid response from device: {message}")]
    InvalidResponse { message: String },

    /// Driver used out of sequence or internal bookkeeping failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error type for loading and saving settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not find config directory")]
    NoConfigDir,

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for profile decoding.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for sensor operations.
pub type Result<T> = std::result::Result<T, SensorError>;

/// Result type alias for settings persistence.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
