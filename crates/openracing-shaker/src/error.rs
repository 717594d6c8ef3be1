//! Error types for the shaker core.
//!
//! None of these are fatal to the control loop. Configuration errors reject
//! an update and leave the previous snapshot active, generator errors drop a
//! single signal for one tick, and telemetry errors hold the last output.

use thiserror::Error;

use crate::generators::SignalKind;

/// Configuration validation and parsing failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Value outside its allowed range.
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// Divisor or factor that must be a positive finite number.
    #[error("{field} must be finite and greater than zero, got {value}")]
    NotPositive {
        /// Field name
        field: &'static str,
        /// The invalid value
        value: String,
    },

    /// Named parameter update for a key that does not exist.
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    /// Named parameter update whose value does not parse.
    #[error("Invalid value '{value}' for parameter '{name}'")]
    InvalidValue {
        /// Parameter name
        name: String,
        /// Raw value as received
        value: String,
    },

    /// YAML or JSON document could not be decoded.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn out_of_range(
        field: &'static str,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub(crate) fn not_positive(field: &'static str, value: impl ToString) -> Self {
        ConfigError::NotPositive {
            field,
            value: value.to_string(),
        }
    }
}

/// Per-tick generator failures. The controller skips the signal.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeneratorError {
    /// RPM divisor is zero, negative or not finite.
    #[error("RPM divisor must be finite and > 0, got {0}")]
    InvalidDivisor(f32),

    /// The input aggregate or transfer factor produced a non-finite frequency.
    #[error("{0} generator produced a non-finite frequency")]
    NonFinite(SignalKind),
}

/// Telemetry acquisition failures reported by a [`crate::TelemetrySource`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// A sample field holds NaN or infinity.
    #[error("Telemetry field '{0}' is not finite")]
    NonFinite(&'static str),

    /// The upstream decoder rejected a packet.
    #[error("Failed to decode telemetry: {0}")]
    Decode(String),

    /// The source has no more samples to give.
    #[error("Telemetry source disconnected")]
    Disconnected,
}

/// Umbrella error for fallible operations outside the tick path.
#[derive(Error, Debug)]
pub enum ShakerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Telemetry errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for shaker operations.
pub type ShakerResult<T> = Result<T, ShakerError>;
