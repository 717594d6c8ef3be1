//! Error types for shakerctl

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Telemetry file not found: {0}")]
    TelemetryNotFound(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Refusing to overwrite existing file: {0}")]
    AlreadyExists(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::TelemetryNotFound(_) => 2,
            CliError::ConfigNotFound(_) => 3,
            CliError::InvalidConfiguration(_) => 4,
            CliError::AlreadyExists(_) => 5,
            CliError::JsonError(_) => 1,
        }
    }
}

impl From<openracing_shaker::ConfigError> for CliError {
    fn from(err: openracing_shaker::ConfigError) -> Self {
        CliError::InvalidConfiguration(err.to_string())
    }
}

/// Exit code for any error bubbling out of a command.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(cli) = error.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    if error
        .downcast_ref::<openracing_shaker::ConfigError>()
        .is_some()
    {
        return 4;
    }
    1
}
