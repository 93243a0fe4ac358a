use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AutopilotError>;

/// Rejected autopilot or lander configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("could not parse profile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field, reason: reason.into() }
    }
}

#[derive(Debug, Error)]
pub enum AutopilotError {
    #[error("vehicle state field `{field}` is not finite ({value})")]
    NonFiniteState { field: &'static str, value: f64 },

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
