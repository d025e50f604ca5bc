use thiserror::Error;
use twstock_core::{AcquireError, CacheError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("command error: {0}")]
    Command(String),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Acquire(AcquireError::Validation(_)) => 2,
            Self::Acquire(AcquireError::FetchTransport { .. }) => 3,
            Self::Acquire(AcquireError::NoDataInRange { .. }) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Cache(_) | Self::Acquire(AcquireError::Cache(_)) => 6,
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
