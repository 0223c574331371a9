use std::path::PathBuf;

use thiserror::Error;
use tokengraph_core::{CoreError, HttpError, SchedulerError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("http client setup failed: {0}")]
    Http(#[from] HttpError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("failed to load env file '{}': {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Core(error) => match error {
                CoreError::Validation(_) | CoreError::NotFound { .. } => 2,
                CoreError::DataSource(_) | CoreError::NumericDegenerate { .. } => 3,
                CoreError::Serialization(_) => 4,
                CoreError::Io(_) => 10,
            },
            Self::Http(_) => 3,
            Self::Scheduler(_) => 5,
            Self::EnvFile { .. } => 2,
            Self::Logging(_) => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
