use deployer_core::ManifestError;
use deployer_runner::RunnerError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Missing or unusable input; nothing was attempted.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] RunnerError),
}

impl ReleaseError {
    /// Output of the external command, if it ran.
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Self::Process(err) => err.output(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReleaseError>;
