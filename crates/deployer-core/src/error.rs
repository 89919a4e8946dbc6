use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    /// Malformed manifest text, or a field with the wrong shape.
    #[error("manifest format error: {0}")]
    Format(String),

    /// Renaming a service would land on a key that already exists.
    #[error("service '{service}' cannot be renamed to '{renamed}': the name is already taken")]
    Conflict { service: String, renamed: String },

    #[error("failed to read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_yaml::Error> for ManifestError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Format(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ManifestError>;
