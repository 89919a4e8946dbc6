//! Release request

use crate::error::{ReleaseError, Result};
use std::fmt;

/// What a release is for. Both run the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseIntent {
    Deploy,
    /// Redeploy `version` as the state to restore
    Rollback,
}

impl ReleaseIntent {
    pub fn from_rollback_flag(rollback: bool) -> Self {
        if rollback { Self::Rollback } else { Self::Deploy }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Rollback => "rollback",
        }
    }
}

impl fmt::Display for ReleaseIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One invocation's input. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    project: String,
    version: String,
    intent: ReleaseIntent,
}

impl ReleaseRequest {
    pub fn new(project: impl Into<String>, version: impl Into<String>, rollback: bool) -> Self {
        Self {
            project: project.into(),
            version: version.into(),
            intent: ReleaseIntent::from_rollback_flag(rollback),
        }
    }

    /// From optional CLI values; a missing value becomes an empty one and
    /// fails validation.
    pub fn from_args(project: Option<String>, version: Option<String>, rollback: bool) -> Self {
        Self::new(
            project.unwrap_or_default(),
            version.unwrap_or_default(),
            rollback,
        )
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn intent(&self) -> ReleaseIntent {
        self.intent
    }

    /// Project and version both end up in names (services, image tags, the
    /// manifest file), so they are restricted to `[A-Za-z0-9_.-]`.
    pub fn validate(&self) -> Result<()> {
        check_identifier("project", &self.project)?;
        check_identifier("version", &self.version)
    }
}

fn check_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReleaseError::Validation(format!("{field} is required")));
    }
    if value.starts_with(['.', '-']) {
        return Err(ReleaseError::Validation(format!(
            "{field} '{value}' must not start with '.' or '-'"
        )));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ReleaseError::Validation(format!(
            "{field} '{value}' contains invalid character {c:?}"
        )));
    }
    Ok(())
}
