//! Deploy policy definitions
//!
//! ```yaml
//! deploy:
//!   replicas: 2
//!   resources:
//!     limits:
//!       cpus: "0.5"
//!       memory: 512M
//!   update_config:
//!     parallelism: 1
//!     delay: 10s
//!   restart_policy:
//!     condition: on-failure
//!     delay: 5s
//!     max_attempts: 3
//! ```

use crate::error::{ManifestError, Result};
use serde::{Deserialize, Serialize};

/// Per-service deploy policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploySpec {
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default, skip_serializing_if = "ResourceSpec::is_empty")]
    pub resources: ResourceSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_config: Option<UpdateConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
}

fn default_replicas() -> u32 {
    1
}

impl Default for DeploySpec {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            resources: ResourceSpec::default(),
            update_config: None,
            restart_policy: None,
        }
    }
}

impl DeploySpec {
    pub(crate) fn validate(&self, service: &str) -> Result<()> {
        for (kind, limits) in [
            ("limits", &self.resources.limits),
            ("reservations", &self.resources.reservations),
        ] {
            if let Some(limits) = limits {
                require_token(service, kind, "cpus", limits.cpus.as_deref())?;
                require_token(service, kind, "memory", limits.memory.as_deref())?;
            }
        }

        if let Some(update) = &self.update_config {
            require_token(service, "update_config", "delay", update.delay.as_deref())?;
        }
        if let Some(restart) = &self.restart_policy {
            require_token(service, "restart_policy", "delay", restart.delay.as_deref())?;
        }
        Ok(())
    }
}

/// Opaque tokens are only checked for being present-but-blank.
fn require_token(service: &str, section: &str, field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(token) if token.trim().is_empty() => Err(ManifestError::Format(format!(
            "services.{service}.deploy.{section}.{field} must not be empty"
        ))),
        _ => Ok(()),
    }
}

/// CPU / memory limits and reservations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservations: Option<ResourceLimits>,
}

impl ResourceSpec {
    pub fn is_empty(&self) -> bool {
        self.limits.is_none() && self.reservations.is_none()
    }
}

/// Tokens such as `"0.5"` or `"1G"`, passed through untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Rolling update behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
    /// Duration string, e.g. `10s`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
}

fn default_parallelism() -> u32 {
    1
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            delay: None,
        }
    }
}

/// Restart policy of the service's tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    #[serde(default)]
    pub condition: RestartCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

/// When a task gets restarted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartCondition {
    /// Never restart
    None,
    /// Restart on non-zero exit only
    OnFailure,
    /// Always restart (orchestrator default)
    #[default]
    Any,
}
