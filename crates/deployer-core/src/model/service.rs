//! Service definitions

use super::deploy::DeploySpec;
use crate::error::{ManifestError, Result};
use crate::image::ImageRef;
use serde::{Deserialize, Serialize};

/// One deployable unit of a manifest
///
/// ```yaml
/// service:
///   image: registry/app
///   ports:
///     - "80:80"
///   environment:
///     - "RUST_LOG=info"
///   networks:
///     - webnet
///   volumes:
///     - "data:/var/lib/app"
///   deploy:
///     replicas: 2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// `repository[:tag]`
    pub image: String,
    /// `"host:container"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// `"KEY=VALUE"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub deploy: DeploySpec,
}

impl ServiceSpec {
    /// Parsed view of [`ServiceSpec::image`]
    pub fn image_ref(&self) -> ImageRef {
        ImageRef::parse(&self.image)
    }

    /// Replace the image tag, dropping any pinned digest.
    pub fn retag(&mut self, tag: &str) {
        self.image = self.image_ref().with_tag(tag).to_string();
    }

    pub(crate) fn validate(&self, name: &str) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(ManifestError::Format(format!(
                "services.{name}.image must not be empty"
            )));
        }
        if let Some(entry) = self.environment.iter().find(|e| !e.contains('=')) {
            return Err(ManifestError::Format(format!(
                "services.{name}.environment entry '{entry}' is not KEY=VALUE"
            )));
        }
        self.deploy.validate(name)
    }
}
