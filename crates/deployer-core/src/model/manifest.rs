//! Manifest root and its YAML codec

use super::network::NetworkSpec;
use super::service::ServiceSpec;
use super::volume::VolumeSpec;
use crate::error::{ManifestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Network every service joins when it names none.
pub const DEFAULT_NETWORK: &str = "default";

/// Root of a compose-style deployment descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDescriptor {
    /// Compose file format version, e.g. `"3.8"`
    pub version: String,
    pub services: BTreeMap<String, ServiceSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, NetworkSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, VolumeSpec>,
}

impl ManifestDescriptor {
    /// Decode and validate manifest text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(text)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Encode as YAML. Output is stable for equal descriptors.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks that go beyond the shape serde already enforces.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(ManifestError::Format(
                "version must not be empty".to_string(),
            ));
        }

        for (name, service) in &self.services {
            service.validate(name)?;

            if let Some(network) = service
                .networks
                .iter()
                .find(|n| n.as_str() != DEFAULT_NETWORK && !self.networks.contains_key(*n))
            {
                return Err(ManifestError::Format(format!(
                    "services.{name} joins undeclared network '{network}'"
                )));
            }
        }

        Ok(())
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl FromStr for ManifestDescriptor {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_yaml(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RestartCondition;

    const SAMPLE: &str = r#"
version: "3.8"
services:
  web:
    image: nginx:1.25
    ports:
      - "8080:80"
    environment:
      - "MODE=prod"
    networks:
      - front
    deploy:
      replicas: 3
      restart_policy:
        condition: on-failure
        max_attempts: 5
  worker:
    image: registry.local:5000/worker
networks:
  front:
    driver: overlay
volumes:
  cache: {}
"#;

    #[test]
    fn test_decode_all_fields() {
        let manifest = ManifestDescriptor::from_yaml(SAMPLE).unwrap();

        assert_eq!(manifest.version, "3.8");
        assert_eq!(
            manifest.service_names().collect::<Vec<_>>(),
            vec!["web", "worker"]
        );

        let web = &manifest.services["web"];
        assert_eq!(web.image, "nginx:1.25");
        assert_eq!(web.ports, vec!["8080:80"]);
        assert_eq!(web.environment, vec!["MODE=prod"]);
        assert_eq!(web.networks, vec!["front"]);
        assert_eq!(web.deploy.replicas, 3);

        let restart = web.deploy.restart_policy.as_ref().unwrap();
        assert_eq!(restart.condition, RestartCondition::OnFailure);
        assert_eq!(restart.max_attempts, Some(5));
        assert!(restart.delay.is_none());

        // deploy omitted entirely falls back to defaults
        assert_eq!(manifest.services["worker"].deploy.replicas, 1);

        assert_eq!(manifest.networks["front"].driver.as_deref(), Some("overlay"));
        assert!(manifest.volumes["cache"].driver.is_none());
    }

    #[test]
    fn test_encode_decode_is_equivalent() {
        let manifest = ManifestDescriptor::from_yaml(SAMPLE).unwrap();
        let encoded = manifest.to_yaml().unwrap();
        let decoded = ManifestDescriptor::from_yaml(&encoded).unwrap();

        assert_eq!(decoded, manifest);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let manifest = ManifestDescriptor::from_yaml(SAMPLE).unwrap();
        assert_eq!(manifest.to_yaml().unwrap(), manifest.clone().to_yaml().unwrap());
    }

    #[test]
    fn test_malformed_text() {
        let result = ManifestDescriptor::from_yaml("services: [unclosed");
        assert!(matches!(result, Err(ManifestError::Format(_))));
    }

    #[test]
    fn test_mapping_where_list_expected() {
        let text = r#"
version: "3.8"
services:
  web:
    image: nginx
    ports:
      http: 80
"#;
        let result = ManifestDescriptor::from_yaml(text);
        assert!(matches!(result, Err(ManifestError::Format(_))));
    }

    #[test]
    fn test_missing_services() {
        let result = ManifestDescriptor::from_yaml("version: \"3.8\"\n");
        assert!(matches!(result, Err(ManifestError::Format(_))));
    }

    #[test]
    fn test_unknown_restart_condition() {
        let text = r#"
version: "3.8"
services:
  web:
    image: nginx
    deploy:
      restart_policy:
        condition: sometimes
"#;
        assert!(ManifestDescriptor::from_yaml(text).is_err());
    }

    #[test]
    fn test_undeclared_network() {
        let text = r#"
version: "3.8"
services:
  web:
    image: nginx
    networks:
      - default
      - missing
"#;
        let err = ManifestDescriptor::from_yaml(text).unwrap_err();
        assert!(err.to_string().contains("'missing'"));
    }

    #[test]
    fn test_from_str() {
        let manifest: ManifestDescriptor = SAMPLE.parse().unwrap();
        assert_eq!(manifest.services.len(), 2);
    }
}
