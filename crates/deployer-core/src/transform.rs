//! Per-project manifest rewrites
//!
//! Two rewrites run as one all-or-nothing pass:
//! 1. every service `S` is renamed to `<project>-S`
//! 2. every image tag is replaced by the release version
//!
//! Renames are checked for collisions before any service is retagged; a
//! failed transform returns an error and no descriptor.

use crate::error::{ManifestError, Result};
use crate::model::{ManifestDescriptor, ServiceSpec};
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a release version turns into an image tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagPolicy {
    /// `2.1.0` → `:2.1.0`
    #[default]
    Plain,
    /// `2.1.0` → `:v2.1.0`
    VPrefixed,
}

impl TagPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain" => Some(Self::Plain),
            "v-prefixed" | "v_prefixed" | "v" => Some(Self::VPrefixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::VPrefixed => "v-prefixed",
        }
    }

    pub fn tag_for(&self, version: &str) -> String {
        match self {
            Self::Plain => version.to_string(),
            Self::VPrefixed => format!("v{version}"),
        }
    }
}

impl FromStr for TagPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown tag policy '{s}' (expected plain or v-prefixed)"))
    }
}

impl fmt::Display for TagPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rewrites a manifest for one project and release version
#[derive(Debug, Clone)]
pub struct Transformer {
    project: String,
    version: String,
    policy: TagPolicy,
}

impl Transformer {
    pub fn new(project: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            version: version.into(),
            policy: TagPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TagPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Name a service `S` gets in the rewritten manifest
    pub fn service_name(&self, service: &str) -> String {
        format!("{}-{}", self.project, service)
    }

    /// Tag every image receives
    pub fn tag(&self) -> String {
        self.policy.tag_for(&self.version)
    }

    pub fn transform(&self, mut manifest: ManifestDescriptor) -> Result<ManifestDescriptor> {
        let renamed = self.rename_services(std::mem::take(&mut manifest.services))?;

        let tag = self.tag();
        manifest.services = renamed
            .into_iter()
            .map(|(name, mut service)| {
                service.retag(&tag);
                (name, service)
            })
            .collect();

        tracing::debug!(
            project = %self.project,
            tag = %tag,
            services = manifest.services.len(),
            "Rewrote manifest"
        );
        Ok(manifest)
    }

    /// Decode the template, rewrite it, encode the result.
    pub fn render(&self, template: &Template) -> Result<String> {
        let manifest = template.decode()?;
        self.transform(manifest)?.to_yaml()
    }

    /// Builds a fresh map; the source map is only read. The prefix is the
    /// same for every key, so distinct names stay distinct and the only
    /// possible collision is with an existing key.
    fn rename_services(
        &self,
        services: BTreeMap<String, ServiceSpec>,
    ) -> Result<BTreeMap<String, ServiceSpec>> {
        for name in services.keys() {
            let renamed = self.service_name(name);
            if services.contains_key(&renamed) {
                return Err(ManifestError::Conflict {
                    service: name.clone(),
                    renamed,
                });
            }
        }

        Ok(services
            .into_iter()
            .map(|(name, service)| (self.service_name(&name), service))
            .collect())
    }
}
