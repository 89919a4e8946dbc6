//! Baseline manifest template
//!
//! The built-in template is the unconfigured skeleton every release starts
//! from. A project may point at its own template file instead.

use crate::error::{ManifestError, Result};
use crate::model::ManifestDescriptor;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Baseline descriptor shipped with the binary
pub const BUILTIN_TEMPLATE: &str = r#"version: "3.8"
services:
  service:
    image: registry/app
    ports:
      - "80:80"
    environment:
      - "RUST_LOG=info"
    networks:
      - webnet
    volumes:
      - "data:/var/lib/app"
    deploy:
      replicas: 2
      resources:
        limits:
          cpus: "0.5"
          memory: 512M
        reservations:
          cpus: "0.25"
          memory: 128M
      update_config:
        parallelism: 1
        delay: 10s
      restart_policy:
        condition: on-failure
        delay: 5s
        max_attempts: 3
networks:
  webnet:
    driver: overlay
volumes:
  data:
    driver: local
"#;

/// Where a template comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    #[default]
    Builtin,
    File(PathBuf),
}

impl TemplateSource {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Builtin, Self::File)
    }
}

/// Template text, not yet decoded
#[derive(Debug, Clone)]
pub struct Template {
    path: Option<PathBuf>,
    text: Cow<'static, str>,
}

impl Template {
    pub fn builtin() -> Self {
        Self {
            path: None,
            text: Cow::Borrowed(BUILTIN_TEMPLATE),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            path: None,
            text: Cow::Owned(text.into()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loaded template");
        Ok(Self {
            path: Some(path.to_path_buf()),
            text: Cow::Owned(text),
        })
    }

    pub fn load(source: &TemplateSource) -> Result<Self> {
        match source {
            TemplateSource::Builtin => Ok(Self::builtin()),
            TemplateSource::File(path) => Self::from_file(path),
        }
    }

    /// File the template was read from, `None` for in-memory text.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn decode(&self) -> Result<ManifestDescriptor> {
        ManifestDescriptor::from_yaml(&self.text)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::builtin()
    }
}
