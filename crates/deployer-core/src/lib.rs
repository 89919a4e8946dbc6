//! Manifest engine for deployer
//!
//! Decodes a compose-style deployment descriptor, rewrites it for a single
//! project and release version, and encodes it back to YAML.
//!
//! # Example
//!
//! ```
//! use deployer_core::{TagPolicy, Template, Transformer};
//!
//! let manifest = Transformer::new("orders", "2.1.0")
//!     .with_policy(TagPolicy::VPrefixed)
//!     .render(&Template::builtin())
//!     .unwrap();
//!
//! assert!(manifest.contains("orders-service"));
//! assert!(manifest.contains("registry/app:v2.1.0"));
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod template;
pub mod transform;

pub use error::{ManifestError, Result};
pub use image::ImageRef;
pub use model::*;
pub use template::{BUILTIN_TEMPLATE, Template, TemplateSource};
pub use transform::{TagPolicy, Transformer};
