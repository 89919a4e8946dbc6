//! Manifest model
//!
//! Typed view of a compose-style deployment descriptor. Every map is a
//! `BTreeMap`, so encoding the same descriptor always yields the same text.

mod deploy;
mod manifest;
mod network;
mod service;
mod volume;

// Re-exports
pub use deploy::*;
pub use manifest::*;
pub use network::*;
pub use service::*;
pub use volume::*;
