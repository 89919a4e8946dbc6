//! Release orchestration for deployer
//!
//! Turns a project name and version into a compose manifest, writes it and
//! hands it to the orchestrator's apply command.
//!
//! # Example
//!
//! ```ignore
//! use deployer::{ReleaseRequest, Releaser};
//! use deployer_config::DeployerConfig;
//! use deployer_runner::ProcessRunner;
//!
//! let releaser = Releaser::new(ProcessRunner::new(), DeployerConfig::default());
//! let report = releaser.run(&ReleaseRequest::new("orders", "2.1.0", false)).await;
//! assert!(report.is_success());
//! ```

pub mod error;
pub mod release;
pub mod request;

pub use error::{ReleaseError, Result};
pub use release::{AppliedRelease, ReleaseOutcome, ReleaseReport, ReleaseState, Releaser};
pub use request::{ReleaseIntent, ReleaseRequest};
