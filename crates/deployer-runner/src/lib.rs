//! External command execution for deployer
//!
//! Runs one program with an explicit argument list (never through a shell),
//! captures stdout and stderr, and reports launch failures separately from
//! programs that ran and failed.
//!
//! # Example
//!
//! ```ignore
//! use deployer_runner::{CommandRunner, CommandSpec, ProcessRunner};
//! use std::time::Duration;
//!
//! let runner = ProcessRunner::new();
//! let spec = CommandSpec::new("docker")
//!     .args(["stack", "deploy", "--compose-file", "docker-compose.yml", "orders"])
//!     .timeout(Duration::from_secs(300));
//!
//! let output = runner.run(&spec).await?;
//! println!("{}", output.output);
//! ```

pub mod error;
pub mod runner;

pub use error::{ExitReason, Result, RunnerError};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
