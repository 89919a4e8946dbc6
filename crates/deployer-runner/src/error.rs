//! Command runner error types

use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    /// The program could not be started at all.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and did not succeed. `output` holds whatever it printed.
    #[error("`{command}` failed ({reason})")]
    Exit {
        command: String,
        reason: ExitReason,
        output: String,
    },

    #[error("lost track of `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// Captured output, when the process got far enough to produce any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Exit { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn command(&self) -> &str {
        match self {
            Self::Launch { command, .. } | Self::Exit { command, .. } | Self::Wait { command, .. } => {
                command
            }
        }
    }
}

/// Why a process that did start is considered failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    Code(i32),
    /// Terminated by a signal, no exit code
    Signal,
    TimedOut(Duration),
    Cancelled,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signal => f.write_str("terminated by signal"),
            Self::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs_f32()),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
