//! Process runner
//!
//! [`ProcessRunner`] is the production [`CommandRunner`]. stdout and stderr
//! are read concurrently and joined (stdout first) into a single output
//! text, which is returned on success and on failure alike.

use crate::error::{ExitReason, Result, RunnerError};
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// A fully composed command: program plus literal arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

/// Human-readable command line, for logs and error messages only.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    /// stdout followed by stderr
    pub output: String,
    pub duration: Duration,
}

/// Executes a [`CommandSpec`]
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        (**self).run(spec).await
    }
}

/// Runs commands as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    cancel: CancellationToken,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancelling `token` kills whatever child is running at the time.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self { cancel: token }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// How long output is still read after the child has exited
const OUTPUT_GRACE: Duration = Duration::from_millis(200);

enum Waited {
    Finished(std::io::Result<ExitStatus>),
    Interrupted(ExitReason),
}

impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let command = spec.to_string();
        tracing::debug!("Running: {}", command);

        let mut child = spec
            .to_command()
            .spawn()
            .map_err(|source| RunnerError::Launch {
                command: command.clone(),
                source,
            })?;

        let started = Instant::now();
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let waited = {
            let pipes = async {
                tokio::join!(
                    drain(stdout.as_mut(), &mut stdout_buf),
                    drain(stderr.as_mut(), &mut stderr_buf),
                )
            };
            tokio::pin!(pipes);
            let deadline = async {
                match spec.timeout {
                    Some(limit) => {
                        tokio::time::sleep(limit).await;
                        limit
                    }
                    None => std::future::pending().await,
                }
            };
            tokio::pin!(deadline);

            // The exit status decides the outcome; pipes are only read
            // alongside it.
            let mut pipes_closed = false;
            let waited = loop {
                tokio::select! {
                    status = child.wait() => break Waited::Finished(status),
                    _ = &mut pipes, if !pipes_closed => pipes_closed = true,
                    limit = &mut deadline => break Waited::Interrupted(ExitReason::TimedOut(limit)),
                    () = self.cancel.cancelled() => break Waited::Interrupted(ExitReason::Cancelled),
                }
            };

            if let Waited::Interrupted(reason) = &waited {
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill `{}`: {}", command, e);
                }
                tracing::warn!(%reason, "Stopped `{}`", command);
            }

            // A background process may still hold the pipes open
            if !pipes_closed && tokio::time::timeout(OUTPUT_GRACE, &mut pipes).await.is_err() {
                tracing::debug!("Output of `{}` still open after exit, keeping what was read", command);
            }
            waited
        };

        let output = combine(&stdout_buf, &stderr_buf);
        let duration = started.elapsed();

        let status = match waited {
            Waited::Finished(Ok(status)) => status,
            Waited::Finished(Err(source)) => return Err(RunnerError::Wait { command, source }),
            Waited::Interrupted(reason) => {
                return Err(RunnerError::Exit {
                    command,
                    reason,
                    output,
                });
            }
        };

        if !status.success() {
            let reason = status.code().map_or(ExitReason::Signal, ExitReason::Code);
            tracing::debug!(%reason, duration_ms = duration.as_millis() as u64, "Command failed");
            return Err(RunnerError::Exit {
                command,
                reason,
                output,
            });
        }

        tracing::debug!(duration_ms = duration.as_millis() as u64, "Command finished");
        Ok(CommandOutput {
            code: status.code(),
            output,
            duration,
        })
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) {
    if let Some(pipe) = pipe
        && let Err(e) = pipe.read_to_end(buf).await
    {
        tracing::debug!("Output pipe closed early: {}", e);
    }
}

fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut output = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&String::from_utf8_lossy(stderr));
    }
    output
}
