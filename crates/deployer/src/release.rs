//! Release orchestration
//!
//! ```text
//! Validating ─┬─> Deploying ───┬─> Succeeded
//!             │                │
//!             ├─> RollingBack ─┤
//!             │                │
//!             └────────────────┴─> Failed
//! ```
//!
//! Deploying and RollingBack run the same sequence: render the template,
//! write the manifest file, run the apply command. The first failing step
//! ends the release; later steps are never attempted and nothing is retried
//! or undone.

use crate::error::{ReleaseError, Result};
use crate::request::{ReleaseIntent, ReleaseRequest};
use deployer_config::DeployerConfig;
use deployer_core::{Template, Transformer};
use deployer_runner::{CommandOutput, CommandRunner, CommandSpec};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    Validating,
    Deploying,
    RollingBack,
    Succeeded,
    Failed,
}

impl ReleaseState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Deploying => "deploying",
            Self::RollingBack => "rolling-back",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

/// What a successful release produced
#[derive(Debug, Clone)]
pub struct AppliedRelease {
    /// Rendered manifest text
    pub manifest: String,
    /// `None` on a dry run
    pub manifest_path: Option<PathBuf>,
    /// Output of the apply command; `None` on a dry run
    pub output: Option<CommandOutput>,
}

#[derive(Debug)]
pub enum ReleaseOutcome {
    Succeeded(AppliedRelease),
    Failed(ReleaseError),
}

/// Final report of one release
#[derive(Debug)]
pub struct ReleaseReport {
    pub request: ReleaseRequest,
    /// Every state entered, in order; the last one is terminal.
    pub states: Vec<ReleaseState>,
    pub outcome: ReleaseOutcome,
}

impl ReleaseReport {
    pub fn state(&self) -> ReleaseState {
        match self.outcome {
            ReleaseOutcome::Succeeded(_) => ReleaseState::Succeeded,
            ReleaseOutcome::Failed(_) => ReleaseState::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ReleaseOutcome::Succeeded(_))
    }

    pub fn error(&self) -> Option<&ReleaseError> {
        match &self.outcome {
            ReleaseOutcome::Failed(err) => Some(err),
            ReleaseOutcome::Succeeded(_) => None,
        }
    }

    pub fn into_result(self) -> Result<AppliedRelease> {
        match self.outcome {
            ReleaseOutcome::Succeeded(applied) => Ok(applied),
            ReleaseOutcome::Failed(err) => Err(err),
        }
    }
}

/// Runs releases with one runner and one configuration
pub struct Releaser<R> {
    runner: R,
    config: DeployerConfig,
    dry_run: bool,
    span: tracing::Span,
}

impl<R: CommandRunner> Releaser<R> {
    pub fn new(runner: R, config: DeployerConfig) -> Self {
        Self {
            runner,
            config,
            dry_run: false,
            span: tracing::info_span!("deployer"),
        }
    }

    /// Render only: no manifest file, no apply command.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Parent span for every event this releaser emits.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub async fn run(&self, request: &ReleaseRequest) -> ReleaseReport {
        let span = tracing::info_span!(
            parent: &self.span,
            "release",
            project = %request.project(),
            version = %request.version(),
            intent = %request.intent()
        );
        self.execute(request).instrument(span).await
    }

    async fn execute(&self, request: &ReleaseRequest) -> ReleaseReport {
        let mut states = Vec::with_capacity(3);

        enter(&mut states, ReleaseState::Validating);
        if let Err(err) = request.validate() {
            return finish(request, states, Err(err));
        }

        match request.intent() {
            ReleaseIntent::Deploy => enter(&mut states, ReleaseState::Deploying),
            ReleaseIntent::Rollback => {
                enter(&mut states, ReleaseState::RollingBack);
                tracing::info!(
                    "Rolling back {} to version {}",
                    request.project(),
                    request.version()
                );
            }
        }

        let result = self.release(request).await;
        finish(request, states, result)
    }

    async fn release(&self, request: &ReleaseRequest) -> Result<AppliedRelease> {
        let manifest = self.render(request)?;

        if self.dry_run {
            tracing::info!("Dry run, manifest not written or applied");
            return Ok(AppliedRelease {
                manifest,
                manifest_path: None,
                output: None,
            });
        }

        let path = self.config.manifest_path(request.project());
        write_manifest(&path, &manifest)?;
        tracing::info!(path = %path.display(), "Wrote manifest");

        let spec = self.apply_command(&path, request.project());
        tracing::info!(command = %spec, "Applying manifest");
        let output = self.runner.run(&spec).await?;

        Ok(AppliedRelease {
            manifest,
            manifest_path: Some(path),
            output: Some(output),
        })
    }

    /// Rendered manifest text for `request`.
    pub fn render(&self, request: &ReleaseRequest) -> Result<String> {
        let template = Template::load(&self.config.template_source())?;
        let manifest = Transformer::new(request.project(), request.version())
            .with_policy(self.config.tag_policy)
            .render(&template)?;

        tracing::debug!(
            policy = %self.config.tag_policy,
            bytes = manifest.len(),
            "Rendered manifest"
        );
        Ok(manifest)
    }

    pub fn apply_command(&self, manifest_path: &Path, project: &str) -> CommandSpec {
        CommandSpec::new(&self.config.apply.program)
            .args(self.config.apply.render_args(manifest_path, project))
            .with_timeout(self.config.timeout())
    }
}

fn enter(states: &mut Vec<ReleaseState>, state: ReleaseState) {
    tracing::info!(%state, "Entering state");
    states.push(state);
}

fn finish(
    request: &ReleaseRequest,
    mut states: Vec<ReleaseState>,
    result: Result<AppliedRelease>,
) -> ReleaseReport {
    let outcome = match result {
        Ok(applied) => {
            enter(&mut states, ReleaseState::Succeeded);
            tracing::info!("Release succeeded");
            ReleaseOutcome::Succeeded(applied)
        }
        Err(err) => {
            enter(&mut states, ReleaseState::Failed);
            tracing::error!(error = %err, "Release failed");
            ReleaseOutcome::Failed(err)
        }
    };

    ReleaseReport {
        request: request.clone(),
        states,
        outcome,
    }
}

/// Replace `path` atomically: readers see the old file or the new one,
/// never a partial write. Two releases of the same project still race;
/// the last rename wins.
fn write_manifest(path: &Path, manifest: &str) -> Result<()> {
    let write_error = |source: std::io::Error| ReleaseError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_error)?;

    let mut file = tempfile::Builder::new()
        .prefix(".docker-compose")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_error)?;
    file.write_all(manifest.as_bytes()).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}
