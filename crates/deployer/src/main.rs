use clap::Parser;
use colored::Colorize;
use deployer::{ReleaseError, ReleaseIntent, ReleaseOutcome, ReleaseRequest, Releaser};
use deployer_core::TagPolicy;
use deployer_runner::ProcessRunner;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deployer")]
#[command(about = "Render a project's compose manifest and apply it to the cluster", long_about = None)]
struct Cli {
    /// Project name, prefixed to every service name
    #[arg(short, long, env = "DEPLOYER_PROJECT")]
    project: Option<String>,
    /// Release version, used as the image tag
    #[arg(short = 'v', long)]
    version: Option<String>,
    /// Redeploy VERSION as a rollback
    #[arg(long)]
    rollback: bool,
    /// Config file (default: deployer.yml search)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Template file replacing the built-in manifest template
    #[arg(long)]
    template: Option<PathBuf>,
    /// Image tag format (plain, v-prefixed)
    #[arg(long)]
    tag_policy: Option<TagPolicy>,
    /// Apply command timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
    /// Print the manifest without writing or applying it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Subscriber is scoped to this thread; the current-thread runtime never leaves it.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    let _log_guard = tracing::subscriber::set_default(subscriber);

    // CLI flags override the config file
    let mut config = deployer_config::load(cli.config.as_deref())?;
    if let Some(template) = cli.template {
        config.template = Some(template);
    }
    if let Some(policy) = cli.tag_policy {
        config.tag_policy = policy;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }

    let request = ReleaseRequest::from_args(cli.project, cli.version, cli.rollback);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping apply command");
            on_interrupt.cancel();
        }
    });

    // Invalid requests are reported by the releaser below
    if !cli.dry_run && request.validate().is_ok() {
        let banner = match request.intent() {
            ReleaseIntent::Deploy => "Deploying",
            ReleaseIntent::Rollback => "Rolling back",
        };
        eprintln!(
            "{} {} {}",
            banner.blue().bold(),
            request.project().cyan(),
            request.version().cyan()
        );
    }

    let releaser =
        Releaser::new(ProcessRunner::with_cancellation(cancel), config).dry_run(cli.dry_run);
    let report = releaser.run(&request).await;

    match report.outcome {
        ReleaseOutcome::Succeeded(applied) => {
            if cli.dry_run {
                print!("{}", applied.manifest);
                return Ok(());
            }

            if let Some(output) = &applied.output {
                print!("{}", output.output);
            }
            if let Some(path) = &applied.manifest_path {
                eprintln!("  manifest: {}", path.display().to_string().cyan());
            }
            eprintln!("{}", "✓ Release succeeded".green().bold());
            Ok(())
        }
        ReleaseOutcome::Failed(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);

            if let Some(output) = err.command_output()
                && !output.trim().is_empty()
            {
                eprintln!();
                eprintln!("{}", "Command output:".yellow());
                eprintln!("{}", output.trim_end());
            }

            if matches!(err, ReleaseError::Validation(_)) {
                eprintln!();
                eprintln!(
                    "{}",
                    "Usage: deployer --project <PROJECT> --version <VERSION> [--rollback]".yellow()
                );
            }
            std::process::exit(1);
        }
    }
}
