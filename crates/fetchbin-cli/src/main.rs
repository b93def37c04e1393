//! fetchbin CLI

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use fetchbin_cli::cmd;
use fetchbin_cli::ops::PipelineError;
use fetchbin_cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so `hash` and `info` output stays pipeable.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{} failed to start runtime: {e}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            let code = e
                .downcast_ref::<PipelineError>()
                .map_or(1, PipelineError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let dry_run = cli.dry_run;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Install {
            packages,
            platform,
            bin_dir,
        } => cmd::install::install(&packages, platform, bin_dir, dry_run, quiet).await,
        Commands::Info {
            package,
            platform,
            json,
        } => cmd::info::info(&package, platform, json),
        Commands::Check { path } => cmd::check::check(&path),
        Commands::Hash { files } => cmd::hash::hash(&files),
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
