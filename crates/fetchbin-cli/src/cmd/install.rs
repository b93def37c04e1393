//! Install command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use fetchbin_schema::Platform;

use crate::ops::install::install_packages;
use crate::ops::{Context, PipelineError};
use crate::ui::ConsoleReporter;

/// Install one or more packages for `platform`, or for this machine.
pub async fn install(
    packages: &[String],
    platform: Option<Platform>,
    bin_dir: Option<PathBuf>,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let platform = platform
        .or_else(Platform::current)
        .ok_or(PipelineError::UnknownHost)?;

    let reporter = Arc::new(ConsoleReporter::new(quiet));
    let ctx = Context::load(bin_dir, reporter, dry_run)?;
    install_packages(&ctx, packages, platform).await?;
    Ok(())
}
