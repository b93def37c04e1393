//! Check command

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;
use fetchbin_schema::PackageDescriptor;

use crate::ops::PipelineError;
use crate::ui::theme::Icons;

/// Load and validate a formula file.
pub fn check(path: &Path) -> Result<()> {
    let descriptor = PackageDescriptor::from_file(path).map_err(PipelineError::from)?;
    let icons = Icons::default();

    println!(
        "{} {} {} {}",
        icons.success.green(),
        path.display(),
        descriptor.name().as_str().cyan(),
        descriptor.version().as_str().dark_grey()
    );
    for entry in &descriptor.platforms {
        println!(
            "  {} {:<16}{}",
            icons.pending.dark_grey(),
            entry.label(),
            descriptor.binary_for(entry)
        );
    }
    Ok(())
}
