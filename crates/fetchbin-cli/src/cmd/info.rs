//! Info command

use anyhow::Result;
use crossterm::style::Stylize;
use fetchbin_core::{Origin, Registry, resolve};
use fetchbin_schema::{BinarySpec, PackageDescriptor, Platform, PlatformEntry};
use serde::Serialize;

use crate::ops::PipelineError;
use crate::ops::context::load_layout;
use crate::ui::table::platform_table;

#[derive(Debug, Serialize)]
struct InfoReport<'a> {
    name: &'a str,
    version: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'a str,
    origin: String,
    bin: &'a BinarySpec,
    platform: Option<String>,
    selected: Option<&'a PlatformEntry>,
    platforms: &'a [PlatformEntry],
}

/// Show a formula and the entry selected for `platform` (default: this machine).
pub fn info(package: &str, platform: Option<Platform>, json: bool) -> Result<()> {
    let (layout, _) = load_layout()?;
    let registry = Registry::new(&layout.formula_dir);
    let found = registry.lookup(package).map_err(PipelineError::from)?;
    let descriptor = &found.descriptor;

    let platform = platform.or_else(Platform::current);
    let selected = platform.and_then(|p| resolve(descriptor, &p).ok());

    if json {
        let report = InfoReport {
            name: descriptor.name().as_str(),
            version: descriptor.version().as_str(),
            description: &descriptor.package.description,
            homepage: &descriptor.package.homepage,
            origin: found.origin.to_string(),
            bin: &descriptor.install.bin,
            platform: platform.map(|p| p.to_string()),
            selected,
            platforms: &descriptor.platforms,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human(descriptor, &found.origin, platform, selected);
    Ok(())
}

fn print_human(
    descriptor: &PackageDescriptor,
    origin: &Origin,
    platform: Option<Platform>,
    selected: Option<&PlatformEntry>,
) {
    let lw = 12;

    println!();
    println!(
        "  {} {}",
        descriptor.name().as_str().white().bold(),
        descriptor.version().as_str().dark_grey()
    );
    if !descriptor.package.description.is_empty() {
        println!("  {}", descriptor.package.description);
    }
    println!();

    if !descriptor.package.homepage.is_empty() {
        println!("  {:<lw$}{}", "homepage", descriptor.package.homepage);
    }
    println!("  {:<lw$}{}", "binary", descriptor.install.bin);
    println!("  {:<lw$}{}", "formula", origin);

    match (platform, selected) {
        (Some(p), Some(entry)) => {
            println!("  {:<lw$}{} → {}", "platform", p.describe(), entry.file_name());
        }
        (Some(p), None) => {
            println!(
                "  {:<lw$}{}",
                "platform",
                format!("{} (no artifact)", p.describe()).yellow()
            );
        }
        (None, _) => println!("  {:<lw$}{}", "platform", "unknown".yellow()),
    }
    println!();

    let index = selected.and_then(|s| {
        descriptor
            .platforms
            .iter()
            .position(|e| std::ptr::eq(e, s))
    });
    println!("{}", platform_table(&descriptor.platforms, index));
}
