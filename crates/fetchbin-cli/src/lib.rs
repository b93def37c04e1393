//! fetchbin - fetch, verify and install prebuilt release binaries
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! # Overview
//!
//! fetchbin turns "package name + version" into a verified executable in a
//! bin directory. A formula (TOML descriptor) lists one download per
//! platform together with its SHA-256; fetchbin picks the entry for the
//! running machine, downloads it, checks the digest and installs the binary.
//!
//! # Architecture
//!
//! - **Typestate Pattern**: `Requested` → `Resolved` → `Fetched` → `Verified` →
//!   `Installed`, so an unverified artifact can never reach the install step.
//! - **Errors**: each stage has its own error type; [`ops::PipelineError`]
//!   aggregates them and owns the exit-code mapping.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.fetchbin/
//! ├── bin/          # Installed executables
//! ├── formulas/     # Extra descriptors (<name>.toml)
//! ├── tmp/          # Download scratch space
//! └── config.toml   # Optional settings
//! ```

pub mod cmd;
pub mod ops;
pub mod ui;

pub use fetchbin_core::USER_AGENT;

use clap::{Parser, Subcommand};
use fetchbin_schema::Platform;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fetchbin")]
#[command(author, version, about = "fetchbin - fetch, verify and install prebuilt release binaries")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install a package
    Install {
        /// Package name(s), optionally with version (pkg or pkg@1.0.0), or a path to a .toml formula
        #[arg(required = true)]
        packages: Vec<String>,
        /// Target platform as os/arch[/bits] (default: this machine)
        #[arg(long)]
        platform: Option<Platform>,
        /// Install into this directory instead of the configured bin dir
        #[arg(long)]
        bin_dir: Option<PathBuf>,
    },
    /// Show a formula's platform table
    Info {
        /// Package name, optionally with version, or a path to a .toml formula
        package: String,
        /// Platform to mark as selected (default: this machine)
        #[arg(long)]
        platform: Option<Platform>,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a formula file
    Check {
        /// Formula file to check
        path: PathBuf,
    },
    /// Compute SHA256 hash of a file (for formula authoring)
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
