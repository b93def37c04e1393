//! Hash command

use anyhow::{Context, Result};
use fetchbin_core::io::verify::sha256_file;
use std::path::PathBuf;

/// Print the SHA-256 of each file, `sha256sum` style.
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let digest =
            sha256_file(file).with_context(|| format!("Cannot read {}", file.display()))?;
        println!("{digest}  {}", file.display());
    }
    Ok(())
}
