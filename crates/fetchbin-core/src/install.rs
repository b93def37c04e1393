//! Binary installation: extract, locate, atomically place.
//!
//! The final step is always a rename of a fully written, already executable
//! temp file that lives in the destination directory, so an interrupted
//! install never leaves a truncated binary at the target path.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fetchbin_schema::BinarySpec;
use thiserror::Error;

use crate::io::extract::{self, ArtifactFormat, ExtractError};

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Failed to unpack {}: {source}", archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error("'{}' not found in {}", binary.display(), archive.display())]
    BinaryNotFound { binary: PathBuf, archive: PathBuf },

    #[error("Cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    /// Final location of the executable.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Install the binary described by `binary` out of a verified artifact.
///
/// `scratch` is a private directory used for extraction; it should be
/// discarded afterwards. Installing twice with the same inputs overwrites
/// the first copy with identical content.
///
/// # Errors
///
/// Returns [`InstallError`] if the archive cannot be unpacked, the binary
/// path is missing from it, or the destination cannot be written.
pub fn install_binary(
    archive: &Path,
    binary: &BinarySpec,
    bin_dir: &Path,
    scratch: &Path,
) -> Result<InstalledBinary, InstallError> {
    let name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let format = extract::detect_format(name);

    let source = if format == ArtifactFormat::Binary {
        archive.to_path_buf()
    } else {
        let root = scratch.join("unpacked");
        let files =
            extract::extract(archive, format, &root).map_err(|source| InstallError::Extract {
                archive: archive.to_path_buf(),
                source,
            })?;
        tracing::debug!("unpacked {} files from {}", files.len(), archive.display());
        extract::find_file(&files, binary.path())
            .map(|f| f.absolute_path.clone())
            .ok_or_else(|| InstallError::BinaryNotFound {
                binary: binary.path().to_path_buf(),
                archive: archive.to_path_buf(),
            })?
    };

    let target = bin_dir.join(binary.name());
    let size = place_atomically(&source, &target)?;
    tracing::info!("installed {} ({size} bytes)", target.display());
    Ok(InstalledBinary { path: target, size })
}

fn place_atomically(source: &Path, target: &Path) -> Result<u64, InstallError> {
    let dir = target.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(InstallError::io(dir))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".fetchbin-")
        .tempfile_in(dir)
        .map_err(InstallError::io(dir))?;

    let mut input = File::open(source).map_err(InstallError::io(source))?;
    let size = io::copy(&mut input, tmp.as_file_mut()).map_err(InstallError::io(target))?;
    tmp.as_file_mut().flush().map_err(InstallError::io(target))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o755))
            .map_err(InstallError::io(target))?;
    }
    tmp.as_file().sync_all().map_err(InstallError::io(target))?;

    tmp.persist(target)
        .map_err(|e| InstallError::io(target)(e.error))?;
    Ok(size)
}
