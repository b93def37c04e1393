//! Install Flow Typestate Pattern
//!
//! Models one package install as a series of explicit state transitions:
//!
//! ```text
//! Requested --[resolve()]--> Resolved --[fetch()]--> Fetched --[verify()]--> Verified --[install()]--> Installed
//! ```
//!
//! Each stage consumes the previous one, so an artifact cannot reach the bin
//! directory without passing the checksum stage first.
//!
//! # Usage
//!
//! ```ignore
//! let resolved = Requested::lookup(&registry, "kubeflex", platform)?.resolve()?;
//! let fetched = resolved.fetch(&fetcher, &layout.tmp_dir, &reporter).await?;
//! let installed = fetched.verify(&reporter)?.install(&layout.bin_dir, &reporter)?;
//! ```

use std::path::{Path, PathBuf};

use fetchbin_core::io::download::{FetchError, FetchRequest, Fetcher};
use fetchbin_core::io::verify::verify_file;
use fetchbin_core::{InstalledBinary, Lookup, Origin, Registry, Reporter, install_binary, resolve};
use fetchbin_schema::{
    BinarySpec, PackageDescriptor, PackageName, Platform, PlatformEntry, Sha256Digest, Version,
};
use tempfile::TempDir;

use crate::ops::PipelineError;

/// State 1: a descriptor has been found for the request, nothing is selected yet.
///
/// # Transitions
///
/// - [`resolve()`](Self::resolve) -> [`Resolved`]
#[derive(Debug)]
pub struct Requested {
    lookup: Lookup,
    platform: Platform,
}

/// State 2: the platform entry to install is known.
///
/// # Transitions
///
/// - [`fetch()`](Self::fetch) -> [`Fetched`]
#[derive(Debug)]
pub struct Resolved {
    descriptor: PackageDescriptor,
    entry: PlatformEntry,
    platform: Platform,
}

/// State 3: the artifact is on disk but not yet trusted.
///
/// # Transitions
///
/// - [`verify()`](Self::verify) -> [`Verified`]
#[derive(Debug)]
pub struct Fetched {
    resolved: Resolved,
    artifact: PathBuf,
    scratch: TempDir,
}

/// State 4: the artifact digest matches the descriptor.
///
/// # Transitions
///
/// - [`install()`](Self::install) -> [`Installed`]
#[derive(Debug)]
pub struct Verified {
    fetched: Fetched,
    digest: Sha256Digest,
}

/// Final state: the binary is in place.
#[derive(Debug, Clone)]
pub struct Installed {
    pub name: PackageName,
    pub version: Version,
    pub platform: Platform,
    pub digest: Sha256Digest,
    pub binary: InstalledBinary,
}

impl Requested {
    /// Look up `request` (a name, `name@version` or a `.toml` path).
    pub fn lookup(
        registry: &Registry,
        request: &str,
        platform: Platform,
    ) -> Result<Self, PipelineError> {
        let lookup = registry.lookup(request)?;
        Ok(Self { lookup, platform })
    }

    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.lookup.descriptor
    }

    pub fn origin(&self) -> &Origin {
        &self.lookup.origin
    }

    /// Select the entry for the target platform.
    pub fn resolve(self) -> Result<Resolved, PipelineError> {
        let entry = resolve(&self.lookup.descriptor, &self.platform)?.clone();
        Ok(Resolved {
            descriptor: self.lookup.descriptor,
            entry,
            platform: self.platform,
        })
    }
}

impl Resolved {
    pub fn name(&self) -> &PackageName {
        self.descriptor.name()
    }

    pub fn version(&self) -> &Version {
        self.descriptor.version()
    }

    pub fn entry(&self) -> &PlatformEntry {
        &self.entry
    }

    pub fn binary(&self) -> &BinarySpec {
        self.descriptor.binary_for(&self.entry)
    }

    /// Download the artifact into a fresh scratch directory under `tmp_root`.
    pub async fn fetch<R: Reporter>(
        self,
        fetcher: &Fetcher,
        tmp_root: &Path,
        reporter: &R,
    ) -> Result<Fetched, PipelineError> {
        let scratch = match make_scratch(tmp_root) {
            Ok(dir) => dir,
            Err(e) => return Err(self.fetch_error(FetchError::Io(e))),
        };

        let req = FetchRequest {
            name: self.descriptor.name(),
            version: self.descriptor.version(),
            entry: &self.entry,
            dest_dir: scratch.path(),
        };
        match fetcher.fetch(req, reporter).await {
            Ok(artifact) => Ok(Fetched {
                resolved: self,
                artifact,
                scratch,
            }),
            Err(source) => Err(self.fetch_error(source)),
        }
    }

    fn fetch_error(&self, source: FetchError) -> PipelineError {
        PipelineError::Fetch {
            package: self.name().clone(),
            version: self.version().clone(),
            platform: self.platform,
            source,
        }
    }
}

impl Fetched {
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Check the artifact against the descriptor digest. A mismatching file is deleted.
    pub fn verify<R: Reporter>(self, reporter: &R) -> Result<Verified, PipelineError> {
        let r = &self.resolved;
        reporter.verifying(r.name(), r.version());

        match verify_file(&self.artifact, &r.entry.sha256) {
            Ok(digest) => Ok(Verified {
                fetched: self,
                digest,
            }),
            Err(source) => Err(PipelineError::Verify {
                package: r.name().clone(),
                version: r.version().clone(),
                platform: r.platform,
                source,
            }),
        }
    }
}

impl Verified {
    /// Extract the binary and place it in `bin_dir`. The scratch directory is
    /// removed whether or not this succeeds.
    pub fn install<R: Reporter>(
        self,
        bin_dir: &Path,
        reporter: &R,
    ) -> Result<Installed, PipelineError> {
        let Fetched {
            resolved,
            artifact,
            scratch,
        } = self.fetched;
        reporter.installing(resolved.name(), resolved.version());

        let result = install_binary(&artifact, resolved.binary(), bin_dir, scratch.path());
        drop(scratch);

        match result {
            Ok(binary) => Ok(Installed {
                name: resolved.name().clone(),
                version: resolved.version().clone(),
                platform: resolved.platform,
                digest: self.digest,
                binary,
            }),
            Err(source) => Err(PipelineError::Install {
                package: resolved.name().clone(),
                version: resolved.version().clone(),
                platform: resolved.platform,
                source,
            }),
        }
    }
}

fn make_scratch(tmp_root: &Path) -> std::io::Result<TempDir> {
    std::fs::create_dir_all(tmp_root)?;
    tempfile::Builder::new()
        .prefix("fetchbin-")
        .tempdir_in(tmp_root)
}
