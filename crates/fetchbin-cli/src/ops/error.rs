//! Domain-specific errors for the install pipeline

use fetchbin_core::install::InstallError;
use fetchbin_core::io::download::FetchError;
use fetchbin_core::io::verify::VerifyError;
use fetchbin_core::{ConfigError, RegistryError, ResolveError};
use fetchbin_schema::{DescriptorError, PackageName, Platform, Version};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not detect this machine's platform; pass --platform os/arch")]
    UnknownHost,

    #[error("Unsupported platform: {0}")]
    Unsupported(#[from] ResolveError),

    #[error("Formula error: {0}")]
    Formula(#[from] RegistryError),

    #[error("Invalid formula: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Download of {package} {version} ({platform}) failed: {source}")]
    Fetch {
        package: PackageName,
        version: Version,
        platform: Platform,
        #[source]
        source: FetchError,
    },

    #[error("Verification of {package} {version} ({platform}) failed: {source}")]
    Verify {
        package: PackageName,
        version: Version,
        platform: Platform,
        #[source]
        source: VerifyError,
    },

    #[error("Install of {package} {version} ({platform}) failed: {source}")]
    Install {
        package: PackageName,
        version: Version,
        platform: Platform,
        #[source]
        source: InstallError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{context}: {message}")]
    Context {
        context: &'static str,
        message: String,
    },
}

impl PipelineError {
    /// Create an error with context for better debugging.
    pub fn context(ctx: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx,
            message: msg.to_string(),
        }
    }

    /// Process exit code for this failure kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::UnknownHost | Self::Unsupported(_) => 3,
            Self::Fetch { .. } => 4,
            Self::Verify { .. } => 5,
            Self::Install { .. } => 6,
            Self::Formula(_) | Self::Descriptor(_) => 7,
            Self::Config(_) | Self::Context { .. } => 1,
        }
    }

    /// Short name of the failing stage, for status lines.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnknownHost | Self::Unsupported(_) => "unsupported platform",
            Self::Fetch { .. } => "download failed",
            Self::Verify { .. } => "checksum mismatch",
            Self::Install { .. } => "install failed",
            Self::Formula(_) | Self::Descriptor(_) => "bad formula",
            Self::Config(_) | Self::Context { .. } => "failed",
        }
    }
}
