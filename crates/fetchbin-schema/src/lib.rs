//! Shared data model for fetchbin.
//!
//! A [`PackageDescriptor`] is the static definition of one release: a name, a
//! version and a table of [`PlatformEntry`] records, each pairing a
//! [`Platform`] axis with a download URL and a [`Sha256Digest`].

pub mod descriptor;
pub mod hash;
pub mod platform;
pub mod types;

// Re-exports
pub use descriptor::{
    BinarySpec, DescriptorError, InstallSection, PackageDescriptor, PackageInfo, PlatformEntry,
};
pub use hash::{DigestError, Sha256Digest};
pub use platform::{Arch, Bits, Os, Platform};
pub use types::{PackageName, PackageSpec, SpecError, Version};
