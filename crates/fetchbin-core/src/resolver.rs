//! Platform resolution: pick the one descriptor entry that serves a platform.

use fetchbin_schema::{PackageDescriptor, PackageName, Platform, PlatformEntry, Version};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(
        "{package} {version} has no artifact for {platform_desc} (available: {})",
        available.join(", ")
    )]
    UnsupportedPlatform {
        package: PackageName,
        version: Version,
        platform: Platform,
        platform_desc: String,
        available: Vec<String>,
    },
}

/// Select the entry whose (os, arch) equals the platform's and whose bit-width
/// qualifier, if present, equals the platform's width.
///
/// # Errors
///
/// Returns [`ResolveError::UnsupportedPlatform`] when no entry matches.
pub fn resolve<'a>(
    descriptor: &'a PackageDescriptor,
    platform: &Platform,
) -> Result<&'a PlatformEntry, ResolveError> {
    let found = descriptor.platforms.iter().find(|e| e.matches(platform));
    match found {
        Some(entry) => {
            tracing::debug!(
                "resolved {} {} for {platform} -> {}",
                descriptor.name(),
                descriptor.version(),
                entry.url
            );
            Ok(entry)
        }
        None => Err(ResolveError::UnsupportedPlatform {
            package: descriptor.name().clone(),
            version: descriptor.version().clone(),
            platform: *platform,
            platform_desc: platform.describe(),
            available: descriptor.platforms.iter().map(PlatformEntry::label).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use fetchbin_schema::{Arch, Bits, Os};

    fn kubeflex() -> PackageDescriptor {
        Registry::builtin("kubeflex").unwrap().unwrap()
    }

    #[test]
    fn every_declared_pair_resolves_to_itself() {
        let d = kubeflex();
        for (os, arch, suffix) in [
            (Os::Macos, Arch::Intel, "darwin_amd64"),
            (Os::Macos, Arch::Arm, "darwin_arm64"),
            (Os::Linux, Arch::Intel, "linux_amd64"),
            (Os::Linux, Arch::Arm, "linux_arm64"),
        ] {
            let entry = resolve(&d, &Platform::new(os, arch, Bits::B64)).unwrap();
            assert_eq!(entry.os, os);
            assert_eq!(entry.arch, arch);
            assert!(entry.url.ends_with(&format!("{suffix}.tar.gz")), "{}", entry.url);
        }
    }

    #[test]
    fn linux_amd64_selects_expected_checksum() {
        let d = kubeflex();
        let entry = resolve(&d, &"linux/amd64".parse().unwrap()).unwrap();
        assert_eq!(
            entry.sha256.as_str(),
            "7af4dca22ba2090d787f9cbbf161ac1b9994d3928849a97d67fef40ab190d02e"
        );
    }

    #[test]
    fn linux_arm_32bit_is_unsupported() {
        let d = kubeflex();
        let platform = Platform::new(Os::Linux, Arch::Arm, Bits::B32);
        let err = resolve(&d, &platform).unwrap_err();
        let ResolveError::UnsupportedPlatform {
            package,
            version,
            platform: p,
            available,
            ..
        } = &err;
        assert_eq!(package.as_str(), "kubeflex");
        assert_eq!(version.as_str(), "0.7.2");
        assert_eq!(*p, platform);
        assert_eq!(available.len(), 4);
        assert!(err.to_string().contains("linux/arm (32-bit)"));
    }

    #[test]
    fn absent_os_is_unsupported() {
        let d = kubeflex();
        for platform in ["windows/amd64", "freebsd/amd64", "linux/386"] {
            let platform: Platform = platform.parse().unwrap();
            assert!(resolve(&d, &platform).is_err(), "{platform}");
        }
    }

    #[test]
    fn macos_entries_accept_any_width() {
        let d = kubeflex();
        let p = Platform::new(Os::Macos, Arch::Intel, Bits::B32);
        assert!(resolve(&d, &p).is_ok());
    }
}
