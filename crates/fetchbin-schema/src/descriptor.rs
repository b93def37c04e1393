//! TOML package descriptors.
//!
//! A descriptor is the static definition of one release:
//!
//! ```toml
//! [package]
//! name = "kubeflex"
//! version = "0.7.2"
//!
//! [install]
//! bin = "bin/kflex"
//!
//! [[platform]]
//! os = "linux"
//! arch = "intel"
//! bits = 64
//! url = "https://example.invalid/kubeflex_0.7.2_linux_amd64.tar.gz"
//! sha256 = "7af4dca22ba2090d787f9cbbf161ac1b9994d3928849a97d67fef40ab190d02e"
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::Sha256Digest;
use crate::platform::{Arch, Bits, Os, Platform};
use crate::types::{PackageName, Version};

/// Errors that can occur when loading or validating a descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// The descriptor file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content does not match the descriptor schema.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two entries declare the same (os, arch) pair.
    #[error("Duplicate platform entry for {os}/{arch} in '{package}'")]
    DuplicatePlatform {
        /// Package the descriptor belongs to.
        package: PackageName,
        /// Operating system of the repeated pair.
        os: Os,
        /// Architecture of the repeated pair.
        arch: Arch,
    },

    /// A download URL is not http(s).
    #[error("Invalid URL '{0}': only http:// and https:// are supported")]
    InvalidUrl(String),

    /// A required field is blank.
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// The binary path is absolute, escapes the archive or is malformed.
    #[error("Invalid binary path '{0}': must be relative and stay inside the archive")]
    InvalidBinaryPath(String),

    /// The descriptor declares no platforms at all.
    #[error("Descriptor for '{0}' declares no platforms")]
    NoPlatforms(PackageName),
}

/// Where the binary lives inside an archive and what it is called once installed.
///
/// Written as `path` or `path:installed-name`, e.g. `bin/kflex` or
/// `kflex-darwin:kflex`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BinarySpec {
    path: PathBuf,
    name: String,
}

impl BinarySpec {
    /// Parse a `path[:name]` binary specification.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidBinaryPath`] for empty, absolute or
    /// `..`-containing paths, and for an empty installed name.
    pub fn parse(spec: &str) -> Result<Self, DescriptorError> {
        let spec = spec.trim();
        let (path, name) = match spec.split_once(':') {
            Some((path, name)) => (path, Some(name)),
            None => (spec, None),
        };

        let invalid = || DescriptorError::InvalidBinaryPath(spec.to_string());
        let path = PathBuf::from(path);
        if path.as_os_str().is_empty() {
            return Err(invalid());
        }
        if !path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(invalid());
        }

        let name = match name {
            Some(n) if n.is_empty() || n.contains('/') => return Err(invalid()),
            Some(n) => n.to_string(),
            None => path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(invalid)?
                .to_string(),
        };

        Ok(Self { path, name })
    }

    /// Relative path of the binary inside the extracted archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name the binary is installed under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for BinarySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let default_name = self.path.file_name().and_then(|n| n.to_str());
        if default_name == Some(self.name.as_str()) {
            write!(f, "{}", self.path.display())
        } else {
            write!(f, "{}:{}", self.path.display(), self.name)
        }
    }
}

impl FromStr for BinarySpec {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BinarySpec {
    type Error = DescriptorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BinarySpec> for String {
    fn from(spec: BinarySpec) -> Self {
        spec.to_string()
    }
}

/// Identity and descriptive metadata of a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name.
    pub name: PackageName,
    /// Release version.
    pub version: Version,
    /// Short summary.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Project homepage.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage: String,
}

/// Package-level install instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallSection {
    /// Binary to copy into the bin directory.
    pub bin: BinarySpec,
}

/// One downloadable artifact for one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEntry {
    /// Operating system the artifact targets.
    pub os: Os,
    /// Architecture family the artifact targets.
    pub arch: Arch,
    /// Required pointer width; `None` accepts either.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<Bits>,
    /// Download URL.
    pub url: String,
    /// Expected SHA-256 of the downloaded file.
    pub sha256: Sha256Digest,
    /// Per-entry override of the package-level binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<BinarySpec>,
}

impl PlatformEntry {
    /// Whether this entry serves `platform`.
    pub fn matches(&self, platform: &Platform) -> bool {
        self.os == platform.os
            && self.arch == platform.arch
            && self.bits.is_none_or(|b| b == platform.bits)
    }

    /// Last path segment of the URL, without query string or fragment.
    pub fn file_name(&self) -> &str {
        let path = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.url)
            .trim_end_matches('/');
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Short `os/arch[/bits]` label for tables and messages.
    pub fn label(&self) -> String {
        match self.bits {
            Some(bits) => format!("{}/{}/{}", self.os, self.arch, bits.as_u8()),
            None => format!("{}/{}", self.os, self.arch),
        }
    }
}

/// Complete descriptor: metadata, install instruction and platform table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Identity and metadata.
    pub package: PackageInfo,
    /// Install instruction shared by all entries.
    pub install: InstallSection,
    /// Per-platform artifacts, in declaration order.
    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformEntry>,
}

impl PackageDescriptor {
    /// Load and validate a descriptor from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] if the file cannot be read, does not parse,
    /// or violates a descriptor invariant.
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a descriptor from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] if the content does not parse or violates
    /// a descriptor invariant.
    pub fn parse(content: &str) -> Result<Self, DescriptorError> {
        let descriptor: Self = toml::from_str(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check the invariants deserialization alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.package.name.is_empty() {
            return Err(DescriptorError::EmptyField("package.name"));
        }
        if self.package.version.trim().is_empty() {
            return Err(DescriptorError::EmptyField("package.version"));
        }
        if self.platforms.is_empty() {
            return Err(DescriptorError::NoPlatforms(self.package.name.clone()));
        }

        let mut seen = HashSet::new();
        for entry in &self.platforms {
            if !seen.insert((entry.os, entry.arch)) {
                return Err(DescriptorError::DuplicatePlatform {
                    package: self.package.name.clone(),
                    os: entry.os,
                    arch: entry.arch,
                });
            }
            let url = entry.url.trim();
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(DescriptorError::InvalidUrl(entry.url.clone()));
            }
            if entry.file_name().is_empty() {
                return Err(DescriptorError::InvalidUrl(entry.url.clone()));
            }
        }
        Ok(())
    }

    /// Package name.
    pub fn name(&self) -> &PackageName {
        &self.package.name
    }

    /// Release version.
    pub fn version(&self) -> &Version {
        &self.package.version
    }

    /// Binary to install for `entry`: its override, else the package default.
    pub fn binary_for<'a>(&'a self, entry: &'a PlatformEntry) -> &'a BinarySpec {
        entry.bin.as_ref().unwrap_or(&self.install.bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBEFLEX: &str = r#"
[package]
name = "kubeflex"
version = "0.7.2"
homepage = "https://github.com/kubestellar/kubeflex"

[install]
bin = "bin/kflex"

[[platform]]
os = "darwin"
arch = "arm"
url = "https://github.com/kubestellar/kubeflex/releases/download/v0.7.2/kubeflex_0.7.2_darwin_arm64.tar.gz"
sha256 = "eba11fc2a0d1fbcc0b412cc4962836678368f860c83bb0620e215d55b12f38e6"

[[platform]]
os = "linux"
arch = "arm"
bits = 64
url = "https://github.com/kubestellar/kubeflex/releases/download/v0.7.2/kubeflex_0.7.2_linux_arm64.tar.gz"
sha256 = "47FCFAFB8CC135A770489071FBBD5843899F1134744D91854B82746CE17BE09A"
"#;

    #[test]
    fn parses_kubeflex_descriptor() {
        let d = PackageDescriptor::parse(KUBEFLEX).unwrap();
        assert_eq!(d.name(), &PackageName::new("kubeflex"));
        assert_eq!(d.version().as_str(), "0.7.2");
        assert_eq!(d.platforms.len(), 2);

        let mac = &d.platforms[0];
        assert_eq!(mac.os, Os::Macos);
        assert_eq!(mac.bits, None);
        assert_eq!(mac.file_name(), "kubeflex_0.7.2_darwin_arm64.tar.gz");

        let linux = &d.platforms[1];
        assert_eq!(linux.bits, Some(Bits::B64));
        assert!(linux.sha256.as_str().starts_with("47fcfafb"));
        assert_eq!(d.binary_for(linux).path(), Path::new("bin/kflex"));
        assert_eq!(d.binary_for(linux).name(), "kflex");
    }

    #[test]
    fn entry_matching_honours_bit_width() {
        let d = PackageDescriptor::parse(KUBEFLEX).unwrap();
        let linux_arm = &d.platforms[1];
        assert!(linux_arm.matches(&Platform::new(Os::Linux, Arch::Arm, Bits::B64)));
        assert!(!linux_arm.matches(&Platform::new(Os::Linux, Arch::Arm, Bits::B32)));

        let mac_arm = &d.platforms[0];
        assert!(mac_arm.matches(&Platform::new(Os::Macos, Arch::Arm, Bits::B32)));
    }

    #[test]
    fn rejects_duplicate_pairs() {
        let dup = format!(
            "{KUBEFLEX}\n[[platform]]\nos = \"linux\"\narch = \"aarch64\"\nurl = \"https://x.invalid/a.tar.gz\"\nsha256 = \"{}\"\n",
            "0".repeat(64)
        );
        let err = PackageDescriptor::parse(&dup).unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::DuplicatePlatform {
                os: Os::Linux,
                arch: Arch::Arm,
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_checksum_at_parse_time() {
        let bad = KUBEFLEX.replace(
            "eba11fc2a0d1fbcc0b412cc4962836678368f860c83bb0620e215d55b12f38e6",
            "eba11fc2",
        );
        assert!(matches!(
            PackageDescriptor::parse(&bad),
            Err(DescriptorError::Parse(_))
        ));
    }

    #[test]
    fn rejects_non_http_url() {
        let bad = KUBEFLEX.replace(
            "https://github.com/kubestellar/kubeflex/releases/download/v0.7.2/kubeflex_0.7.2_darwin_arm64.tar.gz",
            "file:///tmp/kubeflex.tar.gz",
        );
        assert!(matches!(
            PackageDescriptor::parse(&bad),
            Err(DescriptorError::InvalidUrl(_))
        ));
    }

    #[test]
    fn rejects_missing_platforms() {
        let toml = "[package]\nname = \"x\"\nversion = \"1\"\n[install]\nbin = \"x\"\n";
        assert!(matches!(
            PackageDescriptor::parse(toml),
            Err(DescriptorError::NoPlatforms(_))
        ));
    }

    #[test]
    fn binary_spec_forms() {
        let plain = BinarySpec::parse("bin/kflex").unwrap();
        assert_eq!(plain.name(), "kflex");
        assert_eq!(plain.to_string(), "bin/kflex");

        let renamed = BinarySpec::parse("kflex-linux-amd64:kflex").unwrap();
        assert_eq!(renamed.path(), Path::new("kflex-linux-amd64"));
        assert_eq!(renamed.name(), "kflex");
        assert_eq!(renamed.to_string(), "kflex-linux-amd64:kflex");

        for bad in ["", "/usr/bin/kflex", "../kflex", "bin/../../kflex", "bin/kflex:"] {
            assert!(BinarySpec::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubeflex.toml");
        fs::write(&path, KUBEFLEX).unwrap();
        let d = PackageDescriptor::from_file(&path).unwrap();
        assert_eq!(d.platforms.len(), 2);

        let missing = PackageDescriptor::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(DescriptorError::Io(_))));
    }
}
