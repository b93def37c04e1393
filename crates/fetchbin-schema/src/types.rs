//! Identifier newtypes: package names, versions and `name@version` specs.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use thiserror::Error;

/// A normalized package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// A semantic-version-like release string (e.g. `0.7.2`), stored as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(String);

impl Version {
    /// Create a new version from the given string (stored as-is).
    pub fn new(v: &str) -> Self {
        Self(v.to_string())
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The version without a leading `v` (release tags are often `v0.7.2`).
    pub fn bare(&self) -> &str {
        self.0.strip_prefix('v').unwrap_or(&self.0)
    }

    /// Whether `self` names the same release as `other`, ignoring a leading `v`.
    pub fn same_release(&self, other: &Version) -> bool {
        self.bare() == other.bare()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Version {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Errors from parsing a `name[@version]` specifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Nothing before the `@`.
    #[error("Invalid package specifier '{0}': missing package name")]
    MissingName(String),
    /// Nothing after the `@`.
    #[error("Invalid package specifier '{0}': missing version after @")]
    MissingVersion(String),
    /// The name contains a path separator or `..`.
    #[error("Invalid package name '{0}': names cannot contain '/', '\\' or '..'")]
    InvalidName(String),
}

/// A requested package, optionally pinned to a version: `kubeflex` or `kubeflex@0.7.2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Requested package name.
    pub name: PackageName,
    /// Requested version; `None` means whatever the descriptor declares.
    pub version: Option<Version>,
}

impl PackageSpec {
    /// Parse a package specifier like `kubeflex` or `kubeflex@0.7.2`.
    ///
    /// `@latest` is treated the same as no version.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] when either side of the `@` is empty or the
    /// name could escape a formula directory.
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        let spec = spec.trim();
        let (name, version) = match spec.split_once('@') {
            Some((_, "")) => return Err(SpecError::MissingVersion(spec.to_string())),
            Some((name, "latest")) => (name, None),
            Some((name, version)) => (name, Some(Version::new(version))),
            None => (spec, None),
        };

        if name.is_empty() {
            return Err(SpecError::MissingName(spec.to_string()));
        }
        if name.contains(['/', '\\']) || name.contains("..") {
            return Err(SpecError::InvalidName(name.to_string()));
        }

        Ok(Self {
            name: PackageName::new(name),
            version,
        })
    }
}

impl std::fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{v}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl std::str::FromStr for PackageSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_without_version() {
        let spec = PackageSpec::parse("KubeFlex").unwrap();
        assert_eq!(spec.name, "kubeflex");
        assert!(spec.version.is_none());
    }

    #[test]
    fn spec_with_version() {
        let spec = PackageSpec::parse("kubeflex@0.7.2").unwrap();
        assert_eq!(spec.name.as_str(), "kubeflex");
        assert_eq!(spec.version, Some(Version::new("0.7.2")));
        assert_eq!(spec.to_string(), "kubeflex@0.7.2");
    }

    #[test]
    fn spec_latest_is_unpinned() {
        let spec = PackageSpec::parse("kubeflex@latest").unwrap();
        assert!(spec.version.is_none());
    }

    #[test]
    fn spec_errors() {
        assert!(matches!(
            PackageSpec::parse("@1.0"),
            Err(SpecError::MissingName(_))
        ));
        assert!(matches!(
            PackageSpec::parse("kubeflex@"),
            Err(SpecError::MissingVersion(_))
        ));
        assert!(PackageSpec::parse("  ").is_err());
    }

    #[test]
    fn spec_rejects_path_like_names() {
        for bad in ["../../etc/x", "a/b", "a\\b", "..", "kubeflex..@1.0"] {
            assert!(
                matches!(PackageSpec::parse(bad), Err(SpecError::InvalidName(_))),
                "{bad}"
            );
        }
        assert!(PackageSpec::parse("kube-flex_2@v1.0.0").is_ok());
    }

    #[test]
    fn version_ignores_tag_prefix() {
        assert!(Version::new("v0.7.2").same_release(&Version::new("0.7.2")));
        assert!(!Version::new("0.7.2").same_release(&Version::new("0.7.3")));
    }
}
