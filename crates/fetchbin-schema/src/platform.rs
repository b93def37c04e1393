//! Platform axis: operating system, CPU architecture family and bit-width.
//!
//! Release archives are usually named with Go-style tokens
//! (`darwin_arm64`, `linux_amd64`), while formulas speak in families
//! (`on_intel`, `on_arm`) with an optional "64-bit only" qualifier. Both
//! spellings parse into the same [`Platform`].
//!
//! # Example
//!
//! ```
//! use fetchbin_schema::{Arch, Bits, Os, Platform};
//!
//! let p: Platform = "linux/amd64".parse().unwrap();
//! assert_eq!(p, Platform::new(Os::Linux, Arch::Intel, Bits::B64));
//! assert_eq!(p.to_string(), "linux/amd64");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Os {
    /// Apple macOS (also spelled `darwin` or `osx`).
    Macos,
    /// Linux-based operating systems.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// FreeBSD.
    FreeBsd,
}

impl Os {
    /// Operating system of the running binary, if it is one we know about.
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::Macos)
        } else if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else if cfg!(target_os = "windows") {
            Some(Self::Windows)
        } else if cfg!(target_os = "freebsd") {
            Some(Self::FreeBsd)
        } else {
            None
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Macos => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::FreeBsd => "freebsd",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "macos" | "darwin" | "osx" | "mac" => Ok(Self::Macos),
            "linux" => Ok(Self::Linux),
            "windows" | "win" => Ok(Self::Windows),
            "freebsd" => Ok(Self::FreeBsd),
            _ => Err(format!("Unknown operating system: {s}")),
        }
    }
}

impl TryFrom<String> for Os {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Os> for String {
    fn from(os: Os) -> Self {
        os.as_str().to_string()
    }
}

/// CPU architecture family.
///
/// Word size is tracked separately in [`Bits`], so `amd64` and `386` are both
/// [`Arch::Intel`], and `arm64` and `armv7` are both [`Arch::Arm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Arch {
    /// Intel/AMD (`x86_64`, `amd64`, `386`).
    Intel,
    /// ARM (`arm64`, `aarch64`, `armv7`).
    Arm,
}

impl Arch {
    /// Architecture family of the running binary, if it is one we know about.
    pub fn current() -> Option<Self> {
        if cfg!(any(target_arch = "x86_64", target_arch = "x86")) {
            Some(Self::Intel)
        } else if cfg!(any(target_arch = "aarch64", target_arch = "arm")) {
            Some(Self::Arm)
        } else {
            None
        }
    }

    /// Canonical family name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intel => "intel",
            Self::Arm => "arm",
        }
    }

    /// Parse an architecture token, returning the word size when the token
    /// implies one (`arm64` is 64-bit, `arm` and `armv7` are 32-bit, `intel`
    /// says nothing). As a family name `arm` covers both widths.
    pub fn parse_token(token: &str) -> Option<(Self, Option<Bits>)> {
        let parsed = match token.to_lowercase().as_str() {
            "intel" => (Self::Intel, None),
            "amd64" | "x86_64" | "x64" => (Self::Intel, Some(Bits::B64)),
            "386" | "i386" | "i686" | "x86" => (Self::Intel, Some(Bits::B32)),
            // Go's GOARCH=arm is the 32-bit target.
            "arm" => (Self::Arm, Some(Bits::B32)),
            "arm64" | "aarch64" => (Self::Arm, Some(Bits::B64)),
            "armv7" | "armv6" | "armhf" | "armel" => (Self::Arm, Some(Bits::B32)),
            _ => return None,
        };
        Some(parsed)
    }

    /// Go-style name for this family at the given word size.
    pub fn go_name(&self, bits: Bits) -> &'static str {
        match (self, bits) {
            (Self::Intel, Bits::B64) => "amd64",
            (Self::Intel, Bits::B32) => "386",
            (Self::Arm, Bits::B64) => "arm64",
            (Self::Arm, Bits::B32) => "arm",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s)
            .map(|(arch, _)| arch)
            .ok_or_else(|| format!("Unknown architecture: {s}"))
    }
}

impl TryFrom<String> for Arch {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Arch> for String {
    fn from(arch: Arch) -> Self {
        arch.as_str().to_string()
    }
}

/// Pointer width of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Bits {
    /// 32-bit.
    B32,
    /// 64-bit.
    B64,
}

impl Bits {
    /// Pointer width of the running binary.
    pub fn current() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::B64
        } else {
            Self::B32
        }
    }

    /// Width as a number.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::B32 => 32,
            Self::B64 => 64,
        }
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.as_u8())
    }
}

impl TryFrom<u8> for Bits {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            32 => Ok(Self::B32),
            64 => Ok(Self::B64),
            other => Err(format!("Unsupported bit-width: {other} (expected 32 or 64)")),
        }
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.as_u8()
    }
}

/// A concrete runtime platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture family.
    pub arch: Arch,
    /// Pointer width.
    pub bits: Bits,
}

impl Platform {
    /// Construct a platform from its three axes.
    pub fn new(os: Os, arch: Arch, bits: Bits) -> Self {
        Self { os, arch, bits }
    }

    /// Platform of the running binary, or `None` on an unrecognised target.
    pub fn current() -> Option<Self> {
        Some(Self::new(Os::current()?, Arch::current()?, Bits::current()))
    }

    /// Human-oriented description, e.g. `linux/arm (32-bit)`.
    pub fn describe(&self) -> String {
        format!("{self} ({})", self.bits)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch.go_name(self.bits))
    }
}

impl FromStr for Platform {
    type Err = String;

    /// Parse `os/arch` or `os/arch/bits`. When neither the arch token nor an
    /// explicit suffix gives a width, 64-bit is assumed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let os = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("Invalid platform '{s}': expected os/arch"))?
            .parse::<Os>()?;
        let arch_token = parts
            .next()
            .ok_or_else(|| format!("Invalid platform '{s}': expected os/arch"))?;
        let (arch, implied) = Arch::parse_token(arch_token)
            .ok_or_else(|| format!("Unknown architecture: {arch_token}"))?;

        let explicit = match parts.next() {
            Some(b) => {
                let digits = b.trim_end_matches("bit").trim_end_matches('-');
                let n: u8 = digits
                    .parse()
                    .map_err(|_| format!("Invalid bit-width '{b}' in platform '{s}'"))?;
                Some(Bits::try_from(n)?)
            }
            None => None,
        };

        if parts.next().is_some() {
            return Err(format!("Invalid platform '{s}': too many components"));
        }

        let bits = explicit.or(implied).unwrap_or(Bits::B64);
        Ok(Self::new(os, arch, bits))
    }
}
