//! Formula lookup.
//!
//! A request names either a descriptor file (`./kubeflex.toml`) or a package
//! (`kubeflex`, `kubeflex@0.7.2`). Packages are searched in the formula
//! directory first, then in the formulas compiled into the binary.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use fetchbin_schema::{DescriptorError, PackageDescriptor, PackageName, PackageSpec, SpecError, Version};
use thiserror::Error;

const BUILTIN: &[(&str, &str)] = &[("kubeflex", include_str!("../formulas/kubeflex.toml"))];

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidSpec(#[from] SpecError),

    #[error("No formula named '{name}' (known: {})", known.join(", "))]
    NotFound { name: PackageName, known: Vec<String> },

    #[error("Invalid formula {origin}: {source}")]
    Descriptor {
        origin: Origin,
        #[source]
        source: DescriptorError,
    },

    #[error("{package}@{requested} is not available (formula provides {available})")]
    VersionMismatch {
        package: PackageName,
        requested: Version,
        available: Version,
    },
}

/// Where a descriptor came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A descriptor path given on the command line.
    File(PathBuf),
    /// `<formula_dir>/<name>.toml`.
    FormulaDir(PathBuf),
    /// Compiled into the binary.
    Builtin,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(p) | Self::FormulaDir(p) => write!(f, "{}", p.display()),
            Self::Builtin => f.write_str("(built-in)"),
        }
    }
}

/// A loaded descriptor plus where it was found.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub descriptor: PackageDescriptor,
    pub origin: Origin,
}

#[derive(Debug, Clone)]
pub struct Registry {
    formula_dir: PathBuf,
}

impl Registry {
    pub fn new(formula_dir: impl Into<PathBuf>) -> Self {
        Self {
            formula_dir: formula_dir.into(),
        }
    }

    /// Parse a built-in formula by name. `None` if there is no such formula.
    pub fn builtin(name: &str) -> Option<Result<PackageDescriptor, DescriptorError>> {
        BUILTIN
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, src)| PackageDescriptor::parse(src))
    }

    /// Names of every formula that can be looked up without a path.
    pub fn known(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN.iter().map(|(n, _)| (*n).to_string()).collect();
        if let Ok(entries) = fs::read_dir(&self.formula_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }

    /// Resolve a command-line request to a descriptor and check the requested version.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the request is malformed, names nothing,
    /// points at an invalid descriptor, or pins a version the formula lacks.
    pub fn lookup(&self, request: &str) -> Result<Lookup, RegistryError> {
        if is_descriptor_path(request) {
            let path = PathBuf::from(request);
            let descriptor = load(&path, Origin::File(path.clone()))?;
            return Ok(Lookup {
                descriptor,
                origin: Origin::File(path),
            });
        }

        let spec = PackageSpec::parse(request)?;
        let lookup = self.find(&spec.name)?;

        if let Some(requested) = spec.version {
            let available = lookup.descriptor.version();
            if !requested.same_release(available) {
                return Err(RegistryError::VersionMismatch {
                    package: spec.name,
                    requested,
                    available: available.clone(),
                });
            }
        }
        Ok(lookup)
    }

    fn find(&self, name: &PackageName) -> Result<Lookup, RegistryError> {
        let local = self.formula_dir.join(format!("{name}.toml"));
        if local.is_file() {
            tracing::debug!("using formula {}", local.display());
            let descriptor = load(&local, Origin::FormulaDir(local.clone()))?;
            return Ok(Lookup {
                descriptor,
                origin: Origin::FormulaDir(local),
            });
        }

        match Self::builtin(name) {
            Some(Ok(descriptor)) => Ok(Lookup {
                descriptor,
                origin: Origin::Builtin,
            }),
            Some(Err(source)) => Err(RegistryError::Descriptor {
                origin: Origin::Builtin,
                source,
            }),
            None => Err(RegistryError::NotFound {
                name: name.clone(),
                known: self.known(),
            }),
        }
    }
}

fn is_descriptor_path(request: &str) -> bool {
    request.to_ascii_lowercase().ends_with(".toml")
}

fn load(path: &Path, origin: Origin) -> Result<PackageDescriptor, RegistryError> {
    PackageDescriptor::from_file(path).map_err(|source| RegistryError::Descriptor { origin, source })
}
