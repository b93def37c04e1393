//! Core pipeline stages for fetchbin: resolve a descriptor against a platform,
//! fetch the artifact, verify its digest and install the binary.

pub mod config;
pub mod install;
pub mod io;
pub mod paths;
pub mod registry;
pub mod reporter;
pub mod resolver;

pub use config::{Config, ConfigError, FetchConfig, RetryConfig};
pub use install::{InstallError, InstalledBinary, install_binary};
pub use paths::Layout;
pub use registry::{Lookup, Origin, Registry, RegistryError};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{ResolveError, resolve};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("fetchbin/", env!("CARGO_PKG_VERSION"));
