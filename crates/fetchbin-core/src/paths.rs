use dirs::home_dir;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Environment variable overriding the fetchbin home directory.
pub const HOME_ENV: &str = "FETCHBIN_HOME";
/// Environment variable overriding the bin directory.
pub const BIN_DIR_ENV: &str = "FETCHBIN_BIN_DIR";
/// Environment variable overriding the formula directory.
pub const FORMULA_DIR_ENV: &str = "FETCHBIN_FORMULA_DIR";

/// Returns the fetchbin home directory, or None if the user's home cannot be resolved.
pub fn try_fetchbin_home() -> Option<PathBuf> {
    home_from(|key| std::env::var(key).ok())
}

fn home_from(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(val) = lookup(HOME_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".fetchbin"))
}

/// Every directory fetchbin reads from or writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Root: `$FETCHBIN_HOME` or `~/.fetchbin`.
    pub home: PathBuf,
    /// Installed executables land here.
    pub bin_dir: PathBuf,
    /// Download scratch space (`<home>/tmp`).
    pub tmp_dir: PathBuf,
    /// Extra descriptors, looked up as `<formula_dir>/<name>.toml`.
    pub formula_dir: PathBuf,
}

impl Layout {
    /// Default layout rooted at `home`.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            bin_dir: home.join("bin"),
            tmp_dir: home.join("tmp"),
            formula_dir: home.join("formulas"),
            home,
        }
    }

    /// Layout for the current user, honouring `FETCHBIN_HOME`.
    pub fn discover() -> Option<Self> {
        try_fetchbin_home().map(Self::new)
    }

    /// Location of the optional config file.
    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Apply directory settings from a loaded config file.
    pub fn with_config(mut self, config: &Config) -> Self {
        if let Some(dir) = &config.bin_dir {
            self.bin_dir = self.expand(dir);
        }
        if let Some(dir) = &config.formula_dir {
            self.formula_dir = self.expand(dir);
        }
        self
    }

    /// Apply `FETCHBIN_BIN_DIR` / `FETCHBIN_FORMULA_DIR` from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply directory overrides from an arbitrary variable source.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(BIN_DIR_ENV).filter(|v| !v.is_empty()) {
            self.bin_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(FORMULA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.formula_dir = PathBuf::from(dir);
        }
        self
    }

    // Relative paths in the config file are relative to home; `~/` expands.
    fn expand(&self, path: &Path) -> PathBuf {
        if let Ok(rest) = path.strip_prefix("~") {
            if let Some(home) = home_dir() {
                return home.join(rest);
            }
        }
        if path.is_relative() {
            self.home.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
