//! Reporter trait for dependency injection
//!
//! This trait allows the pipeline to report progress and status without
//! being coupled to a specific terminal implementation.

use std::time::Duration;

use fetchbin_schema::{PackageName, Platform, PlatformEntry, Version};

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Installing").
    fn section(&self, title: &str);

    /// A descriptor entry was selected for the platform.
    fn resolved(&self, name: &PackageName, version: &Version, platform: &Platform, entry: &PlatformEntry);

    /// Updates the progress of a download.
    fn downloading(&self, name: &PackageName, version: &Version, current: u64, total: Option<u64>);

    /// A download attempt failed and will be retried after `delay`.
    fn retrying(&self, name: &PackageName, version: &Version, attempt: u32, delay: Duration, reason: &str);

    /// The artifact digest is being checked.
    fn verifying(&self, name: &PackageName, version: &Version);

    /// The binary is being extracted and written.
    fn installing(&self, name: &PackageName, version: &Version);

    /// Marks a package operation as successfully completed.
    fn done(&self, name: &PackageName, version: &Version, detail: &str, size: Option<u64>);

    /// Marks a package operation as failed with a specific reason.
    fn failed(&self, name: &PackageName, version: &Version, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Display a final summary of multiple operations.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title)
    }
    fn resolved(&self, name: &PackageName, version: &Version, platform: &Platform, entry: &PlatformEntry) {
        (**self).resolved(name, version, platform, entry)
    }
    fn downloading(&self, name: &PackageName, version: &Version, current: u64, total: Option<u64>) {
        (**self).downloading(name, version, current, total)
    }
    fn retrying(&self, name: &PackageName, version: &Version, attempt: u32, delay: Duration, reason: &str) {
        (**self).retrying(name, version, attempt, delay, reason)
    }
    fn verifying(&self, name: &PackageName, version: &Version) {
        (**self).verifying(name, version)
    }
    fn installing(&self, name: &PackageName, version: &Version) {
        (**self).installing(name, version)
    }
    fn done(&self, name: &PackageName, version: &Version, detail: &str, size: Option<u64>) {
        (**self).done(name, version, detail, size)
    }
    fn failed(&self, name: &PackageName, version: &Version, reason: &str) {
        (**self).failed(name, version, reason)
    }
    fn info(&self, msg: &str) {
        (**self).info(msg)
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg)
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs)
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn resolved(&self, _: &PackageName, _: &Version, _: &Platform, _: &PlatformEntry) {}
    fn downloading(&self, _: &PackageName, _: &Version, _: u64, _: Option<u64>) {}
    fn retrying(&self, _: &PackageName, _: &Version, _: u32, _: Duration, _: &str) {}
    fn verifying(&self, _: &PackageName, _: &Version) {}
    fn installing(&self, _: &PackageName, _: &Version) {}
    fn done(&self, _: &PackageName, _: &Version, _: &str, _: Option<u64>) {}
    fn failed(&self, _: &PackageName, _: &Version, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
