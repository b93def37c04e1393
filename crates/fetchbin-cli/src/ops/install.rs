//! Package installation.
//!
//! [`install_packages`] drives each request through the typestate pipeline in
//! [`crate::ops::flow`], stopping at the first failure. Nothing is written to
//! the bin directory for a package whose artifact failed verification.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Instant;

use fetchbin_core::Reporter;
use fetchbin_schema::{PackageName, Platform, Version};

use crate::ops::flow::{Installed, Requested};
use crate::ops::{Context, PipelineError};

/// Install every request in order for `platform`.
///
/// Returns the installed binaries, or an empty list for a dry run.
pub async fn install_packages(
    ctx: &Context,
    packages: &[String],
    platform: Platform,
) -> Result<Vec<Installed>, PipelineError> {
    let reporter = &ctx.reporter;
    let start = Instant::now();
    reporter.section(if ctx.dry_run { "Resolving" } else { "Installing" });
    tracing::debug!("installing {packages:?} for {platform}");

    let mut installed = Vec::with_capacity(packages.len());
    for request in packages {
        match install_one(ctx, request, platform).await {
            Ok(Some(done)) => installed.push(done),
            Ok(None) => {}
            Err((name, version, e)) => {
                reporter.failed(&name, &version, e.stage());
                return Err(e);
            }
        }
    }

    if ctx.dry_run {
        return Ok(installed);
    }

    reporter.summary(
        installed.len(),
        "installed",
        start.elapsed().as_secs_f64(),
    );
    let names: Vec<String> = installed
        .iter()
        .filter_map(|i| i.binary.path.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    perform_ux_checks(&names, &ctx.layout.bin_dir, reporter);
    Ok(installed)
}

type Failure = (PackageName, Version, PipelineError);

async fn install_one(
    ctx: &Context,
    request: &str,
    platform: Platform,
) -> Result<Option<Installed>, Failure> {
    let reporter = &ctx.reporter;
    let unknown = |e: PipelineError| (PackageName::new(request), Version::new(""), e);

    let requested = Requested::lookup(&ctx.registry, request, platform).map_err(unknown)?;
    let name = requested.descriptor().name().clone();
    let version = requested.descriptor().version().clone();
    tracing::debug!("{request} -> {name} {version} from {}", requested.origin());
    let fail = |e: PipelineError| (name.clone(), version.clone(), e);

    let resolved = requested.resolve().map_err(fail)?;
    reporter.resolved(&name, &version, &platform, resolved.entry());

    if ctx.dry_run {
        let target = ctx.layout.bin_dir.join(resolved.binary().name());
        reporter.done(
            &name,
            &version,
            &format!("would install {}", target.display()),
            None,
        );
        return Ok(None);
    }

    let fetched = resolved
        .fetch(&ctx.fetcher, &ctx.layout.tmp_dir, reporter)
        .await
        .map_err(fail)?;
    let installed = fetched
        .verify(reporter)
        .map_err(fail)?
        .install(&ctx.layout.bin_dir, reporter)
        .map_err(fail)?;

    reporter.done(
        &name,
        &version,
        &installed.binary.path.display().to_string(),
        Some(installed.binary.size),
    );
    Ok(Some(installed))
}

/// Warn when `bin_dir` is not on PATH or an installed name resolves elsewhere first.
pub fn perform_ux_checks(names: &[String], bin_dir: &Path, reporter: &impl Reporter) {
    let path_env = std::env::var_os("PATH").unwrap_or_default();
    check_path(&path_env, names, bin_dir, reporter);
}

fn check_path(path_env: &OsStr, names: &[String], bin_dir: &Path, reporter: &impl Reporter) {
    let is_in_path = std::env::split_paths(path_env).any(|p| p == bin_dir);

    if !is_in_path {
        reporter.warning(&format!("{} is not in your PATH.", bin_dir.display()));
        reporter.info(&format!(
            "Add this to your shell profile: export PATH=\"{}:$PATH\"",
            bin_dir.display()
        ));
        return;
    }

    for name in names {
        if let Ok(path) = which::which_in(name, Some(path_env), bin_dir) {
            if !path.starts_with(bin_dir) {
                reporter.warning(&format!(
                    "'{name}' is shadowed by another copy at {}",
                    path.display()
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchbin_schema::PlatformEntry;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Captured {
        warnings: Mutex<Vec<String>>,
    }

    impl Captured {
        fn warnings(&self) -> Vec<String> {
            self.warnings.lock().unwrap().clone()
        }
    }

    impl Reporter for Captured {
        fn section(&self, _: &str) {}
        fn resolved(&self, _: &PackageName, _: &Version, _: &Platform, _: &PlatformEntry) {}
        fn downloading(&self, _: &PackageName, _: &Version, _: u64, _: Option<u64>) {}
        fn retrying(&self, _: &PackageName, _: &Version, _: u32, _: Duration, _: &str) {}
        fn verifying(&self, _: &PackageName, _: &Version) {}
        fn installing(&self, _: &PackageName, _: &Version) {}
        fn done(&self, _: &PackageName, _: &Version, _: &str, _: Option<u64>) {}
        fn failed(&self, _: &PackageName, _: &Version, _: &str) {}
        fn info(&self, _: &str) {}
        fn warning(&self, msg: &str) {
            self.warnings.lock().unwrap().push(msg.to_string());
        }
        fn summary(&self, _: usize, _: &str, _: f64) {}
    }

    #[cfg(unix)]
    fn executable(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn bin_dir_missing_from_path() {
        let work = tempfile::tempdir().unwrap();
        let bin = work.path().join("bin");
        let path_env = std::env::join_paths([work.path().join("other")]).unwrap();

        let reporter = Captured::default();
        check_path(&path_env, &["kflex".to_string()], &bin, &reporter);
        let warnings = reporter.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("is not in your PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn shadowed_binary_keeps_its_case() {
        let work = tempfile::tempdir().unwrap();
        let bin = work.path().join("bin");
        let other = work.path().join("other");
        executable(&bin, "Foo");
        let shadow = executable(&other, "Foo");
        let path_env = std::env::join_paths([&other, &bin]).unwrap();

        let reporter = Captured::default();
        check_path(&path_env, &["Foo".to_string()], &bin, &reporter);
        let warnings = reporter.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'Foo'"), "{warnings:?}");
        assert!(warnings[0].contains(&shadow.display().to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn first_on_path_is_quiet() {
        let work = tempfile::tempdir().unwrap();
        let bin = work.path().join("bin");
        let other = work.path().join("other");
        executable(&bin, "kflex");
        executable(&other, "kflex");
        let path_env = std::env::join_paths([&bin, &other]).unwrap();

        let reporter = Captured::default();
        check_path(&path_env, &["kflex".to_string()], &bin, &reporter);
        assert!(reporter.warnings().is_empty());
    }
}
