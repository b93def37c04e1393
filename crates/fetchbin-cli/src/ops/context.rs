//! Shared pipeline context.
//!
//! Groups the layout, registry, HTTP fetcher and reporter so the stages of
//! an install don't each take half a dozen arguments.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use fetchbin_core::io::download::Fetcher;
use fetchbin_core::{Config, Layout, Registry, Reporter};

use crate::ops::PipelineError;

/// Groups common state used during install operations.
#[derive(Clone)]
pub struct Context {
    pub layout: Layout,
    pub config: Config,
    pub registry: Registry,
    pub fetcher: Fetcher,
    pub reporter: Arc<dyn Reporter>,
    pub dry_run: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("layout", &self.layout)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context from the user's environment.
    ///
    /// Directory precedence, lowest first: built-in layout, `config.toml`,
    /// `FETCHBIN_*` variables, then `bin_dir_override`.
    pub fn load(
        bin_dir_override: Option<PathBuf>,
        reporter: Arc<dyn Reporter>,
        dry_run: bool,
    ) -> Result<Self, PipelineError> {
        let (layout, config) = load_layout()?;
        let layout = match bin_dir_override {
            Some(dir) => Layout {
                bin_dir: dir,
                ..layout
            },
            None => layout,
        };

        let fetcher = Fetcher::new(&config.fetch, config.retry.policy())
            .map_err(|e| PipelineError::context("HTTP client", e))?;
        let registry = Registry::new(&layout.formula_dir);
        tracing::debug!(
            "bin_dir={} formula_dir={}",
            layout.bin_dir.display(),
            layout.formula_dir.display()
        );

        Ok(Self {
            layout,
            config,
            registry,
            fetcher,
            reporter,
            dry_run,
        })
    }
}

/// Discover the layout and apply the config file and environment on top.
pub fn load_layout() -> Result<(Layout, Config), PipelineError> {
    let layout = Layout::discover().ok_or_else(|| {
        PipelineError::context(
            "Layout",
            "cannot determine home directory; set FETCHBIN_HOME",
        )
    })?;
    let config = Config::load(&layout.config_file())?;
    let layout = layout.with_config(&config).with_env();
    Ok((layout, config))
}
