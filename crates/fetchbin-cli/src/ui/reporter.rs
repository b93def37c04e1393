//! Console implementation of the pipeline [`Reporter`].
//!
//! Everything goes to stderr; stdout is reserved for command output that
//! users may pipe (`hash`, `info --json`). The in-place download line is only
//! drawn when stderr is a terminal.

use std::io::{IsTerminal, Write, stderr};
use std::sync::Mutex;
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use fetchbin_core::Reporter;
use fetchbin_schema::{PackageName, Platform, PlatformEntry, Version};

use super::theme::{Icons, format_progress, format_size};

const BAR_WIDTH: usize = 24;

#[derive(Debug, Default)]
struct ProgressLine {
    active: bool,
    last_drawn: u64,
}

#[derive(Debug)]
pub struct ConsoleReporter {
    icons: Icons,
    quiet: bool,
    live: bool,
    line: Mutex<ProgressLine>,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            icons: Icons::default(),
            quiet,
            live: !quiet && stderr().is_terminal(),
            line: Mutex::new(ProgressLine::default()),
        }
    }

    // Progress lines are redrawn in place; anything else must clear one first.
    fn println(&self, msg: &str) {
        if let Ok(mut line) = self.line.lock() {
            if line.active {
                let mut err = stderr();
                let _ = crossterm::queue!(err, MoveToColumn(0), Clear(ClearType::CurrentLine));
                let _ = err.flush();
                *line = ProgressLine::default();
            }
        }
        eprintln!("{msg}");
    }

    fn label(name: &PackageName, version: &Version) -> String {
        format!("{} {}", name.as_str().cyan(), version.as_str().dark_grey())
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        if !self.quiet {
            self.println(&format!("{}", title.bold()));
        }
    }

    fn resolved(&self, name: &PackageName, version: &Version, platform: &Platform, entry: &PlatformEntry) {
        if self.quiet {
            return;
        }
        self.println(&format!(
            "  {} {}  {} {}",
            self.icons.pending.dark_grey(),
            Self::label(name, version),
            platform.describe().dark_grey(),
            entry.file_name().dark_grey()
        ));
    }

    fn downloading(&self, name: &PackageName, version: &Version, current: u64, total: Option<u64>) {
        if !self.live {
            return;
        }
        let Ok(mut line) = self.line.lock() else {
            return;
        };
        // Redraw at most every 64 KiB, plus the final chunk.
        let finished = total.is_some_and(|t| current >= t);
        if line.active && current.saturating_sub(line.last_drawn) < 64 * 1024 && !finished {
            return;
        }
        let mut err = stderr();
        let _ = crossterm::queue!(err, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = write!(
            err,
            "  {} {}  {}",
            self.icons.active.yellow(),
            Self::label(name, version),
            format_progress(current, total, BAR_WIDTH)
        );
        let _ = err.flush();
        line.active = true;
        line.last_drawn = current;
    }

    fn retrying(&self, name: &PackageName, version: &Version, attempt: u32, delay: Duration, reason: &str) {
        self.println(&format!(
            "  {} {}  attempt {attempt} failed ({reason}), retrying in {:.1}s",
            self.icons.warning.yellow(),
            Self::label(name, version),
            delay.as_secs_f64()
        ));
    }

    fn verifying(&self, name: &PackageName, version: &Version) {
        if !self.quiet {
            self.println(&format!(
                "  {} {}  verifying sha256",
                self.icons.active.dark_grey(),
                Self::label(name, version)
            ));
        }
    }

    fn installing(&self, name: &PackageName, version: &Version) {
        if !self.quiet {
            self.println(&format!(
                "  {} {}  installing",
                self.icons.active.dark_grey(),
                Self::label(name, version)
            ));
        }
    }

    fn done(&self, name: &PackageName, version: &Version, detail: &str, size: Option<u64>) {
        let size = size.map(|s| format!(" ({})", format_size(s))).unwrap_or_default();
        self.println(&format!(
            "  {} {}  {detail}{}",
            self.icons.success.green(),
            Self::label(name, version),
            size.dark_grey()
        ));
    }

    fn failed(&self, name: &PackageName, version: &Version, reason: &str) {
        let label = if version.is_empty() {
            name.as_str().cyan().to_string()
        } else {
            Self::label(name, version)
        };
        self.println(&format!("  {} {label}  {}", self.icons.error.red(), reason.red()));
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            self.println(&format!("  {} {msg}", self.icons.info.blue()));
        }
    }

    fn warning(&self, msg: &str) {
        self.println(&format!("  {} {}", self.icons.warning.yellow(), msg.yellow()));
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        if self.quiet {
            return;
        }
        let noun = if count == 1 { "package" } else { "packages" };
        self.println(&format!(
            "\n{} {count} {noun} {action} in {elapsed_secs:.1}s",
            self.icons.success.green()
        ));
    }
}
