//! UI Theme - icons and formatting helpers shared by every command.

/// Status icons for different states
#[derive(Debug, Clone, Copy)]
pub struct Icons {
    /// Pending/queued state (○)
    pub pending: &'static str,
    /// Active/in-progress state (●)
    pub active: &'static str,
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Info/Tip state (ℹ)
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            pending: "○",
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

/// Download progress as `▓▓▓░░░  42%  3.1 MB`, or just the running size
/// when the server sent no length.
pub fn format_progress(current: u64, total: Option<u64>, width: usize) -> String {
    let Some(total) = total.filter(|t| *t > 0) else {
        return format_size(current);
    };
    let ratio = (current as f64 / total as f64).min(1.0);
    let filled = (ratio * width as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "▓".repeat(filled),
        "░".repeat(width.saturating_sub(filled))
    );
    let pct = (ratio * 100.0) as u64;
    format!("{bar}  {pct:>3}%  {}", format_size(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024 * 5), "5.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_progress_with_total() {
        assert_eq!(format_progress(50, Some(100), 4), "▓▓░░   50%  100 B");
        assert_eq!(format_progress(200, Some(100), 2), "▓▓  100%  100 B");
    }

    #[test]
    fn test_progress_without_total() {
        assert_eq!(format_progress(2048, None, 10), "2.0 KB");
        assert_eq!(format_progress(10, Some(0), 10), "10 B");
    }
}
