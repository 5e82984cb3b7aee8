//! Terminal progress display for pool builds and mosaic renders

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static PHASE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    let template = format!(
        "[{{elapsed_precise}}] {{prefix:>8}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Hands out one progress bar per pipeline phase
///
/// When disabled every bar is hidden, so callers never need to branch on
/// whether progress is shown.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgressManager {
    /// Create a progress manager, visible only when `enabled`
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    /// Whether bars are drawn
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start a bar labelled `phase` expecting `total` steps
    pub fn phase(&self, phase: &'static str, total: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total);
        bar.set_style(PHASE_STYLE.clone());
        bar.set_prefix(phase);
        self.multi_progress.add(bar)
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        let _ = self.multi_progress.clear();
    }
}
