//! Progress bar display for installs

use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;

use super::{MonotoneDisplay, ProgressUnit, TOTAL_UNITS};

/// Terminal progress bar following a [`ProgressUnit`] tree
pub struct ProgressDisplay {
    bar: ProgressBar,
    follower: Option<JoinHandle<()>>,
}

impl ProgressDisplay {
    /// Create a progress bar with a leading message
    pub fn new(message: impl Into<String>) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let bar = ProgressBar::new(TOTAL_UNITS);
        bar.set_style(style);
        bar.set_message(message.into());

        Self {
            bar,
            follower: None,
        }
    }

    /// Track `unit` until [`finish`](Self::finish) or [`abandon`](Self::abandon).
    ///
    /// Raw fractions go through a [`MonotoneDisplay`], so the bar never moves back.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn follow(&mut self, unit: &ProgressUnit) {
        let bar = self.bar.clone();
        let unit = unit.clone();
        let mut changes = unit.subscribe();

        self.follower = Some(tokio::spawn(async move {
            let mut display = MonotoneDisplay::new();
            loop {
                let shown = display.apply(unit.fraction());
                bar.set_position((shown * TOTAL_UNITS as f64).round() as u64);
                if changes.changed().await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Handle for hiding the bar around interactive prompts
    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }

    /// Finish with the bar full
    pub fn finish(mut self, message: impl Into<String>) {
        self.stop_following();
        self.bar.set_position(TOTAL_UNITS);
        self.bar.finish_with_message(message.into());
    }

    /// Abandon on error or cancellation, leaving the bar where it is
    pub fn abandon(mut self, message: impl Into<String>) {
        self.stop_following();
        self.bar.abandon_with_message(message.into());
    }

    fn stop_following(&mut self) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
    }
}

impl Drop for ProgressDisplay {
    fn drop(&mut self) {
        self.stop_following();
    }
}
