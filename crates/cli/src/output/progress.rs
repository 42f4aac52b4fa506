//! Progress indication for transfers and sync runs
//!
//! Progress goes to stderr and is suppressed in quiet, JSON or no-progress mode.

use std::time::Duration;

use indicatif::ProgressStyle;

use super::OutputConfig;

const SPINNER_TEMPLATE: &str = "{spinner:.green} {pos} files {msg}";

/// Progress bar wrapper
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    fn hidden(config: &OutputConfig) -> bool {
        config.quiet || config.json || config.no_progress
    }

    /// Create a spinner counting completed items
    pub fn spinner(config: &OutputConfig, message: &str) -> Self {
        let bar = (!Self::hidden(config)).then(|| {
            let bar = indicatif::ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_message(message.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        Self { bar }
    }

    /// Increment progress
    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Set message
    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Check if progress bar is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}
