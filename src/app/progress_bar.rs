//! Terminal progress bar for the transfer in flight.

use std::sync::Mutex;

use dropbox_dl::{ProgressSink, format_bytes};
use indicatif::{ProgressBar, ProgressStyle};

/// Renders transfer progress with indicatif.
///
/// One bar per transfer; it is created on start and cleared on finish.
pub(crate) struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub(crate) fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock()
            && let Some(bar) = guard.as_ref()
        {
            f(bar);
        }
    }
}

impl ProgressSink for BarProgress {
    fn on_start(&self, file_name: &str, total: Option<u64>) {
        let bar = match total {
            Some(total) if total > 0 => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
                bar
            }
            _ => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner} {msg} {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        };
        bar.set_message(match total {
            Some(total) => format!("{file_name} ({})", format_bytes(total)),
            None => file_name.to_string(),
        });
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_progress(&self, bytes_so_far: u64, _total: Option<u64>) {
        self.with_bar(|bar| bar.set_position(bytes_so_far));
    }

    fn on_finish(&self) {
        if let Ok(mut guard) = self.bar.lock()
            && let Some(bar) = guard.take()
        {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_progress_lifecycle_without_total() {
        let progress = BarProgress::new();
        progress.on_start("photos.zip", None);
        progress.on_progress(1 << 20, None);
        progress.on_finish();
        assert!(progress.bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_bar_progress_ignores_progress_before_start() {
        let progress = BarProgress::new();
        progress.on_progress(10, Some(100));
        progress.on_finish();
    }
}
