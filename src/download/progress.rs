//! Progress observation for streaming transfers.
//!
//! The transferrer notifies a [`ProgressSink`] after every chunk written to
//! the staging file. Sinks only observe; they cannot influence the transfer.

/// Unit suffixes for [`format_bytes`], base 1024.
const SUFFIXES: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Observer of transfer progress.
pub trait ProgressSink: Send + Sync {
    /// Called once the archive name and expected size are known.
    fn on_start(&self, _file_name: &str, _total: Option<u64>) {}

    /// Called after each chunk with the running byte count.
    fn on_progress(&self, bytes_so_far: u64, total: Option<u64>);

    /// Called when streaming stops, whatever the reason.
    fn on_finish(&self) {}
}

/// Sink that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _bytes_so_far: u64, _total: Option<u64>) {}
}

/// Formats a byte count with base-1024 suffixes, e.g. `1.50 MB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut index = 0;
    while value >= 1024.0 && index < SUFFIXES.len() - 1 {
        value /= 1024.0;
        index += 1;
    }
    if index == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", SUFFIXES[index])
    }
}
