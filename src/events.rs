//! Lifecycle events and the sinks that report them.
//!
//! Components receive an [`EventSink`] instead of logging through a global,
//! so tests can capture exactly what an operator would have seen.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::download::format_bytes;
use crate::outcome::{ErrorKind, SkipReason};

/// One observable step in the life of a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Processing of a link began.
    Started {
        /// Link as supplied by the operator.
        url: String,
    },
    /// The server answered and streaming is about to begin.
    Downloading {
        /// Normalized download URL.
        url: String,
        /// Resolved archive name.
        file_name: String,
        /// Advertised size, when known.
        expected_size: Option<u64>,
    },
    /// The archive was published under its final name.
    Succeeded {
        /// Link as supplied by the operator.
        url: String,
        /// Final archive path.
        path: PathBuf,
        /// Time from first request to publication.
        elapsed: Duration,
    },
    /// The archive was unpacked.
    Extracted {
        /// Archive that was unpacked.
        archive: PathBuf,
        /// Directory holding the contents.
        directory: PathBuf,
        /// Number of files written.
        entries: usize,
    },
    /// The archive was deleted after extraction.
    ArchiveRemoved {
        /// Deleted archive path.
        path: PathBuf,
    },
    /// The link was skipped without network traffic.
    Skipped {
        /// Link as supplied by the operator.
        url: String,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// The link failed.
    Failed {
        /// Link as supplied by the operator.
        url: String,
        /// Failure classification.
        kind: ErrorKind,
        /// Underlying detail.
        detail: String,
    },
    /// The operator interrupted the run while this link was in flight.
    Interrupted {
        /// Link as supplied by the operator.
        url: String,
    },
    /// A staging file could not be removed.
    CleanupFailed {
        /// Path left behind.
        path: PathBuf,
        /// IO error text.
        detail: String,
    },
}

/// Receiver of lifecycle events.
pub trait EventSink: Send + Sync {
    /// Records one event. Must not block for long or panic.
    fn emit(&self, event: &LifecycleEvent);
}

/// Sink that writes each event as a `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn emit(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Started { url } => info!(%url, "Processing link"),
            LifecycleEvent::Downloading {
                url,
                file_name,
                expected_size,
            } => info!(
                %url,
                file = %file_name,
                size = %expected_size.map_or_else(|| "unknown".to_string(), format_bytes),
                "Downloading file"
            ),
            LifecycleEvent::Succeeded { url, path, elapsed } => info!(
                %url,
                path = %path.display(),
                elapsed = ?elapsed,
                "Downloaded"
            ),
            LifecycleEvent::Extracted {
                archive,
                directory,
                entries,
            } => info!(
                archive = %archive.display(),
                directory = %directory.display(),
                entries,
                "Extracted"
            ),
            LifecycleEvent::ArchiveRemoved { path } => info!(path = %path.display(), "Removed archive"),
            LifecycleEvent::Skipped { url, reason } => match reason.kind() {
                Some(kind) => warn!(%url, %kind, %reason, "Skipping link"),
                None => warn!(%url, %reason, "Skipping link"),
            },
            LifecycleEvent::Failed { url, kind, detail } => {
                error!(%url, %kind, %detail, "Download failed");
            }
            LifecycleEvent::Interrupted { url } => {
                error!(%url, "Interrupted by user, removed incomplete file");
            }
            LifecycleEvent::CleanupFailed { path, detail } => {
                error!(path = %path.display(), %detail, "Unable to remove incomplete file");
            }
        }
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingEvents {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: &LifecycleEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_events_keeps_order() {
        let sink = RecordingEvents::new();
        sink.emit(&LifecycleEvent::Started {
            url: "https://www.dropbox.com/s/a".to_string(),
        });
        sink.emit(&LifecycleEvent::Interrupted {
            url: "https://www.dropbox.com/s/a".to_string(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LifecycleEvent::Started { .. }));
        assert!(matches!(events[1], LifecycleEvent::Interrupted { .. }));
    }

    #[test]
    fn test_tracing_events_accepts_every_variant() {
        let sink = TracingEvents;
        sink.emit(&LifecycleEvent::Downloading {
            url: "https://www.dropbox.com/s/a?dl=1".to_string(),
            file_name: "a.zip".to_string(),
            expected_size: None,
        });
        sink.emit(&LifecycleEvent::CleanupFailed {
            path: PathBuf::from("/tmp/a.zip.part"),
            detail: "permission denied".to_string(),
        });
    }
}
