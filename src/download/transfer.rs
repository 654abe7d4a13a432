//! Streaming transfer of one normalized link to disk.
//!
//! Lifecycle of a single transfer:
//!
//! ```text
//! Connecting -> Streaming -> Publishing -> Published (optionally Extracted)
//!                   |             |
//!                   |             +-> Failed (size mismatch, rename error)
//!                   +-> Interrupted -> staging removed
//!                   +-> Failed (network, filesystem) -> staging removed
//! ```
//!
//! Bytes go to `<name>.zip.part` first; the final name only ever appears via
//! an atomic rename after the byte count has been checked.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use super::client::HttpClient;
use super::constants::CHUNK_SIZE;
use super::error::DownloadError;
use super::extract::{extract_archive, extraction_dir};
use super::filename::{resolve_archive_name, staging_path};
use super::progress::ProgressSink;
use crate::config::{DownloadRequest, SizePolicy};
use crate::events::{EventSink, LifecycleEvent};
use crate::interrupt::InterruptFlag;
use crate::link::NormalizedTarget;
use crate::outcome::{ErrorKind, Outcome};

/// The operator cancelled the run. The staging file has already been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interrupted by user")]
pub struct Interrupted;

/// Downloads normalized links, publishing each as a zip archive.
pub struct Transferrer {
    client: HttpClient,
    events: Arc<dyn EventSink>,
    interrupt: InterruptFlag,
    size_policy: SizePolicy,
}

impl std::fmt::Debug for Transferrer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transferrer")
            .field("client", &self.client)
            .field("interrupt", &self.interrupt)
            .field("size_policy", &self.size_policy)
            .finish_non_exhaustive()
    }
}

/// Byte accounting for the transfer in flight.
#[derive(Debug)]
struct TransferState {
    expected_size: Option<u64>,
    bytes_written: u64,
    staging_path: PathBuf,
    final_path: PathBuf,
}

impl Transferrer {
    /// Creates a transferrer with the strict size policy.
    #[must_use]
    pub fn new(client: HttpClient, events: Arc<dyn EventSink>, interrupt: InterruptFlag) -> Self {
        Self {
            client,
            events,
            interrupt,
            size_policy: SizePolicy::default(),
        }
    }

    /// Sets how size mismatches are handled.
    #[must_use]
    pub fn with_size_policy(mut self, size_policy: SizePolicy) -> Self {
        self.size_policy = size_policy;
        self
    }

    /// Returns the interrupt flag this transferrer observes.
    #[must_use]
    pub fn interrupt(&self) -> &InterruptFlag {
        &self.interrupt
    }

    /// Downloads `target` according to `request`.
    ///
    /// Every per-link failure becomes [`Outcome::Failed`]; only an operator
    /// interrupt escapes as `Err`, after the staging file is cleaned up.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] when the interrupt flag is raised before the
    /// archive is published.
    #[instrument(skip_all, fields(url = %target.download_url))]
    pub async fn transfer(
        &self,
        target: &NormalizedTarget,
        request: &DownloadRequest,
        progress: &dyn ProgressSink,
    ) -> Result<Outcome, Interrupted> {
        match self.run(target, request, progress).await {
            Ok(outcome) => Ok(outcome),
            Err(error) if error.is_interrupted() => Err(Interrupted),
            Err(error) => Ok(Outcome::Failed {
                kind: error.kind().unwrap_or(ErrorKind::FilesystemError),
                detail: error.to_string(),
            }),
        }
    }

    async fn run(
        &self,
        target: &NormalizedTarget,
        request: &DownloadRequest,
        progress: &dyn ProgressSink,
    ) -> Result<Outcome, DownloadError> {
        let started = Instant::now();
        let url = target.download_url.as_str();

        let response = self.client.get(url, &self.interrupt).await?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let expected_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let file_name = resolve_archive_name(
            request.destination.name_hint.as_deref(),
            content_disposition.as_deref(),
            &target.source_url,
        );

        let directory = &request.destination.directory;
        tokio::fs::create_dir_all(directory)
            .await
            .map_err(|e| DownloadError::io(directory, e))?;

        let final_path = directory.join(&file_name);
        let mut state = TransferState {
            expected_size,
            bytes_written: 0,
            staging_path: staging_path(&final_path),
            final_path,
        };
        debug!(staging = %state.staging_path.display(), ?expected_size, "resolved output paths");

        self.events.emit(&LifecycleEvent::Downloading {
            url: url.to_string(),
            file_name: file_name.clone(),
            expected_size,
        });

        progress.on_start(&file_name, expected_size);
        let streamed = self
            .stream_to_staging(response, url, &mut state, progress)
            .await;
        progress.on_finish();

        let published = match streamed {
            Ok(()) => publish_staging(&state, self.size_policy).await,
            Err(error) => Err(error),
        };
        if let Err(error) = published {
            self.discard_staging(&state.staging_path).await;
            return Err(error);
        }
        let elapsed = started.elapsed();

        let extracted_to = if request.unzip {
            Some(self.extract(&state.final_path, request.retain_archive).await?)
        } else {
            None
        };

        Ok(Outcome::Success {
            path: state.final_path,
            elapsed,
            extracted_to,
        })
    }

    /// Streams the body into the staging file in [`CHUNK_SIZE`] writes.
    async fn stream_to_staging(
        &self,
        response: reqwest::Response,
        url: &str,
        state: &mut TransferState,
        progress: &dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        let staging = state.staging_path.clone();
        let mut file = File::create(&staging)
            .await
            .map_err(|e| DownloadError::io(&staging, e))?;
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::with_capacity(CHUNK_SIZE);

        loop {
            let next = tokio::select! {
                biased;
                () = self.interrupt.raised() => return Err(DownloadError::interrupted(url)),
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return Err(body_error(url, state, buffer.len(), e)),
            };
            buffer.extend_from_slice(&chunk);

            while buffer.len() >= CHUNK_SIZE {
                if self.interrupt.is_raised() {
                    return Err(DownloadError::interrupted(url));
                }
                file.write_all(&buffer[..CHUNK_SIZE])
                    .await
                    .map_err(|e| DownloadError::io(&staging, e))?;
                buffer.drain(..CHUNK_SIZE);
                state.bytes_written += CHUNK_SIZE as u64;
                progress.on_progress(state.bytes_written, state.expected_size);
            }
        }

        if !buffer.is_empty() {
            if self.interrupt.is_raised() {
                return Err(DownloadError::interrupted(url));
            }
            file.write_all(&buffer)
                .await
                .map_err(|e| DownloadError::io(&staging, e))?;
            state.bytes_written += buffer.len() as u64;
            progress.on_progress(state.bytes_written, state.expected_size);
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::io(&staging, e))?;
        file.sync_all()
            .await
            .map_err(|e| DownloadError::io(&staging, e))?;
        Ok(())
    }

    /// Removes a staging file; failures are reported, never raised.
    async fn discard_staging(&self, staging: &Path) {
        if let Err(e) = remove_if_exists(staging).await {
            self.events.emit(&LifecycleEvent::CleanupFailed {
                path: staging.to_path_buf(),
                detail: e.to_string(),
            });
        }
    }

    /// Unpacks a published archive next to it and optionally deletes it.
    async fn extract(&self, archive: &Path, retain_archive: bool) -> Result<PathBuf, DownloadError> {
        let directory = extraction_dir(archive);
        let files = extract_archive(archive, &directory).await?;
        self.events.emit(&LifecycleEvent::Extracted {
            archive: archive.to_path_buf(),
            directory: directory.clone(),
            entries: files.len(),
        });

        if !retain_archive {
            tokio::fs::remove_file(archive)
                .await
                .map_err(|e| DownloadError::io(archive, e))?;
            self.events.emit(&LifecycleEvent::ArchiveRemoved {
                path: archive.to_path_buf(),
            });
        }
        Ok(directory)
    }
}

/// Maps a body stream error.
///
/// A connection that ends before the advertised length is a size mismatch;
/// timeouts and streams of unknown length stay network errors.
fn body_error(
    url: &str,
    state: &TransferState,
    buffered: usize,
    error: reqwest::Error,
) -> DownloadError {
    let received = state.bytes_written + buffered as u64;
    match state.expected_size {
        Some(expected) if received < expected && !error.is_timeout() => {
            debug!(%error, expected, received, "body ended early");
            DownloadError::size_mismatch(&state.staging_path, expected, received)
        }
        _ => DownloadError::network(url, error),
    }
}

/// Checks the byte count and renames the staging file onto the final path.
///
/// Under [`SizePolicy::Strict`] a mismatch fails, leaving the staging file
/// for the caller to discard; under [`SizePolicy::Lenient`] it is logged and
/// published anyway. An unknown expected size skips the check.
async fn publish_staging(state: &TransferState, policy: SizePolicy) -> Result<(), DownloadError> {
    if let Some(expected) = state.expected_size
        && expected != state.bytes_written
    {
        match policy {
            SizePolicy::Strict => {
                return Err(DownloadError::size_mismatch(
                    &state.staging_path,
                    expected,
                    state.bytes_written,
                ));
            }
            SizePolicy::Lenient => warn!(
                expected,
                actual = state.bytes_written,
                path = %state.final_path.display(),
                "size mismatch, publishing anyway"
            ),
        }
    }

    tokio::fs::rename(&state.staging_path, &state.final_path)
        .await
        .map_err(|e| DownloadError::io(&state.final_path, e))
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::events::RecordingEvents;

    fn state_in(dir: &Path, expected_size: Option<u64>, bytes_written: u64) -> TransferState {
        let final_path = dir.join("photos.zip");
        TransferState {
            expected_size,
            bytes_written,
            staging_path: staging_path(&final_path),
            final_path,
        }
    }

    #[tokio::test]
    async fn test_publish_renames_when_sizes_match() {
        let temp = TempDir::new().unwrap();
        let state = state_in(temp.path(), Some(5), 5);
        std::fs::write(&state.staging_path, b"hello").unwrap();

        publish_staging(&state, SizePolicy::Strict).await.unwrap();

        assert!(!state.staging_path.exists());
        assert_eq!(std::fs::read(&state.final_path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_publish_without_expected_size_skips_check() {
        let temp = TempDir::new().unwrap();
        let state = state_in(temp.path(), None, 5);
        std::fs::write(&state.staging_path, b"hello").unwrap();

        publish_staging(&state, SizePolicy::Strict).await.unwrap();
        assert!(state.final_path.exists());
    }

    #[tokio::test]
    async fn test_publish_strict_mismatch_fails_without_publishing() {
        let temp = TempDir::new().unwrap();
        let state = state_in(temp.path(), Some(100), 5);
        std::fs::write(&state.staging_path, b"hello").unwrap();

        let error = publish_staging(&state, SizePolicy::Strict).await.unwrap_err();

        assert_eq!(error.kind(), Some(ErrorKind::SizeMismatch));
        assert!(!state.final_path.exists(), "nothing may be published");
    }

    #[tokio::test]
    async fn test_discard_staging_removes_file_silently() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("photos.zip.part");
        std::fs::write(&staging, b"partial").unwrap();
        let events = Arc::new(RecordingEvents::new());
        let transferrer = Transferrer::new(HttpClient::new(), events.clone(), InterruptFlag::new());

        transferrer.discard_staging(&staging).await;

        assert!(!staging.exists());
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn test_discard_staging_reports_failure_through_sink() {
        let temp = TempDir::new().unwrap();
        // A directory can't be removed with remove_file.
        let staging = temp.path().join("photos.zip.part");
        std::fs::create_dir(&staging).unwrap();
        let events = Arc::new(RecordingEvents::new());
        let transferrer = Transferrer::new(HttpClient::new(), events.clone(), InterruptFlag::new());

        transferrer.discard_staging(&staging).await;

        let recorded = events.events();
        assert_eq!(recorded.len(), 1);
        assert!(matches!(
            &recorded[0],
            LifecycleEvent::CleanupFailed { path, .. } if *path == staging
        ));
    }

    #[tokio::test]
    async fn test_publish_lenient_mismatch_still_publishes() {
        let temp = TempDir::new().unwrap();
        let state = state_in(temp.path(), Some(100), 5);
        std::fs::write(&state.staging_path, b"hello").unwrap();

        publish_staging(&state, SizePolicy::Lenient).await.unwrap();
        assert!(state.final_path.exists());
    }

    #[tokio::test]
    async fn test_publish_overwrites_previous_download() {
        let temp = TempDir::new().unwrap();
        let state = state_in(temp.path(), Some(3), 3);
        std::fs::write(&state.final_path, b"old contents").unwrap();
        std::fs::write(&state.staging_path, b"new").unwrap();

        publish_staging(&state, SizePolicy::Strict).await.unwrap();
        assert_eq!(std::fs::read(&state.final_path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_remove_if_exists_ignores_missing_file() {
        let temp = TempDir::new().unwrap();
        remove_if_exists(&temp.path().join("missing.zip.part"))
            .await
            .unwrap();
    }
}
