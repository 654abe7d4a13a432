//! Error types for the download module.
//!
//! Every variant carries the URL or path needed to diagnose the failure from
//! a single log line.

use std::path::PathBuf;

use thiserror::Error;

use crate::outcome::ErrorKind;

/// Errors that can occur while transferring, publishing or extracting a file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, broken body stream, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read timed out.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error (create directory, write, rename, remove).
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Received byte count does not match the advertised content length.
    #[error("size mismatch for {path}: expected {expected_bytes} bytes, got {actual_bytes}")]
    SizeMismatch {
        /// Staging path that failed verification.
        path: PathBuf,
        /// Advertised size in bytes.
        expected_bytes: u64,
        /// Bytes actually written.
        actual_bytes: u64,
    },

    /// The published file could not be unpacked.
    #[error("failed to extract {archive}: {reason}")]
    Extraction {
        /// Archive that failed to unpack.
        archive: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The operator cancelled the run while this URL was in flight.
    #[error("interrupted while downloading {url}")]
    Interrupted {
        /// The URL being downloaded.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a size mismatch error.
    pub fn size_mismatch(path: impl Into<PathBuf>, expected_bytes: u64, actual_bytes: u64) -> Self {
        Self::SizeMismatch {
            path: path.into(),
            expected_bytes,
            actual_bytes,
        }
    }

    /// Creates an extraction error.
    pub fn extraction(archive: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Extraction {
            archive: archive.into(),
            reason: reason.into(),
        }
    }

    /// Creates an interruption marker.
    pub fn interrupted(url: impl Into<String>) -> Self {
        Self::Interrupted { url: url.into() }
    }

    /// Returns true when the error is the operator's cancellation.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    /// Maps the error onto the per-link failure taxonomy.
    ///
    /// Returns `None` for [`DownloadError::Interrupted`], which is not a
    /// per-link failure but aborts the whole batch.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Network { .. } => Some(ErrorKind::NetworkError),
            Self::Timeout { .. } => Some(ErrorKind::Timeout),
            Self::HttpStatus { .. } => Some(ErrorKind::HttpStatusError),
            Self::Io { .. } => Some(ErrorKind::FilesystemError),
            Self::SizeMismatch { .. } => Some(ErrorKind::SizeMismatch),
            Self::Extraction { .. } => Some(ErrorKind::ExtractionError),
            Self::Interrupted { .. } => None,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path, which the source errors don't carry.
