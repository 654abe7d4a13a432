//! Terminal results of a single link.
//!
//! Every requested link yields exactly one [`Outcome`]. Outcomes are reported
//! through the event sink and collected in the batch report; they are never
//! persisted.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Classification of per-link failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Link does not belong to the provider host.
    HostMismatch,
    /// Connection could not be established or broke mid-transfer.
    NetworkError,
    /// Connect or read timed out.
    Timeout,
    /// Server answered with a non-success status.
    HttpStatusError,
    /// Bytes received differ from the advertised content length.
    SizeMismatch,
    /// Downloaded file is not a readable zip archive, or unpacking failed.
    ExtractionError,
    /// Directory creation, write, rename or removal failed.
    FilesystemError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::HostMismatch => "host mismatch",
            Self::NetworkError => "network error",
            Self::Timeout => "timeout",
            Self::HttpStatusError => "HTTP status error",
            Self::SizeMismatch => "size mismatch",
            Self::ExtractionError => "extraction error",
            Self::FilesystemError => "filesystem error",
        };
        f.write_str(label)
    }
}

/// Why a link was skipped without any network traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The link points at a host other than the provider.
    HostMismatch {
        /// Host found in the link, if any.
        host: Option<String>,
    },
    /// The link could not be parsed as a URL.
    InvalidUrl {
        /// Parser message.
        detail: String,
    },
}

impl SkipReason {
    /// Returns the error kind this skip corresponds to, if any.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::HostMismatch { .. } => Some(ErrorKind::HostMismatch),
            Self::InvalidUrl { .. } => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostMismatch { host: Some(host) } => write!(f, "host {host} is not the provider"),
            Self::HostMismatch { host: None } => write!(f, "link has no host"),
            Self::InvalidUrl { detail } => write!(f, "invalid URL: {detail}"),
        }
    }
}

/// Terminal result for one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The archive was published (and possibly extracted).
    Success {
        /// Final archive path. May no longer exist when extraction removed it.
        path: PathBuf,
        /// Time from the first request to publication.
        elapsed: Duration,
        /// Directory the archive was unpacked into, when extraction ran.
        extracted_to: Option<PathBuf>,
    },
    /// The link was not attempted.
    Skipped {
        /// Reason for skipping.
        reason: SkipReason,
    },
    /// The link was attempted and failed.
    Failed {
        /// Failure classification.
        kind: ErrorKind,
        /// Operator-facing detail, including URL or path context.
        detail: String,
    },
}

impl Outcome {
    /// Returns true for [`Outcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true for [`Outcome::Skipped`].
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Returns the failure kind for [`Outcome::Failed`].
    #[must_use]
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_host_mismatch_maps_to_kind() {
        let reason = SkipReason::HostMismatch {
            host: Some("example.com".to_string()),
        };
        assert_eq!(reason.kind(), Some(ErrorKind::HostMismatch));
        assert!(reason.to_string().contains("example.com"));
    }

    #[test]
    fn test_skip_reason_invalid_url_has_no_kind() {
        let reason = SkipReason::InvalidUrl {
            detail: "relative URL without a base".to_string(),
        };
        assert_eq!(reason.kind(), None);
    }

    #[test]
    fn test_outcome_predicates() {
        let failed = Outcome::Failed {
            kind: ErrorKind::Timeout,
            detail: "timeout downloading https://www.dropbox.com/s/a".to_string(),
        };
        assert!(!failed.is_success());
        assert!(!failed.is_skipped());
        assert_eq!(failed.failure_kind(), Some(ErrorKind::Timeout));

        let success = Outcome::Success {
            path: PathBuf::from("/tmp/a.zip"),
            elapsed: Duration::from_millis(5),
            extracted_to: None,
        };
        assert!(success.is_success());
        assert_eq!(success.failure_kind(), None);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::HttpStatusError.to_string(), "HTTP status error");
        assert_eq!(ErrorKind::SizeMismatch.to_string(), "size mismatch");
    }
}
