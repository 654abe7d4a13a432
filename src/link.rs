//! Provider link validation and rewriting.
//!
//! Shared links normally open a preview page. Forcing the `dl` query flag to
//! `1` makes the provider stream the file (or a zip of the folder) instead.

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::outcome::SkipReason;

/// Host every accepted link must point at.
pub const PROVIDER_HOST: &str = "www.dropbox.com";

/// Query flag that switches between preview and download.
const DOWNLOAD_FLAG: &str = "dl";

/// Value of [`DOWNLOAD_FLAG`] that requests a direct download.
const DOWNLOAD_VALUE: &str = "1";

/// A link that passed provenance checks and was rewritten for direct download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTarget {
    /// URL to request.
    pub download_url: String,
    /// Host the URL points at; always the expected provider host.
    pub origin_host: String,
    /// Link as supplied by the operator.
    pub source_url: String,
}

/// Reasons a link is rejected before any request is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkError {
    /// The input could not be parsed as an absolute URL.
    #[error("invalid URL {url}: {detail}")]
    InvalidUrl {
        /// Input text.
        url: String,
        /// Parser message.
        detail: String,
    },

    /// The URL points at a host other than the provider.
    #[error("{url} does not belong to {expected}")]
    HostMismatch {
        /// Input text.
        url: String,
        /// Host found in the URL, if any.
        host: Option<String>,
        /// Host that was required.
        expected: String,
    },
}

impl LinkError {
    /// Converts the rejection into the reason reported for a skipped link.
    #[must_use]
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::InvalidUrl { detail, .. } => SkipReason::InvalidUrl {
                detail: detail.clone(),
            },
            Self::HostMismatch { host, .. } => SkipReason::HostMismatch { host: host.clone() },
        }
    }
}

/// Validates links against the provider host and rewrites them for download.
#[derive(Debug, Clone)]
pub struct LinkNormalizer {
    expected_host: String,
}

impl Default for LinkNormalizer {
    fn default() -> Self {
        Self::dropbox()
    }
}

impl LinkNormalizer {
    /// Creates a normalizer accepting only `expected_host`.
    #[must_use]
    pub fn new(expected_host: impl Into<String>) -> Self {
        Self {
            expected_host: expected_host.into().to_ascii_lowercase(),
        }
    }

    /// Creates a normalizer for [`PROVIDER_HOST`].
    #[must_use]
    pub fn dropbox() -> Self {
        Self::new(PROVIDER_HOST)
    }

    /// Returns the host links must point at.
    #[must_use]
    pub fn expected_host(&self) -> &str {
        &self.expected_host
    }

    /// Validates `url` and forces its download flag.
    ///
    /// Path and fragment are untouched; other query parameters keep their
    /// order and exact spelling.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidUrl`] when `url` doesn't parse or isn't
    /// http(s), and [`LinkError::HostMismatch`] when its host isn't the
    /// expected one.
    pub fn normalize(&self, url: &str) -> Result<NormalizedTarget, LinkError> {
        let trimmed = url.trim();
        let mut parsed = Url::parse(trimmed).map_err(|e| LinkError::InvalidUrl {
            url: trimmed.to_string(),
            detail: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LinkError::InvalidUrl {
                url: trimmed.to_string(),
                detail: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let host = parsed.host_str().map(str::to_ascii_lowercase);
        if host.as_deref() != Some(self.expected_host.as_str()) {
            return Err(LinkError::HostMismatch {
                url: trimmed.to_string(),
                host,
                expected: self.expected_host.clone(),
            });
        }

        let query = force_download_flag(parsed.query());
        parsed.set_query(Some(&query));
        debug!(source = %trimmed, download = %parsed, "normalized link");

        Ok(NormalizedTarget {
            download_url: parsed.to_string(),
            origin_host: self.expected_host.clone(),
            source_url: trimmed.to_string(),
        })
    }
}

/// Returns `query` with every `dl` parameter set to `1`, appending one if absent.
fn force_download_flag(query: Option<&str>) -> String {
    let mut found = false;
    let mut params: Vec<String> = query
        .unwrap_or_default()
        .split('&')
        .filter(|param| !param.is_empty())
        .map(|param| {
            let key = param.split_once('=').map_or(param, |(key, _)| key);
            if key == DOWNLOAD_FLAG {
                found = true;
                format!("{DOWNLOAD_FLAG}={DOWNLOAD_VALUE}")
            } else {
                param.to_string()
            }
        })
        .collect();

    if !found {
        params.push(format!("{DOWNLOAD_FLAG}={DOWNLOAD_VALUE}"));
    }
    params.join("&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn normalize(url: &str) -> Result<NormalizedTarget, LinkError> {
        LinkNormalizer::dropbox().normalize(url)
    }

    #[test]
    fn test_normalize_forces_preview_flag_to_download() {
        let target = normalize("https://www.dropbox.com/s/abc123/photo.jpg?dl=0").unwrap();
        assert_eq!(
            target.download_url,
            "https://www.dropbox.com/s/abc123/photo.jpg?dl=1"
        );
        assert_eq!(target.origin_host, PROVIDER_HOST);
    }

    #[test]
    fn test_normalize_appends_flag_when_query_absent() {
        let target = normalize("https://www.dropbox.com/sh/abc123/folder").unwrap();
        assert_eq!(
            target.download_url,
            "https://www.dropbox.com/sh/abc123/folder?dl=1"
        );
    }

    #[test]
    fn test_normalize_appends_flag_after_existing_params() {
        let target = normalize("https://www.dropbox.com/scl/fo/abc/xyz?rlkey=k3y&st=x%20y").unwrap();
        assert_eq!(
            target.download_url,
            "https://www.dropbox.com/scl/fo/abc/xyz?rlkey=k3y&st=x%20y&dl=1"
        );
    }

    #[test]
    fn test_normalize_rewrites_flag_in_middle_of_query() {
        let target = normalize("https://www.dropbox.com/scl/fi/abc/a.zip?rlkey=k&dl=0&e=1").unwrap();
        assert_eq!(
            target.download_url,
            "https://www.dropbox.com/scl/fi/abc/a.zip?rlkey=k&dl=1&e=1"
        );
    }

    #[test]
    fn test_normalize_keeps_already_downloadable_link() {
        let url = "https://www.dropbox.com/s/abc/a.zip?dl=1";
        assert_eq!(normalize(url).unwrap().download_url, url);
    }

    #[test]
    fn test_normalize_empty_query_gets_single_flag() {
        let target = normalize("https://www.dropbox.com/s/abc/a.zip?").unwrap();
        assert_eq!(target.download_url, "https://www.dropbox.com/s/abc/a.zip?dl=1");
    }

    #[test]
    fn test_normalize_does_not_touch_similar_keys() {
        let target = normalize("https://www.dropbox.com/s/abc/a.zip?xdl=0").unwrap();
        assert_eq!(
            target.download_url,
            "https://www.dropbox.com/s/abc/a.zip?xdl=0&dl=1"
        );
    }

    #[test]
    fn test_normalize_preserves_source_url() {
        let target = normalize("  https://www.dropbox.com/s/abc/a.zip?dl=0 ").unwrap();
        assert_eq!(target.source_url, "https://www.dropbox.com/s/abc/a.zip?dl=0");
    }

    #[test]
    fn test_normalize_rejects_other_hosts() {
        let error = normalize("https://dropbox.com.evil.example/s/abc?dl=0").unwrap_err();
        match &error {
            LinkError::HostMismatch { host, expected, .. } => {
                assert_eq!(host.as_deref(), Some("dropbox.com.evil.example"));
                assert_eq!(expected, PROVIDER_HOST);
            }
            LinkError::InvalidUrl { .. } => panic!("expected host mismatch, got {error:?}"),
        }
        assert!(matches!(
            error.skip_reason(),
            SkipReason::HostMismatch { .. }
        ));
    }

    #[test]
    fn test_normalize_rejects_bare_provider_domain() {
        let error = normalize("https://dropbox.com/s/abc?dl=0").unwrap_err();
        assert!(matches!(error, LinkError::HostMismatch { .. }));
    }

    #[test]
    fn test_normalize_host_match_is_case_insensitive() {
        assert!(normalize("https://WWW.Dropbox.com/s/abc").is_ok());
    }

    #[test]
    fn test_normalize_rejects_unparseable_input() {
        let error = normalize("not a url").unwrap_err();
        assert!(matches!(error, LinkError::InvalidUrl { .. }));
        assert!(matches!(error.skip_reason(), SkipReason::InvalidUrl { .. }));
    }

    #[test]
    fn test_normalize_rejects_non_http_scheme() {
        let error = normalize("ftp://www.dropbox.com/s/abc/file").unwrap_err();
        match &error {
            LinkError::InvalidUrl { detail, .. } => assert!(detail.contains("ftp"), "{detail}"),
            LinkError::HostMismatch { .. } => panic!("expected invalid URL, got {error:?}"),
        }
    }

    #[test]
    fn test_custom_expected_host() {
        let normalizer = LinkNormalizer::new("127.0.0.1");
        let target = normalizer.normalize("http://127.0.0.1:8080/s/a").unwrap();
        assert_eq!(target.download_url, "http://127.0.0.1:8080/s/a?dl=1");
        assert_eq!(normalizer.expected_host(), "127.0.0.1");
    }
}
