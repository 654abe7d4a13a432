//! Filename resolution, sanitization, and staging paths for downloads.
//!
//! The provider always serves shared links as zip archives, so every resolved
//! name ends in `.zip` regardless of what the server advertises.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use super::constants::{ARCHIVE_EXTENSION, STAGING_SUFFIX};

/// Prefix of the name used when neither a hint nor a header provides one.
const DEFAULT_NAME_PREFIX: &str = "dropbox";

/// Picks the archive name for a download.
///
/// Priority: the operator's name hint, then the `Content-Disposition` header,
/// then a default derived from the source URL. The result is sanitized and
/// carries the `.zip` extension.
#[must_use]
pub fn resolve_archive_name(
    name_hint: Option<&str>,
    content_disposition: Option<&str>,
    source_url: &str,
) -> String {
    let advertised = content_disposition.and_then(parse_content_disposition);
    let chosen = name_hint
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .or(advertised)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.trim_matches('_').is_empty());

    match chosen {
        Some(name) => with_archive_extension(&name),
        None => default_archive_name(source_url),
    }
}

/// Deterministic fallback name: `dropbox-<first 8 hex digits of sha256(url)>.zip`.
///
/// Repeat runs of the same link land on the same name, while unrelated links
/// without a `Content-Disposition` header don't overwrite each other.
#[must_use]
pub fn default_archive_name(source_url: &str) -> String {
    let digest = Sha256::digest(source_url.as_bytes());
    let short: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{DEFAULT_NAME_PREFIX}-{short}.{ARCHIVE_EXTENSION}")
}

/// Replaces the last extension of `name` with `.zip` (or appends it).
#[must_use]
pub fn with_archive_extension(name: &str) -> String {
    Path::new(name)
        .with_extension(ARCHIVE_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

/// Staging path for a final path: `<final>.part` in the same directory.
#[must_use]
pub fn staging_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".");
    name.push(STAGING_SUFFIX);
    final_path.with_file_name(name)
}

/// Parses Content-Disposition header to extract filename.
///
/// Handles:
/// - `attachment; filename="example.zip"`
/// - `attachment; filename=example.zip`
/// - `attachment; filename*=UTF-8''example.zip` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        // Format: charset'language'encoded_value
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let encoded_name = encoded[..end].trim().trim_matches('"');
            if let Ok(decoded) = urlencoding::decode(encoded_name)
                && !decoded.is_empty()
            {
                return Some(decoded.into_owned());
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();

    if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"')?;
        let filename = &stripped[..end];
        return (!filename.is_empty()).then(|| filename.to_string());
    }

    let end = value.find(';').unwrap_or(value.len());
    let filename = value[..end].trim();
    (!filename.is_empty()).then(|| filename.to_string())
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
