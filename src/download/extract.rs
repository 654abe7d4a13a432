//! Zip extraction for published archives.

use std::fs::File;
use std::path::{Path, PathBuf};

use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use super::DownloadError;

/// Directory an archive unpacks into: `<archive dir>/<archive stem>`.
#[must_use]
pub fn extraction_dir(archive_path: &Path) -> PathBuf {
    let stem = archive_path
        .file_stem()
        .map_or_else(|| "archive".into(), |s| s.to_os_string());
    archive_path
        .parent()
        .map_or_else(|| PathBuf::from(&stem), |parent| parent.join(&stem))
}

/// Extracts every entry of `archive_path` into `dest_dir` on a blocking worker.
///
/// # Errors
///
/// Returns [`DownloadError::Extraction`] when the file is not a readable zip
/// archive or an entry can't be unpacked, and [`DownloadError::Io`] when the
/// destination can't be created.
pub async fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, DownloadError> {
    let archive_owned = archive_path.to_path_buf();
    let dest_owned = dest_dir.to_path_buf();

    spawn_blocking(move || extract_archive_blocking(&archive_owned, &dest_owned))
        .await
        .map_err(|e| {
            DownloadError::extraction(archive_path, format!("extraction task failed: {e}"))
        })?
}

/// Synchronous extraction used by [`extract_archive`].
///
/// Entries whose names would escape `dest_dir` are skipped.
///
/// # Errors
///
/// Same as [`extract_archive`].
pub fn extract_archive_blocking(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, DownloadError> {
    debug!(?archive_path, ?dest_dir, "opening zip archive");

    let file = File::open(archive_path).map_err(|e| DownloadError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        DownloadError::extraction(archive_path, format!("failed to read zip archive: {e}"))
    })?;

    std::fs::create_dir_all(dest_dir).map_err(|e| DownloadError::io(dest_dir, e))?;

    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| {
            DownloadError::extraction(archive_path, format!("failed to read zip entry: {e}"))
        })?;

        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!(entry = entry.name(), "skipping entry with unsafe path");
            continue;
        };
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| DownloadError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DownloadError::io(parent, e))?;
        }
        let mut out_file = File::create(&out_path).map_err(|e| DownloadError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out_file).map_err(|e| {
            DownloadError::extraction(
                archive_path,
                format!("failed to unpack {}: {e}", out_path.display()),
            )
        })?;
        extracted.push(out_path);
    }

    info!(
        ?archive_path,
        extracted_count = extracted.len(),
        "zip extraction complete"
    );
    Ok(extracted)
}
