//! Run configuration and per-link requests.

use std::path::{Component, Path, PathBuf};

/// What to do when the received byte count differs from `Content-Length`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizePolicy {
    /// Remove the staging file and fail the link.
    #[default]
    Strict,
    /// Publish anyway and log a warning.
    Lenient,
}

/// Where downloads land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Directory receiving the archive (created if missing).
    pub directory: PathBuf,
    /// Archive name chosen by the operator, overriding the advertised one.
    pub name_hint: Option<String>,
}

impl Destination {
    /// Destination directory without a name hint.
    #[must_use]
    pub fn directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            name_hint: None,
        }
    }

    /// Interprets a `--dest` argument.
    ///
    /// A relative path made of a single plain segment (`photos`) names the
    /// archive and saves it in `cwd`. Anything else (`./photos`,
    /// `out/photos`, `/tmp`, `.`) is the target directory.
    #[must_use]
    pub fn from_arg(arg: &Path, cwd: &Path) -> Self {
        let mut components = arg.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(segment)), None) if !arg.as_os_str().is_empty() => Self {
                directory: cwd.to_path_buf(),
                name_hint: Some(segment.to_string_lossy().into_owned()),
            },
            _ => Self::directory(arg),
        }
    }
}

/// Settings shared by every link in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Where archives are written.
    pub destination: Destination,
    /// Unpack each archive after download.
    pub unzip: bool,
    /// Keep the archive after unpacking. Ignored unless `unzip` is set.
    pub retain_archive: bool,
    /// Handling of size mismatches.
    pub size_policy: SizePolicy,
}

impl DownloadConfig {
    /// Configuration for `destination` with every option off.
    #[must_use]
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            unzip: false,
            retain_archive: false,
            size_policy: SizePolicy::default(),
        }
    }

    /// Builds the request for one link.
    #[must_use]
    pub fn request_for(&self, source_url: &str) -> DownloadRequest {
        DownloadRequest {
            source_url: source_url.to_string(),
            destination: self.destination.clone(),
            unzip: self.unzip,
            retain_archive: self.unzip && self.retain_archive,
        }
    }
}

/// One link to download, with everything needed to place the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Link as supplied by the operator.
    pub source_url: String,
    /// Where the archive goes.
    pub destination: Destination,
    /// Unpack after download.
    pub unzip: bool,
    /// Keep the archive after unpacking.
    pub retain_archive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_single_segment_is_name_hint() {
        let dest = Destination::from_arg(Path::new("photos"), Path::new("/home/me"));
        assert_eq!(dest.directory, PathBuf::from("/home/me"));
        assert_eq!(dest.name_hint.as_deref(), Some("photos"));
    }

    #[test]
    fn test_destination_multi_segment_is_directory() {
        let dest = Destination::from_arg(Path::new("out/photos"), Path::new("/home/me"));
        assert_eq!(dest, Destination::directory("out/photos"));
    }

    #[test]
    fn test_destination_dot_prefixed_is_directory() {
        let dest = Destination::from_arg(Path::new("./photos"), Path::new("/home/me"));
        assert_eq!(dest.name_hint, None);
        let dest = Destination::from_arg(Path::new("."), Path::new("/home/me"));
        assert_eq!(dest, Destination::directory("."));
    }

    #[test]
    fn test_destination_absolute_is_directory() {
        let dest = Destination::from_arg(Path::new("/srv/downloads"), Path::new("/home/me"));
        assert_eq!(dest, Destination::directory("/srv/downloads"));
    }

    #[test]
    fn test_request_ignores_retain_without_unzip() {
        let mut config = DownloadConfig::new(Destination::directory("/tmp"));
        config.retain_archive = true;
        let request = config.request_for("https://www.dropbox.com/s/a");
        assert!(!request.unzip);
        assert!(!request.retain_archive);

        config.unzip = true;
        let request = config.request_for("https://www.dropbox.com/s/a");
        assert!(request.unzip);
        assert!(request.retain_archive);
    }

    #[test]
    fn test_size_policy_defaults_to_strict() {
        assert_eq!(SizePolicy::default(), SizePolicy::Strict);
    }
}
