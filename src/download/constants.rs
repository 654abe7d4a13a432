//! Constants for the download module (timeouts, chunking, retry defaults).

use std::time::Duration;

/// HTTP connect timeout (60 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 60;

/// HTTP read timeout between body reads (60 seconds).
pub const READ_TIMEOUT_SECS: u64 = 60;

/// Size of each chunk written to the staging file (1 MiB).
pub const CHUNK_SIZE: usize = 1 << 20;

/// Suffix appended to the final file name while the transfer is in flight.
pub const STAGING_SUFFIX: &str = "part";

/// Extension every published download receives.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Default number of retries for transient connection failures.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Delay before the first retry; later retries double it.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Upper bound for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(120);
