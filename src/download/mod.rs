//! HTTP download pipeline: streaming transfer, atomic publish, extraction.
//!
//! # Features
//!
//! - Streaming downloads written in 1 MiB chunks to a `.part` staging file
//! - Retry with exponential backoff for connection errors and timeouts
//! - Filename from the operator's hint or the Content-Disposition header
//! - Byte-count verification before an atomic rename to the final name
//! - Optional zip extraction with archive cleanup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dropbox_dl::config::{Destination, DownloadConfig};
//! use dropbox_dl::download::{HttpClient, NoProgress, Transferrer};
//! use dropbox_dl::events::TracingEvents;
//! use dropbox_dl::interrupt::InterruptFlag;
//! use dropbox_dl::link::LinkNormalizer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let target = LinkNormalizer::dropbox().normalize("https://www.dropbox.com/sh/abc/xyz?dl=0")?;
//! let config = DownloadConfig::new(Destination::directory("./downloads"));
//! let transferrer = Transferrer::new(HttpClient::new(), Arc::new(TracingEvents), InterruptFlag::new());
//! let outcome = transferrer
//!     .transfer(&target, &config.request_for(&target.source_url), &NoProgress)
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
pub mod extract;
mod filename;
mod progress;
mod retry;
mod transfer;

pub use client::HttpClient;
pub use constants::DEFAULT_MAX_RETRIES;
pub use error::DownloadError;
pub use filename::{default_archive_name, resolve_archive_name, staging_path, with_archive_extension};
pub use progress::{NoProgress, ProgressSink, format_bytes};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
pub use transfer::{Interrupted, Transferrer};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
