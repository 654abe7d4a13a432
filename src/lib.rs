//! Dropbox shared-link downloader library.
//!
//! Turns a list of Dropbox sharing links into zip archives on disk, optionally
//! unpacked, one link at a time.
//!
//! # Architecture
//!
//! - [`link`] - provider check and rewrite of links into direct downloads
//! - [`download`] - streaming transfer with retry, staging, publish, extraction
//! - [`batch`] - sequential processing of a link list with per-link isolation
//! - [`events`] - lifecycle events and the sinks that report them
//! - [`config`] - run configuration and per-link requests
//! - [`input`] - link list assembly (de-duplication, links files)
//! - [`interrupt`] - cooperative cancellation
//! - [`outcome`] - per-link terminal results

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod download;
pub mod events;
pub mod input;
pub mod interrupt;
pub mod link;
pub mod outcome;
mod user_agent;

// Re-export commonly used types
pub use batch::{BatchReport, BatchRunner, LinkOutcome};
pub use config::{Destination, DownloadConfig, DownloadRequest, SizePolicy};
pub use download::{
    DEFAULT_MAX_RETRIES, DownloadError, HttpClient, Interrupted, NoProgress, ProgressSink,
    RetryPolicy, Transferrer, format_bytes,
};
pub use events::{EventSink, LifecycleEvent, RecordingEvents, TracingEvents};
pub use interrupt::InterruptFlag;
pub use link::{LinkError, LinkNormalizer, NormalizedTarget, PROVIDER_HOST};
pub use outcome::{ErrorKind, Outcome, SkipReason};
