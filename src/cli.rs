//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use dropbox_dl::DEFAULT_MAX_RETRIES;

/// Download Dropbox shared files and folders as zip archives.
///
/// Links are processed one at a time. Links that don't point at
/// www.dropbox.com are skipped.
#[derive(Parser, Debug)]
#[command(name = "dropbox-dl")]
#[command(author, version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["links", "read"])))]
pub struct Args {
    /// Dropbox sharing links to download
    #[arg(long, num_args = 1.., value_name = "URL")]
    pub links: Vec<String>,

    /// Read links from a file, one per line
    #[arg(long, value_name = "FILE")]
    pub read: Option<PathBuf>,

    /// Download directory; a bare name (no slashes) saves as <NAME>.zip in the current directory
    #[arg(long, value_name = "PATH")]
    pub dest: Option<PathBuf>,

    /// Unzip downloaded archives into folders and delete the archives
    #[arg(long)]
    pub unzip: bool,

    /// Keep archives after unzipping
    #[arg(long = "retain-zip", alias = "retain_zip", requires = "unzip")]
    pub retain_zip: bool,

    /// Publish downloads whose size differs from the advertised Content-Length
    #[arg(long)]
    pub allow_size_mismatch: bool,

    /// Maximum retries for connection errors and timeouts (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
