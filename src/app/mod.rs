//! Binary-only collaborators: progress rendering and exit codes.

pub(crate) mod exit_handler;
pub(crate) mod progress_bar;
