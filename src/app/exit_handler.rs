//! Exit code logic for the downloader process.
//!
//! Single responsibility: map a batch report to the process exit outcome.

use dropbox_dl::BatchReport;

/// Process exit categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every link succeeded or was skipped.
    Success,
    /// Some links succeeded, some failed.
    Partial,
    /// Every attempted link failed.
    Failure,
    /// The operator interrupted the run.
    Interrupted,
}

impl ProcessExit {
    pub(crate) fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
            Self::Interrupted => 130,
        }
    }
}

/// Determines the process exit outcome from a batch report.
pub(crate) fn determine_exit_outcome(report: &BatchReport) -> ProcessExit {
    if report.was_interrupted() {
        ProcessExit::Interrupted
    } else if report.failed() == 0 {
        ProcessExit::Success
    } else if report.succeeded() > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_outcome_success_for_empty_report() {
        assert_eq!(
            determine_exit_outcome(&BatchReport::default()),
            ProcessExit::Success
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Partial.code(), 2);
        assert_eq!(ProcessExit::Interrupted.code(), 130);
    }
}
