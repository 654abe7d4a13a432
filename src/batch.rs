//! Sequential processing of a list of links.
//!
//! Each link is normalized, transferred and reported before the next one
//! starts. A failure only affects its own link; an operator interrupt stops
//! the whole batch.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::DownloadConfig;
use crate::download::{Interrupted, ProgressSink, Transferrer};
use crate::events::{EventSink, LifecycleEvent};
use crate::link::LinkNormalizer;
use crate::outcome::Outcome;

/// Outcome of one link, paired with the link as supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Link as supplied by the operator.
    pub url: String,
    /// What happened to it.
    pub outcome: Outcome,
}

/// Results of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    outcomes: Vec<LinkOutcome>,
    interrupted: bool,
}

impl BatchReport {
    /// Outcomes in input order. An interrupted link has no entry.
    #[must_use]
    pub fn outcomes(&self) -> &[LinkOutcome] {
        &self.outcomes
    }

    /// Returns true if the operator interrupted the run.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Number of links published successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    /// Number of links skipped before any request.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_skipped()).count()
    }

    /// Number of links that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.failure_kind().is_some())
            .count()
    }
}

/// Drives normalization and transfer for each link in order.
pub struct BatchRunner {
    normalizer: LinkNormalizer,
    transferrer: Transferrer,
    events: Arc<dyn EventSink>,
}

impl BatchRunner {
    /// Creates a runner. `events` receives per-link start and terminal events.
    #[must_use]
    pub fn new(
        normalizer: LinkNormalizer,
        transferrer: Transferrer,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            normalizer,
            transferrer,
            events,
        }
    }

    /// Processes `links` in order and returns one outcome per processed link.
    ///
    /// Stops early only when the interrupt flag is raised; the link in flight
    /// at that moment is cleaned up and reported as interrupted.
    #[instrument(skip_all, fields(links = links.len()))]
    pub async fn run(
        &self,
        links: &[String],
        config: &DownloadConfig,
        progress: &dyn ProgressSink,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for url in links {
            if self.transferrer.interrupt().is_raised() {
                debug!("interrupt raised, stopping before next link");
                report.interrupted = true;
                break;
            }

            self.events
                .emit(&LifecycleEvent::Started { url: url.clone() });

            let target = match self.normalizer.normalize(url) {
                Ok(target) => target,
                Err(error) => {
                    debug!(%error, "link rejected");
                    let reason = error.skip_reason();
                    self.events.emit(&LifecycleEvent::Skipped {
                        url: url.clone(),
                        reason: reason.clone(),
                    });
                    report.outcomes.push(LinkOutcome {
                        url: url.clone(),
                        outcome: Outcome::Skipped { reason },
                    });
                    continue;
                }
            };

            let request = config.request_for(url);
            match self.transferrer.transfer(&target, &request, progress).await {
                Ok(outcome) => {
                    self.report_outcome(url, &outcome);
                    report.outcomes.push(LinkOutcome {
                        url: url.clone(),
                        outcome,
                    });
                }
                Err(Interrupted) => {
                    self.events
                        .emit(&LifecycleEvent::Interrupted { url: url.clone() });
                    report.interrupted = true;
                    break;
                }
            }
        }

        report
    }

    fn report_outcome(&self, url: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Success { path, elapsed, .. } => {
                self.events.emit(&LifecycleEvent::Succeeded {
                    url: url.to_string(),
                    path: path.clone(),
                    elapsed: *elapsed,
                });
            }
            Outcome::Failed { kind, detail } => self.events.emit(&LifecycleEvent::Failed {
                url: url.to_string(),
                kind: *kind,
                detail: detail.clone(),
            }),
            Outcome::Skipped { reason } => self.events.emit(&LifecycleEvent::Skipped {
                url: url.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::config::Destination;
    use crate::download::{HttpClient, NoProgress};
    use crate::events::RecordingEvents;
    use crate::interrupt::InterruptFlag;
    use crate::outcome::{ErrorKind, SkipReason};

    fn runner(events: Arc<RecordingEvents>, interrupt: InterruptFlag) -> BatchRunner {
        let transferrer = Transferrer::new(HttpClient::new(), events.clone(), interrupt);
        BatchRunner::new(LinkNormalizer::dropbox(), transferrer, events)
    }

    #[test]
    fn test_batch_report_counters() {
        let report = BatchReport {
            outcomes: vec![
                LinkOutcome {
                    url: "a".to_string(),
                    outcome: Outcome::Success {
                        path: PathBuf::from("/tmp/a.zip"),
                        elapsed: Duration::from_secs(1),
                        extracted_to: None,
                    },
                },
                LinkOutcome {
                    url: "b".to_string(),
                    outcome: Outcome::Skipped {
                        reason: SkipReason::HostMismatch { host: None },
                    },
                },
                LinkOutcome {
                    url: "c".to_string(),
                    outcome: Outcome::Failed {
                        kind: ErrorKind::Timeout,
                        detail: "timeout".to_string(),
                    },
                },
            ],
            interrupted: false,
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.was_interrupted());
    }

    #[tokio::test]
    async fn test_run_skips_foreign_hosts_without_network() {
        let events = Arc::new(RecordingEvents::new());
        let runner = runner(events.clone(), InterruptFlag::new());
        let config = DownloadConfig::new(Destination::directory("/nonexistent/never-created"));
        let links = vec![
            "https://example.com/s/abc?dl=0".to_string(),
            "definitely not a url".to_string(),
        ];

        let report = runner.run(&links, &config, &NoProgress).await;

        assert_eq!(report.skipped(), 2);
        assert!(matches!(
            report.outcomes()[0].outcome,
            Outcome::Skipped {
                reason: SkipReason::HostMismatch { .. }
            }
        ));
        assert!(matches!(
            report.outcomes()[1].outcome,
            Outcome::Skipped {
                reason: SkipReason::InvalidUrl { .. }
            }
        ));
        assert!(
            !events
                .events()
                .iter()
                .any(|e| matches!(e, LifecycleEvent::Downloading { .. })),
            "no transfer may start for a rejected link"
        );
    }

    #[tokio::test]
    async fn test_run_stops_immediately_when_already_interrupted() {
        let events = Arc::new(RecordingEvents::new());
        let interrupt = InterruptFlag::new();
        interrupt.raise();
        let runner = runner(events.clone(), interrupt);
        let config = DownloadConfig::new(Destination::directory("/nonexistent"));
        let links = vec!["https://www.dropbox.com/s/abc?dl=0".to_string()];

        let report = runner.run(&links, &config, &NoProgress).await;

        assert!(report.was_interrupted());
        assert!(report.outcomes().is_empty());
        assert!(events.events().is_empty());
    }
}
