use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::collector::{Collector, CollectorKind};
use crate::concurrent::{catch_panic, ConcurrencyGate, TaskOutcome};
use crate::config::StageSettings;
use crate::model::Candidate;

/// One step of the pipeline: every collector of a given kind.
pub struct Stage {
    pub name: &'static str,
    pub kind: CollectorKind,
    pub collectors: Vec<Arc<dyn Collector>>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub enabled: bool,
}

impl Stage {
    pub fn new(kind: CollectorKind, settings: &StageSettings) -> Self {
        Self {
            name: kind.stage_name(),
            kind,
            collectors: Vec::new(),
            concurrency: settings.concurrency,
            timeout: settings.timeout(),
            enabled: settings.enabled,
        }
    }

    pub fn is_brute(&self) -> bool {
        self.kind == CollectorKind::Brute
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub subdomains: Vec<String>,
    /// Same names as `subdomains`, with the collector that reported them.
    pub candidates: Vec<Candidate>,
    pub completed: usize,
    pub failed: usize,
    pub panicked: usize,
    pub skipped: usize,
}

/// Run `collectors` against `domain` with at most `concurrency` in flight.
///
/// Unless this is the brute stage, a timer fires after `timeout`; collectors
/// still waiting for a slot at that point are skipped, those already running
/// are left to finish. A zero timeout disables the timer.
pub async fn run_stage(
    collectors: &[Arc<dyn Collector>],
    domain: &str,
    concurrency: usize,
    timeout: Duration,
    is_brute_stage: bool,
) -> StageReport {
    let gate = ConcurrencyGate::new(concurrency);
    let deadline = CancellationToken::new();
    let timer = (!is_brute_stage && !timeout.is_zero()).then(|| {
        let token = deadline.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            token.cancel();
        })
    });

    let mut handles = Vec::new();
    for collector in collectors.iter().filter(|c| c.is_enabled()) {
        let collector = collector.clone();
        let gate = gate.clone();
        let deadline = deadline.clone();
        let domain = domain.to_string();
        let name = collector.name().to_string();
        let handle = tokio::spawn(async move {
            let name = collector.name().to_string();
            let permit = tokio::select! {
                biased;
                _ = deadline.cancelled() => return TaskOutcome::Skipped { name },
                p = gate.acquire() => p,
            };
            tracing::debug!(collector = %name, "collector started");
            let outcome = catch_panic(collector.run(&domain)).await;
            drop(permit);
            match outcome {
                Ok(Ok(output)) => {
                    let now = Local::now();
                    let kind = collector.kind();
                    let output: Vec<Candidate> =
                        output.iter().map(|s| Candidate::new(s, kind, &name, now)).collect();
                    TaskOutcome::Completed { name, output }
                }
                Ok(Err(error)) => TaskOutcome::Failed { name, error },
                Err(message) => TaskOutcome::Panicked { name, message },
            }
        });
        handles.push((name, handle));
    }

    let mut report = StageReport::default();
    for (name, handle) in handles {
        let outcome = match handle.await {
            Ok(o) => o,
            Err(e) => TaskOutcome::Panicked { name, message: e.to_string() },
        };
        match outcome {
            TaskOutcome::Completed { name, output } => {
                tracing::debug!(collector = %name, found = output.len(), "collector finished");
                report.completed += 1;
                report.subdomains.extend(output.iter().map(|c| c.subdomain.clone()));
                report.candidates.extend(output);
            }
            TaskOutcome::Failed { name, error } => {
                tracing::warn!(collector = %name, error = %error, "collector failed");
                report.failed += 1;
            }
            TaskOutcome::Panicked { name, message } => {
                tracing::error!(collector = %name, panic = %message, "collector panicked");
                report.panicked += 1;
            }
            TaskOutcome::Skipped { name } => {
                tracing::warn!(collector = %name, "stage timeout reached, collector skipped");
                report.skipped += 1;
            }
        }
    }

    if let Some(timer) = timer {
        timer.abort();
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(&'static str, Vec<&'static str>);

    #[async_trait]
    impl Collector for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        fn kind(&self) -> CollectorKind {
            CollectorKind::Dataset
        }
        async fn run(&self, _domain: &str) -> anyhow::Result<Vec<String>> {
            Ok(self.1.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Broken;

    #[async_trait]
    impl Collector for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn kind(&self) -> CollectorKind {
            CollectorKind::Dataset
        }
        async fn run(&self, _domain: &str) -> anyhow::Result<Vec<String>> {
            anyhow::bail!("upstream returned 500")
        }
    }

    #[tokio::test]
    async fn empty_stage_is_noop() {
        let report = run_stage(&[], "example.com", 4, Duration::from_secs(1), false).await;
        assert_eq!(report, StageReport::default());
    }

    #[tokio::test]
    async fn failures_do_not_block_siblings() {
        let collectors: Vec<Arc<dyn Collector>> =
            vec![Arc::new(Fixed("a", vec!["x.example.com"])), Arc::new(Broken), Arc::new(Fixed("b", vec![]))];
        let report = run_stage(&collectors, "example.com", 2, Duration::from_secs(5), false).await;
        assert_eq!(report.completed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.subdomains, vec!["x.example.com"]);
    }
}
