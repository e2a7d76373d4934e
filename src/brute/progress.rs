use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Counters shared by every worker of one dictionary pass.
#[derive(Debug)]
pub struct BruteProgress {
    total: usize,
    processed: AtomicUsize,
    success: AtomicUsize,
    started: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub processed: usize,
    pub success: usize,
    pub percent: f64,
    pub success_rate: f64,
    pub elapsed: Duration,
    pub remaining: Duration,
}

impl BruteProgress {
    pub fn new(total: usize) -> Arc<Self> {
        Arc::new(Self {
            total,
            processed: AtomicUsize::new(0),
            success: AtomicUsize::new(0),
            started: Instant::now(),
        })
    }

    pub fn record(&self, valid: bool) {
        if valid {
            self.success.fetch_add(1, Ordering::Relaxed);
        }
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        snapshot_at(
            self.total,
            self.processed.load(Ordering::Relaxed),
            self.success.load(Ordering::Relaxed),
            self.started.elapsed(),
        )
    }

    pub fn report(&self) {
        let s = self.snapshot();
        if s.total == 0 {
            return;
        }
        tracing::info!(
            "Brute force progress: {}/{} ({:.1}%) - Success: {} ({:.1}%) - Elapsed: {}s - Remaining: {}s",
            s.processed,
            s.total,
            s.percent,
            s.success,
            s.success_rate,
            s.elapsed.as_secs(),
            s.remaining.as_secs()
        );
    }

    /// Log a report every [`REPORT_INTERVAL`] until `stop` is cancelled.
    pub fn spawn_reporter(self: &Arc<Self>, stop: CancellationToken) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REPORT_INTERVAL);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => this.report(),
                }
            }
        })
    }
}

/// Linear ETA: average time per processed item times the items left.
pub fn snapshot_at(total: usize, processed: usize, success: usize, elapsed: Duration) -> ProgressSnapshot {
    let percent = if total > 0 { processed as f64 / total as f64 * 100.0 } else { 0.0 };
    let success_rate = if processed > 0 { success as f64 / processed as f64 * 100.0 } else { 0.0 };
    let remaining = if processed > 0 {
        let left = total.saturating_sub(processed) as u32;
        (elapsed / processed as u32) * left
    } else {
        Duration::ZERO
    };
    ProgressSnapshot { total, processed, success, percent, success_rate, elapsed, remaining }
}
