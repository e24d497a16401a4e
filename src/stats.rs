//! Statistics tracking for ct-sweep

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe statistics collector shared by every worker
#[derive(Clone)]
pub struct StatsCollector {
    requests_sent: Arc<AtomicU64>,
    requests_failed: Arc<AtomicU64>,
    hostnames_abandoned: Arc<AtomicU64>,
    domains_completed: Arc<AtomicU64>,
    domains_skipped: Arc<AtomicU64>,
    domains_failed: Arc<AtomicU64>,
    start_time: Instant,
}

/// Snapshot of statistics at a point in time
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub requests_sent: u64,
    pub requests_failed: u64,
    pub hostnames_abandoned: u64,
    pub domains_completed: u64,
    pub domains_skipped: u64,
    pub domains_failed: u64,
    pub requests_per_minute: f64,
    pub uptime_secs: u64,
}

impl StatsSnapshot {
    /// Domains that reached any final state
    pub fn domains_finished(&self) -> u64 {
        self.domains_completed + self.domains_skipped + self.domains_failed
    }
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            requests_sent: Arc::new(AtomicU64::new(0)),
            requests_failed: Arc::new(AtomicU64::new(0)),
            hostnames_abandoned: Arc::new(AtomicU64::new(0)),
            domains_completed: Arc::new(AtomicU64::new(0)),
            domains_skipped: Arc::new(AtomicU64::new(0)),
            domains_failed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Count one HTTP attempt against the CT endpoint
    pub fn increment_requests(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one failed attempt (transport error, bad status, truncated body)
    pub fn increment_failed_requests(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_abandoned(&self) {
        self.hostnames_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_completed(&self) {
        self.domains_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self) {
        self.domains_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_domain_failures(&self) {
        self.domains_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> StatsSnapshot {
        let elapsed = self.start_time.elapsed();
        let requests = self.requests_sent.load(Ordering::Relaxed);

        let rate = if elapsed.as_secs() > 0 {
            (requests as f64 / elapsed.as_secs() as f64) * 60.0
        } else {
            0.0
        };

        StatsSnapshot {
            requests_sent: requests,
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            hostnames_abandoned: self.hostnames_abandoned.load(Ordering::Relaxed),
            domains_completed: self.domains_completed.load(Ordering::Relaxed),
            domains_skipped: self.domains_skipped.load(Ordering::Relaxed),
            domains_failed: self.domains_failed.load(Ordering::Relaxed),
            requests_per_minute: rate,
            uptime_secs: elapsed.as_secs(),
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_stats(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "{} domains done | {} requests ({} failed) | {:.1} req/min | uptime: {}",
            snapshot.domains_finished(),
            snapshot.requests_sent,
            snapshot.requests_failed,
            snapshot.requests_per_minute,
            Self::format_uptime(snapshot.uptime_secs)
        )
    }

    pub fn format_uptime(secs: u64) -> String {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
