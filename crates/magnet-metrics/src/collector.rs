use crate::snapshot::{MetricsSnapshot, ServerInfo, ServerType};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// How a request ended, from the dispatcher's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The script compiled (or was reused) and ran to completion.
    Success,
    /// The script path did not resolve to a readable resource.
    NotFound,
    /// Compile or execution failure.
    Failed,
}

/// Metrics collector for the Magnet gateway.
///
/// All counters are atomics updated without locks; a snapshot is a
/// best-effort read, not a consistent cut. That is fine for an endpoint
/// whose only consumer is a human or a dashboard.
pub struct GatewayMetricsCollector {
    started: Instant,
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    not_found_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    recompiles: AtomicU64,
    latency_total_us: AtomicU64,
}

impl GatewayMetricsCollector {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            not_found_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            recompiles: AtomicU64::new(0),
            latency_total_us: AtomicU64::new(0),
        }
    }

    /// Records a completed request with its outcome and latency.
    ///
    /// Called exactly once per request, after the dispatcher has the final
    /// result in hand.
    pub fn record_request(&self, start_time: Instant, outcome: RequestOutcome) {
        let latency_us = start_time.elapsed().as_micros() as u64;

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.latency_total_us.fetch_add(latency_us, Ordering::Relaxed);

        match outcome {
            RequestOutcome::Success => {
                self.successful_requests.fetch_add(1, Ordering::Relaxed);
            }
            RequestOutcome::NotFound => {
                self.not_found_requests.fetch_add(1, Ordering::Relaxed);
                self.failed_requests.fetch_add(1, Ordering::Relaxed);
            }
            RequestOutcome::Failed => {
                self.failed_requests.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Records a reuse of an unchanged compiled script.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a first-time compile of a script.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a recompile of a script whose file changed on disk.
    pub fn record_recompile(&self) {
        self.recompiles.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let latency_total = self.latency_total_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            not_found_requests: self.not_found_requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            recompiles: self.recompiles.load(Ordering::Relaxed),
            avg_latency_us: if total > 0 { latency_total / total } else { 0 },
            uptime_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    /// Returns server information for the `/_info` endpoint.
    pub fn info(&self) -> ServerInfo {
        ServerInfo::new(ServerType::Gateway, self.started.elapsed().as_millis() as u64)
    }
}

impl Default for GatewayMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request_outcomes() {
        let collector = GatewayMetricsCollector::new();
        let start = Instant::now();

        collector.record_request(start, RequestOutcome::Success);
        collector.record_request(start, RequestOutcome::Failed);
        collector.record_request(start, RequestOutcome::NotFound);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.successful_requests, 1);
        assert_eq!(snapshot.failed_requests, 2);
        assert_eq!(snapshot.not_found_requests, 1);
    }

    #[test]
    fn test_cache_counters() {
        let collector = GatewayMetricsCollector::new();

        collector.record_cache_miss();
        collector.record_cache_hit();
        collector.record_cache_hit();
        collector.record_recompile();

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 2);
        assert_eq!(snapshot.recompiles, 1);
    }

    #[test]
    fn test_empty_snapshot_has_zero_latency() {
        let collector = GatewayMetricsCollector::new();
        let snapshot = collector.snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.avg_latency_us, 0);
    }

    #[test]
    fn test_info_reports_gateway() {
        let collector = GatewayMetricsCollector::new();
        let info = collector.info();
        assert_eq!(info.server_type, ServerType::Gateway);
    }
}
