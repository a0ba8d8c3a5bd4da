
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

const LATENCY_SAMPLE_CAP: usize = 1000;

/// How a request left the gateway, for accounting purposes.
///
/// Rejected requests get their own variants so that
/// `cache_hits + cache_misses == total - rate_limited - server_busy`
/// holds for any trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    CacheHit,
    CacheMiss,
    RateLimited,
    ServerBusy,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub concurrent_requests: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub rate_limited_requests: u64,
    pub server_busy_requests: u64,
    pub average_response_time_ms: f64,
}

#[derive(Default)]
struct MetricsInner {
    total_requests: u64,
    concurrent_requests: usize,
    cache_hits: u64,
    cache_misses: u64,
    rate_limited_requests: u64,
    server_busy_requests: u64,
    response_times: VecDeque<Duration>,
}

/// Process-wide traffic and cache counters with a bounded latency sample.
///
/// Each record/snapshot call is a single critical section.
#[derive(Default)]
pub struct MetricsSink {
    inner: Mutex<MetricsInner>,
}

impl MetricsSink {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&self, latency: Duration, outcome: RequestOutcome) {
        let mut inner = self.lock();

        inner.total_requests += 1;
        match outcome {
            RequestOutcome::CacheHit => inner.cache_hits += 1,
            RequestOutcome::CacheMiss => inner.cache_misses += 1,
            RequestOutcome::RateLimited => inner.rate_limited_requests += 1,
            RequestOutcome::ServerBusy => inner.server_busy_requests += 1,
        }

        if inner.response_times.len() >= LATENCY_SAMPLE_CAP {
            inner.response_times.pop_front();
        }
        inner.response_times.push_back(latency);
    }

    /// A request entered the processing section.
    #[inline]
    pub fn enter(&self) {
        self.lock().concurrent_requests += 1;
    }

    /// A request left the processing section.
    #[inline]
    pub fn exit(&self) {
        let mut inner = self.lock();
        inner.concurrent_requests = inner.concurrent_requests.saturating_sub(1);
    }

    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.lock();

        let scored = inner.cache_hits + inner.cache_misses;
        let cache_hit_rate = if scored > 0 {
            inner.cache_hits as f64 / scored as f64
        } else {
            0.0
        };

        let average_response_time_ms = if inner.response_times.is_empty() {
            0.0
        } else {
            let total: Duration = inner.response_times.iter().sum();
            total.as_secs_f64() * 1000.0 / inner.response_times.len() as f64
        };

        MetricsSnapshot {
            total_requests: inner.total_requests,
            concurrent_requests: inner.concurrent_requests,
            cache_hits: inner.cache_hits,
            cache_misses: inner.cache_misses,
            cache_hit_rate,
            rate_limited_requests: inner.rate_limited_requests,
            server_busy_requests: inner.server_busy_requests,
            average_response_time_ms,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MetricsInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
