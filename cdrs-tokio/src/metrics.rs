//! Lock-free counters and latency tracking, following the teacher's atomics-first style rather
//! than pulling in a metrics-registry crate.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Per-session counters. Cheap to clone (wraps an `Arc` in practice via `Session` ownership, but
/// the struct itself is plain atomics so it can be embedded directly).
#[derive(Debug, Default)]
pub struct Metrics {
    active_connections: AtomicU64,
    total_connections_opened: AtomicU64,
    errors: AtomicU64,
    timeouts: AtomicU64,
    speculative_executions: AtomicU64,
    requests_in_flight: AtomicI64,
    requests_rejected: AtomicU64,
    request_latency_sum_micros: AtomicU64,
    request_latency_count: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        self.total_connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn total_connections_opened(&self) -> u64 {
        self.total_connections_opened.load(Ordering::Relaxed)
    }

    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn speculative_execution(&self) {
        self.speculative_executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn speculative_executions(&self) -> u64 {
        self.speculative_executions.load(Ordering::Relaxed)
    }

    pub fn request_started(&self) {
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_completed(&self, latency_micros: u64) {
        self.requests_in_flight.fetch_sub(1, Ordering::Relaxed);
        self.request_latency_sum_micros
            .fetch_add(latency_micros, Ordering::Relaxed);
        self.request_latency_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_in_flight(&self) -> i64 {
        self.requests_in_flight.load(Ordering::Relaxed)
    }

    /// A request was refused admission because the session's request queue was full.
    pub fn request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_rejected(&self) -> u64 {
        self.requests_rejected.load(Ordering::Relaxed)
    }

    /// Mean request latency across the session's lifetime, in microseconds.
    pub fn mean_request_latency_micros(&self) -> f64 {
        let count = self.request_latency_count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }

        self.request_latency_sum_micros.load(Ordering::Relaxed) as f64 / count as f64
    }
}
