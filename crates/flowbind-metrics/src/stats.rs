//! Bridge counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Per-delta failure categories, one counter each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaErrorKind {
    BrokenInvariant,
    UnknownKind,
    UncontrolledWorkload,
    Orchestrator,
}

impl DeltaErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            DeltaErrorKind::BrokenInvariant => "broken_invariant",
            DeltaErrorKind::UnknownKind => "unknown_kind",
            DeltaErrorKind::UncontrolledWorkload => "uncontrolled_workload",
            DeltaErrorKind::Orchestrator => "orchestrator",
        }
    }
}

/// Monotonic counters plus the size of the most recent batch.
#[derive(Debug, Default)]
pub struct BridgeStats {
    readiness_probes: AtomicU64,
    iterations: AtomicU64,
    batch_failures: AtomicU64,
    last_batch_size: AtomicU64,
    deltas_received: AtomicU64,
    placements: AtomicU64,
    requeues: AtomicU64,
    noops: AtomicU64,
    broken_invariant_errors: AtomicU64,
    unknown_kind_errors: AtomicU64,
    uncontrolled_workload_errors: AtomicU64,
    orchestrator_errors: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub readiness_probes: u64,
    pub iterations: u64,
    pub batch_failures: u64,
    pub last_batch_size: u64,
    pub deltas_received: u64,
    pub placements: u64,
    pub requeues: u64,
    pub noops: u64,
    pub broken_invariant_errors: u64,
    pub unknown_kind_errors: u64,
    pub uncontrolled_workload_errors: u64,
    pub orchestrator_errors: u64,
}

impl StatsSnapshot {
    pub fn delta_errors(&self) -> u64 {
        self.broken_invariant_errors
            + self.unknown_kind_errors
            + self.uncontrolled_workload_errors
            + self.orchestrator_errors
    }
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_readiness_probe(&self) {
        self.readiness_probes.fetch_add(1, Ordering::Relaxed);
    }

    /// A batch of `size` deltas was fetched from the engine.
    pub fn record_batch(&self, size: usize) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        self.last_batch_size.store(size as u64, Ordering::Relaxed);
        self.deltas_received
            .fetch_add(size as u64, Ordering::Relaxed);
    }

    /// The engine request for a batch failed.
    pub fn record_batch_failure(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        self.batch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_placement(&self) {
        self.placements.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_requeue(&self) {
        self.requeues.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_noop(&self) {
        self.noops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delta_error(&self, kind: DeltaErrorKind) {
        let counter = match kind {
            DeltaErrorKind::BrokenInvariant => &self.broken_invariant_errors,
            DeltaErrorKind::UnknownKind => &self.unknown_kind_errors,
            DeltaErrorKind::UncontrolledWorkload => &self.uncontrolled_workload_errors,
            DeltaErrorKind::Orchestrator => &self.orchestrator_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            readiness_probes: self.readiness_probes.load(Ordering::Relaxed),
            iterations: self.iterations.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
            last_batch_size: self.last_batch_size.load(Ordering::Relaxed),
            deltas_received: self.deltas_received.load(Ordering::Relaxed),
            placements: self.placements.load(Ordering::Relaxed),
            requeues: self.requeues.load(Ordering::Relaxed),
            noops: self.noops.load(Ordering::Relaxed),
            broken_invariant_errors: self.broken_invariant_errors.load(Ordering::Relaxed),
            unknown_kind_errors: self.unknown_kind_errors.load(Ordering::Relaxed),
            uncontrolled_workload_errors: self
                .uncontrolled_workload_errors
                .load(Ordering::Relaxed),
            orchestrator_errors: self.orchestrator_errors.load(Ordering::Relaxed),
        }
    }
}
