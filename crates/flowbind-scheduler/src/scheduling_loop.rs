//! The scheduling loop: fetch a batch, apply it in order, wait, repeat.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};

use flowbind_core::BrokenInvariantPolicy;
use flowbind_engine::SchedulingEngine;
use flowbind_metrics::BridgeStats;

use crate::dispatcher::Dispatcher;
use crate::error::{SchedulerError, SchedulerResult};

/// Tally of a single iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    pub received: usize,
    pub applied: usize,
    pub failed: usize,
    /// Shutdown was requested before the whole batch was applied.
    pub interrupted: bool,
}

pub struct SchedulingLoop {
    engine: Arc<dyn SchedulingEngine>,
    dispatcher: Dispatcher,
    stats: Arc<BridgeStats>,
    interval: Duration,
    invariant_policy: BrokenInvariantPolicy,
    trigger: Arc<Notify>,
}

impl SchedulingLoop {
    pub fn new(
        engine: Arc<dyn SchedulingEngine>,
        dispatcher: Dispatcher,
        stats: Arc<BridgeStats>,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            dispatcher,
            stats,
            interval,
            invariant_policy: BrokenInvariantPolicy::default(),
            trigger: Arc::new(Notify::new()),
        }
    }

    pub fn with_invariant_policy(mut self, policy: BrokenInvariantPolicy) -> Self {
        self.invariant_policy = policy;
        self
    }

    /// Handle that cuts the current wait short. A notification sent while
    /// an iteration is running starts the next one as soon as it ends.
    pub fn trigger_handle(&self) -> Arc<Notify> {
        self.trigger.clone()
    }

    /// Run one iteration: fetch a batch and apply every delta in order.
    ///
    /// Shutdown is checked between deltas, never while one is being
    /// applied. An engine failure is returned as
    /// [`SchedulerError::Transport`]. A per-delta error is logged and
    /// counted, except a broken invariant under
    /// [`BrokenInvariantPolicy::Abort`], which is returned.
    pub async fn run_once(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> SchedulerResult<IterationReport> {
        let batch = match self.engine.schedule().await {
            Ok(batch) => batch,
            Err(e) => {
                self.stats.record_batch_failure();
                return Err(SchedulerError::Transport(e));
            }
        };
        self.stats.record_batch(batch.len());

        let mut report = IterationReport {
            received: batch.len(),
            ..Default::default()
        };

        for delta in &batch {
            if *shutdown.borrow() {
                report.interrupted = true;
                break;
            }

            match self.dispatcher.apply(delta).await {
                Ok(outcome) => {
                    debug!(?outcome, "delta applied");
                    report.applied += 1;
                }
                Err(e @ SchedulerError::BrokenInvariant { .. })
                    if self.invariant_policy == BrokenInvariantPolicy::Abort =>
                {
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        kind = %delta.kind,
                        task_id = %delta.task_id,
                        error = %e,
                        "skipping delta"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Run until shutdown.
    ///
    /// Engine failures are retried on the next iteration. Returns early
    /// only when an iteration returns a non-transport error.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> SchedulerResult<()> {
        info!(
            interval = ?self.interval,
            policy = ?self.invariant_policy,
            "scheduling loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.run_once(&shutdown).await {
                Ok(report) if report.received > 0 => {
                    info!(
                        received = report.received,
                        applied = report.applied,
                        failed = report.failed,
                        delta_errors_total = self.stats.snapshot().delta_errors(),
                        "batch applied"
                    );
                }
                Ok(_) => debug!("empty batch"),
                Err(SchedulerError::Transport(e)) => {
                    warn!(error = %e, "engine request failed, retrying next iteration");
                }
                Err(e) => {
                    error!(error = %e, "scheduling loop aborted");
                    return Err(e);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.trigger.notified() => {
                    debug!("scheduling iteration triggered");
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        info!("scheduling loop shutting down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use flowbind_core::{
        HostId, ResourceId, SchedulingDelta, TaskId, UncontrolledWorkloadPolicy, Workload,
    };
    use flowbind_engine::EngineResult;
    use flowbind_orchestrator::DryRunOrchestrator;
    use flowbind_registry::IdentityRegistry;

    use super::*;

    struct Batches(Mutex<VecDeque<Vec<SchedulingDelta>>>);

    #[async_trait]
    impl SchedulingEngine for Batches {
        async fn health_check(&self) -> EngineResult<bool> {
            Ok(true)
        }

        async fn schedule(&self) -> EngineResult<Vec<SchedulingDelta>> {
            Ok(self.0.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn scheduling_loop(batches: Vec<Vec<SchedulingDelta>>) -> (SchedulingLoop, Arc<DryRunOrchestrator>) {
        let registry = Arc::new(IdentityRegistry::new());
        registry.register_workload(TaskId(1), Workload::controlled("ns", "pod-1", "Job"));
        registry.register_host(ResourceId::from("r1"), HostId::from("node-1"));

        let orchestrator = Arc::new(DryRunOrchestrator::new());
        let stats = Arc::new(BridgeStats::new());
        let dispatcher = Dispatcher::new(
            registry,
            orchestrator.clone(),
            stats.clone(),
            UncontrolledWorkloadPolicy::Delete,
        );
        let engine = Arc::new(Batches(Mutex::new(batches.into())));
        let sl = SchedulingLoop::new(engine, dispatcher, stats, Duration::from_secs(10));
        (sl, orchestrator)
    }

    #[tokio::test]
    async fn shutdown_before_first_delta_applies_nothing() {
        let (sl, orchestrator) = scheduling_loop(vec![vec![
            SchedulingDelta::place(1, "r1"),
            SchedulingDelta::migrate(1),
        ]]);
        let (_tx, rx) = watch::channel(true);

        let report = sl.run_once(&rx).await.unwrap();

        assert_eq!(report.received, 2);
        assert_eq!(report.applied, 0);
        assert!(report.interrupted);
        assert!(orchestrator.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_normal() {
        let (sl, orchestrator) = scheduling_loop(vec![]);
        let (_tx, rx) = watch::channel(false);

        let report = sl.run_once(&rx).await.unwrap();

        assert_eq!(report, IterationReport::default());
        assert!(orchestrator.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_exits_on_shutdown() {
        let (sl, _orchestrator) = scheduling_loop(vec![]);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { sl.run(rx).await });
        tokio::time::sleep(Duration::from_secs(25)).await;
        tx.send(true).unwrap();

        handle.await.unwrap().unwrap();
    }
}
