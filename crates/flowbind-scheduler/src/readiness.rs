//! Startup gate: wait for the engine to report it is serving.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use flowbind_engine::SchedulingEngine;
use flowbind_metrics::BridgeStats;

use crate::error::{SchedulerError, SchedulerResult};

/// Probes the engine at a constant interval until it answers `SERVING`
/// or the timeout elapses.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    timeout: Duration,
    poll_interval: Duration,
    stats: Option<Arc<BridgeStats>>,
}

impl ReadinessGate {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            stats: None,
        }
    }

    /// Count every probe in `stats`.
    pub fn with_stats(mut self, stats: Arc<BridgeStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Block until the engine is ready.
    ///
    /// The first probe goes out immediately. A probe that errors counts
    /// as "not ready". Returns the number of probes issued, or
    /// [`SchedulerError::ReadinessTimeout`] once `timeout` has elapsed
    /// without a successful probe.
    pub async fn wait_until_ready(&self, engine: &dyn SchedulingEngine) -> SchedulerResult<u32> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if let Some(ref stats) = self.stats {
                stats.record_readiness_probe();
            }

            match engine.health_check().await {
                Ok(true) => {
                    info!(attempts, waited = ?started.elapsed(), "engine is serving");
                    return Ok(attempts);
                }
                Ok(false) => debug!(attempts, "engine not serving yet"),
                Err(e) => debug!(attempts, error = %e, "engine probe failed"),
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                return Err(SchedulerError::ReadinessTimeout { waited, attempts });
            }

            // Never sleep past the deadline; the last probe lands on it.
            let remaining = self.timeout - waited;
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }
}
