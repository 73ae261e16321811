//! Delta dispatcher: one engine decision in, at most one orchestrator
//! action out.

use std::sync::Arc;

use tracing::{debug, info, warn};

use flowbind_core::{
    DeltaKind, HostId, ResourceId, SchedulingDelta, TaskId, UncontrolledWorkloadPolicy, Workload,
    WorkloadId,
};
use flowbind_metrics::BridgeStats;
use flowbind_orchestrator::Orchestrator;
use flowbind_registry::IdentityRegistry;

use crate::error::{MissingIdentity, SchedulerError, SchedulerResult};

/// What applying a delta did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaOutcome {
    Placed {
        task_id: TaskId,
        workload: WorkloadId,
        host: HostId,
    },
    Requeued {
        task_id: TaskId,
        workload: WorkloadId,
    },
    Noop,
}

/// Resolves engine identifiers through the registry and drives the
/// orchestrator. Reads the registry, never writes it.
pub struct Dispatcher {
    registry: Arc<IdentityRegistry>,
    orchestrator: Arc<dyn Orchestrator>,
    stats: Arc<BridgeStats>,
    uncontrolled_policy: UncontrolledWorkloadPolicy,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<IdentityRegistry>,
        orchestrator: Arc<dyn Orchestrator>,
        stats: Arc<BridgeStats>,
        uncontrolled_policy: UncontrolledWorkloadPolicy,
    ) -> Self {
        Self {
            registry,
            orchestrator,
            stats,
            uncontrolled_policy,
        }
    }

    /// Apply one delta and record the result in the stats counters.
    pub async fn apply(&self, delta: &SchedulingDelta) -> SchedulerResult<DeltaOutcome> {
        let result = self.dispatch(delta).await;
        match &result {
            Ok(DeltaOutcome::Placed { .. }) => self.stats.record_placement(),
            Ok(DeltaOutcome::Requeued { .. }) => self.stats.record_requeue(),
            Ok(DeltaOutcome::Noop) => self.stats.record_noop(),
            Err(e) => {
                if let Some(kind) = e.delta_error_kind() {
                    self.stats.record_delta_error(kind);
                }
            }
        }
        result
    }

    async fn dispatch(&self, delta: &SchedulingDelta) -> SchedulerResult<DeltaOutcome> {
        match delta.kind {
            DeltaKind::Place => self.place(delta.task_id, &delta.resource_id).await,
            DeltaKind::Preempt | DeltaKind::Migrate => {
                debug!(task_id = %delta.task_id, kind = %delta.kind, "requeueing task");
                self.requeue_via_deletion(delta.task_id).await
            }
            DeltaKind::Noop => Ok(DeltaOutcome::Noop),
            DeltaKind::Unrecognized(raw) => Err(SchedulerError::UnknownDeltaKind(raw)),
        }
    }

    async fn place(
        &self,
        task_id: TaskId,
        resource_id: &ResourceId,
    ) -> SchedulerResult<DeltaOutcome> {
        let workload = self.workload_for(task_id)?;
        let host = self
            .registry
            .lookup_host(resource_id)
            .ok_or_else(|| SchedulerError::BrokenInvariant {
                task_id,
                missing: MissingIdentity::Resource(resource_id.clone()),
            })?;

        self.orchestrator
            .bind_workload_to_host(&workload.id, &host)
            .await?;

        info!(%task_id, workload = %workload.id, %host, "task placed");
        Ok(DeltaOutcome::Placed {
            task_id,
            workload: workload.id,
            host,
        })
    }

    /// Emulate preemption or migration by deleting the workload.
    ///
    /// The orchestrator has no in-place preemption. Deleting the workload
    /// relies on its owning controller to submit an equivalent one, which
    /// the engine then places afresh. A workload with no controller is
    /// gone for good: under [`UncontrolledWorkloadPolicy::Delete`] it is
    /// deleted with a warning, under [`UncontrolledWorkloadPolicy::Reject`]
    /// the delta fails with [`SchedulerError::UncontrolledWorkload`] and
    /// nothing is deleted.
    pub async fn requeue_via_deletion(&self, task_id: TaskId) -> SchedulerResult<DeltaOutcome> {
        let workload = self.workload_for(task_id)?;

        if !workload.is_controlled() {
            match self.uncontrolled_policy {
                UncontrolledWorkloadPolicy::Reject => {
                    return Err(SchedulerError::UncontrolledWorkload {
                        task_id,
                        workload: workload.id,
                    });
                }
                UncontrolledWorkloadPolicy::Delete => {
                    warn!(
                        %task_id,
                        workload = %workload.id,
                        "workload has no controller; deleting it will not resubmit it"
                    );
                }
            }
        }

        self.orchestrator.remove_workload(&workload.id).await?;

        info!(%task_id, workload = %workload.id, "task requeued via deletion");
        Ok(DeltaOutcome::Requeued {
            task_id,
            workload: workload.id,
        })
    }

    fn workload_for(&self, task_id: TaskId) -> SchedulerResult<Workload> {
        self.registry
            .lookup_workload(task_id)
            .ok_or(SchedulerError::BrokenInvariant {
                task_id,
                missing: MissingIdentity::Task(task_id),
            })
    }
}
