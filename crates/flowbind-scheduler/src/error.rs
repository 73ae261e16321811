//! Scheduler error types.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use flowbind_core::{ResourceId, TaskId, WorkloadId};
use flowbind_engine::EngineError;
use flowbind_metrics::DeltaErrorKind;
use flowbind_orchestrator::OrchestratorError;

/// The identifier a delta referenced that the registry does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingIdentity {
    Task(TaskId),
    Resource(ResourceId),
}

impl fmt::Display for MissingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingIdentity::Task(id) => write!(f, "task {id}"),
            MissingIdentity::Resource(id) => write!(f, "resource \"{id}\""),
        }
    }
}

/// Errors raised while gating on, or applying decisions from, the engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("engine not ready after {waited:?} ({attempts} probes)")]
    ReadinessTimeout { waited: Duration, attempts: u32 },

    #[error("engine transport failure: {0}")]
    Transport(#[from] EngineError),

    #[error("delta for task {task_id} references unregistered {missing}")]
    BrokenInvariant {
        task_id: TaskId,
        missing: MissingIdentity,
    },

    #[error("unknown delta kind {0}")]
    UnknownDeltaKind(i32),

    #[error("refusing to requeue uncontrolled workload {workload} (task {task_id})")]
    UncontrolledWorkload {
        task_id: TaskId,
        workload: WorkloadId,
    },

    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

impl SchedulerError {
    /// The per-delta counter this error is recorded under, if it is a
    /// per-delta error at all.
    pub fn delta_error_kind(&self) -> Option<DeltaErrorKind> {
        match self {
            SchedulerError::BrokenInvariant { .. } => Some(DeltaErrorKind::BrokenInvariant),
            SchedulerError::UnknownDeltaKind(_) => Some(DeltaErrorKind::UnknownKind),
            SchedulerError::UncontrolledWorkload { .. } => {
                Some(DeltaErrorKind::UncontrolledWorkload)
            }
            SchedulerError::Orchestrator(_) => Some(DeltaErrorKind::Orchestrator),
            SchedulerError::ReadinessTimeout { .. } | SchedulerError::Transport(_) => None,
        }
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_invariant_names_the_missing_identifier() {
        let err = SchedulerError::BrokenInvariant {
            task_id: TaskId(99),
            missing: MissingIdentity::Task(TaskId(99)),
        };
        assert_eq!(
            err.to_string(),
            "delta for task 99 references unregistered task 99"
        );

        let err = SchedulerError::BrokenInvariant {
            task_id: TaskId(5),
            missing: MissingIdentity::Resource(ResourceId::from("r9")),
        };
        assert!(err.to_string().ends_with("unregistered resource \"r9\""));
    }

    #[test]
    fn only_delta_errors_map_to_counters() {
        let timeout = SchedulerError::ReadinessTimeout {
            waited: Duration::from_secs(1),
            attempts: 1,
        };
        assert_eq!(timeout.delta_error_kind(), None);
        assert_eq!(
            SchedulerError::UnknownDeltaKind(7).delta_error_kind(),
            Some(DeltaErrorKind::UnknownKind)
        );
    }
}
