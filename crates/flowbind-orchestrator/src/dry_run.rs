//! Dry-run orchestrator: records actions instead of performing them.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use flowbind_core::{HostId, WorkloadId};

use crate::error::OrchestratorResult;
use crate::Orchestrator;

/// One call received by a [`DryRunOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorCall {
    Bind { workload: WorkloadId, host: HostId },
    Remove { workload: WorkloadId },
}

/// Logs and records every call, in order. Never fails.
#[derive(Debug, Default)]
pub struct DryRunOrchestrator {
    calls: Mutex<Vec<OrchestratorCall>>,
}

impl DryRunOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls received so far, oldest first.
    pub fn calls(&self) -> Vec<OrchestratorCall> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<OrchestratorCall>> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Orchestrator for DryRunOrchestrator {
    async fn bind_workload_to_host(
        &self,
        workload: &WorkloadId,
        host: &HostId,
    ) -> OrchestratorResult<()> {
        info!(%workload, %host, "dry run: would bind workload");
        self.lock().push(OrchestratorCall::Bind {
            workload: workload.clone(),
            host: host.clone(),
        });
        Ok(())
    }

    async fn remove_workload(&self, workload: &WorkloadId) -> OrchestratorResult<()> {
        info!(%workload, "dry run: would delete workload");
        self.lock().push(OrchestratorCall::Remove {
            workload: workload.clone(),
        });
        Ok(())
    }
}
