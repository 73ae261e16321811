//! flowbind-orchestrator: the actions the bridge takes on the cluster.
//!
//! The bridge needs exactly two things from the orchestrator: bind a
//! pending workload to a host, and delete a workload. Both sit behind
//! the [`Orchestrator`] trait.
//!
//! - [`KubeOrchestrator`] speaks the Kubernetes core/v1 REST API over
//!   plain HTTP/1.1, typically to a `kubectl proxy` sidecar.
//! - [`DryRunOrchestrator`] records the calls it receives and touches
//!   nothing; the daemon uses it for `--dry-run`.

pub mod dry_run;
pub mod error;
pub mod kube;

use async_trait::async_trait;

use flowbind_core::{HostId, WorkloadId};

pub use dry_run::{DryRunOrchestrator, OrchestratorCall};
pub use error::{OrchestratorError, OrchestratorResult};
pub use kube::KubeOrchestrator;

/// Side-effecting operations on the cluster orchestrator.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Bind `workload` to run on `host`.
    async fn bind_workload_to_host(
        &self,
        workload: &WorkloadId,
        host: &HostId,
    ) -> OrchestratorResult<()>;

    /// Delete `workload`.
    async fn remove_workload(&self, workload: &WorkloadId) -> OrchestratorResult<()>;
}
