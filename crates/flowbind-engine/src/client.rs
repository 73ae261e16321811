//! Engine client: health probe and batch retrieval.

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, trace};

use flowbind_core::{DeltaKind, ResourceId, SchedulingDelta, TaskId};

use crate::error::{EngineError, EngineResult};
use crate::proto::{self, ServingStatus, firmament_scheduler_client::FirmamentSchedulerClient};

/// The remote scheduling engine as seen by the bridge.
#[async_trait]
pub trait SchedulingEngine: Send + Sync {
    /// Whether the engine is up and serving.
    async fn health_check(&self) -> EngineResult<bool>;

    /// Fetch the next batch of decisions, in the engine's order.
    async fn schedule(&self) -> EngineResult<Vec<SchedulingDelta>>;
}

/// [`SchedulingEngine`] backed by a tonic channel.
#[derive(Debug, Clone)]
pub struct GrpcEngine {
    endpoint: String,
    client: FirmamentSchedulerClient<Channel>,
}

impl GrpcEngine {
    /// Build a client for `address:port` without connecting.
    ///
    /// The channel connects on first use, so an engine that is not up
    /// yet shows up as a failed probe rather than a startup error. Must
    /// be called from within a tokio runtime.
    pub fn connect_lazy(endpoint: &str, request_timeout: Duration) -> EngineResult<Self> {
        let uri = format!("http://{endpoint}");
        let channel = Endpoint::from_shared(uri)
            .map_err(|e| EngineError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?
            .connect_timeout(request_timeout)
            .timeout(request_timeout)
            .connect_lazy();

        debug!(%endpoint, ?request_timeout, "engine channel created");
        Ok(Self {
            endpoint: endpoint.to_string(),
            client: FirmamentSchedulerClient::new(channel),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SchedulingEngine for GrpcEngine {
    async fn health_check(&self) -> EngineResult<bool> {
        let mut client = self.client.clone();
        let response = client
            .check(proto::HealthCheckRequest {})
            .await
            .map_err(|status| EngineError::rpc("Check", status))?;
        Ok(is_serving(&response.into_inner()))
    }

    async fn schedule(&self) -> EngineResult<Vec<SchedulingDelta>> {
        let mut client = self.client.clone();
        let response = client
            .schedule(proto::ScheduleRequest {})
            .await
            .map_err(|status| EngineError::rpc("Schedule", status))?;
        let deltas = from_proto_batch(response.into_inner());
        trace!(count = deltas.len(), "engine returned batch");
        Ok(deltas)
    }
}

fn is_serving(response: &proto::HealthCheckResponse) -> bool {
    response.status == ServingStatus::Serving as i32
}

/// Convert a wire batch into core deltas, preserving order.
pub fn from_proto_batch(batch: proto::SchedulingDeltas) -> Vec<SchedulingDelta> {
    batch
        .deltas
        .into_iter()
        .map(|d| SchedulingDelta {
            kind: DeltaKind::from_wire(d.r#type),
            task_id: TaskId(d.task_id),
            resource_id: ResourceId(d.resource_id),
        })
        .collect()
}
