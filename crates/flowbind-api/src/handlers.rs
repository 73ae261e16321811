//! Bridge API handlers.
//!
//! Registry handlers go through `IdentityRegistry` operations only and
//! return JSON in the `{success, data, error}` envelope.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use flowbind_core::{HostId, ResourceId, TaskId, Workload, WorkloadId};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

// ── Counters ───────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = flowbind_metrics::render_prometheus(&state.bridge_name, &state.stats.snapshot());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.stats.snapshot())
}

// ── Workloads ──────────────────────────────────────────────────

/// A registered workload as listed by the API.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkloadEntry {
    pub task_id: TaskId,
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
}

impl WorkloadEntry {
    fn new(task_id: TaskId, workload: Workload) -> Self {
        Self {
            task_id,
            namespace: workload.id.namespace,
            name: workload.id.name,
            controller: workload.controller,
        }
    }
}

/// Register workload request body.
#[derive(Debug, Deserialize)]
pub struct RegisterWorkload {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub controller: Option<String>,
}

/// GET /api/v1/workloads
pub async fn list_workloads(State(state): State<ApiState>) -> impl IntoResponse {
    let entries: Vec<WorkloadEntry> = state
        .registry
        .workloads()
        .into_iter()
        .map(|(task_id, workload)| WorkloadEntry::new(task_id, workload))
        .collect();
    ApiResponse::ok(entries)
}

/// PUT /api/v1/workloads/{task_id}
pub async fn register_workload(
    State(state): State<ApiState>,
    Path(task_id): Path<u64>,
    Json(req): Json<RegisterWorkload>,
) -> impl IntoResponse {
    if req.namespace.is_empty() || req.name.is_empty() {
        return error_response("namespace and name are required", StatusCode::BAD_REQUEST)
            .into_response();
    }

    let task_id = TaskId(task_id);
    let workload = Workload {
        id: WorkloadId::new(req.namespace, req.name),
        controller: req.controller.filter(|c| !c.is_empty()),
    };
    info!(%task_id, workload = %workload.id, "workload registered");
    state.registry.register_workload(task_id, workload.clone());

    ApiResponse::ok(WorkloadEntry::new(task_id, workload)).into_response()
}

/// DELETE /api/v1/workloads/{task_id}
pub async fn unregister_workload(
    State(state): State<ApiState>,
    Path(task_id): Path<u64>,
) -> impl IntoResponse {
    let task_id = TaskId(task_id);
    match state.registry.unregister_workload(task_id) {
        Some(workload) => {
            info!(%task_id, workload = %workload.id, "workload unregistered");
            ApiResponse::ok(WorkloadEntry::new(task_id, workload)).into_response()
        }
        None => error_response("task not registered", StatusCode::NOT_FOUND).into_response(),
    }
}

// ── Hosts ──────────────────────────────────────────────────────

/// A registered host as listed by the API.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HostEntry {
    pub resource_id: ResourceId,
    pub host: HostId,
}

/// Register host request body.
#[derive(Debug, Deserialize)]
pub struct RegisterHost {
    pub host: String,
}

/// GET /api/v1/hosts
pub async fn list_hosts(State(state): State<ApiState>) -> impl IntoResponse {
    let entries: Vec<HostEntry> = state
        .registry
        .hosts()
        .into_iter()
        .map(|(resource_id, host)| HostEntry { resource_id, host })
        .collect();
    ApiResponse::ok(entries)
}

/// PUT /api/v1/hosts/{resource_id}
pub async fn register_host(
    State(state): State<ApiState>,
    Path(resource_id): Path<String>,
    Json(req): Json<RegisterHost>,
) -> impl IntoResponse {
    if req.host.is_empty() {
        return error_response("host is required", StatusCode::BAD_REQUEST).into_response();
    }

    let resource_id = ResourceId::new(resource_id);
    let host = HostId::new(req.host);
    info!(%resource_id, %host, "host registered");
    state
        .registry
        .register_host(resource_id.clone(), host.clone());

    ApiResponse::ok(HostEntry { resource_id, host }).into_response()
}

/// DELETE /api/v1/hosts/{resource_id}
pub async fn unregister_host(
    State(state): State<ApiState>,
    Path(resource_id): Path<String>,
) -> impl IntoResponse {
    let resource_id = ResourceId::new(resource_id);
    match state.registry.unregister_host(&resource_id) {
        Some(host) => {
            info!(%resource_id, %host, "host unregistered");
            ApiResponse::ok(HostEntry { resource_id, host }).into_response()
        }
        None => error_response("resource not registered", StatusCode::NOT_FOUND).into_response(),
    }
}

// ── Scheduling ─────────────────────────────────────────────────

/// POST /api/v1/schedule
pub async fn trigger_schedule(State(state): State<ApiState>) -> impl IntoResponse {
    debug!("scheduling iteration requested");
    state.trigger.notify_one();
    (StatusCode::ACCEPTED, ApiResponse::ok("triggered"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use flowbind_metrics::BridgeStats;
    use flowbind_registry::IdentityRegistry;
    use tokio::sync::Notify;

    use super::*;

    fn test_state() -> ApiState {
        ApiState {
            bridge_name: "test".to_string(),
            registry: Arc::new(IdentityRegistry::new()),
            stats: Arc::new(BridgeStats::new()),
            trigger: Arc::new(Notify::new()),
        }
    }

    #[tokio::test]
    async fn register_workload_then_lookup() {
        let state = test_state();
        let req = RegisterWorkload {
            namespace: "nsA".to_string(),
            name: "podA".to_string(),
            controller: Some("ReplicaSet".to_string()),
        };

        let resp = register_workload(State(state.clone()), Path(5), Json(req))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let workload = state.registry.lookup_workload(TaskId(5)).unwrap();
        assert_eq!(workload, Workload::controlled("nsA", "podA", "ReplicaSet"));
    }

    #[tokio::test]
    async fn register_workload_requires_name() {
        let state = test_state();
        let req = RegisterWorkload {
            namespace: "ns".to_string(),
            name: String::new(),
            controller: None,
        };

        let resp = register_workload(State(state.clone()), Path(1), Json(req))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.registry.workload_count(), 0);
    }

    #[tokio::test]
    async fn empty_controller_counts_as_none() {
        let state = test_state();
        let req = RegisterWorkload {
            namespace: "ns".to_string(),
            name: "pod".to_string(),
            controller: Some(String::new()),
        };

        register_workload(State(state.clone()), Path(2), Json(req)).await;
        assert!(!state.registry.lookup_workload(TaskId(2)).unwrap().is_controlled());
    }

    #[tokio::test]
    async fn unregister_missing_workload_is_not_found() {
        let state = test_state();
        let resp = unregister_workload(State(state), Path(404))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_and_unregister_host() {
        let state = test_state();
        let req = RegisterHost {
            host: "nodeX".to_string(),
        };

        let resp = register_host(State(state.clone()), Path("r1".to_string()), Json(req))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            state.registry.lookup_host(&ResourceId::from("r1")),
            Some(HostId::from("nodeX"))
        );

        let resp = unregister_host(State(state.clone()), Path("r1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.registry.host_count(), 0);
    }

    #[tokio::test]
    async fn trigger_returns_accepted_and_stores_permit() {
        let state = test_state();
        let resp = trigger_schedule(State(state.clone())).await.into_response();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        // The permit is kept until the loop next waits on it.
        tokio::time::timeout(std::time::Duration::from_secs(1), state.trigger.notified())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_text() {
        let state = test_state();
        state.stats.record_batch(2);
        let resp = prometheus_metrics(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }
}
