//! flowbind-api: HTTP surface of the bridge.
//!
//! Observers populate the identity registry through these routes; the
//! same listener serves liveness, counters, and a trigger for an
//! immediate scheduling iteration.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness |
//! | GET | `/metrics` | Prometheus exposition |
//! | GET | `/api/v1/stats` | Counter snapshot |
//! | GET | `/api/v1/workloads` | List registered workloads |
//! | PUT | `/api/v1/workloads/{task_id}` | Register a workload |
//! | DELETE | `/api/v1/workloads/{task_id}` | Unregister a workload |
//! | GET | `/api/v1/hosts` | List registered hosts |
//! | PUT | `/api/v1/hosts/{resource_id}` | Register a host |
//! | DELETE | `/api/v1/hosts/{resource_id}` | Unregister a host |
//! | POST | `/api/v1/schedule` | Trigger a scheduling iteration |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tokio::sync::Notify;

use flowbind_metrics::BridgeStats;
use flowbind_registry::IdentityRegistry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Label attached to every exported metric.
    pub bridge_name: String,
    pub registry: Arc<IdentityRegistry>,
    pub stats: Arc<BridgeStats>,
    /// Wakes the scheduling loop.
    pub trigger: Arc<Notify>,
}

/// Build the complete bridge router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/stats", get(handlers::get_stats))
        .route("/workloads", get(handlers::list_workloads))
        .route(
            "/workloads/{task_id}",
            put(handlers::register_workload).delete(handlers::unregister_workload),
        )
        .route("/hosts", get(handlers::list_hosts))
        .route(
            "/hosts/{resource_id}",
            put(handlers::register_host).delete(handlers::unregister_host),
        )
        .route("/schedule", post(handlers::trigger_schedule))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
}
