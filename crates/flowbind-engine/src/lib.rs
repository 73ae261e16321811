//! flowbind-engine: client side of the remote scheduling engine.
//!
//! The engine is a Firmament-style flow scheduler reachable over gRPC.
//! The bridge uses two of its RPCs:
//!
//! ```text
//! service firmament.FirmamentScheduler
//!   ├── Check(HealthCheckRequest)  → HealthCheckResponse   (readiness)
//!   └── Schedule(ScheduleRequest)  → SchedulingDeltas      (one batch)
//! ```
//!
//! [`SchedulingEngine`] is the seam the scheduler crate depends on;
//! [`GrpcEngine`] is the production implementation.

pub mod client;
pub mod error;
pub mod proto;

pub use client::{GrpcEngine, SchedulingEngine};
pub use error::{EngineError, EngineResult};
