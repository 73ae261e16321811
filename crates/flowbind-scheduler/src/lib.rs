//! flowbind-scheduler: turns engine decisions into orchestrator actions.
//!
//! # Architecture
//!
//! ```text
//! SchedulingLoop
//!   ├── SchedulingEngine (fetch the next batch of deltas)
//!   ├── Dispatcher (apply one delta)
//!   │     ├── IdentityRegistry (TaskId → Workload, ResourceId → Host)
//!   │     └── Orchestrator (bind / delete)
//!   └── BridgeStats (counters)
//! ```
//!
//! [`ReadinessGate`] runs once before the loop starts and blocks until
//! the engine reports it is serving.

pub mod dispatcher;
pub mod error;
pub mod readiness;
pub mod scheduling_loop;

pub use dispatcher::{DeltaOutcome, Dispatcher};
pub use error::{MissingIdentity, SchedulerError, SchedulerResult};
pub use readiness::ReadinessGate;
pub use scheduling_loop::{IterationReport, SchedulingLoop};
