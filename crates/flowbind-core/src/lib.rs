//! flowbind-core: shared types for the flowbind scheduling bridge.
//!
//! Identifiers on both sides of the bridge (orchestrator workloads and
//! hosts, engine tasks and resources), the `SchedulingDelta` decision
//! record, and the daemon's `BridgeConfig`.

pub mod config;
pub mod duration;
pub mod error;
pub mod types;

pub use config::{BridgeConfig, BrokenInvariantPolicy, UncontrolledWorkloadPolicy};
pub use duration::parse_duration;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
