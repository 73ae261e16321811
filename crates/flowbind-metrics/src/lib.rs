//! flowbind-metrics: operational counters for the bridge.
//!
//! The scheduling loop and dispatcher increment [`BridgeStats`]; the API
//! listener reads it. Counters are plain atomics, so neither side ever
//! waits on the other.
//!
//! ```text
//! BridgeStats
//!   ├── record_*()  ← called by the loop / dispatcher
//!   └── snapshot() → StatsSnapshot
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics
//! ```

pub mod prometheus;
pub mod stats;

pub use prometheus::render_prometheus;
pub use stats::{BridgeStats, DeltaErrorKind, StatsSnapshot};
