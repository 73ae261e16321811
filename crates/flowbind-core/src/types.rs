//! Identifiers and decision records shared across flowbind crates.
//!
//! The orchestrator names things by `namespace/name` (workloads) and by
//! node name (hosts). The engine names the same things with its own
//! graph identifiers: a numeric task id per workload and an opaque
//! resource id per host.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Engine identifiers ─────────────────────────────────────────────

/// The engine's identifier for a workload it is tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The engine's identifier for a schedulable resource (a host).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ── Orchestrator identifiers ───────────────────────────────────────

/// An execution host as named by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub String);

impl HostId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A workload as named by the orchestrator. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadId {
    pub namespace: String,
    pub name: String,
}

impl WorkloadId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A registered workload: its identity plus the controller that owns it.
///
/// `controller` is the kind of the owning controller (`ReplicaSet`,
/// `Job`, ...) when the observer knows of one. Workloads without a
/// controller are not resubmitted after a requeue-via-deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub id: WorkloadId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
}

impl Workload {
    /// A workload with no known controller.
    pub fn bare(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: WorkloadId::new(namespace, name),
            controller: None,
        }
    }

    /// A workload owned by a controller of the given kind.
    pub fn controlled(
        namespace: impl Into<String>,
        name: impl Into<String>,
        controller: impl Into<String>,
    ) -> Self {
        Self {
            id: WorkloadId::new(namespace, name),
            controller: Some(controller.into()),
        }
    }

    pub fn is_controlled(&self) -> bool {
        self.controller.is_some()
    }
}

// ── Scheduling decisions ───────────────────────────────────────────

/// The kind of a scheduling decision.
///
/// Wire values: PLACE=0, PREEMPT=1, MIGRATE=2, NOOP=3. Anything else
/// is kept as `Unrecognized` so the dispatcher can report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    Place,
    Preempt,
    Migrate,
    Noop,
    Unrecognized(i32),
}

impl DeltaKind {
    pub fn from_wire(value: i32) -> Self {
        match value {
            0 => DeltaKind::Place,
            1 => DeltaKind::Preempt,
            2 => DeltaKind::Migrate,
            3 => DeltaKind::Noop,
            other => DeltaKind::Unrecognized(other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeltaKind::Place => "place",
            DeltaKind::Preempt => "preempt",
            DeltaKind::Migrate => "migrate",
            DeltaKind::Noop => "noop",
            DeltaKind::Unrecognized(_) => "unrecognized",
        }
    }
}

impl fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaKind::Unrecognized(raw) => write!(f, "unrecognized({raw})"),
            other => f.write_str(other.label()),
        }
    }
}

/// One placement decision emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingDelta {
    pub kind: DeltaKind,
    pub task_id: TaskId,
    pub resource_id: ResourceId,
}

impl SchedulingDelta {
    pub fn place(task_id: u64, resource_id: &str) -> Self {
        Self {
            kind: DeltaKind::Place,
            task_id: TaskId(task_id),
            resource_id: ResourceId::from(resource_id),
        }
    }

    pub fn preempt(task_id: u64) -> Self {
        Self {
            kind: DeltaKind::Preempt,
            task_id: TaskId(task_id),
            resource_id: ResourceId::default(),
        }
    }

    pub fn migrate(task_id: u64) -> Self {
        Self {
            kind: DeltaKind::Migrate,
            task_id: TaskId(task_id),
            resource_id: ResourceId::default(),
        }
    }

    pub fn noop() -> Self {
        Self {
            kind: DeltaKind::Noop,
            task_id: TaskId(0),
            resource_id: ResourceId::default(),
        }
    }
}
