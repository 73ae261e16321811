//! Identity registry: engine identifiers to orchestrator identifiers.
//!
//! The engine refers to workloads by numeric task id and to hosts by an
//! opaque resource id. Observers that watch the orchestrator record each
//! pairing here as they learn of it; the scheduling loop only reads.
//!
//! The two mappings are independent, each behind its own reader-writer
//! lock, so a burst of host updates never stalls workload lookups. The
//! maps are never handed out: callers get cloned entries or snapshots.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use flowbind_core::{HostId, ResourceId, TaskId, Workload};

/// Concurrency-safe store of task → workload and resource → host pairings.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    workloads: RwLock<HashMap<TaskId, Workload>>,
    hosts: RwLock<HashMap<ResourceId, HostId>>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Workloads ──────────────────────────────────────────────────

    /// Record (or replace) the workload paired with `task_id`.
    pub fn register_workload(&self, task_id: TaskId, workload: Workload) {
        debug!(%task_id, workload = %workload.id, "workload registered");
        write(&self.workloads).insert(task_id, workload);
    }

    pub fn lookup_workload(&self, task_id: TaskId) -> Option<Workload> {
        read(&self.workloads).get(&task_id).cloned()
    }

    /// Remove the pairing for `task_id`, returning the entry if there was one.
    pub fn unregister_workload(&self, task_id: TaskId) -> Option<Workload> {
        let removed = write(&self.workloads).remove(&task_id);
        if let Some(ref workload) = removed {
            debug!(%task_id, workload = %workload.id, "workload unregistered");
        }
        removed
    }

    /// Point-in-time copy of all workload pairings, ordered by task id.
    pub fn workloads(&self) -> Vec<(TaskId, Workload)> {
        let mut entries: Vec<_> = read(&self.workloads)
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }

    pub fn workload_count(&self) -> usize {
        read(&self.workloads).len()
    }

    // ── Hosts ──────────────────────────────────────────────────────

    /// Record (or replace) the host paired with `resource_id`.
    pub fn register_host(&self, resource_id: ResourceId, host: HostId) {
        debug!(%resource_id, %host, "host registered");
        write(&self.hosts).insert(resource_id, host);
    }

    pub fn lookup_host(&self, resource_id: &ResourceId) -> Option<HostId> {
        read(&self.hosts).get(resource_id).cloned()
    }

    pub fn unregister_host(&self, resource_id: &ResourceId) -> Option<HostId> {
        let removed = write(&self.hosts).remove(resource_id);
        if let Some(ref host) = removed {
            debug!(%resource_id, %host, "host unregistered");
        }
        removed
    }

    /// Point-in-time copy of all host pairings, ordered by resource id.
    pub fn hosts(&self) -> Vec<(ResourceId, HostId)> {
        let mut entries: Vec<_> = read(&self.hosts)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }

    pub fn host_count(&self) -> usize {
        read(&self.hosts).len()
    }
}

// A writer that panicked mid-call cannot leave a torn entry behind
// (HashMap insert/remove either happened or not), so poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_registry() {
        let registry = IdentityRegistry::new();
        assert_eq!(registry.workload_count(), 0);
        assert_eq!(registry.host_count(), 0);
        assert!(registry.lookup_workload(TaskId(1)).is_none());
        assert!(registry.lookup_host(&ResourceId::from("r1")).is_none());
    }

    #[test]
    fn register_and_lookup_workload() {
        let registry = IdentityRegistry::new();
        registry.register_workload(TaskId(5), Workload::bare("nsA", "podA"));

        let found = registry.lookup_workload(TaskId(5)).unwrap();
        assert_eq!(found.id.name, "podA");
        assert_eq!(found.id.namespace, "nsA");
    }

    #[test]
    fn register_workload_is_idempotent_upsert() {
        let registry = IdentityRegistry::new();
        registry.register_workload(TaskId(5), Workload::bare("ns", "pod"));
        registry.register_workload(TaskId(5), Workload::bare("ns", "pod"));
        assert_eq!(registry.workload_count(), 1);

        registry.register_workload(TaskId(5), Workload::controlled("ns", "pod-2", "Job"));
        assert_eq!(registry.workload_count(), 1);
        assert_eq!(registry.lookup_workload(TaskId(5)).unwrap().id.name, "pod-2");
    }

    #[test]
    fn unregister_workload_returns_entry() {
        let registry = IdentityRegistry::new();
        registry.register_workload(TaskId(1), Workload::bare("ns", "pod"));

        assert!(registry.unregister_workload(TaskId(1)).is_some());
        assert!(registry.unregister_workload(TaskId(1)).is_none());
        assert!(registry.lookup_workload(TaskId(1)).is_none());
    }

    #[test]
    fn register_and_lookup_host() {
        let registry = IdentityRegistry::new();
        let r1 = ResourceId::from("r1");
        registry.register_host(r1.clone(), HostId::from("nodeX"));

        assert_eq!(registry.lookup_host(&r1), Some(HostId::from("nodeX")));
        assert_eq!(registry.unregister_host(&r1), Some(HostId::from("nodeX")));
        assert!(registry.lookup_host(&r1).is_none());
    }

    #[test]
    fn mappings_are_independent() {
        let registry = IdentityRegistry::new();
        registry.register_workload(TaskId(1), Workload::bare("ns", "pod"));
        registry.register_host(ResourceId::from("1"), HostId::from("node"));

        registry.unregister_host(&ResourceId::from("1"));
        assert!(registry.lookup_workload(TaskId(1)).is_some());
    }

    #[test]
    fn snapshots_are_sorted() {
        let registry = IdentityRegistry::new();
        registry.register_workload(TaskId(9), Workload::bare("ns", "c"));
        registry.register_workload(TaskId(2), Workload::bare("ns", "a"));
        registry.register_host(ResourceId::from("r2"), HostId::from("b"));
        registry.register_host(ResourceId::from("r1"), HostId::from("a"));

        let tasks: Vec<_> = registry.workloads().into_iter().map(|(k, _)| k).collect();
        assert_eq!(tasks, vec![TaskId(2), TaskId(9)]);

        let resources: Vec<_> = registry
            .hosts()
            .into_iter()
            .map(|(k, _)| k.0)
            .collect();
        assert_eq!(resources, vec!["r1", "r2"]);
    }

    #[test]
    fn poisoned_lock_still_serves_reads() {
        let registry = Arc::new(IdentityRegistry::new());
        registry.register_workload(TaskId(1), Workload::bare("ns", "pod"));

        let poisoner = Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.workloads.write().unwrap();
            panic!("observer crashed while holding the lock");
        })
        .join();

        assert!(registry.workloads.is_poisoned());
        assert!(registry.lookup_workload(TaskId(1)).is_some());
        registry.register_workload(TaskId(2), Workload::bare("ns", "pod-2"));
        assert_eq!(registry.workload_count(), 2);
    }
}
