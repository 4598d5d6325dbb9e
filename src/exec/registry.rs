// src/exec/registry.rs

//! Registry of live supervised processes.
//!
//! Every mutation goes through one mutex, so an entry is inserted exactly
//! once and removed exactly once: of several concurrent `remove` calls for
//! the same id (natural exit, timeout, explicit stop) only one gets the
//! entry back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tracing::debug;

use crate::exec::termination::TerminationSignal;
use crate::types::ProcessId;

/// Public description of a registered process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub id: ProcessId,
    pub pid: Option<u32>,
    pub command: String,
    pub started_at: SystemTime,
}

/// A registry slot. The OS child itself is owned by the monitor task; the
/// entry holds the signal used to tell that task to kill it.
#[derive(Debug)]
pub struct ProcessEntry {
    pub info: ProcessInfo,
    pub signal: Arc<TerminationSignal>,
}

#[derive(Debug)]
pub struct ProcessRegistry {
    processes: Mutex<HashMap<ProcessId, ProcessEntry>>,
    next_id: AtomicU64,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            processes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn generate_id(&self) -> ProcessId {
        ProcessId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn insert(&self, entry: ProcessEntry) {
        let id = entry.info.id;
        let previous = self.lock().insert(id, entry);
        debug_assert!(previous.is_none(), "process id {id} registered twice");
        debug!(id = %id, "registered process");
    }

    /// Remove and return the entry for `id`, if it is still registered.
    pub fn remove(&self, id: ProcessId) -> Option<ProcessEntry> {
        let removed = self.lock().remove(&id);
        if removed.is_some() {
            debug!(id = %id, "deregistered process");
        }
        removed
    }

    /// Remove every entry at once.
    pub fn drain(&self) -> Vec<ProcessEntry> {
        self.lock().drain().map(|(_, entry)| entry).collect()
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list(&self) -> Vec<ProcessInfo> {
        let mut infos: Vec<_> = self.lock().values().map(|e| e.info.clone()).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProcessId, ProcessEntry>> {
        // The map stays consistent even if a holder panicked.
        self.processes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn entry(registry: &ProcessRegistry, command: &str) -> ProcessEntry {
        ProcessEntry {
            info: ProcessInfo {
                id: registry.generate_id(),
                pid: None,
                command: command.to_string(),
                started_at: SystemTime::now(),
            },
            signal: Arc::new(TerminationSignal::new()),
        }
    }

    #[test]
    fn ids_are_unique() {
        let registry = ProcessRegistry::new();
        let a = registry.generate_id();
        let b = registry.generate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn remove_returns_entry_only_once() {
        let registry = ProcessRegistry::new();
        let e = entry(&registry, "sleep 1");
        let id = e.info.id;
        registry.insert(e);

        assert!(registry.contains(id));
        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(!registry.contains(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_removal_has_a_single_winner() {
        let registry = Arc::new(ProcessRegistry::new());
        let e = entry(&registry, "sleep 1");
        let id = e.info.id;
        registry.insert(e);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.remove(id).is_some())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn drain_empties_registry_and_list_is_ordered() {
        let registry = ProcessRegistry::new();
        for cmd in ["a", "b", "c"] {
            let e = entry(&registry, cmd);
            registry.insert(e);
        }

        let listed: Vec<_> = registry.list().into_iter().map(|i| i.command).collect();
        assert_eq!(listed, vec!["a", "b", "c"]);

        assert_eq!(registry.drain().len(), 3);
        assert_eq!(registry.len(), 0);
    }
}
