// ==========================================
// Inbound Flow Engine - Snapshot Cache
// ==========================================
// Role: optional memo of fetched snapshots keyed by canonical PO key
// Rule: bounded; when full the oldest inserted entry is evicted.
//       Callers invalidate explicitly; entries never expire on their own.
// ==========================================

use crate::domain::snapshot::FlowSnapshot;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, FlowSnapshot>,
    /// insertion order, oldest first
    order: VecDeque<String>,
}

pub struct SnapshotCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl SnapshotCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // a poisoned lock only means a panic elsewhere; the map itself is intact
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, po_key: &str) -> Option<FlowSnapshot> {
        self.state().entries.get(po_key).cloned()
    }

    pub fn insert(&self, snapshot: FlowSnapshot) {
        let po_key = snapshot.po_key().to_string();
        let mut state = self.state();

        if state.entries.insert(po_key.clone(), snapshot).is_some() {
            state.order.retain(|k| k != &po_key);
        }
        state.order.push_back(po_key);

        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
            }
        }
    }

    /// Drop one PO; returns whether it was cached.
    pub fn invalidate(&self, po_key: &str) -> bool {
        let mut state = self.state();
        let removed = state.entries.remove(po_key).is_some();
        if removed {
            state.order.retain(|k| k != po_key);
        }
        removed
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.order.clear();
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
