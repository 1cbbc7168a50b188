// ── Generic reactive entity collection ──
//
// Lock-free concurrent storage with O(1) lookups and push-based
// change notification via `watch` channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::EntityId;

/// Stored value plus the sequence number fixing its position in snapshots.
struct Slot<T> {
    seq: u64,
    entity: Arc<T>,
}

/// A lock-free, reactive collection keyed by [`EntityId`].
///
/// Snapshots list entities in first-insertion order; updating an entity
/// keeps its place. Every published mutation rebuilds the snapshot that
/// subscribers receive.
pub(crate) struct EntityCollection<T: Send + Sync + 'static> {
    by_id: DashMap<EntityId, Slot<T>>,

    /// Next insertion sequence number.
    next_seq: AtomicU64,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            next_seq: AtomicU64::new(0),
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, id: EntityId, entity: T) -> bool {
        let is_new = self.store(id, Arc::new(entity));
        self.publish();
        is_new
    }

    /// Apply `f` to a copy of the entity and store the result in place.
    pub(crate) fn modify(&self, id: &EntityId, f: impl FnOnce(&mut T)) -> Option<Arc<T>>
    where
        T: Clone,
    {
        let updated = {
            let mut slot = self.by_id.get_mut(id)?;
            let mut entity = T::clone(&slot.entity);
            f(&mut entity);
            slot.entity = Arc::new(entity);
            Arc::clone(&slot.entity)
        };
        self.publish();
        Some(updated)
    }

    /// Remove an entity. Returns it if it existed.
    pub(crate) fn remove(&self, id: &EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.remove(id).map(|(_, slot)| slot.entity);
        if removed.is_some() {
            self.publish();
        }
        removed
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(&r.value().entity))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.by_id.iter().map(|r| r.key().clone()).collect()
    }

    // ── Batch primitives (caller publishes) ─────────────────────────

    /// Insert or replace without notifying subscribers.
    pub(crate) fn store(&self, id: EntityId, entity: Arc<T>) -> bool {
        match self.by_id.get_mut(&id) {
            Some(mut slot) => {
                slot.entity = entity;
                false
            }
            None => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                self.by_id.insert(id, Slot { seq, entity });
                true
            }
        }
    }

    /// Remove without notifying subscribers.
    pub(crate) fn discard(&self, id: &EntityId) -> bool {
        self.by_id.remove(id).is_some()
    }

    /// Rebuild the ordered snapshot and broadcast it.
    pub(crate) fn publish(&self) {
        let mut slots: Vec<(u64, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (r.value().seq, Arc::clone(&r.value().entity)))
            .collect();
        slots.sort_unstable_by_key(|(seq, _)| *seq);
        let values = slots.into_iter().map(|(_, e)| e).collect();

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
