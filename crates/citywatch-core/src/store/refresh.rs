// ── Bulk replacement ──
//
// Applies a whole camera list (e.g. seeds from config) to the store.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::CameraStore;
use super::collection::EntityCollection;
use crate::model::{Camera, EntityId};

/// Upsert all incoming entities, then prune any existing ids not in the
/// incoming set, then publish once. Subscribers never observe an empty or
/// half-applied collection.
fn upsert_and_prune<T: Send + Sync + 'static>(
    collection: &EntityCollection<T>,
    items: Vec<(EntityId, T)>,
) -> usize {
    let incoming: HashSet<EntityId> = items.iter().map(|(id, _)| id.clone()).collect();
    for (id, entity) in items {
        collection.store(id, Arc::new(entity));
    }
    let mut pruned = 0;
    for existing in collection.ids() {
        if !incoming.contains(&existing) && collection.discard(&existing) {
            pruned += 1;
        }
    }
    collection.publish();
    pruned
}

impl CameraStore {
    /// Replace the whole collection with `cameras`.
    pub fn replace_all(&self, cameras: Vec<Camera>) {
        let total = cameras.len();
        let pruned = upsert_and_prune(
            &self.cameras,
            cameras.into_iter().map(|c| (c.id.clone(), c)).collect(),
        );
        debug!(total, pruned, "camera collection replaced");
    }
}
