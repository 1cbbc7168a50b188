// ── Camera store ──
//
// The dashboard's camera collection. Mutations come from the add/delete
// workflow and config seeds; the map view and the list panel read
// snapshots.

use std::sync::Arc;

use tracing::debug;

use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{Camera, CameraStatus, EntityId};
use crate::stream::EntityStream;

/// Subscription to the camera collection.
pub type CameraStream = EntityStream<Camera>;

/// Aggregates shown in the dashboard's statistic tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraStats {
    pub total: usize,
    pub active: usize,
    /// Mean coverage percentage, rounded. Zero when there are no cameras.
    pub average_coverage: u8,
}

/// Reactive store for cameras.
///
/// Thread-safe and lock-free: reads are wait-free, writes use the per-shard
/// locks inside `DashMap`. Every mutation publishes a fresh snapshot.
pub struct CameraStore {
    pub(crate) cameras: EntityCollection<Camera>,
}

impl Default for CameraStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraStore {
    pub fn new() -> Self {
        Self {
            cameras: EntityCollection::new(),
        }
    }

    /// Store seeded with `cameras`, in order.
    pub fn with_cameras(cameras: Vec<Camera>) -> Self {
        let store = Self::new();
        store.replace_all(cameras);
        store
    }

    /// Insert or replace a camera. Returns `true` if its id was new.
    pub fn insert(&self, camera: Camera) -> bool {
        let id = camera.id.clone();
        let is_new = self.cameras.upsert(id.clone(), camera);
        debug!(%id, is_new, "camera stored");
        is_new
    }

    /// Edit a camera in place. The id cannot be changed.
    pub fn update(
        &self,
        id: &EntityId,
        f: impl FnOnce(&mut Camera),
    ) -> Result<Arc<Camera>, CoreError> {
        let updated = self
            .cameras
            .modify(id, |camera| {
                f(camera);
                camera.id = id.clone();
            })
            .ok_or_else(|| CoreError::CameraNotFound { id: id.to_string() })?;
        debug!(%id, "camera updated");
        Ok(updated)
    }

    pub fn remove(&self, id: &EntityId) -> Result<Arc<Camera>, CoreError> {
        let removed = self
            .cameras
            .remove(id)
            .ok_or_else(|| CoreError::CameraNotFound { id: id.to_string() })?;
        debug!(%id, name = %removed.name, "camera removed");
        Ok(removed)
    }

    pub fn get(&self, id: &EntityId) -> Option<Arc<Camera>> {
        self.cameras.get(id)
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<Camera>>> {
        self.cameras.snapshot()
    }

    pub fn subscribe(&self) -> CameraStream {
        EntityStream::new(self.cameras.subscribe())
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn stats(&self) -> CameraStats {
        CameraStats::from_cameras(&self.snapshot())
    }
}

impl CameraStats {
    pub fn from_cameras(cameras: &[Arc<Camera>]) -> Self {
        let total = cameras.len();
        if total == 0 {
            return Self::default();
        }
        let active = cameras
            .iter()
            .filter(|c| c.status == CameraStatus::Active)
            .count();
        let sum: usize = cameras.iter().map(|c| usize::from(c.coverage)).sum();
        // Round half up; the mean of u8 values always fits in u8.
        let average = (sum + total / 2) / total;

        Self {
            total,
            active,
            average_coverage: u8::try_from(average).unwrap_or(u8::MAX),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use crate::model::LatLng;

    fn camera(id: &str, status: CameraStatus, coverage: u8) -> Camera {
        Camera {
            id: EntityId::from(id),
            name: format!("Camera-{id}"),
            position: LatLng::new(52.29, 104.28),
            radius: 100.0,
            status,
            coverage,
            last_activity: Utc::now(),
        }
    }

    #[test]
    fn stats_for_empty_store_are_zero() {
        assert_eq!(CameraStore::new().stats(), CameraStats::default());
    }

    #[test]
    fn stats_count_active_and_round_average() {
        let store = CameraStore::with_cameras(vec![
            camera("1", CameraStatus::Active, 85),
            camera("2", CameraStatus::Warning, 90),
            camera("3", CameraStatus::Inactive, 90),
        ]);
        assert_eq!(
            store.stats(),
            CameraStats {
                total: 3,
                active: 1,
                average_coverage: 88,
            }
        );
    }

    #[test]
    fn update_keeps_id_and_position_in_snapshot() {
        let store = CameraStore::with_cameras(vec![
            camera("1", CameraStatus::Active, 85),
            camera("2", CameraStatus::Active, 85),
        ]);
        let id = EntityId::from("1");

        let updated = store
            .update(&id, |c| {
                c.radius = 180.0;
                c.id = EntityId::from("hijack");
            })
            .unwrap();

        assert_eq!(updated.id, id);
        assert!((updated.radius - 180.0).abs() < f64::EPSILON);
        assert_eq!(store.snapshot()[0].id, id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_unknown_camera_fails() {
        let store = CameraStore::new();
        assert_eq!(
            store.remove(&EntityId::from("9")).unwrap_err(),
            CoreError::CameraNotFound { id: "9".into() }
        );
    }

    #[test]
    fn replace_all_prunes_and_upserts() {
        let store = CameraStore::with_cameras(vec![
            camera("1", CameraStatus::Active, 85),
            camera("2", CameraStatus::Active, 85),
        ]);
        store.replace_all(vec![
            camera("2", CameraStatus::Warning, 85),
            camera("3", CameraStatus::Active, 85),
        ]);

        let ids: Vec<String> = store.snapshot().iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(
            store.get(&EntityId::from("2")).unwrap().status,
            CameraStatus::Warning
        );
    }

    #[tokio::test]
    async fn subscribers_see_each_mutation() {
        let store = CameraStore::new();
        let mut stream = store.subscribe();
        assert!(stream.current().is_empty());

        store.insert(camera("1", CameraStatus::Active, 85));
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(stream.current().len(), 1);

        store.remove(&EntityId::from("1")).unwrap();
        assert!(stream.changed().await.unwrap().is_empty());
        assert!(stream.latest().is_empty());
    }
}
