// ── Click routing ──
//
// Surface callbacks are registered once (map click at mount, marker click
// at pair creation) but must always act on the latest state: the current
// add-mode flag, the current host callbacks, and the current camera
// object behind a marker. The router holds that state behind lock-free
// swaps; callbacks only capture an `Arc<ClickRouter>` plus an id.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};
use tracing::trace;

use crate::model::{Camera, EntityId, LatLng};

/// Host callback receiving the clicked camera.
pub type CameraClickHandler = Box<dyn Fn(Arc<Camera>) + Send + Sync>;

/// Host callback receiving a map click position while in add-mode.
pub type MapClickHandler = Box<dyn Fn(LatLng) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ClickRouter {
    cameras: ArcSwap<HashMap<EntityId, Arc<Camera>>>,
    on_camera: ArcSwapOption<CameraClickHandler>,
    on_map: ArcSwapOption<MapClickHandler>,
    add_mode: AtomicBool,
}

impl ClickRouter {
    pub(crate) fn set_cameras(&self, cameras: &[Arc<Camera>]) {
        let map = cameras
            .iter()
            .map(|c| (c.id.clone(), Arc::clone(c)))
            .collect();
        self.cameras.store(Arc::new(map));
    }

    pub(crate) fn clear_cameras(&self) {
        self.cameras.store(Arc::new(HashMap::new()));
    }

    pub(crate) fn set_camera_handler(&self, handler: Option<CameraClickHandler>) {
        self.on_camera.store(handler.map(Arc::new));
    }

    pub(crate) fn set_map_handler(&self, handler: Option<MapClickHandler>) {
        self.on_map.store(handler.map(Arc::new));
    }

    pub(crate) fn set_add_mode(&self, on: bool) {
        self.add_mode.store(on, Ordering::Relaxed);
    }

    /// A camera marker was clicked. Fires regardless of add-mode.
    pub(crate) fn camera_clicked(&self, id: &EntityId) {
        let Some(camera) = self.cameras.load().get(id).cloned() else {
            trace!(%id, "click on marker of a camera no longer present");
            return;
        };
        if let Some(handler) = self.on_camera.load_full() {
            handler(camera);
        }
    }

    /// The map background was clicked. Forwarded only in add-mode.
    pub(crate) fn map_clicked(&self, at: LatLng) {
        if !self.add_mode.load(Ordering::Relaxed) {
            return;
        }
        if let Some(handler) = self.on_map.load_full() {
            handler(at);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;

    use crate::model::CameraStatus;

    fn camera(id: &str, radius: f64) -> Arc<Camera> {
        Arc::new(Camera {
            id: EntityId::from(id),
            name: format!("Camera-{id}"),
            position: LatLng::new(52.29, 104.28),
            radius,
            status: CameraStatus::Active,
            coverage: 85,
            last_activity: Utc::now(),
        })
    }

    #[test]
    fn map_click_only_forwarded_in_add_mode() {
        let router = ClickRouter::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        router.set_map_handler(Some(Box::new(move |at| sink.lock().unwrap().push(at))));

        router.map_clicked(LatLng::new(1.0, 1.0));
        router.set_add_mode(true);
        router.map_clicked(LatLng::new(2.0, 2.0));

        assert_eq!(*seen.lock().unwrap(), vec![LatLng::new(2.0, 2.0)]);
    }

    #[test]
    fn camera_click_reports_latest_snapshot() {
        let router = ClickRouter::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        router.set_camera_handler(Some(Box::new(move |c| sink.lock().unwrap().push(c.radius))));

        router.set_cameras(&[camera("1", 150.0)]);
        router.set_cameras(&[camera("1", 180.0)]);
        router.camera_clicked(&EntityId::from("1"));

        assert_eq!(*seen.lock().unwrap(), vec![180.0]);
    }

    #[test]
    fn click_on_removed_camera_is_ignored() {
        let router = ClickRouter::default();
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        router.set_camera_handler(Some(Box::new(move |_| *sink.lock().unwrap() += 1)));
        router.set_cameras(&[camera("1", 100.0)]);
        router.clear_cameras();

        router.camera_clicked(&EntityId::from("1"));
        assert_eq!(*hits.lock().unwrap(), 0);
    }
}
