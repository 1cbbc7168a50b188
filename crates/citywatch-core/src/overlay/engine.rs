// ── Overlay reconciliation engine ──
//
// Owns the mounted surface, the identity → (marker, circle) mapping and the
// two transient slots. Every pass diffs the incoming collection against the
// mapping and issues the minimal set of surface primitives.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, trace};

use super::router::{CameraClickHandler, ClickRouter, MapClickHandler};
use super::transient::{OverlaySlot, place_preview, place_search_pin};
use crate::config::MapConfig;
use crate::model::{Camera, EntityId, LatLng, camera_icon, coverage_style, status_color};
use crate::search::SearchResult;
use crate::surface::{MapSurface, SurfaceFactory};

/// The marker and coverage circle rendered for one camera.
pub struct OverlayPair<S: MapSurface> {
    pub marker: S::Marker,
    pub circle: S::Circle,
}

impl<S: MapSurface> Clone for OverlayPair<S> {
    fn clone(&self) -> Self {
        Self {
            marker: self.marker.clone(),
            circle: self.circle.clone(),
        }
    }
}

impl<S: MapSurface> fmt::Debug for OverlayPair<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayPair")
            .field("marker", &self.marker)
            .field("circle", &self.circle)
            .finish()
    }
}

/// Counts of pair operations performed by one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

pub struct OverlayEngine<S: MapSurface> {
    config: MapConfig,
    surface: Option<S>,
    pairs: HashMap<EntityId, OverlayPair<S>>,
    placement: OverlaySlot<S::Marker>,
    search: OverlaySlot<S::Marker>,
    router: Arc<ClickRouter>,
}

impl<S: MapSurface> OverlayEngine<S> {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            surface: None,
            pairs: HashMap::new(),
            placement: OverlaySlot::default(),
            search: OverlaySlot::default(),
            router: Arc::new(ClickRouter::default()),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Create the surface if none exists. Returns `false` when already
    /// mounted.
    pub fn mount<F>(&mut self, factory: &mut F) -> bool
    where
        F: SurfaceFactory<Surface = S>,
    {
        if self.surface.is_some() {
            trace!("mount skipped: surface already exists");
            return false;
        }

        let cfg = &self.config;
        let mut surface = factory.create_surface(&cfg.container, cfg.center, cfg.zoom);
        surface.add_tile_layer(&cfg.tile_layer);

        let router = Arc::clone(&self.router);
        surface.on_click(Arc::new(move |at| router.map_clicked(at)));

        info!(
            container = %cfg.container,
            center = %cfg.center,
            zoom = cfg.zoom,
            "map surface mounted"
        );
        self.surface = Some(surface);
        true
    }

    /// Destroy the surface and forget every overlay it held. Returns
    /// `false` when nothing was mounted.
    pub fn unmount(&mut self) -> bool {
        let Some(surface) = self.surface.take() else {
            trace!("unmount skipped: no surface");
            return false;
        };
        surface.destroy();

        let dropped = self.pairs.len();
        self.pairs.clear();
        self.placement.forget();
        self.search.forget();
        self.router.clear_cameras();

        info!(pairs = dropped, "map surface destroyed");
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    // ── Reconciliation ─────────────────────────────────────────────

    /// Bring the pair mapping in line with `cameras`. Returns `None` when
    /// no surface is mounted.
    pub fn reconcile(&mut self, cameras: &[Arc<Camera>]) -> Option<ReconcileStats> {
        let Some(surface) = self.surface.as_mut() else {
            trace!(incoming = cameras.len(), "reconcile skipped: no surface");
            return None;
        };

        self.router.set_cameras(cameras);

        let incoming: HashSet<&EntityId> = cameras.iter().map(|c| &c.id).collect();
        let mut stats = ReconcileStats::default();

        self.pairs.retain(|id, pair| {
            if incoming.contains(id) {
                return true;
            }
            surface.remove_marker(&pair.marker);
            surface.remove_circle(&pair.circle);
            stats.removed += 1;
            false
        });

        for camera in cameras {
            let color = status_color(camera.status);
            let icon = camera_icon(color);
            let style = coverage_style(color);

            if let Some(pair) = self.pairs.get(&camera.id) {
                surface.set_marker_position(&pair.marker, camera.position);
                surface.set_marker_icon(&pair.marker, &icon);
                surface.set_circle_position(&pair.circle, camera.position);
                surface.set_circle_radius(&pair.circle, camera.radius);
                surface.set_circle_style(&pair.circle, &style);
                stats.updated += 1;
                continue;
            }

            let circle = surface.create_circle(camera.position, camera.radius, &style);
            let marker = surface.create_marker(camera.position, &icon);
            let router = Arc::clone(&self.router);
            let id = camera.id.clone();
            surface.bind_click(&marker, Arc::new(move || router.camera_clicked(&id)));

            self.pairs
                .insert(camera.id.clone(), OverlayPair { marker, circle });
            stats.created += 1;
        }

        debug!(
            created = stats.created,
            updated = stats.updated,
            removed = stats.removed,
            pairs = self.pairs.len(),
            "overlays reconciled"
        );
        Some(stats)
    }

    // ── Transient overlays ─────────────────────────────────────────

    /// Rebuild the placement preview. Returns `false` when no surface is
    /// mounted.
    pub fn update_placement(&mut self, add_mode: bool, candidate: Option<LatLng>) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            trace!("placement update skipped: no surface");
            return false;
        };
        self.placement
            .replace(surface, |s| place_preview(s, add_mode, candidate));
        true
    }

    /// Rebuild the search highlight. Returns `false` when no surface is
    /// mounted.
    pub fn update_search(&mut self, result: Option<&SearchResult>) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            trace!("search update skipped: no surface");
            return false;
        };
        let zoom = self.config.search_zoom;
        self.search
            .replace(surface, |s| place_search_pin(s, result, zoom));
        true
    }

    // ── Click wiring ───────────────────────────────────────────────

    pub fn set_camera_click(&self, handler: Option<CameraClickHandler>) {
        self.router.set_camera_handler(handler);
    }

    pub fn set_map_click(&self, handler: Option<MapClickHandler>) {
        self.router.set_map_handler(handler);
    }

    /// Gate for forwarding map clicks; read at click time.
    pub fn set_add_mode(&self, on: bool) {
        self.router.set_add_mode(on);
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn pair(&self, id: &EntityId) -> Option<&OverlayPair<S>> {
        self.pairs.get(id)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&EntityId, &OverlayPair<S>)> {
        self.pairs.iter()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn placement_marker(&self) -> Option<&S::Marker> {
        self.placement.get()
    }

    pub fn search_marker(&self) -> Option<&S::Marker> {
        self.search.get()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }
}

impl<S: MapSurface> Drop for OverlayEngine<S> {
    fn drop(&mut self) {
        if let Some(surface) = self.surface.take() {
            surface.destroy();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use crate::model::CameraStatus;
    use crate::surface::{RecordingFactory, RecordingSurface, SurfaceCall};

    fn camera(id: &str, lat: f64, lng: f64) -> Arc<Camera> {
        Arc::new(Camera {
            id: EntityId::from(id),
            name: format!("Camera-{id}"),
            position: LatLng::new(lat, lng),
            radius: 100.0,
            status: CameraStatus::Active,
            coverage: 85,
            last_activity: Utc::now(),
        })
    }

    fn mounted() -> (OverlayEngine<RecordingSurface>, RecordingFactory) {
        let mut factory = RecordingFactory::new();
        let mut engine = OverlayEngine::new(MapConfig::default());
        assert!(engine.mount(&mut factory));
        (engine, factory)
    }

    #[test]
    fn mount_creates_surface_with_tile_layer_and_listener() {
        let (engine, factory) = mounted();
        let calls = factory.log.calls();

        assert_eq!(
            calls[0],
            SurfaceCall::Create {
                container: "map".into(),
                center: LatLng::new(52.2897, 104.2806),
                zoom: 13,
            }
        );
        assert!(matches!(calls[1], SurfaceCall::AddTileLayer(_)));
        assert_eq!(calls[2], SurfaceCall::OnClick);
        assert_eq!(engine.surface().unwrap().tile_layers()[0].max_zoom, 19);
    }

    #[test]
    fn mount_is_idempotent() {
        let (mut engine, mut factory) = mounted();
        let before = factory.log.len();
        assert!(!engine.mount(&mut factory));
        assert_eq!(factory.log.len(), before);
    }

    #[test]
    fn new_pair_creates_circle_then_marker_then_click() {
        let (mut engine, factory) = mounted();
        let from = factory.log.len();
        engine.reconcile(&[camera("1", 52.29, 104.28)]).unwrap();

        let calls = factory.log.since(from);
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], SurfaceCall::CreateCircle(..)));
        assert!(matches!(calls[1], SurfaceCall::CreateMarker(..)));
        assert!(matches!(calls[2], SurfaceCall::BindClick(_)));
    }

    #[test]
    fn reconcile_without_surface_is_skipped() {
        let mut engine: OverlayEngine<RecordingSurface> = OverlayEngine::new(MapConfig::default());
        assert_eq!(engine.reconcile(&[camera("1", 52.29, 104.28)]), None);
        assert_eq!(engine.pair_count(), 0);
        assert!(!engine.update_placement(true, Some(LatLng::new(52.3, 104.28))));
        assert!(!engine.update_search(None));
    }

    #[test]
    fn duplicate_id_in_collection_yields_one_pair() {
        let (mut engine, _factory) = mounted();
        let stats = engine
            .reconcile(&[camera("1", 52.29, 104.28), camera("1", 52.30, 104.29)])
            .unwrap();

        assert_eq!(stats.created, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(engine.pair_count(), 1);
    }

    #[test]
    fn drop_destroys_mounted_surface() {
        let (engine, factory) = mounted();
        drop(engine);
        assert_eq!(factory.log.count(|c| *c == SurfaceCall::Destroy), 1);
    }

    #[test]
    fn placement_slot_ignores_candidate_outside_add_mode() {
        let (mut engine, _factory) = mounted();
        engine.update_placement(false, Some(LatLng::new(52.30, 104.28)));
        assert!(engine.placement_marker().is_none());

        engine.update_placement(true, None);
        assert!(engine.placement_marker().is_none());
    }
}
