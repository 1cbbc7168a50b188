// ── Map view ──
//
// Props-driven front of the overlay engine. The host hands over the whole
// prop set on every render; the view compares it with what was last
// applied and only runs the effects whose inputs changed, in a fixed
// order: camera overlays, placement preview, search highlight.

use std::sync::Arc;

use tracing::trace;

use crate::config::MapConfig;
use crate::model::{Camera, LatLng};
use crate::overlay::{OverlayEngine, ReconcileStats};
use crate::search::SearchResult;
use crate::surface::{MapSurface, SurfaceFactory};

/// Everything the host feeds the map on each render.
#[derive(Debug, Clone, Default)]
pub struct MapProps {
    pub cameras: Arc<Vec<Arc<Camera>>>,
    pub add_mode: bool,
    /// Position chosen for a camera that is about to be added.
    pub candidate: Option<LatLng>,
    /// Latest search submission. Each submission is a fresh `Arc`, so an
    /// equal result submitted again still recenters the map.
    pub search: Option<Arc<SearchResult>>,
}

/// Prop values the effects last ran with.
#[derive(Debug, Clone)]
struct Applied {
    cameras: Arc<Vec<Arc<Camera>>>,
    camera_click: u64,
    add_mode: bool,
    candidate: Option<LatLng>,
    search: Option<Arc<SearchResult>>,
}

/// What one [`MapView::update`] ended up doing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectReport {
    pub reconciled: Option<ReconcileStats>,
    pub placement: bool,
    pub search: bool,
}

pub struct MapView<S: MapSurface> {
    engine: OverlayEngine<S>,
    props: MapProps,
    applied: Option<Applied>,
    camera_click: u64,
}

impl<S: MapSurface> MapView<S> {
    pub fn new(config: MapConfig) -> Self {
        Self {
            engine: OverlayEngine::new(config),
            props: MapProps::default(),
            applied: None,
            camera_click: 0,
        }
    }

    /// Create the surface and apply the current props from scratch.
    pub fn mount<F>(&mut self, factory: &mut F) -> EffectReport
    where
        F: SurfaceFactory<Surface = S>,
    {
        if self.engine.mount(factory) {
            self.applied = None;
        }
        self.run_effects()
    }

    /// Destroy the surface and everything drawn on it.
    pub fn unmount(&mut self) {
        self.engine.unmount();
        self.applied = None;
    }

    /// Replace the props and run the effects whose inputs changed.
    pub fn update(&mut self, props: MapProps) -> EffectReport {
        self.props = props;
        self.run_effects()
    }

    pub fn props(&self) -> &MapProps {
        &self.props
    }

    /// Install the camera click callback. Changing it reruns
    /// reconciliation.
    pub fn on_camera_click(&mut self, handler: impl Fn(Arc<Camera>) + Send + Sync + 'static) {
        self.engine.set_camera_click(Some(Box::new(handler)));
        self.camera_click = self.camera_click.wrapping_add(1);
        self.run_effects();
    }

    /// Install the map click callback; it only fires while add-mode is on.
    pub fn on_map_click(&mut self, handler: impl Fn(LatLng) + Send + Sync + 'static) {
        self.engine.set_map_click(Some(Box::new(handler)));
    }

    pub fn clear_map_click(&mut self) {
        self.engine.set_map_click(None);
    }

    pub fn engine(&self) -> &OverlayEngine<S> {
        &self.engine
    }

    pub fn surface(&self) -> Option<&S> {
        self.engine.surface()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.engine.surface_mut()
    }

    fn run_effects(&mut self) -> EffectReport {
        self.engine.set_add_mode(self.props.add_mode);

        if !self.engine.is_mounted() {
            trace!("map view not mounted; props stored");
            return EffectReport::default();
        }

        let props = &self.props;
        let prev = self.applied.as_ref();
        let mut report = EffectReport::default();

        let cameras_changed = prev.is_none_or(|a| {
            !Arc::ptr_eq(&a.cameras, &props.cameras) || a.camera_click != self.camera_click
        });
        if cameras_changed {
            report.reconciled = self.engine.reconcile(&props.cameras);
        }

        let placement_changed =
            prev.is_none_or(|a| a.add_mode != props.add_mode || a.candidate != props.candidate);
        if placement_changed {
            report.placement = self.engine.update_placement(props.add_mode, props.candidate);
        }

        if prev.is_none_or(|a| !same_submission(a.search.as_ref(), props.search.as_ref())) {
            report.search = self.engine.update_search(props.search.as_deref());
        }

        self.applied = Some(Applied {
            cameras: Arc::clone(&props.cameras),
            camera_click: self.camera_click,
            add_mode: props.add_mode,
            candidate: props.candidate,
            search: props.search.clone(),
        });
        report
    }
}

fn same_submission(a: Option<&Arc<SearchResult>>, b: Option<&Arc<SearchResult>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
