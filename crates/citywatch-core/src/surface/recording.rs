// ── In-memory recording surface ──
//
// A `MapSurface` that keeps its overlays in plain maps and appends every
// primitive call to a log shared with the factory that created it. The log
// outlives the surface, so tests can assert on teardown too.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{MapClickCallback, MapSurface, MarkerClickCallback, TileLayer};
use crate::model::{CircleStyle, IconSpec, LatLng, Popup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CircleId(pub u64);

/// One primitive call, in the order it reached the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Create { container: String, center: LatLng, zoom: u8 },
    Destroy,
    AddTileLayer(TileLayer),
    OnClick,
    CreateMarker(MarkerId, LatLng, IconSpec),
    RemoveMarker(MarkerId),
    SetMarkerPosition(MarkerId, LatLng),
    SetMarkerIcon(MarkerId, IconSpec),
    BindClick(MarkerId),
    BindPopup(MarkerId, Popup),
    CreateCircle(CircleId, LatLng, f64, CircleStyle),
    RemoveCircle(CircleId),
    SetCirclePosition(CircleId, LatLng),
    SetCircleRadius(CircleId, f64),
    SetCircleStyle(CircleId, CircleStyle),
    SetView(LatLng, u8),
}

impl SurfaceCall {
    /// Calls that add or remove an overlay, as opposed to mutating one.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::CreateMarker(..)
                | Self::RemoveMarker(_)
                | Self::CreateCircle(..)
                | Self::RemoveCircle(_)
        )
    }
}

/// Shared, append-only call log.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<SurfaceCall>>>);

impl CallLog {
    fn push(&self, call: SurfaceCall) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    /// Copy of every call recorded so far.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls recorded after the first `from` entries.
    pub fn since(&self, from: usize) -> Vec<SurfaceCall> {
        self.calls().into_iter().skip(from).collect()
    }

    pub fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }
}

/// Marker state as last set through the primitives.
#[derive(Clone)]
pub struct RecordedMarker {
    pub position: LatLng,
    pub icon: IconSpec,
    pub popup: Option<Popup>,
    click: Option<MarkerClickCallback>,
}

/// Circle state as last set through the primitives.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCircle {
    pub position: LatLng,
    pub radius: f64,
    pub style: CircleStyle,
}

/// In-memory surface for tests and headless runs.
pub struct RecordingSurface {
    log: CallLog,
    center: LatLng,
    zoom: u8,
    tile_layers: Vec<TileLayer>,
    on_click: Option<MapClickCallback>,
    markers: HashMap<MarkerId, RecordedMarker>,
    circles: HashMap<CircleId, RecordedCircle>,
    next_id: u64,
}

impl RecordingSurface {
    pub fn new(log: CallLog, container: &str, center: LatLng, zoom: u8) -> Self {
        log.push(SurfaceCall::Create {
            container: container.to_owned(),
            center,
            zoom,
        });
        Self {
            log,
            center,
            zoom,
            tile_layers: Vec::new(),
            on_click: None,
            markers: HashMap::new(),
            circles: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn view(&self) -> (LatLng, u8) {
        (self.center, self.zoom)
    }

    pub fn tile_layers(&self) -> &[TileLayer] {
        &self.tile_layers
    }

    pub fn marker(&self, id: MarkerId) -> Option<&RecordedMarker> {
        self.markers.get(&id)
    }

    pub fn circle(&self, id: CircleId) -> Option<&RecordedCircle> {
        self.circles.get(&id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    /// Simulate a click on a marker. Returns `false` if it has no handler.
    pub fn click_marker(&self, id: MarkerId) -> bool {
        match self.markers.get(&id).and_then(|m| m.click.as_ref()) {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }

    /// Simulate a click on the map background.
    pub fn click_map(&self, at: LatLng) {
        if let Some(cb) = &self.on_click {
            cb(at);
        }
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MapSurface for RecordingSurface {
    type Marker = MarkerId;
    type Circle = CircleId;

    fn destroy(self) {
        self.log.push(SurfaceCall::Destroy);
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) {
        self.log.push(SurfaceCall::AddTileLayer(layer.clone()));
        self.tile_layers.push(layer.clone());
    }

    fn on_click(&mut self, callback: MapClickCallback) {
        self.log.push(SurfaceCall::OnClick);
        self.on_click = Some(callback);
    }

    fn create_marker(&mut self, at: LatLng, icon: &IconSpec) -> MarkerId {
        let id = MarkerId(self.next());
        self.log.push(SurfaceCall::CreateMarker(id, at, *icon));
        self.markers.insert(
            id,
            RecordedMarker {
                position: at,
                icon: *icon,
                popup: None,
                click: None,
            },
        );
        id
    }

    fn remove_marker(&mut self, marker: &MarkerId) {
        self.log.push(SurfaceCall::RemoveMarker(*marker));
        self.markers.remove(marker);
    }

    fn set_marker_position(&mut self, marker: &MarkerId, at: LatLng) {
        self.log.push(SurfaceCall::SetMarkerPosition(*marker, at));
        if let Some(m) = self.markers.get_mut(marker) {
            m.position = at;
        }
    }

    fn set_marker_icon(&mut self, marker: &MarkerId, icon: &IconSpec) {
        self.log.push(SurfaceCall::SetMarkerIcon(*marker, *icon));
        if let Some(m) = self.markers.get_mut(marker) {
            m.icon = *icon;
        }
    }

    fn bind_click(&mut self, marker: &MarkerId, callback: MarkerClickCallback) {
        self.log.push(SurfaceCall::BindClick(*marker));
        if let Some(m) = self.markers.get_mut(marker) {
            m.click = Some(callback);
        }
    }

    fn bind_popup(&mut self, marker: &MarkerId, popup: Popup) {
        self.log.push(SurfaceCall::BindPopup(*marker, popup.clone()));
        if let Some(m) = self.markers.get_mut(marker) {
            m.popup = Some(popup);
        }
    }

    fn create_circle(&mut self, at: LatLng, radius: f64, style: &CircleStyle) -> CircleId {
        let id = CircleId(self.next());
        self.log.push(SurfaceCall::CreateCircle(id, at, radius, *style));
        self.circles.insert(
            id,
            RecordedCircle {
                position: at,
                radius,
                style: *style,
            },
        );
        id
    }

    fn remove_circle(&mut self, circle: &CircleId) {
        self.log.push(SurfaceCall::RemoveCircle(*circle));
        self.circles.remove(circle);
    }

    fn set_circle_position(&mut self, circle: &CircleId, at: LatLng) {
        self.log.push(SurfaceCall::SetCirclePosition(*circle, at));
        if let Some(c) = self.circles.get_mut(circle) {
            c.position = at;
        }
    }

    fn set_circle_radius(&mut self, circle: &CircleId, radius: f64) {
        self.log.push(SurfaceCall::SetCircleRadius(*circle, radius));
        if let Some(c) = self.circles.get_mut(circle) {
            c.radius = radius;
        }
    }

    fn set_circle_style(&mut self, circle: &CircleId, style: &CircleStyle) {
        self.log.push(SurfaceCall::SetCircleStyle(*circle, *style));
        if let Some(c) = self.circles.get_mut(circle) {
            c.style = *style;
        }
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.log.push(SurfaceCall::SetView(center, zoom));
        self.center = center;
        self.zoom = zoom;
    }
}

/// Factory handing every surface it creates the same [`CallLog`].
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    pub log: CallLog,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl super::SurfaceFactory for RecordingFactory {
    type Surface = RecordingSurface;

    fn create_surface(&mut self, container: &str, center: LatLng, zoom: u8) -> RecordingSurface {
        RecordingSurface::new(self.log.clone(), container, center, zoom)
    }
}
