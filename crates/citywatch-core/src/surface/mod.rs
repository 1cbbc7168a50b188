//! Map surface contract.
//!
//! A [`MapSurface`] is the interactive pan/zoom map widget that overlays are
//! drawn on. The overlay engine owns exactly one surface per mount and only
//! ever talks to it through these primitives, so any backend (a terminal
//! canvas, a browser map, the in-memory [`RecordingSurface`] used in tests)
//! can host the dashboard.

#[cfg(any(test, feature = "testing"))]
mod recording;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{CircleStyle, IconSpec, LatLng, Popup};

#[cfg(any(test, feature = "testing"))]
pub use recording::{
    CallLog, CircleId, MarkerId, RecordedCircle, RecordedMarker, RecordingFactory, RecordingSurface,
    SurfaceCall,
};

/// Listener for clicks on the map background, reporting the geo-coordinate.
pub type MapClickCallback = Arc<dyn Fn(LatLng) + Send + Sync>;

/// Listener for clicks on a single marker.
pub type MarkerClickCallback = Arc<dyn Fn() + Send + Sync>;

/// Base raster layer drawn beneath every overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    /// Slippy-map URL template (`{s}`, `{z}`, `{x}`, `{y}` placeholders).
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            attribution: "© OpenStreetMap contributors".into(),
            max_zoom: 19,
        }
    }
}

/// Primitive operations of an interactive map widget.
///
/// Marker and circle handles are opaque, cheap to clone, and only valid for
/// the surface that created them. Destroying the surface releases every
/// handle it ever returned.
pub trait MapSurface {
    type Marker: Clone + Eq + Hash + fmt::Debug;
    type Circle: Clone + Eq + Hash + fmt::Debug;

    /// Tear the widget down, releasing its tile layer, markers and circles.
    fn destroy(self);

    fn add_tile_layer(&mut self, layer: &TileLayer);

    /// Register the background click listener.
    fn on_click(&mut self, callback: MapClickCallback);

    fn create_marker(&mut self, at: LatLng, icon: &IconSpec) -> Self::Marker;
    fn remove_marker(&mut self, marker: &Self::Marker);
    fn set_marker_position(&mut self, marker: &Self::Marker, at: LatLng);
    fn set_marker_icon(&mut self, marker: &Self::Marker, icon: &IconSpec);
    fn bind_click(&mut self, marker: &Self::Marker, callback: MarkerClickCallback);
    fn bind_popup(&mut self, marker: &Self::Marker, popup: Popup);

    /// Create a circle of `radius` meters centered at `at`.
    fn create_circle(&mut self, at: LatLng, radius: f64, style: &CircleStyle) -> Self::Circle;
    fn remove_circle(&mut self, circle: &Self::Circle);
    fn set_circle_position(&mut self, circle: &Self::Circle, at: LatLng);
    fn set_circle_radius(&mut self, circle: &Self::Circle, radius: f64);
    fn set_circle_style(&mut self, circle: &Self::Circle, style: &CircleStyle);

    /// Jump the viewport to `center` at `zoom`.
    fn set_view(&mut self, center: LatLng, zoom: u8);
}

/// Creates surfaces bound to a container.
///
/// Implemented for any `FnMut(&str, LatLng, u8) -> S`, so a constructor
/// function can be passed directly.
pub trait SurfaceFactory {
    type Surface: MapSurface;

    fn create_surface(&mut self, container: &str, center: LatLng, zoom: u8) -> Self::Surface;
}

impl<S, F> SurfaceFactory for F
where
    S: MapSurface,
    F: FnMut(&str, LatLng, u8) -> S,
{
    type Surface = S;

    fn create_surface(&mut self, container: &str, center: LatLng, zoom: u8) -> S {
        self(container, center, zoom)
    }
}
