// ── Domain model ──
//
// Canonical types shared by the overlay engine, the camera store, and the
// dashboard.

pub mod camera;
pub mod entity_id;
pub mod geo;
pub mod style;

pub use camera::{Camera, CameraStatus, NewCamera, RadiusBounds};
pub use entity_id::EntityId;
pub use geo::LatLng;
pub use style::{
    Border, CircleStyle, Glyph, IconSpec, Popup, Rgb, camera_icon, coverage_style, placement_icon,
    search_pin_icon, status_color,
};
