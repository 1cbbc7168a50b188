// ── Overlay styling ──
//
// Structured descriptions of how overlays look. Surfaces translate these
// into whatever their rendering backend understands; the engine only ever
// builds them through the functions below so every caller agrees on the
// palette.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::camera::CameraStatus;

/// 24-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const SKY: Rgb = Rgb(0x0E, 0xA5, 0xE9);
    pub const ORANGE: Rgb = Rgb(0xF9, 0x73, 0x16);
    pub const SLATE: Rgb = Rgb(0x8E, 0x91, 0x96);
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Shape drawn at a marker's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Glyph {
    /// Camera marker: ringed disc with a lens symbol.
    Camera,
    /// Placement preview: "+" inside a ring.
    Plus,
    /// Search highlight: map pin.
    Pin,
}

/// Marker ring border style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Border {
    Solid,
    Dashed,
}

/// Everything a surface needs to draw a marker icon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IconSpec {
    pub glyph: Glyph,
    /// Ring and symbol color.
    pub stroke: Rgb,
    /// Disc background, if filled.
    pub fill: Option<Rgb>,
    pub border: Border,
    /// Animated attention pulse.
    pub pulse: bool,
    /// Icon size in pixels (width, height).
    pub size: (u16, u16),
    /// Pixel offset of the geographic anchor from the icon's top-left.
    pub anchor: (u16, u16),
}

/// Stroke and fill for a coverage circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleStyle {
    pub color: Rgb,
    pub fill_color: Rgb,
    pub fill_opacity: f32,
    pub weight: u8,
}

/// Label attached to a marker, shown when the marker is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Popup {
    pub title: String,
    pub body: String,
}

const ICON_SIZE: (u16, u16) = (40, 40);

/// Deterministic status → color mapping.
pub fn status_color(status: CameraStatus) -> Rgb {
    match status {
        CameraStatus::Active => Rgb::SKY,
        CameraStatus::Warning => Rgb::ORANGE,
        CameraStatus::Inactive => Rgb::SLATE,
    }
}

/// Camera marker icon with its ring in `color`.
pub fn camera_icon(color: Rgb) -> IconSpec {
    IconSpec {
        glyph: Glyph::Camera,
        stroke: color,
        fill: Some(Rgb::WHITE),
        border: Border::Solid,
        pulse: false,
        size: ICON_SIZE,
        anchor: (20, 20),
    }
}

/// Coverage circle style in `color`.
pub fn coverage_style(color: Rgb) -> CircleStyle {
    CircleStyle {
        color,
        fill_color: color,
        fill_opacity: 0.15,
        weight: 2,
    }
}

/// Dashed, pulsing icon shown while choosing a new camera's position.
pub fn placement_icon() -> IconSpec {
    IconSpec {
        glyph: Glyph::Plus,
        stroke: Rgb::SKY,
        fill: None,
        border: Border::Dashed,
        pulse: true,
        size: ICON_SIZE,
        anchor: (20, 20),
    }
}

/// Pin icon for a looked-up address. Anchored at its bottom tip.
pub fn search_pin_icon() -> IconSpec {
    IconSpec {
        glyph: Glyph::Pin,
        stroke: Rgb::WHITE,
        fill: Some(Rgb::ORANGE),
        border: Border::Solid,
        pulse: false,
        size: ICON_SIZE,
        anchor: (20, 40),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_colors_are_distinct() {
        assert_eq!(status_color(CameraStatus::Active), Rgb::SKY);
        assert_eq!(status_color(CameraStatus::Warning), Rgb::ORANGE);
        assert_eq!(status_color(CameraStatus::Inactive), Rgb::SLATE);
    }

    #[test]
    fn rgb_formats_as_hex() {
        assert_eq!(Rgb::SKY.to_string(), "#0EA5E9");
    }

    #[test]
    fn camera_icon_and_circle_share_status_color() {
        let color = status_color(CameraStatus::Warning);
        assert_eq!(camera_icon(color).stroke, coverage_style(color).color);
    }
}
