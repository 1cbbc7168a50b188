// ── Runtime map configuration ──
//
// Describes where the map starts and how overlays behave. Built by the
// dashboard (usually from `citywatch-config`) and handed in; the core never
// reads config files.

use crate::error::CoreError;
use crate::model::{LatLng, RadiusBounds};
use crate::surface::TileLayer;

/// Configuration for one mounted map view.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Identifier of the container the surface is bound to.
    pub container: String,
    /// Initial viewport center.
    pub center: LatLng,
    /// Initial zoom level.
    pub zoom: u8,
    /// Zoom level used when jumping to a search result.
    pub search_zoom: u8,
    pub tile_layer: TileLayer,
    /// Radius range offered when placing a camera.
    pub radius: RadiusBounds,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: "map".into(),
            center: LatLng::new(52.2897, 104.2806),
            zoom: 13,
            search_zoom: 15,
            tile_layer: TileLayer::default(),
            radius: RadiusBounds::default(),
        }
    }
}

impl MapConfig {
    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), CoreError> {
        let err = |message: String| Err(CoreError::Config { message });

        if !self.center.is_valid() {
            return err(format!("center {} is not a valid coordinate", self.center));
        }
        if self.tile_layer.max_zoom > 22 {
            return err(format!(
                "max_zoom {} exceeds 22",
                self.tile_layer.max_zoom
            ));
        }
        if self.zoom > self.tile_layer.max_zoom || self.search_zoom > self.tile_layer.max_zoom {
            return err(format!(
                "zoom levels must not exceed max_zoom {}",
                self.tile_layer.max_zoom
            ));
        }
        let r = &self.radius;
        if !(r.min > 0.0 && r.min <= r.default && r.default <= r.max && r.step > 0.0) {
            return err(format!(
                "radius bounds must satisfy 0 < min <= default <= max and step > 0 (got {}..={} default {} step {})",
                r.min, r.max, r.default, r.step
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(MapConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zoom_beyond_tile_max_is_rejected() {
        let mut cfg = MapConfig::default();
        cfg.search_zoom = 20;
        assert!(matches!(cfg.validate(), Err(CoreError::Config { .. })));
    }

    #[test]
    fn inverted_radius_bounds_are_rejected() {
        let mut cfg = MapConfig::default();
        cfg.radius.min = 300.0;
        assert!(cfg.validate().is_err());
    }
}
