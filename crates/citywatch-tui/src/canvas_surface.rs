//! Map surface drawn on a ratatui [`Canvas`].
//!
//! Canvas x is longitude and y is latitude. The viewport follows the
//! surface's center and zoom; its extent depends on the area the map is
//! rendered into, so every geometric query takes that area.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::canvas::{Context, Line as CanvasLine, Map, MapResolution};
use tracing::{debug, trace};

use citywatch_core::model::{Border, Glyph};
use citywatch_core::surface::{MapClickCallback, MarkerClickCallback};
use citywatch_core::{CircleStyle, IconSpec, LatLng, MapSurface, Popup, TileLayer};

use crate::theme;

const MIN_ZOOM: u8 = 1;
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;
const CIRCLE_SEGMENTS: u32 = 48;
const GRID_LINES: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanvasMarker(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanvasCircle(u64);

struct MarkerState {
    position: LatLng,
    icon: IconSpec,
    popup: Option<Popup>,
    popup_open: bool,
    on_click: Option<MarkerClickCallback>,
}

struct CircleState {
    position: LatLng,
    radius: f64,
    style: CircleStyle,
}

/// Geographic extent of the map for one render area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub area: Rect,
    /// `[west, east]`
    pub lng: [f64; 2],
    /// `[south, north]`
    pub lat: [f64; 2],
}

impl Viewport {
    pub fn new(center: LatLng, zoom: u8, area: Rect) -> Self {
        let lng_span = 360.0 / 2f64.powi(i32::from(zoom));
        let aspect = if area.width == 0 {
            1.0
        } else {
            f64::from(area.height) * CELL_ASPECT / f64::from(area.width)
        };
        let lat_span = lng_span * center.lat.to_radians().cos().abs() * aspect;

        Self {
            area,
            lng: [center.lng - lng_span / 2.0, center.lng + lng_span / 2.0],
            lat: [center.lat - lat_span / 2.0, center.lat + lat_span / 2.0],
        }
    }

    pub fn lng_span(&self) -> f64 {
        self.lng[1] - self.lng[0]
    }

    pub fn lat_span(&self) -> f64 {
        self.lat[1] - self.lat[0]
    }

    /// Geo-coordinate at the center of terminal cell (`col`, `row`).
    pub fn to_geo(&self, col: u16, row: u16) -> Option<LatLng> {
        let a = self.area;
        if a.width == 0 || a.height == 0 || !a.contains((col, row).into()) {
            return None;
        }
        let fx = (f64::from(col - a.x) + 0.5) / f64::from(a.width);
        let fy = (f64::from(row - a.y) + 0.5) / f64::from(a.height);
        Some(LatLng::new(
            self.lat[1] - fy * self.lat_span(),
            self.lng[0] + fx * self.lng_span(),
        ))
    }

    /// Terminal cell containing `at`, if visible.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    pub fn to_cell(&self, at: LatLng) -> Option<(u16, u16)> {
        let a = self.area;
        if a.width == 0 || a.height == 0 {
            return None;
        }
        let fx = (at.lng - self.lng[0]) / self.lng_span();
        let fy = (self.lat[1] - at.lat) / self.lat_span();
        if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
            return None;
        }
        let col = (fx * f64::from(a.width)).floor() as u16;
        let row = (fy * f64::from(a.height)).floor() as u16;
        Some((a.x + col, a.y + row))
    }

    /// Width of one terminal cell in degrees of longitude.
    pub fn cell_lng(&self) -> f64 {
        self.lng_span() / f64::from(self.area.width.max(1))
    }
}

/// What a mouse click on the map area hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    Marker(CanvasMarker),
    Map(LatLng),
    Outside,
}

/// Terminal map widget. Created through the [`MapSurface`] contract by the
/// overlay engine and painted by the map screen.
pub struct CanvasSurface {
    container: String,
    center: LatLng,
    zoom: u8,
    tile_layer: Option<TileLayer>,
    on_click: Option<MapClickCallback>,
    markers: BTreeMap<CanvasMarker, MarkerState>,
    circles: BTreeMap<CanvasCircle, CircleState>,
    next_id: u64,
    pulse_on: bool,
}

impl CanvasSurface {
    /// Surface constructor; also usable directly as a `SurfaceFactory`.
    pub fn new(container: &str, center: LatLng, zoom: u8) -> Self {
        debug!(container, %center, zoom, "canvas surface created");
        Self {
            container: container.to_owned(),
            center,
            zoom,
            tile_layer: None,
            on_click: None,
            markers: BTreeMap::new(),
            circles: BTreeMap::new(),
            next_id: 0,
            pulse_on: true,
        }
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn attribution(&self) -> Option<&str> {
        self.tile_layer.as_ref().map(|t| t.attribution.as_str())
    }

    pub fn viewport(&self, area: Rect) -> Viewport {
        Viewport::new(self.center, self.zoom, area)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn circle_count(&self) -> usize {
        self.circles.len()
    }

    pub fn is_popup_open(&self, marker: CanvasMarker) -> bool {
        self.markers.get(&marker).is_some_and(|m| m.popup_open)
    }

    /// Advance the pulse animation of pulsing icons.
    pub fn tick(&mut self) {
        self.pulse_on = !self.pulse_on;
    }

    fn max_zoom(&self) -> u8 {
        self.tile_layer.as_ref().map_or(TileLayer::default().max_zoom, |t| t.max_zoom)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Route a click on cell (`col`, `row`) of `area`. Markers within one
    /// cell win over the map; the most recently created marker is on top.
    pub fn click(&mut self, area: Rect, col: u16, row: u16) -> ClickOutcome {
        let vp = self.viewport(area);
        let Some(at) = vp.to_geo(col, row) else {
            return ClickOutcome::Outside;
        };

        let hit = self.markers.iter().rev().find_map(|(id, m)| {
            let (mc, mr) = vp.to_cell(m.position)?;
            (mc.abs_diff(col) <= 1 && mr.abs_diff(row) <= 1).then_some(*id)
        });

        if let Some(id) = hit {
            trace!(container = %self.container, marker = ?id, "marker clicked");
            if let Some(marker) = self.markers.get_mut(&id) {
                if marker.popup.is_some() {
                    marker.popup_open = !marker.popup_open;
                }
                if let Some(cb) = &marker.on_click {
                    cb();
                }
            }
            return ClickOutcome::Marker(id);
        }

        if let Some(cb) = &self.on_click {
            cb(at);
        }
        ClickOutcome::Map(at)
    }

    /// Draw grid, base map, circles and markers.
    pub fn paint(&self, ctx: &mut Context<'_>, vp: &Viewport) {
        self.paint_grid(ctx, vp);
        ctx.draw(&Map {
            color: theme::COASTLINE,
            resolution: MapResolution::High,
        });
        ctx.layer();

        for circle in self.circles.values() {
            paint_circle(ctx, circle);
        }
        ctx.layer();

        for marker in self.markers.values() {
            self.paint_marker(ctx, vp, marker);
        }
    }

    #[allow(clippy::unused_self)]
    fn paint_grid(&self, ctx: &mut Context<'_>, vp: &Viewport) {
        let step_lng = vp.lng_span() / GRID_LINES;
        let step_lat = vp.lat_span() / GRID_LINES;
        if step_lng <= 0.0 || step_lat <= 0.0 {
            return;
        }
        let mut x = (vp.lng[0] / step_lng).ceil() * step_lng;
        while x < vp.lng[1] {
            ctx.draw(&CanvasLine::new(x, vp.lat[0], x, vp.lat[1], theme::GRID));
            x += step_lng;
        }
        let mut y = (vp.lat[0] / step_lat).ceil() * step_lat;
        while y < vp.lat[1] {
            ctx.draw(&CanvasLine::new(vp.lng[0], y, vp.lng[1], y, theme::GRID));
            y += step_lat;
        }
    }

    fn paint_marker(&self, ctx: &mut Context<'_>, vp: &Viewport, marker: &MarkerState) {
        let icon = &marker.icon;
        let symbol = match (icon.glyph, icon.border) {
            (Glyph::Camera, _) => "◉",
            (Glyph::Plus, Border::Dashed) => "⊹",
            (Glyph::Plus, Border::Solid) => "⊕",
            (Glyph::Pin, _) => "▼",
        };
        let color = match icon.glyph {
            Glyph::Pin => icon.fill.unwrap_or(icon.stroke),
            Glyph::Camera | Glyph::Plus => icon.stroke,
        };
        let mut style = Style::default().fg(theme::rgb(color));
        if icon.pulse && !self.pulse_on {
            style = style.add_modifier(Modifier::DIM);
        } else {
            style = style.add_modifier(Modifier::BOLD);
        }
        let at = marker.position;
        ctx.print(at.lng, at.lat, Span::styled(symbol, style));

        if let (true, Some(popup)) = (marker.popup_open, &marker.popup) {
            ctx.print(
                at.lng + vp.cell_lng() * 2.0,
                at.lat,
                Span::styled(
                    format!("{}: {}", popup.title, popup.body),
                    Style::default().fg(theme::DIM_WHITE).bg(theme::BG_DARK),
                ),
            );
        }
    }
}

fn paint_circle(ctx: &mut Context<'_>, circle: &CircleState) {
    let (dlat, dlng) = circle.position.meters_to_degrees(circle.radius);
    let color = theme::rgb(circle.style.color);
    // One ring per stroke weight, each a little inside the previous.
    for ring in 0..circle.style.weight.max(1) {
        let scale = 1.0 - f64::from(ring) * 0.04;
        let point = |i: u32| {
            let t = TAU * f64::from(i) / f64::from(CIRCLE_SEGMENTS);
            (
                circle.position.lng + dlng * scale * t.cos(),
                circle.position.lat + dlat * scale * t.sin(),
            )
        };
        for i in 0..CIRCLE_SEGMENTS {
            let (x1, y1) = point(i);
            let (x2, y2) = point(i + 1);
            ctx.draw(&CanvasLine::new(x1, y1, x2, y2, color));
        }
    }
}

impl MapSurface for CanvasSurface {
    type Marker = CanvasMarker;
    type Circle = CanvasCircle;

    fn destroy(self) {
        debug!(
            container = %self.container,
            markers = self.markers.len(),
            circles = self.circles.len(),
            "canvas surface destroyed"
        );
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) {
        self.tile_layer = Some(layer.clone());
        self.zoom = self.zoom.min(layer.max_zoom);
    }

    fn on_click(&mut self, callback: MapClickCallback) {
        self.on_click = Some(callback);
    }

    fn create_marker(&mut self, at: LatLng, icon: &IconSpec) -> CanvasMarker {
        let id = CanvasMarker(self.next_id());
        self.markers.insert(
            id,
            MarkerState {
                position: at,
                icon: *icon,
                popup: None,
                popup_open: false,
                on_click: None,
            },
        );
        id
    }

    fn remove_marker(&mut self, marker: &CanvasMarker) {
        self.markers.remove(marker);
    }

    fn set_marker_position(&mut self, marker: &CanvasMarker, at: LatLng) {
        if let Some(m) = self.markers.get_mut(marker) {
            m.position = at;
        }
    }

    fn set_marker_icon(&mut self, marker: &CanvasMarker, icon: &IconSpec) {
        if let Some(m) = self.markers.get_mut(marker) {
            m.icon = *icon;
        }
    }

    fn bind_click(&mut self, marker: &CanvasMarker, callback: MarkerClickCallback) {
        if let Some(m) = self.markers.get_mut(marker) {
            m.on_click = Some(callback);
        }
    }

    fn bind_popup(&mut self, marker: &CanvasMarker, popup: Popup) {
        if let Some(m) = self.markers.get_mut(marker) {
            m.popup = Some(popup);
            m.popup_open = true;
        }
    }

    fn create_circle(&mut self, at: LatLng, radius: f64, style: &CircleStyle) -> CanvasCircle {
        let id = CanvasCircle(self.next_id());
        self.circles.insert(
            id,
            CircleState {
                position: at,
                radius,
                style: *style,
            },
        );
        id
    }

    fn remove_circle(&mut self, circle: &CanvasCircle) {
        self.circles.remove(circle);
    }

    fn set_circle_position(&mut self, circle: &CanvasCircle, at: LatLng) {
        if let Some(c) = self.circles.get_mut(circle) {
            c.position = at;
        }
    }

    fn set_circle_radius(&mut self, circle: &CanvasCircle, radius: f64) {
        if let Some(c) = self.circles.get_mut(circle) {
            c.radius = radius;
        }
    }

    fn set_circle_style(&mut self, circle: &CanvasCircle, style: &CircleStyle) {
        if let Some(c) = self.circles.get_mut(circle) {
            c.style = *style;
        }
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, self.max_zoom());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use citywatch_core::model::{camera_icon, search_pin_icon};
    use citywatch_core::{MapConfig, Rgb};
    use pretty_assertions::assert_eq;

    const AREA: Rect = Rect {
        x: 10,
        y: 5,
        width: 100,
        height: 40,
    };

    fn surface() -> CanvasSurface {
        let cfg = MapConfig::default();
        let mut s = CanvasSurface::new(&cfg.container, cfg.center, cfg.zoom);
        s.add_tile_layer(&cfg.tile_layer);
        s
    }

    #[test]
    fn viewport_is_centered_and_scaled_by_zoom() {
        let s = surface();
        let vp = s.viewport(AREA);
        let mid_lng = (vp.lng[0] + vp.lng[1]) / 2.0;
        let mid_lat = (vp.lat[0] + vp.lat[1]) / 2.0;
        assert!((mid_lng - s.center().lng).abs() < 1e-9);
        assert!((mid_lat - s.center().lat).abs() < 1e-9);
        assert!((vp.lng_span() - 360.0 / 8192.0).abs() < 1e-12);

        let wider = Viewport::new(s.center(), 12, AREA);
        assert!((wider.lng_span() - 2.0 * vp.lng_span()).abs() < 1e-12);
    }

    #[test]
    fn cell_and_geo_conversions_agree() {
        let vp = surface().viewport(AREA);
        let at = vp.to_geo(42, 17).unwrap();
        assert_eq!(vp.to_cell(at), Some((42, 17)));
        assert_eq!(vp.to_geo(9, 17), None);
        assert_eq!(vp.to_geo(42, 45), None);
    }

    #[test]
    fn click_near_marker_hits_marker_not_map() {
        let mut s = surface();
        let vp = s.viewport(AREA);
        let at = vp.to_geo(50, 20).unwrap();
        let marker = s.create_marker(at, &camera_icon(Rgb::SKY));

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        s.bind_click(&marker, Arc::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }));
        let map_clicks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&map_clicks);
        s.on_click(Arc::new(move |p: LatLng| sink.lock().unwrap().push(p)));

        assert_eq!(s.click(AREA, 51, 21), ClickOutcome::Marker(marker));
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert!(map_clicks.lock().unwrap().is_empty());

        let outcome = s.click(AREA, 70, 30);
        assert!(matches!(outcome, ClickOutcome::Map(_)));
        assert_eq!(map_clicks.lock().unwrap().len(), 1);
        assert_eq!(s.click(AREA, 0, 0), ClickOutcome::Outside);
    }

    #[test]
    fn popup_starts_open_and_toggles_on_click() {
        let mut s = surface();
        let vp = s.viewport(AREA);
        let pin = s.create_marker(vp.to_geo(30, 10).unwrap(), &search_pin_icon());
        s.bind_popup(
            &pin,
            Popup {
                title: "Checked address".into(),
                body: "Test St".into(),
            },
        );
        assert!(s.is_popup_open(pin));

        s.click(AREA, 30, 10);
        assert!(!s.is_popup_open(pin));
        s.click(AREA, 30, 10);
        assert!(s.is_popup_open(pin));
    }

    #[test]
    fn set_view_clamps_zoom_to_tile_layer() {
        let mut s = surface();
        let target = LatLng::new(52.31, 104.29);
        s.set_view(target, 25);
        assert_eq!(s.center(), target);
        assert_eq!(s.zoom(), 19);
        s.set_view(target, 0);
        assert_eq!(s.zoom(), MIN_ZOOM);
    }

    #[test]
    fn removed_overlays_are_forgotten() {
        let mut s = surface();
        let m = s.create_marker(s.center(), &camera_icon(Rgb::SKY));
        let c = s.create_circle(
            s.center(),
            100.0,
            &citywatch_core::model::coverage_style(Rgb::SKY),
        );
        assert_ne!(m.0, c.0);
        s.remove_marker(&m);
        s.remove_circle(&c);
        assert_eq!(s.marker_count(), 0);
        assert_eq!(s.circle_count(), 0);
    }
}
