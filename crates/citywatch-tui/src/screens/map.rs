//! Map screen: hosts the overlay view on a terminal canvas.
//!
//! Owns the [`MapView`] and feeds it props from dispatched actions. Mouse
//! clicks go through [`CanvasSurface::click`], which fires the marker and
//! map callbacks the view installed; those come back as actions.

use std::cell::Cell;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Context};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, trace, warn};

use citywatch_core::{Camera, EntityId, LatLng, MapConfig, MapProps, MapSurface, MapView};

use crate::action::Action;
use crate::canvas_surface::{CanvasSurface, ClickOutcome};
use crate::component::Component;
use crate::theme;

/// Fraction of the visible span moved per arrow key.
const PAN_FRACTION: f64 = 0.25;

pub struct MapScreen {
    focused: bool,
    view: MapView<CanvasSurface>,
    props: MapProps,
    selected: Option<EntityId>,
    /// Canvas area from the last render, for mouse hit-testing.
    last_area: Cell<Rect>,
}

impl MapScreen {
    pub fn new(config: MapConfig) -> Self {
        Self {
            focused: false,
            view: MapView::new(config),
            props: MapProps::default(),
            selected: None,
            last_area: Cell::new(Rect::default()),
        }
    }

    fn apply_props(&mut self) {
        let report = self.view.update(self.props.clone());
        trace!(?report, "map props applied");
    }

    fn selected_camera(&self) -> Option<&Arc<Camera>> {
        let id = self.selected.as_ref()?;
        self.props.cameras.iter().find(|c| &c.id == id)
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        let area = self.last_area.get();
        let Some(surface) = self.view.surface_mut() else {
            return;
        };
        let vp = surface.viewport(area);
        let center = surface.center();
        let target = LatLng::new(
            (center.lat + dy * vp.lat_span() * PAN_FRACTION).clamp(-85.0, 85.0),
            (center.lng + dx * vp.lng_span() * PAN_FRACTION).clamp(-180.0, 180.0),
        );
        let zoom = surface.zoom();
        surface.set_view(target, zoom);
    }

    fn zoom_by(&mut self, delta: i8) {
        let Some(surface) = self.view.surface_mut() else {
            return;
        };
        let zoom = surface.zoom().saturating_add_signed(delta);
        let center = surface.center();
        surface.set_view(center, zoom);
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let attribution = self
            .view
            .surface()
            .and_then(CanvasSurface::attribution)
            .unwrap_or_default();
        let line = Line::from(vec![
            Span::styled("  ←→↑↓ ", theme::key_hint_key()),
            Span::styled("pan  ", theme::key_hint()),
            Span::styled("=/- ", theme::key_hint_key()),
            Span::styled("zoom  ", theme::key_hint()),
            Span::styled("click ", theme::key_hint_key()),
            Span::styled("select  ", theme::key_hint()),
            Span::styled(attribution.to_owned(), Style::default().fg(theme::SLATE)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

impl Component for MapScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        let tx = action_tx.clone();
        self.view.on_camera_click(move |camera| {
            let _ = tx.send(Action::SelectCamera(camera.id.clone()));
        });
        self.view.on_map_click(move |at| {
            let _ = action_tx.send(Action::SetCandidate(at));
        });

        let report = self.view.mount(&mut CanvasSurface::new);
        if self.view.surface().is_none() {
            warn!("map surface did not mount");
        }
        info!(?report, "map screen mounted");
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Left => self.pan(-1.0, 0.0),
            KeyCode::Right => self.pan(1.0, 0.0),
            KeyCode::Up => self.pan(0.0, 1.0),
            KeyCode::Down => self.pan(0.0, -1.0),
            KeyCode::Char('=' | '+') => self.zoom_by(1),
            KeyCode::Char('-') => self.zoom_by(-1),
            _ => {}
        }
        Ok(None)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let area = self.last_area.get();
        if !area.contains((mouse.column, mouse.row).into()) {
            return Ok(None);
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(surface) = self.view.surface_mut() {
                    let outcome = surface.click(area, mouse.column, mouse.row);
                    trace!(?outcome, "map click");
                    // Selection and placement arrive through the view's callbacks.
                    if matches!(outcome, ClickOutcome::Map(_)) && !self.props.add_mode {
                        return Ok(Some(Action::ClearSelection));
                    }
                }
            }
            MouseEventKind::ScrollUp => self.zoom_by(1),
            MouseEventKind::ScrollDown => self.zoom_by(-1),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::CamerasUpdated(cameras) => {
                self.props.cameras = Arc::clone(cameras);
                self.apply_props();
            }
            Action::PlacementChanged {
                add_mode,
                candidate,
            } => {
                self.props.add_mode = *add_mode;
                self.props.candidate = *candidate;
                self.apply_props();
            }
            Action::SearchResolved(result) => {
                self.props.search.clone_from(result);
                self.apply_props();
            }
            Action::SelectCamera(id) => {
                self.selected = Some(id.clone());
            }
            Action::ClearSelection => {
                self.selected = None;
            }
            Action::Tick => {
                if let Some(surface) = self.view.surface_mut() {
                    surface.tick();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(surface) = self.view.surface() else {
            return;
        };

        let mode = if self.props.add_mode {
            Span::styled(
                " ADD ",
                Style::default()
                    .fg(theme::BG_DARK)
                    .bg(theme::SKY)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("")
        };
        let title = Line::from(vec![
            Span::styled(
                format!(" Map · z{} · {} ", surface.zoom(), surface.center()),
                theme::title_style(),
            ),
            mode,
        ]);
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [canvas_area, hints_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
        self.last_area.set(canvas_area);

        let vp = surface.viewport(canvas_area);
        let selected = self.selected_camera();
        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(vp.lng)
            .y_bounds(vp.lat)
            .paint(|ctx: &mut Context<'_>| {
                surface.paint(ctx, &vp);
                if let Some(camera) = selected {
                    ctx.print(
                        camera.position.lng + vp.cell_lng() * 2.0,
                        camera.position.lat,
                        Span::styled(
                            format!("◂ {}", camera.name),
                            Style::default()
                                .fg(theme::ELECTRIC_YELLOW)
                                .add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            });
        frame.render_widget(canvas, canvas_area);

        self.render_hints(frame, hints_area);
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Map"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::Utc;
    use citywatch_core::CameraStatus;
    use crossterm::event::KeyModifiers;
    use tokio::sync::mpsc;

    const AREA: Rect = Rect {
        x: 1,
        y: 1,
        width: 80,
        height: 30,
    };

    fn camera(id: &str, position: LatLng) -> Arc<Camera> {
        Arc::new(Camera {
            id: EntityId::from(id),
            name: format!("Camera-{id}"),
            position,
            radius: 120.0,
            status: CameraStatus::Active,
            coverage: 90,
            last_activity: Utc::now(),
        })
    }

    fn mounted() -> (MapScreen, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut screen = MapScreen::new(MapConfig::default());
        screen.init(tx).unwrap();
        screen.last_area.set(AREA);
        (screen, rx)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn surface(screen: &MapScreen) -> &CanvasSurface {
        screen.view.surface().unwrap()
    }

    #[test]
    fn camera_snapshot_becomes_overlays() {
        let (mut screen, _rx) = mounted();
        let center = MapConfig::default().center;
        let cameras = Arc::new(vec![
            camera("1", center),
            camera("2", LatLng::new(center.lat + 0.005, center.lng)),
        ]);
        screen.update(&Action::CamerasUpdated(cameras)).unwrap();
        assert_eq!(surface(&screen).marker_count(), 2);
        assert_eq!(surface(&screen).circle_count(), 2);

        screen
            .update(&Action::CamerasUpdated(Arc::new(Vec::new())))
            .unwrap();
        assert_eq!(surface(&screen).marker_count(), 0);
    }

    #[test]
    fn marker_click_selects_camera() {
        let (mut screen, mut rx) = mounted();
        let vp = surface(&screen).viewport(AREA);
        let at = vp.to_geo(40, 15).unwrap();
        screen
            .update(&Action::CamerasUpdated(Arc::new(vec![camera("7", at)])))
            .unwrap();

        screen.handle_mouse_event(click(40, 15)).unwrap();
        match rx.try_recv().unwrap() {
            Action::SelectCamera(id) => assert_eq!(id, EntityId::from("7")),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn map_click_sets_candidate_only_in_add_mode() {
        let (mut screen, mut rx) = mounted();

        let follow_up = screen.handle_mouse_event(click(10, 5)).unwrap();
        assert!(matches!(follow_up, Some(Action::ClearSelection)));
        assert!(rx.try_recv().is_err());

        screen
            .update(&Action::PlacementChanged {
                add_mode: true,
                candidate: None,
            })
            .unwrap();
        assert!(screen.handle_mouse_event(click(10, 5)).unwrap().is_none());
        assert!(matches!(rx.try_recv().unwrap(), Action::SetCandidate(_)));
    }

    #[test]
    fn placement_preview_follows_candidate() {
        let (mut screen, _rx) = mounted();
        let center = MapConfig::default().center;
        screen
            .update(&Action::PlacementChanged {
                add_mode: true,
                candidate: Some(center),
            })
            .unwrap();
        assert_eq!(surface(&screen).marker_count(), 1);

        screen
            .update(&Action::PlacementChanged {
                add_mode: false,
                candidate: Some(center),
            })
            .unwrap();
        assert_eq!(surface(&screen).marker_count(), 0);
    }

    #[test]
    fn keys_pan_and_zoom_the_viewport() {
        let (mut screen, _rx) = mounted();
        let start = surface(&screen).center();
        let zoom = surface(&screen).zoom();

        screen
            .handle_key_event(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE))
            .unwrap();
        assert!(surface(&screen).center().lng > start.lng);

        screen
            .handle_key_event(KeyEvent::new(KeyCode::Char('='), KeyModifiers::NONE))
            .unwrap();
        assert_eq!(surface(&screen).zoom(), zoom + 1);
    }
}
