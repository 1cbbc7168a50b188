//! Application core: event loop, panel focus, action dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use citywatch_core::{
    CameraStats, CameraStore, EntityId, MapConfig, NewCamera, RadiusBounds, SearchResult,
};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screens::cameras::CameraListScreen;
use crate::screens::map::MapScreen;
use crate::theme;
use crate::tui::Tui;

const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Which panel receives unrouted keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Map,
    List,
}

/// Top-level application state and event loop.
pub struct App {
    store: Arc<CameraStore>,
    bounds: RadiusBounds,
    map: MapScreen,
    list: CameraListScreen,
    focus: Focus,
    /// Whether the app should keep running.
    running: bool,
    /// Aggregates of the latest snapshot, for the header.
    stats: CameraStats,
    selected: Option<EntityId>,
    /// Add-mode flag; while set the add form captures the keyboard.
    add_mode: bool,
    draft: NewCamera,
    help_visible: bool,
    search_active: bool,
    search_query: String,
    /// Action sender: components can dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver: main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmAction>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(config: MapConfig, store: Arc<CameraStore>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let bounds = config.radius;

        Self {
            store,
            bounds,
            map: MapScreen::new(config),
            list: CameraListScreen::new(),
            focus: Focus::Map,
            running: true,
            stats: CameraStats::default(),
            selected: None,
            add_mode: false,
            draft: NewCamera::new(&bounds),
            help_visible: false,
            search_active: false,
            search_query: String::new(),
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
            pending_confirm: None,
            notification: None,
        }
    }

    fn init_panels(&mut self) -> Result<()> {
        self.map.init(self.action_tx.clone())?;
        self.list.init(self.action_tx.clone())?;
        self.map.set_focused(self.focus == Focus::Map);
        self.list.set_focused(self.focus == Focus::List);
        Ok(())
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_panels()?;

        let store = Arc::clone(&self.store);
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(store, tx, cancel).await;
        });

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render | Event::Resize => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    fn focused_panel(&mut self) -> &mut dyn Component {
        match self.focus {
            Focus::Map => &mut self.map,
            Focus::List => &mut self.list,
        }
    }

    /// Map a key event to an action. Modal input (confirm, search, add
    /// form, help) is handled first, then global keys, then the focused
    /// panel.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        // Confirmation dialog captures all input
        if self.pending_confirm.is_some() {
            return match key.code {
                KeyCode::Char('y' | 'Y') => Ok(Some(Action::ConfirmYes)),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Ok(Some(Action::ConfirmNo)),
                _ => Ok(None),
            };
        }

        if self.search_active {
            return match key.code {
                KeyCode::Esc => Ok(Some(Action::CloseSearch)),
                KeyCode::Enter => Ok(Some(Action::SearchSubmit)),
                KeyCode::Backspace => {
                    self.search_query.pop();
                    Ok(None)
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    Ok(None)
                }
                _ => Ok(None),
            };
        }

        if self.add_mode {
            return match key.code {
                KeyCode::Esc => Ok(Some(Action::CancelAdd)),
                KeyCode::Enter => Ok(Some(Action::SubmitCamera)),
                KeyCode::Char('+' | '=') => Ok(Some(Action::AdjustDraftRadius(1))),
                KeyCode::Char('-') => Ok(Some(Action::AdjustDraftRadius(-1))),
                KeyCode::Backspace => {
                    self.draft.name.pop();
                    Ok(None)
                }
                KeyCode::Char(c) => {
                    self.draft.name.push(c);
                    Ok(None)
                }
                KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => {
                    self.map.handle_key_event(key)
                }
                _ => Ok(None),
            };
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        match key.code {
            KeyCode::Char('q') => return Ok(Some(Action::Quit)),
            KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
            KeyCode::Char('/') => return Ok(Some(Action::OpenSearch)),
            KeyCode::Char('a') => return Ok(Some(Action::StartAdd)),
            KeyCode::Tab | KeyCode::BackTab => return Ok(Some(Action::FocusNext)),
            KeyCode::Esc if self.notification.is_some() => {
                return Ok(Some(Action::DismissNotification));
            }
            KeyCode::Char('d') => return Ok(Some(self.with_selected(Action::RequestDelete))),
            KeyCode::Char('s') => return Ok(Some(self.with_selected(Action::CycleStatus))),
            KeyCode::Char('[') => {
                return Ok(Some(self.with_selected(|id| Action::AdjustRadius(id, -1))));
            }
            KeyCode::Char(']') => {
                return Ok(Some(self.with_selected(|id| Action::AdjustRadius(id, 1))));
            }
            // Zoom always targets the map, list keys always the list.
            KeyCode::Char('=' | '+' | '-') => return self.map.handle_key_event(key),
            KeyCode::Char('j' | 'k' | 'g' | 'G') => return self.list.handle_key_event(key),
            _ => {}
        }

        self.focused_panel().handle_key_event(key)
    }

    /// Build a command for the selected camera, or a hint when nothing is
    /// selected.
    fn with_selected(&self, f: impl FnOnce(EntityId) -> Action) -> Action {
        match &self.selected {
            Some(id) => f(id.clone()),
            None => Action::Notify(Notification::warning("Select a camera first")),
        }
    }

    /// Panels hit-test against their own last render area.
    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.pending_confirm.is_some() || self.help_visible {
            return Ok(None);
        }
        if let Some(action) = self.map.handle_mouse_event(mouse)? {
            return Ok(Some(action));
        }
        self.list.handle_mouse_event(mouse)
    }

    /// Forward an action to both panels, queueing their follow-ups.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        let follow_ups = [self.map.update(action)?, self.list.update(action)?];
        for follow_up in follow_ups.into_iter().flatten() {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    fn notify(&self, notification: Notification) -> Result<()> {
        self.action_tx.send(Action::Notify(notification))?;
        Ok(())
    }

    fn set_placement(&mut self, add_mode: bool) -> Result<()> {
        self.add_mode = add_mode;
        if !add_mode {
            self.draft = NewCamera::new(&self.bounds);
        }
        self.action_tx.send(Action::PlacementChanged {
            add_mode,
            candidate: self.draft.position,
        })?;
        Ok(())
    }

    /// Process a single action: update app state and propagate to panels.
    #[allow(clippy::too_many_lines)]
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Render => {}

            Action::Tick => {
                if let Some((_, created)) = &self.notification {
                    if created.elapsed() > NOTIFICATION_TTL {
                        self.notification = None;
                    }
                }
                self.map.update(action)?;
            }

            Action::FocusNext => {
                self.focus = match self.focus {
                    Focus::Map => Focus::List,
                    Focus::List => Focus::Map,
                };
                self.map.set_focused(self.focus == Focus::Map);
                self.list.set_focused(self.focus == Focus::List);
                debug!(focus = ?self.focus, "focus changed");
            }

            Action::CamerasUpdated(cameras) => {
                self.stats = CameraStats::from_cameras(cameras);
                let gone = self
                    .selected
                    .as_ref()
                    .is_some_and(|id| !cameras.iter().any(|c| &c.id == id));
                if gone {
                    self.selected = None;
                    self.action_tx.send(Action::ClearSelection)?;
                }
                self.broadcast(action)?;
            }

            Action::SelectCamera(id) => {
                self.selected = Some(id.clone());
                self.broadcast(action)?;
            }

            Action::ClearSelection => {
                self.selected = None;
                self.broadcast(action)?;
            }

            // ── Add workflow ──────────────────────────────────────────
            Action::StartAdd => {
                self.draft = NewCamera::new(&self.bounds);
                self.set_placement(true)?;
                self.notify(Notification::info("Click the map to place the camera"))?;
            }

            Action::CancelAdd => {
                self.set_placement(false)?;
            }

            Action::SetCandidate(at) => {
                if self.add_mode {
                    self.draft.position = Some(*at);
                    self.set_placement(true)?;
                }
            }

            Action::AdjustDraftRadius(steps) => {
                self.draft.adjust_radius(*steps, &self.bounds);
            }

            Action::SubmitCamera => match self.draft.build(&self.bounds) {
                Ok(camera) => {
                    let id = camera.id.clone();
                    let name = camera.name.clone();
                    self.store.insert(camera);
                    info!(%id, %name, "camera added");
                    self.set_placement(false)?;
                    self.action_tx.send(Action::SelectCamera(id))?;
                    self.notify(Notification::success(format!("Added {name}")))?;
                }
                Err(e) => {
                    self.notify(Notification::error(e.to_string()))?;
                }
            },

            Action::PlacementChanged { .. } | Action::SearchResolved(_) => {
                self.map.update(action)?;
            }

            // ── Camera commands ───────────────────────────────────────
            Action::RequestDelete(id) => match self.store.get(id) {
                Some(camera) => {
                    self.action_tx
                        .send(Action::ShowConfirm(ConfirmAction::DeleteCamera {
                            id: id.clone(),
                            name: camera.name.clone(),
                        }))?;
                }
                None => {
                    warn!(%id, "delete requested for unknown camera");
                }
            },

            Action::CycleStatus(id) => match self.store.update(id, |c| c.status = c.status.next()) {
                Ok(camera) => {
                    self.notify(Notification::info(format!(
                        "{} is now {}",
                        camera.name,
                        camera.status.label()
                    )))?;
                }
                Err(e) => {
                    warn!(error = %e, "status change failed");
                    self.notify(Notification::error(e.to_string()))?;
                }
            },

            Action::AdjustRadius(id, steps) => {
                let bounds = self.bounds;
                let result = self.store.update(id, |c| {
                    c.radius = bounds.clamp(c.radius + f64::from(*steps) * bounds.step);
                });
                if let Err(e) = result {
                    warn!(error = %e, "radius change failed");
                    self.notify(Notification::error(e.to_string()))?;
                }
            }

            // ── Confirm dialog ────────────────────────────────────────
            Action::ShowConfirm(confirm) => {
                self.pending_confirm = Some(confirm.clone());
            }

            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    self.execute_confirm(confirm)?;
                }
            }

            Action::ConfirmNo => {
                self.pending_confirm = None;
            }

            // ── Search ────────────────────────────────────────────────
            Action::OpenSearch => {
                self.search_active = true;
                self.search_query.clear();
            }

            Action::CloseSearch => {
                self.search_active = false;
                self.search_query.clear();
                self.action_tx.send(Action::SearchResolved(None))?;
            }

            Action::SearchSubmit => match SearchResult::parse(&self.search_query) {
                Ok(result) => {
                    self.search_active = false;
                    self.notify(Notification::info(format!("Showing {}", result.label)))?;
                    self.action_tx.send(Action::SearchResolved(Some(Arc::new(result))))?;
                }
                Err(e) => {
                    self.notify(Notification::error(e.to_string()))?;
                }
            },

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Notify(n) => {
                self.notification = Some((n.clone(), Instant::now()));
            }

            Action::DismissNotification => {
                self.notification = None;
            }
        }

        Ok(())
    }

    fn execute_confirm(&mut self, confirm: ConfirmAction) -> Result<()> {
        match confirm {
            ConfirmAction::DeleteCamera { id, name } => match self.store.remove(&id) {
                Ok(_) => {
                    info!(%id, %name, "camera deleted");
                    self.notify(Notification::success(format!("Deleted {name}")))?;
                }
                Err(e) => {
                    warn!(error = %e, "delete failed");
                    self.notify(Notification::error(e.to_string()))?;
                }
            },
        }
        Ok(())
    }

    // ── Rendering ─────────────────────────────────────────────────────

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let form_height = if self.add_mode { 3 } else { 0 };
        let [header_area, body_area, form_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(form_height),
            Constraint::Length(1),
        ])
        .areas(area);

        let [map_area, list_area] =
            Layout::horizontal([Constraint::Percentage(67), Constraint::Percentage(33)])
                .areas(body_area);

        self.render_header(frame, header_area);
        self.map.render(frame, map_area);
        self.list.render(frame, list_area);
        if self.add_mode {
            self.render_add_form(frame, form_area);
        }
        self.render_status_bar(frame, status_area);

        // Overlays, last = topmost
        if let Some((ref notif, _)) = self.notification {
            Self::render_notification(frame, area, notif);
        }
        if let Some(ref confirm) = self.pending_confirm {
            Self::render_confirm_dialog(frame, area, confirm);
        }
        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(" citywatch ", theme::title_style()),
            Span::styled("│ ", theme::key_hint()),
            Span::styled("● ", Style::default().fg(theme::SUCCESS_GREEN)),
            Span::styled(
                format!("{}/{} active", self.stats.active, self.stats.total),
                Style::default().fg(theme::DIM_WHITE),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_add_form(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" New camera ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = Style::default().fg(theme::BORDER_GRAY);
        let value = Style::default().fg(theme::SKY);
        let position = match self.draft.position {
            Some(at) => Span::styled(at.to_string(), value),
            None => Span::styled(
                "click the map",
                Style::default()
                    .fg(theme::ELECTRIC_YELLOW)
                    .add_modifier(Modifier::ITALIC),
            ),
        };
        let line = Line::from(vec![
            Span::styled(" Name ", label),
            Span::styled(self.draft.name.as_str(), value),
            Span::styled("█", value),
            Span::styled("  Radius ", label),
            Span::styled(format!("{:.0} m", self.draft.radius), value),
            Span::styled("  Position ", label),
            position,
            Span::styled("   +/- ", theme::key_hint_key()),
            Span::styled("radius  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("add  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if self.search_active {
            let line = Line::from(vec![
                Span::styled(" / ", Style::default().fg(theme::ORANGE)),
                Span::styled(&self.search_query, Style::default().fg(theme::SKY)),
                Span::styled("█", Style::default().fg(theme::SKY)),
                Span::styled("  lat, lng [label]  Esc clear  Enter go", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let hints = Line::from(vec![
            Span::styled(" a ", theme::key_hint_key()),
            Span::styled("add  ", theme::key_hint()),
            Span::styled("/ ", theme::key_hint_key()),
            Span::styled("search  ", theme::key_hint()),
            Span::styled("Tab ", theme::key_hint_key()),
            Span::styled("focus  ", theme::key_hint()),
            Span::styled("? ", theme::key_hint_key()),
            Span::styled("help  ", theme::key_hint()),
            Span::styled("q ", theme::key_hint_key()),
            Span::styled("quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 56u16.min(area.width.saturating_sub(4));
        let help_height = 20u16.min(area.height.saturating_sub(4));

        let x = (area.width.saturating_sub(help_width)) / 2;
        let y = (area.height.saturating_sub(help_height)) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            help_area,
        );

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let section = |title: &'static str| {
            Line::from(Span::styled(
                format!("  {title}"),
                Style::default().fg(theme::SKY),
            ))
        };
        let entry = |key: &'static str, desc: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(desc, theme::key_hint()),
            ])
        };

        let help_text = vec![
            Line::from(""),
            section("Map"),
            entry("←→↑↓", "Pan"),
            entry("= / -", "Zoom in / out"),
            entry("click", "Select camera / place new camera"),
            Line::from(""),
            section("Cameras"),
            entry("j/k", "Move selection"),
            entry("a", "Add camera (Enter add, Esc cancel)"),
            entry("d", "Delete selected"),
            entry("s", "Cycle status"),
            entry("[ / ]", "Shrink / grow radius"),
            Line::from(""),
            section("Global"),
            entry("/", "Find coordinate (Esc clears)"),
            entry("Tab", "Switch panel"),
            entry("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled(
                "                    Esc or ? to close",
                theme::key_hint(),
            )),
        ];
        frame.render_widget(Paragraph::new(help_text), inner);
    }

    fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
        let width = 50u16.min(area.width.saturating_sub(4));
        let height = 5u16;

        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let dialog_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            dialog_area,
        );

        let block = Block::default()
            .title(" Confirm ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::ELECTRIC_YELLOW));

        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let text = vec![
            Line::from(Span::styled(
                format!("  {confirm}"),
                Style::default().fg(theme::DIM_WHITE),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("  y ", theme::key_hint_key()),
                Span::styled("confirm    ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ]),
        ];
        frame.render_widget(Paragraph::new(text), inner);
    }

    /// Toast in the bottom-right corner, above the status bar.
    fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
        let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
        let width = msg_len.saturating_add(6).clamp(20, 60);
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 2);
        let toast_area = Rect::new(area.x + x, area.y + y, width.min(area.width), height);

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::SUCCESS_GREEN, "✓"),
            NotificationLevel::Error => (theme::ERROR_RED, "✗"),
            NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
            NotificationLevel::Info => (theme::SKY, "·"),
        };

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            toast_area,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(&notif.message, Style::default().fg(theme::DIM_WHITE)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use citywatch_core::{Camera, CameraStatus, LatLng};
    use pretty_assertions::assert_eq;

    fn seeded() -> Vec<Camera> {
        vec![Camera {
            id: EntityId::from("1"),
            name: "Camera-1".into(),
            position: LatLng::new(52.2897, 104.2806),
            radius: 150.0,
            status: CameraStatus::Active,
            coverage: 85,
            last_activity: chrono::Utc::now(),
        }]
    }

    fn app() -> App {
        let store = Arc::new(CameraStore::with_cameras(seeded()));
        let mut app = App::new(MapConfig::default(), store);
        app.init_panels().unwrap();
        app
    }

    /// Process queued actions until the channel is empty.
    fn drain(app: &mut App) {
        while let Ok(action) = app.action_rx.try_recv() {
            app.process_action(&action).unwrap();
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        if let Some(action) = app.handle_key_event(key).unwrap() {
            app.action_tx.send(action).unwrap();
        }
        drain(app);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn notification(app: &App) -> (NotificationLevel, String) {
        let (n, _) = app.notification.as_ref().unwrap();
        (n.level, n.message.clone())
    }

    #[test]
    fn add_flow_inserts_camera_and_leaves_add_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        assert!(app.add_mode);

        app.action_tx
            .send(Action::SetCandidate(LatLng::new(52.3, 104.3)))
            .unwrap();
        drain(&mut app);
        // 'q' and 'd' are name characters while the form is open.
        type_text(&mut app, "Quay dock");
        press(&mut app, KeyCode::Char('+'));
        assert!((app.draft.radius - 110.0).abs() < f64::EPSILON);
        press(&mut app, KeyCode::Enter);

        assert!(!app.add_mode);
        assert!(app.running);
        assert_eq!(app.store.len(), 2);
        let added = app
            .store
            .snapshot()
            .iter()
            .find(|c| c.name == "Quay dock")
            .cloned()
            .unwrap();
        assert!((added.radius - 110.0).abs() < f64::EPSILON);
        assert_eq!(added.status, CameraStatus::Active);
        assert_eq!(app.selected, Some(added.id.clone()));
        assert_eq!(
            notification(&app),
            (NotificationLevel::Success, "Added Quay dock".into())
        );
    }

    #[test]
    fn submit_without_position_reports_error() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "North gate");
        press(&mut app, KeyCode::Enter);

        assert!(app.add_mode);
        assert_eq!(app.store.len(), 1);
        assert_eq!(notification(&app).0, NotificationLevel::Error);

        press(&mut app, KeyCode::Esc);
        assert!(!app.add_mode);
        assert!(app.draft.name.is_empty());
    }

    #[test]
    fn map_click_outside_add_mode_is_ignored() {
        let mut app = app();
        app.action_tx
            .send(Action::SetCandidate(LatLng::new(52.3, 104.3)))
            .unwrap();
        drain(&mut app);
        assert_eq!(app.draft.position, None);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = app();
        app.action_tx
            .send(Action::SelectCamera(EntityId::from("1")))
            .unwrap();
        drain(&mut app);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.pending_confirm.is_some());
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.store.is_empty());
        assert_eq!(
            notification(&app),
            (NotificationLevel::Success, "Deleted Camera-1".into())
        );
    }

    #[test]
    fn commands_without_selection_warn() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(notification(&app).0, NotificationLevel::Warning);
        assert_eq!(
            app.store.get(&EntityId::from("1")).unwrap().status,
            CameraStatus::Active
        );
    }

    #[test]
    fn status_and_radius_edit_selected_camera() {
        let mut app = app();
        let id = EntityId::from("1");
        app.action_tx.send(Action::SelectCamera(id.clone())).unwrap();
        drain(&mut app);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.store.get(&id).unwrap().status, CameraStatus::Warning);

        press(&mut app, KeyCode::Char(']'));
        press(&mut app, KeyCode::Char(']'));
        assert!((app.store.get(&id).unwrap().radius - 170.0).abs() < f64::EPSILON);

        // Clamped at the configured maximum.
        for _ in 0..20 {
            press(&mut app, KeyCode::Char(']'));
        }
        assert!((app.store.get(&id).unwrap().radius - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn search_submit_and_clear() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert!(app.search_active);
        type_text(&mut app, "nowhere");
        press(&mut app, KeyCode::Enter);
        assert!(app.search_active);
        assert_eq!(notification(&app).0, NotificationLevel::Error);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "52.31, 104.29 Test St");
        press(&mut app, KeyCode::Enter);
        assert!(!app.search_active);
        assert_eq!(
            notification(&app),
            (NotificationLevel::Info, "Showing Test St".into())
        );
    }

    #[test]
    fn removed_selection_is_cleared() {
        let mut app = app();
        let id = EntityId::from("1");
        app.action_tx.send(Action::SelectCamera(id.clone())).unwrap();
        drain(&mut app);

        app.store.remove(&id).unwrap();
        app.action_tx
            .send(Action::CamerasUpdated(app.store.snapshot()))
            .unwrap();
        drain(&mut app);
        assert_eq!(app.selected, None);
        assert_eq!(app.stats, CameraStats::default());
    }
}
