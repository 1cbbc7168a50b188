//! Camera list: status badge, coverage, radius and last activity per camera.

use std::cell::Cell as StdCell;
use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use citywatch_core::{Camera, CameraStats, EntityId};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::fmt::{fmt_last_activity, fmt_pct_bar, fmt_radius};
use crate::widgets::status_badge::status_span;

const COVERAGE_BAR_WIDTH: u16 = 6;

pub struct CameraListScreen {
    focused: bool,
    cameras: Arc<Vec<Arc<Camera>>>,
    stats: CameraStats,
    selected: Option<EntityId>,
    table_state: TableState,
    /// Table area from the last render, for mouse row picking.
    last_area: StdCell<Rect>,
}

impl CameraListScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            cameras: Arc::new(Vec::new()),
            stats: CameraStats::default(),
            selected: None,
            table_state: TableState::default(),
            last_area: StdCell::new(Rect::default()),
        }
    }

    fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.cameras.iter().position(|c| &c.id == id)
    }

    fn sync_table_state(&mut self) {
        let idx = self.selected.as_ref().and_then(|id| self.index_of(id));
        self.table_state.select(idx);
    }

    fn select_at(&self, idx: usize) -> Option<Action> {
        let camera = self.cameras.get(idx.min(self.cameras.len().checked_sub(1)?))?;
        Some(Action::SelectCamera(camera.id.clone()))
    }

    fn move_selection(&self, forward: bool) -> Option<Action> {
        let next = match (self.table_state.selected(), forward) {
            (Some(current), true) => current + 1,
            (Some(current), false) => current.saturating_sub(1),
            (None, true) => 0,
            (None, false) => self.cameras.len().checked_sub(1)?,
        };
        self.select_at(next)
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(theme::BORDER_GRAY);
        let value = Style::default().fg(theme::SKY);
        let line = Line::from(vec![
            Span::styled(" Total ", label),
            Span::styled(self.stats.total.to_string(), value),
            Span::styled("  Active ", label),
            Span::styled(
                self.stats.active.to_string(),
                Style::default().fg(theme::SUCCESS_GREEN),
            ),
            Span::styled("  Coverage ", label),
            Span::styled(format!("{}%", self.stats.average_coverage), value),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

impl Component for CameraListScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => Ok(self.move_selection(true)),
            KeyCode::Char('k') | KeyCode::Up => Ok(self.move_selection(false)),
            KeyCode::Char('g') | KeyCode::Home => Ok(self.select_at(0)),
            KeyCode::Char('G') | KeyCode::End => Ok(self.select_at(usize::MAX)),
            KeyCode::Esc => Ok(Some(Action::ClearSelection)),
            _ => Ok(None),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let area = self.last_area.get();
        if mouse.kind != MouseEventKind::Down(MouseButton::Left)
            || !area.contains((mouse.column, mouse.row).into())
        {
            return Ok(None);
        }
        // First table row is the header.
        let Some(row) = (mouse.row - area.y).checked_sub(1) else {
            return Ok(None);
        };
        let idx = usize::from(row) + self.table_state.offset();
        Ok(self
            .cameras
            .get(idx)
            .map(|c| Action::SelectCamera(c.id.clone())))
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::CamerasUpdated(cameras) => {
                self.cameras = Arc::clone(cameras);
                self.stats = CameraStats::from_cameras(cameras);
                self.sync_table_state();
            }
            Action::SelectCamera(id) => {
                self.selected = Some(id.clone());
                self.sync_table_state();
            }
            Action::ClearSelection => {
                self.selected = None;
                self.sync_table_state();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Cameras ({}) ", self.cameras.len());
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [stats_area, table_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);
        self.last_area.set(table_area);

        self.render_stats(frame, stats_area);

        let header = Row::new(vec![
            Cell::from("Status").style(theme::table_header()),
            Cell::from("Name").style(theme::table_header()),
            Cell::from("Coverage").style(theme::table_header()),
            Cell::from("Radius").style(theme::table_header()),
            Cell::from("Seen").style(theme::table_header()),
        ]);

        let now = Utc::now();
        let rows: Vec<Row> = self
            .cameras
            .iter()
            .map(|camera| {
                let (filled, empty) = fmt_pct_bar(camera.coverage, COVERAGE_BAR_WIDTH);
                let coverage = Line::from(vec![
                    Span::styled(filled, Style::default().fg(theme::status(camera.status))),
                    Span::styled(empty, Style::default().fg(theme::GRID)),
                    Span::styled(
                        format!(" {}%", camera.coverage),
                        Style::default().fg(theme::DIM_WHITE),
                    ),
                ]);
                Row::new(vec![
                    Cell::from(status_span(camera.status)),
                    Cell::from(camera.name.clone()),
                    Cell::from(coverage),
                    Cell::from(fmt_radius(camera.radius)),
                    Cell::from(fmt_last_activity(camera.last_activity, now)),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Fill(1),
            Constraint::Length(COVERAGE_BAR_WIDTH + 5),
            Constraint::Length(7),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, table_area, &mut state);

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("select  ", theme::key_hint()),
            Span::styled("s ", theme::key_hint_key()),
            Span::styled("status  ", theme::key_hint()),
            Span::styled("[/] ", theme::key_hint_key()),
            Span::styled("radius  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("delete", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), hints_area);
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Cameras"
    }
}
