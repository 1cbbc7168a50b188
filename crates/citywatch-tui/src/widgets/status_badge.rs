//! Camera status badge: colored dot plus label, same colors as the map.

use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use citywatch_core::CameraStatus;

use crate::theme;

/// `● Active` in the status color.
pub fn status_span(status: CameraStatus) -> Span<'static> {
    let style = Style::default().fg(theme::status(status));
    let style = if status == CameraStatus::Warning {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    };
    Span::styled(format!("● {}", status.label()), style)
}
