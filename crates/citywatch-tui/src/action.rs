//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::fmt;
use std::sync::Arc;

use citywatch_core::{Camera, EntityId, LatLng, SearchResult};

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Pending confirmation action.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteCamera { id: EntityId, name: String },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteCamera { name, .. } => write!(f, "Delete camera {name}?"),
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,

    // ── Focus ──────────────────────────────────────────────────────
    FocusNext,

    // ── Data Events (from the camera store) ───────────────────────
    CamerasUpdated(Arc<Vec<Arc<Camera>>>),

    // ── Selection ─────────────────────────────────────────────────
    SelectCamera(EntityId),
    ClearSelection,

    // ── Add Workflow ──────────────────────────────────────────────
    StartAdd,
    CancelAdd,
    /// Map clicked while adding: the new camera's position.
    SetCandidate(LatLng),
    AdjustDraftRadius(i32),
    SubmitCamera,
    /// Add-mode flag and candidate as the map should show them.
    PlacementChanged {
        add_mode: bool,
        candidate: Option<LatLng>,
    },

    // ── Camera Commands ───────────────────────────────────────────
    RequestDelete(EntityId),
    CycleStatus(EntityId),
    AdjustRadius(EntityId, i32),

    // ── Confirm Dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Search ────────────────────────────────────────────────────
    OpenSearch,
    CloseSearch,
    SearchSubmit,
    SearchResolved(Option<Arc<SearchResult>>),

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
