//! Map overlay reconciliation engine for the citywatch dashboard.
//!
//! This crate owns everything between the camera collection and the
//! interactive map it is drawn on, independent of any particular UI:
//!
//! - **[`MapSurface`]**: Primitive contract of a pan/zoom map widget
//!   (markers, circles, popups, viewport, click listeners). Backends
//!   implement it; [`SurfaceFactory`] creates one per mount.
//!
//! - **[`OverlayEngine`]**: Owns the mounted surface and the
//!   `EntityId` → marker + coverage circle mapping. Each
//!   [`reconcile`](OverlayEngine::reconcile) pass removes vanished pairs,
//!   mutates persisting ones in place, and creates new ones. Also owns the
//!   single-slot placement preview and search highlight overlays.
//!
//! - **[`MapView`]**: Props layer for hosts. Takes the full prop set each
//!   render ([`MapProps`]) and runs only the effects whose inputs changed.
//!
//! - **[`CameraStore`]**: Lock-free reactive storage (`DashMap` +
//!   `tokio::sync::watch`) publishing ordered `Arc<Vec<Arc<Camera>>>`
//!   snapshots, subscribed to through [`EntityStream`].
//!
//! - **Domain model** ([`model`]): `Camera`, `LatLng`, `EntityId`, the
//!   add-camera draft, and the status → style mapping.

pub mod config;
pub mod error;
pub mod model;
pub mod overlay;
pub mod search;
pub mod store;
pub mod stream;
pub mod surface;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::MapConfig;
pub use error::CoreError;
pub use overlay::{OverlayEngine, OverlayPair, OverlaySlot, ReconcileStats};
pub use search::SearchResult;
pub use store::{CameraStats, CameraStore, CameraStream};
pub use stream::EntityStream;
pub use surface::{MapSurface, SurfaceFactory, TileLayer};
pub use view::{EffectReport, MapProps, MapView};

pub use model::{
    Camera, CameraStatus, CircleStyle, EntityId, IconSpec, LatLng, NewCamera, Popup, RadiusBounds,
    Rgb,
};
