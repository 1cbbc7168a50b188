// ── Core error types ──
//
// The overlay engine itself never fails: a missing surface is a silent
// no-op. These errors belong to the host-facing workflows (placing a new
// camera, parsing a search query, building runtime configuration).

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    // ── Camera validation ────────────────────────────────────────────
    #[error("Camera name must not be empty")]
    EmptyName,

    #[error("No position chosen for the new camera")]
    MissingPosition,

    #[error("Invalid position {lat}, {lng}")]
    InvalidPosition { lat: f64, lng: f64 },

    #[error("Radius {radius} m is outside {min}..={max} m")]
    RadiusOutOfRange { radius: f64, min: f64, max: f64 },

    // ── Store errors ─────────────────────────────────────────────────
    #[error("Camera not found: {id}")]
    CameraNotFound { id: String },

    // ── Search errors ────────────────────────────────────────────────
    #[error("Cannot locate '{query}': {reason}")]
    InvalidSearch { query: String, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}
