// ── Camera domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::entity_id::EntityId;
use super::geo::LatLng;
use crate::error::CoreError;

/// Operational state of a camera. Drives the overlay color.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CameraStatus {
    #[default]
    Active,
    Warning,
    Inactive,
}

impl CameraStatus {
    /// Next status in the operator's cycle: active → warning → inactive → active.
    pub fn next(self) -> Self {
        match self {
            Self::Active => Self::Warning,
            Self::Warning => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    /// Human label for list badges.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Warning => "Attention",
            Self::Inactive => "Inactive",
        }
    }
}

/// A monitored camera: a point of interest with a coverage radius.
///
/// `name`, `coverage` and `last_activity` are display metadata; the overlay
/// engine only reads `id`, `position`, `radius` and `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: EntityId,
    pub name: String,
    pub position: LatLng,
    /// Coverage radius in meters.
    pub radius: f64,
    pub status: CameraStatus,
    /// Estimated area coverage, percent.
    pub coverage: u8,
    pub last_activity: DateTime<Utc>,
}

/// Allowed coverage radius range for cameras placed from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl Default for RadiusBounds {
    fn default() -> Self {
        Self {
            min: 50.0,
            max: 250.0,
            step: 10.0,
            default: 100.0,
        }
    }
}

impl RadiusBounds {
    pub fn contains(&self, radius: f64) -> bool {
        radius.is_finite() && radius >= self.min && radius <= self.max
    }

    pub fn clamp(&self, radius: f64) -> f64 {
        radius.clamp(self.min, self.max)
    }

    /// Coverage estimate for a radius: 70% at the minimum, 99% at the
    /// maximum, linear in between.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    pub fn coverage_for(&self, radius: f64) -> u8 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 99;
        }
        let pct = 70.0 + (self.clamp(radius) - self.min) * 29.0 / span;
        pct.round().clamp(70.0, 99.0) as u8
    }
}

/// Draft of a camera being placed in add-mode.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCamera {
    pub name: String,
    pub position: Option<LatLng>,
    pub radius: f64,
}

impl NewCamera {
    pub fn new(bounds: &RadiusBounds) -> Self {
        Self {
            name: String::new(),
            position: None,
            radius: bounds.default,
        }
    }

    /// Move the radius by `steps` increments, staying inside `bounds`.
    pub fn adjust_radius(&mut self, steps: i32, bounds: &RadiusBounds) {
        self.radius = bounds.clamp(self.radius + f64::from(steps) * bounds.step);
    }

    /// Validate the draft and turn it into an active camera with a fresh id.
    pub fn build(&self, bounds: &RadiusBounds) -> Result<Camera, CoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::EmptyName);
        }
        let position = self.position.ok_or(CoreError::MissingPosition)?;
        if !position.is_valid() {
            return Err(CoreError::InvalidPosition {
                lat: position.lat,
                lng: position.lng,
            });
        }
        if !bounds.contains(self.radius) {
            return Err(CoreError::RadiusOutOfRange {
                radius: self.radius,
                min: bounds.min,
                max: bounds.max,
            });
        }

        Ok(Camera {
            id: EntityId::generate(),
            name: name.to_owned(),
            position,
            radius: self.radius,
            status: CameraStatus::Active,
            coverage: bounds.coverage_for(self.radius),
            last_activity: Utc::now(),
        })
    }
}
