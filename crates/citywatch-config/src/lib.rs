//! Configuration for the citywatch dashboard.
//!
//! TOML file + `CITYWATCH_` environment overrides layered over built-in
//! defaults, validation, and translation into `citywatch_core::MapConfig`
//! plus the seed camera list the dashboard starts with.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use citywatch_core::{
    Camera, CameraStatus, CoreError, EntityId, LatLng, MapConfig, RadiusBounds, TileLayer,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub map: MapSection,

    #[serde(default)]
    pub add: AddSection,

    /// Cameras present when the dashboard starts.
    #[serde(default)]
    pub cameras: Vec<CameraSeed>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: MapSection::default(),
            add: AddSection::default(),
            cameras: default_cameras(),
        }
    }
}

/// `[map]`: where the map starts and which tiles it draws.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MapSection {
    pub container: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
    /// Zoom used when jumping to a search result.
    pub search_zoom: u8,
    pub tile_url: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for MapSection {
    fn default() -> Self {
        let map = MapConfig::default();
        Self {
            container: map.container,
            center_lat: map.center.lat,
            center_lng: map.center.lng,
            zoom: map.zoom,
            search_zoom: map.search_zoom,
            tile_url: map.tile_layer.url_template,
            attribution: map.tile_layer.attribution,
            max_zoom: map.tile_layer.max_zoom,
        }
    }
}

/// `[add]`: radius range offered when placing a camera, in meters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AddSection {
    pub default_radius: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub step: f64,
}

impl Default for AddSection {
    fn default() -> Self {
        let bounds = RadiusBounds::default();
        Self {
            default_radius: bounds.default,
            min_radius: bounds.min,
            max_radius: bounds.max,
            step: bounds.step,
        }
    }
}

/// One `[[cameras]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CameraSeed {
    /// Stable id; a fresh UUID is generated when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    #[serde(default)]
    pub status: CameraStatus,
    /// Coverage percentage; derived from the radius when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<u8>,
    /// Minutes since the camera last reported.
    #[serde(default)]
    pub last_seen_minutes: u32,
}

fn default_cameras() -> Vec<CameraSeed> {
    let seed = |id: &str, lat, lng, radius, status, coverage, minutes| CameraSeed {
        id: Some(id.into()),
        name: format!("Camera-{id}"),
        lat,
        lng,
        radius,
        status,
        coverage: Some(coverage),
        last_seen_minutes: minutes,
    };
    vec![
        seed("1", 52.2920, 104.2750, 150.0, CameraStatus::Active, 85, 2),
        seed("2", 52.2950, 104.2900, 120.0, CameraStatus::Active, 92, 5),
        seed("3", 52.2840, 104.2820, 100.0, CameraStatus::Warning, 67, 15),
    ]
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "citywatch", "citywatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("citywatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys use `__` between section and field, e.g.
/// `CITYWATCH_MAP__ZOOM=15`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CITYWATCH_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Check every section; the first problem found is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.map_config()?;

        let mut seen = HashSet::new();
        for (i, seed) in self.cameras.iter().enumerate() {
            let field = |name: &str| format!("cameras[{i}].{name}");
            if seed.name.trim().is_empty() {
                return Err(invalid(field("name"), "must not be empty"));
            }
            if !LatLng::new(seed.lat, seed.lng).is_valid() {
                return Err(invalid(
                    field("lat/lng"),
                    format!("{}, {} is not a valid coordinate", seed.lat, seed.lng),
                ));
            }
            if !seed.radius.is_finite() || seed.radius <= 0.0 {
                return Err(invalid(field("radius"), "must be positive"));
            }
            if seed.coverage.is_some_and(|c| c > 100) {
                return Err(invalid(field("coverage"), "must be at most 100"));
            }
            if let Some(id) = &seed.id {
                if !seen.insert(id.as_str()) {
                    return Err(invalid(field("id"), format!("duplicate id '{id}'")));
                }
            }
        }
        Ok(())
    }

    /// Runtime map configuration for the overlay engine.
    pub fn map_config(&self) -> Result<MapConfig, ConfigError> {
        let map = MapConfig {
            container: self.map.container.clone(),
            center: LatLng::new(self.map.center_lat, self.map.center_lng),
            zoom: self.map.zoom,
            search_zoom: self.map.search_zoom,
            tile_layer: TileLayer {
                url_template: self.map.tile_url.clone(),
                attribution: self.map.attribution.clone(),
                max_zoom: self.map.max_zoom,
            },
            radius: RadiusBounds {
                min: self.add.min_radius,
                max: self.add.max_radius,
                step: self.add.step,
                default: self.add.default_radius,
            },
        };
        map.validate()?;
        Ok(map)
    }

    /// Materialize the seed cameras, in file order.
    pub fn seed_cameras(&self) -> Vec<Camera> {
        let bounds = RadiusBounds {
            min: self.add.min_radius,
            max: self.add.max_radius,
            step: self.add.step,
            default: self.add.default_radius,
        };
        let now = Utc::now();

        self.cameras
            .iter()
            .map(|seed| Camera {
                id: seed
                    .id
                    .as_deref()
                    .map_or_else(EntityId::generate, EntityId::from),
                name: seed.name.trim().to_owned(),
                position: LatLng::new(seed.lat, seed.lng),
                radius: seed.radius,
                status: seed.status,
                coverage: seed
                    .coverage
                    .unwrap_or_else(|| bounds.coverage_for(seed.radius)),
                last_activity: now - Duration::minutes(i64::from(seed.last_seen_minutes)),
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.map_config().unwrap(), MapConfig::default());
    }

    #[test]
    fn file_overrides_defaults_per_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
[map]
zoom = 11

[add]
max_radius = 300.0

[[cameras]]
id = "gate"
name = "North gate"
lat = 52.30
lng = 104.30
radius = 180.0
status = "inactive"
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.map.zoom, 11);
        assert_eq!(cfg.map.search_zoom, 15);
        assert_eq!(cfg.cameras.len(), 1);

        let cams = cfg.seed_cameras();
        assert_eq!(cams[0].id, EntityId::from("gate"));
        assert_eq!(cams[0].status, CameraStatus::Inactive);
        // 70 + (180 - 50) * 29 / 250 = 85.08
        assert_eq!(cams[0].coverage, 85);
    }

    #[test]
    fn empty_camera_list_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "cameras = []\n");
        assert!(load_config_from(&path).unwrap().cameras.is_empty());
    }

    #[test]
    fn zoom_above_max_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "[map]\nzoom = 20\nmax_zoom = 18\n");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Core(CoreError::Config { .. })), "{err}");
    }

    #[test]
    fn duplicate_seed_ids_are_rejected() {
        let mut cfg = Config::default();
        cfg.cameras[1].id = Some("1".into());
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid cameras[1].id: duplicate id '1'");
    }

    #[test]
    fn non_positive_seed_radius_is_rejected() {
        let mut cfg = Config::default();
        cfg.cameras[0].radius = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "cameras[0].radius"
        ));
    }

    #[test]
    fn seeds_without_id_get_fresh_uuids() {
        let mut cfg = Config::default();
        cfg.cameras[0].id = None;
        let cams = cfg.seed_cameras();
        assert!(cams[0].id.as_uuid().is_some());
        assert!(cams[0].last_activity < Utc::now());
    }

    #[test]
    fn saved_config_loads_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config::default();

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
