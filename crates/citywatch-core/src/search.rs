// ── Ad-hoc location lookup ──
//
// The dashboard has no geocoder: an operator types a coordinate pair,
// optionally followed by the address it stands for, and the map jumps there.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{LatLng, Popup};

const POPUP_TITLE: &str = "Checked address";
const USAGE: &str = "expected 'lat, lng [label]'";

/// A looked-up location shown with the search highlight pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub position: LatLng,
    pub label: String,
}

impl SearchResult {
    pub fn new(position: LatLng, label: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
        }
    }

    /// Parse `"52.31, 104.29 Test St"`, `"52.31 104.29"` or
    /// `"52.31,104.29, Test St"`. Without a label the formatted coordinate
    /// is used.
    pub fn parse(query: &str) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidSearch {
            query: query.trim().to_owned(),
            reason: reason.to_owned(),
        };

        let rest = query.trim_start();
        let (lat, rest) = take_number(rest).ok_or_else(|| invalid(USAGE))?;
        let rest = skip_separator(rest);
        let (lng, rest) = take_number(rest).ok_or_else(|| invalid(USAGE))?;

        let position = LatLng::new(lat, lng);
        if !position.is_valid() {
            return Err(invalid("coordinates out of range"));
        }

        let label = skip_separator(rest).trim();
        let label = if label.is_empty() {
            position.to_string()
        } else {
            label.to_owned()
        };
        Ok(Self { position, label })
    }

    /// Popup content bound to the highlight pin.
    pub fn popup(&self) -> Popup {
        Popup {
            title: POPUP_TITLE.to_owned(),
            body: self.label.clone(),
        }
    }
}

/// Split a leading decimal number off `s`.
fn take_number(s: &str) -> Option<(f64, &str)> {
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map_or(s.len(), |(i, _)| i);
    let value: f64 = s.get(..end)?.parse().ok()?;
    Some((value, s.get(end..)?))
}

/// Skip whitespace and at most one comma.
fn skip_separator(s: &str) -> &str {
    let s = s.trim_start();
    s.strip_prefix(',').unwrap_or(s).trim_start()
}
