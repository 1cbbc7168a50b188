// ── Single-slot transient overlays ──
//
// The placement preview and the search highlight each hold at most one
// marker. Every state change destroys whatever is in the slot first, then
// creates a fresh marker if the new state calls for one. Neither ever
// touches the camera overlay pairs.

use tracing::debug;

use crate::model::{LatLng, placement_icon, search_pin_icon};
use crate::search::SearchResult;
use crate::surface::MapSurface;

/// Holds zero or one marker handle.
#[derive(Debug)]
pub struct OverlaySlot<M> {
    current: Option<M>,
}

impl<M> Default for OverlaySlot<M> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<M> OverlaySlot<M> {
    pub fn get(&self) -> Option<&M> {
        self.current.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.current.is_some()
    }

    /// Remove the current marker (if any) from `surface`, then store
    /// whatever `create` returns.
    pub(crate) fn replace<S>(&mut self, surface: &mut S, create: impl FnOnce(&mut S) -> Option<M>)
    where
        S: MapSurface<Marker = M>,
    {
        if let Some(old) = self.current.take() {
            surface.remove_marker(&old);
        }
        self.current = create(surface);
    }

    /// Drop the handle without touching a surface. Used once the surface
    /// itself has been destroyed.
    pub(crate) fn forget(&mut self) {
        self.current = None;
    }
}

/// Placement preview: present iff add-mode is on and a candidate is set.
pub(crate) fn place_preview<S: MapSurface>(
    surface: &mut S,
    add_mode: bool,
    candidate: Option<LatLng>,
) -> Option<S::Marker> {
    let at = candidate.filter(|_| add_mode)?;
    debug!(%at, "showing placement preview");
    Some(surface.create_marker(at, &placement_icon()))
}

/// Search highlight: present iff there is a result. Jumps the viewport to it.
pub(crate) fn place_search_pin<S: MapSurface>(
    surface: &mut S,
    result: Option<&SearchResult>,
    zoom: u8,
) -> Option<S::Marker> {
    let result = result?;
    debug!(at = %result.position, label = %result.label, "showing search highlight");
    let marker = surface.create_marker(result.position, &search_pin_icon());
    surface.bind_popup(&marker, result.popup());
    surface.set_view(result.position, zoom);
    Some(marker)
}
