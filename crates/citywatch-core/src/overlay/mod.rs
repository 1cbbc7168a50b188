// ── Map overlays ──
//
// Identity-keyed camera pairs plus the two single-slot transient overlays.

mod engine;
mod router;
mod transient;

pub use engine::{OverlayEngine, OverlayPair, ReconcileStats};
pub use router::{CameraClickHandler, MapClickHandler};
pub use transient::OverlaySlot;
