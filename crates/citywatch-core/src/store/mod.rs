// ── Reactive camera store ──
//
// Lock-free entity storage with push-based change notification.

mod camera_store;
mod collection;
mod refresh;

pub use camera_store::{CameraStats, CameraStore, CameraStream};
