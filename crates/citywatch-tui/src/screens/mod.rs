//! Dashboard panels. Each panel is a Component owned by the App.

pub mod cameras;
pub mod map;
