pub mod fmt;
pub mod status_badge;
