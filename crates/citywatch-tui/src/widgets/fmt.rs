//! Display formatting for camera metadata.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Compact "time since" label: "just now", "5m ago", "2h 5m ago".
pub fn fmt_last_activity(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds();
    if secs < 60 {
        return "just now".into();
    }
    // Minute resolution is plenty for a list column.
    let minutes = u64::try_from(secs / 60).unwrap_or(0);
    format!(
        "{} ago",
        humantime::format_duration(Duration::from_secs(minutes * 60))
    )
}

/// Radius in whole meters, e.g. "150 m".
pub fn fmt_radius(meters: f64) -> String {
    format!("{meters:.0} m")
}

/// Coverage bar split into filled and empty portions.
///
/// Returns `(filled, empty)` strings of `█` and `░` that together span
/// `width` characters.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn fmt_pct_bar(pct: u8, width: u16) -> (String, String) {
    let clamped = f64::from(pct.min(100));
    let filled_count = ((clamped / 100.0) * f64::from(width)).round() as u16;
    let empty_count = width.saturating_sub(filled_count);
    (
        "█".repeat(usize::from(filled_count)),
        "░".repeat(usize::from(empty_count)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    #[test]
    fn recent_activity_reads_just_now() {
        let now = Utc::now();
        assert_eq!(fmt_last_activity(now - TimeDelta::seconds(20), now), "just now");
        // Clock skew: activity "in the future".
        assert_eq!(fmt_last_activity(now + TimeDelta::seconds(5), now), "just now");
    }

    #[test]
    fn older_activity_truncates_to_minutes() {
        let now = Utc::now();
        assert_eq!(fmt_last_activity(now - TimeDelta::seconds(150), now), "2m ago");
        assert_eq!(
            fmt_last_activity(now - TimeDelta::minutes(125), now),
            "2h 5m ago"
        );
    }

    #[test]
    fn pct_bar_spans_width() {
        let (filled, empty) = fmt_pct_bar(85, 10);
        assert_eq!(filled.chars().count(), 9);
        assert_eq!(empty.chars().count(), 1);
        assert_eq!(fmt_pct_bar(0, 4), (String::new(), "░░░░".into()));
    }

    #[test]
    fn radius_has_no_decimals() {
        assert_eq!(fmt_radius(150.0), "150 m");
    }
}
