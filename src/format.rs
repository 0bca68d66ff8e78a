//! Text helpers for the result view.

use chrono::{DateTime, Local, NaiveDateTime};

use crate::types::{DelayInfo, Severity};

/// Coarse classification of a shipment status string, used for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Delivered,
    Moving,
    Problem,
    Neutral,
}

pub fn status_tone(status: &str) -> StatusTone {
    let s = status.to_lowercase();
    if s.contains("delivered") {
        StatusTone::Delivered
    } else if s.contains("transit") || s.contains("picked") {
        StatusTone::Moving
    } else if s.contains("exception") || s.contains("failed") {
        StatusTone::Problem
    } else {
        StatusTone::Neutral
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    OnTrack,
    Info,
    Warning,
    Danger,
}

/// Delay badge shown next to the shipment status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayBadge {
    pub label: String,
    pub tone: BadgeTone,
    /// Backend explanation, if any
    pub detail: Option<String>,
}

pub fn delay_badge(info: Option<&DelayInfo>) -> DelayBadge {
    let on_track = DelayBadge {
        label: "On Track".to_string(),
        tone: BadgeTone::OnTrack,
        detail: None,
    };
    let Some(info) = info else {
        return on_track;
    };
    if info.is_on_track() {
        return DelayBadge {
            detail: info.message.clone(),
            ..on_track
        };
    }
    let tone = match info.severity {
        Some(Severity::High) => BadgeTone::Danger,
        Some(Severity::Medium) => BadgeTone::Warning,
        Some(Severity::Low) => BadgeTone::Info,
        Some(Severity::None) | None => BadgeTone::OnTrack,
    };
    DelayBadge {
        label: info.status.clone(),
        tone,
        detail: info.message.clone(),
    }
}

/// `2026-01-28T08:00:00Z` -> `28 Jan 2026, 08:00`. Unparseable input is returned as-is.
pub fn format_timestamp(raw: &str) -> String {
    const OUT: &str = "%d %b %Y, %H:%M";
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(OUT).to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format(OUT).to_string();
        }
    }
    raw.to_string()
}

pub fn format_optional_timestamp(raw: Option<&str>) -> String {
    match raw {
        Some(r) if !r.trim().is_empty() => format_timestamp(r),
        _ => "N/A".to_string(),
    }
}

/// Relative "last refreshed" label for a successful fetch.
pub fn format_last_refreshed(fetched_at: DateTime<Local>, now: DateTime<Local>) -> String {
    let seconds = (now - fetched_at).num_seconds().max(0);
    if seconds < 10 {
        "Just now".to_string()
    } else if seconds < 60 {
        format!("{seconds}s ago")
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else {
        fetched_at.format("%H:%M:%S").to_string()
    }
}

/// Truncate to `max` characters, appending an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn delay(status: &str, severity: Option<Severity>) -> DelayInfo {
        DelayInfo {
            status: status.into(),
            severity,
            message: Some("No scan for 3 days".into()),
            hours_since_update: Some(72.0),
        }
    }

    #[test]
    fn test_status_tone() {
        assert_eq!(status_tone("Delivered"), StatusTone::Delivered);
        assert_eq!(status_tone("In Transit"), StatusTone::Moving);
        assert_eq!(status_tone("Picked up"), StatusTone::Moving);
        assert_eq!(status_tone("Delivery FAILED"), StatusTone::Problem);
        assert_eq!(status_tone("Booked"), StatusTone::Neutral);
    }

    #[test]
    fn test_delay_badge() {
        assert_eq!(delay_badge(None).label, "On Track");
        assert_eq!(delay_badge(Some(&delay("Normal", None))).tone, BadgeTone::OnTrack);

        let high = delay_badge(Some(&delay("Delayed", Some(Severity::High))));
        assert_eq!(high.label, "Delayed");
        assert_eq!(high.tone, BadgeTone::Danger);
        assert_eq!(high.detail.as_deref(), Some("No scan for 3 days"));

        assert_eq!(
            delay_badge(Some(&delay("Slow", Some(Severity::Medium)))).tone,
            BadgeTone::Warning
        );
        assert_eq!(
            delay_badge(Some(&delay("Slow", Some(Severity::Low)))).tone,
            BadgeTone::Info
        );
    }

    #[test]
    fn test_delay_badge_keeps_status_for_mild_severity() {
        let unknown = DelayInfo {
            status: "Unknown".into(),
            severity: Some(Severity::None),
            message: Some("No tracking updates available yet".into()),
            hours_since_update: Some(0.0),
        };
        let badge = delay_badge(Some(&unknown));
        assert_eq!(badge.label, "Unknown");
        assert_eq!(badge.tone, BadgeTone::OnTrack);
        assert_eq!(badge.detail.as_deref(), Some("No tracking updates available yet"));

        let moderate: DelayInfo =
            serde_json::from_str(r#"{"status":"delayed","severity":"moderate"}"#).unwrap();
        let badge = delay_badge(Some(&moderate));
        assert_eq!(badge.label, "delayed");
        assert_eq!(badge.tone, BadgeTone::OnTrack);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2026-01-28T08:00:00Z"), "28 Jan 2026, 08:00");
        assert_eq!(format_timestamp("2026-01-28T15:45:00+05:30"), "28 Jan 2026, 15:45");
        assert_eq!(format_timestamp("2026-01-27 22:30:00"), "27 Jan 2026, 22:30");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_optional_timestamp(None), "N/A");
    }

    #[test]
    fn test_last_refreshed() {
        let t = Local::now();
        assert_eq!(format_last_refreshed(t, t + Duration::seconds(3)), "Just now");
        assert_eq!(format_last_refreshed(t, t + Duration::seconds(42)), "42s ago");
        assert_eq!(format_last_refreshed(t, t + Duration::seconds(125)), "2m ago");
        assert_eq!(
            format_last_refreshed(t, t + Duration::hours(2)),
            t.format("%H:%M:%S").to_string()
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Mumbai", 10), "Mumbai");
        assert_eq!(truncate("New Delhi GPO", 6), "New D…");
    }
}
