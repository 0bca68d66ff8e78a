use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::TrackError;

/// Carrier code understood by the backend (e.g. `india-post`).
///
/// Kept as an open string tag: the registry can introduce carriers without
/// a code change here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierCode(String);

impl CarrierCode {
    pub const DEFAULT: &'static str = "india-post";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CarrierCode {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for CarrierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CarrierCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Registry entry returned by `GET /api/carriers`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub code: CarrierCode,
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CarrierList {
    pub carriers: Vec<Carrier>,
}

/// A validated request for one tracking number at one carrier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingQuery {
    pub number: String,
    pub carrier: CarrierCode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Only picks the badge colour; it never decides whether a shipment is on track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    /// Anything else the backend sends (`none`, `moderate`, ...).
    #[serde(other)]
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayInfo {
    pub status: String,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub hours_since_update: Option<f64>,
}

impl DelayInfo {
    /// Decided by `status` alone; `Unknown` or `delayed` with a mild
    /// severity still gets its own badge.
    pub fn is_on_track(&self) -> bool {
        let status = self.status.trim();
        status.eq_ignore_ascii_case("normal") || status.eq_ignore_ascii_case("on_track")
    }
}

/// Shipment payload from `GET /api/track/{number}`.
///
/// Opaque to the controller: it only stores and hands it to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackingResult {
    pub tracking_number: String,
    pub status: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    /// Most recent first.
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
    #[serde(default)]
    pub delay_info: Option<DelayInfo>,
    #[serde(default)]
    pub smart_summary: Option<String>,
}

impl TrackingResult {
    pub fn latest_event(&self) -> Option<&TrackingEvent> {
        self.events.first()
    }

    pub fn is_on_track(&self) -> bool {
        self.delay_info.as_ref().map_or(true, DelayInfo::is_on_track)
    }
}

/// Events delivered to the terminal loop from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// Completion of the fetch issued with sequence number `seq`.
    TrackingFinished {
        seq: u64,
        outcome: Result<TrackingResult, TrackError>,
    },
    CarriersLoaded(Vec<Carrier>),
    Quit,
}
