//! Supported-carrier lookup with a static fallback.

use crate::api::{TrackingClient, TrackingTransport};
use crate::types::{Carrier, CarrierCode};

const FALLBACK: [(&str, &str, &str); 6] = [
    ("india-post", "India Post", "🇮🇳"),
    ("delhivery", "Delhivery", "📦"),
    ("bluedart", "Blue Dart", "✈️"),
    ("dtdc", "DTDC", "🚚"),
    ("ecom-express", "Ecom Express", "🛒"),
    ("ekart", "Ekart Logistics", "🎯"),
];

/// Carriers known without asking the backend.
pub fn fallback_carriers() -> Vec<Carrier> {
    FALLBACK
        .iter()
        .map(|(code, name, icon)| Carrier {
            code: CarrierCode::from(*code),
            name: name.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}

/// Best-effort registry fetch; never fails.
pub async fn list_carriers<T: TrackingTransport>(client: &TrackingClient<T>) -> Vec<Carrier> {
    match client.carriers().await {
        Ok(list) if !list.is_empty() => {
            log::info!("loaded {} carriers from backend", list.len());
            list
        }
        Ok(_) => {
            log::warn!("backend returned no carriers, using defaults");
            fallback_carriers()
        }
        Err(e) => {
            log::error!("Failed to fetch carriers: {:?} {}", e.kind, e.message);
            fallback_carriers()
        }
    }
}

/// Display name for `code`, falling back to the code itself.
pub fn display_name<'a>(carriers: &'a [Carrier], code: &'a CarrierCode) -> &'a str {
    carriers
        .iter()
        .find(|c| &c.code == code)
        .map(|c| c.name.as_str())
        .unwrap_or_else(|| code.as_str())
}
