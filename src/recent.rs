//! Recent tracking numbers, most-recent first.
//!
//! Fails soft: storage or JSON errors are logged and treated as an empty
//! list, never surfaced to the tracking flow.

use std::sync::Arc;

use crate::constants::storage::{MAX_RECENT, RECENT_SEARCHES_KEY};
use crate::storage::KeyValueStore;

#[derive(Clone)]
pub struct RecentSearches {
    store: Arc<dyn KeyValueStore>,
}

impl RecentSearches {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> Vec<String> {
        match self.store.get(RECENT_SEARCHES_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<String>>(&raw).unwrap_or_else(|e| {
                log::error!("Error reading recent searches: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::error!("Error reading recent searches: {e:#}");
                Vec::new()
            }
        }
    }

    /// Move `number` to the front, cap at [`MAX_RECENT`], persist.
    pub fn add(&self, number: &str) -> Vec<String> {
        let mut updated: Vec<String> = Vec::with_capacity(MAX_RECENT);
        updated.push(number.to_string());
        updated.extend(self.list().into_iter().filter(|n| n != number));
        updated.truncate(MAX_RECENT);

        let saved = serde_json::to_string(&updated)
            .map_err(anyhow::Error::from)
            .and_then(|raw| self.store.set(RECENT_SEARCHES_KEY, &raw));
        match saved {
            Ok(()) => updated,
            Err(e) => {
                log::error!("Error saving recent search: {e:#}");
                Vec::new()
            }
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(RECENT_SEARCHES_KEY) {
            log::error!("Error clearing recent searches: {e:#}");
        }
    }
}
