//! Keep-alive pinger.
//!
//! Hits `GET /` on a fixed interval so a hosted backend that sleeps when
//! idle is warm when the user tracks something. Completely independent of
//! the tracking flow: failures are logged and nothing else.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{TrackingClient, TrackingTransport};

/// True for endpoints on the local machine, which never need warming.
pub fn is_local_endpoint(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(u) => matches!(
            u.host_str(),
            Some("localhost") | Some("127.0.0.1") | Some("0.0.0.0") | Some("[::1]")
        ),
        Err(_) => url.contains("localhost"),
    }
}

pub struct KeepAlive<T> {
    client: Arc<TrackingClient<T>>,
    interval: Duration,
    enabled: bool,
    handle: Option<JoinHandle<()>>,
}

impl<T: TrackingTransport + 'static> KeepAlive<T> {
    /// A zero `interval` or a local `api_url` disables pinging.
    pub fn new(client: Arc<TrackingClient<T>>, api_url: &str, interval: Duration) -> Self {
        let enabled = !interval.is_zero() && !is_local_endpoint(api_url);
        Self {
            client,
            interval,
            enabled,
            handle: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ping now, then every `interval`. Calling it again while running is a no-op.
    pub fn start(&mut self) {
        if !self.enabled || self.is_running() {
            return;
        }
        let client = Arc::clone(&self.client);
        let interval = self.interval;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match client.health().await {
                    Ok(()) => log::info!("Backend is alive"),
                    Err(e) => log::warn!(
                        "Keep-alive ping failed (backend may be sleeping): {:?}",
                        e.kind
                    ),
                }
            }
        }));
        log::info!("Keep-alive service started ({}s)", interval.as_secs());
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::info!("Keep-alive service stopped");
        }
    }
}

impl<T> Drop for KeepAlive<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
