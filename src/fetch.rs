use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::api::{TrackingClient, TrackingTransport};
use crate::controller::FetchRequest;
use crate::types::AppEvent;

/// Background task that performs tracking fetches requested by the controller.
///
/// Each request runs in its own task so a new search never waits behind a
/// slow (cold-starting) one; the controller discards superseded results.
pub async fn run_tracking_fetch<T>(
    client: Arc<TrackingClient<T>>,
    mut fetch_rx: UnboundedReceiver<FetchRequest>,
    event_tx: UnboundedSender<AppEvent>,
) where
    T: TrackingTransport + 'static,
{
    log::info!("tracking fetch worker started");

    while let Some(FetchRequest { seq, query }) = fetch_rx.recv().await {
        log::debug!("fetch #{seq} received for {}", query.number);
        let client = Arc::clone(&client);
        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            let outcome = client.track(&query).await;
            if event_tx
                .send(AppEvent::TrackingFinished { seq, outcome })
                .is_err()
            {
                log::debug!("event loop closed before fetch #{seq} finished");
            }
        });
    }

    log::info!("tracking fetch worker shutting down");
}

/// Load the carrier registry once and hand it to the event loop.
pub async fn load_carriers<T>(client: Arc<TrackingClient<T>>, event_tx: UnboundedSender<AppEvent>)
where
    T: TrackingTransport + 'static,
{
    let carriers = crate::carriers::list_carriers(&client).await;
    let _ = event_tx.send(AppEvent::CarriersLoaded(carriers));
}
