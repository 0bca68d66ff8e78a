//! End-to-end request lifecycle: controller -> fetch worker -> transport -> controller.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use dakdash::api::{RetryPolicy, TrackErrorKind, TrackingClient, TrackingTransport, TransportFailure};
use dakdash::controller::{RequestState, Submitted, TrackingController};
use dakdash::fetch::run_tracking_fetch;
use dakdash::recent::RecentSearches;
use dakdash::router::{Location, Route};
use dakdash::storage::MemoryStore;
use dakdash::types::{AppEvent, Carrier, CarrierCode, TrackingQuery, TrackingResult};

type Step = (Duration, Result<TrackingResult, TransportFailure>);

/// Backend double: per tracking number, a queue of (latency, outcome) steps.
#[derive(Default)]
struct FakeBackend {
    script: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl FakeBackend {
    fn script(self, number: &str, steps: Vec<Step>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(number.to_string(), steps.into());
        self
    }

    fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackingTransport for FakeBackend {
    async fn fetch_tracking(
        &self,
        query: &TrackingQuery,
        timeout: Duration,
    ) -> Result<TrackingResult, TransportFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((query.number.clone(), timeout));
        let step = self
            .script
            .lock()
            .unwrap()
            .get_mut(&query.number)
            .and_then(VecDeque::pop_front);
        match step {
            Some((latency, outcome)) => {
                tokio::time::sleep(latency).await;
                outcome
            }
            None => Err(TransportFailure::Status {
                code: 404,
                message: None,
            }),
        }
    }

    async fn fetch_carriers(&self, _timeout: Duration) -> Result<Vec<Carrier>, TransportFailure> {
        Ok(Vec::new())
    }

    async fn ping(&self, _timeout: Duration) -> Result<(), TransportFailure> {
        Ok(())
    }
}

fn shipment(number: &str) -> TrackingResult {
    serde_json::from_value(serde_json::json!({
        "tracking_number": number,
        "status": "Delivered",
        "carrier": "DTDC",
        "events": [{"status": "Delivered", "location": "Pune", "timestamp": "2026-02-01T10:00:00Z"}]
    }))
    .unwrap()
}

struct Harness {
    controller: TrackingController,
    events: UnboundedReceiver<AppEvent>,
    client: Arc<TrackingClient<FakeBackend>>,
}

fn harness(backend: FakeBackend) -> Harness {
    let policy = RetryPolicy {
        max_retries: 1,
        base_timeout: Duration::from_millis(60_000),
        retry_timeout: Duration::from_millis(90_000),
    };
    let client = Arc::new(TrackingClient::new(backend, policy));
    let (fetch_tx, fetch_rx) = unbounded_channel();
    let (event_tx, events) = unbounded_channel();
    tokio::spawn(run_tracking_fetch(Arc::clone(&client), fetch_rx, event_tx));
    let recent = RecentSearches::new(Arc::new(MemoryStore::new()));
    let controller = TrackingController::new(fetch_tx, recent, Location::new(Route::Track { params: None }));
    Harness {
        controller,
        events,
        client,
    }
}

impl Harness {
    /// Deliver the next completion to the controller; returns whether it was applied.
    async fn pump(&mut self) -> bool {
        match tokio::time::timeout(Duration::from_secs(5), self.events.recv()).await {
            Ok(Some(AppEvent::TrackingFinished { seq, outcome })) => {
                self.controller.on_fetch_complete(seq, outcome)
            }
            other => panic!("expected a tracking completion, got {other:?}"),
        }
    }
}

fn dtdc() -> CarrierCode {
    CarrierCode::from("dtdc")
}

#[tokio::test]
async fn cold_start_timeout_is_retried_with_longer_timeout() {
    let backend = FakeBackend::default().script(
        "RM123456789IN",
        vec![
            (Duration::ZERO, Err(TransportFailure::Timeout)),
            (Duration::ZERO, Ok(shipment("RM123456789IN"))),
        ],
    );
    let mut h = harness(backend);

    assert_eq!(h.controller.submit("RM123456789IN", &dtdc()), Submitted::Issued(1));
    assert!(h.pump().await);

    assert!(matches!(h.controller.state(), RequestState::Success { .. }));
    assert_eq!(
        h.client.transport().calls(),
        vec![
            ("RM123456789IN".to_string(), Duration::from_millis(60_000)),
            ("RM123456789IN".to_string(), Duration::from_millis(90_000)),
        ]
    );
    assert_eq!(h.controller.recent().list(), vec!["RM123456789IN"]);
    assert_eq!(
        h.controller.location().share_link(),
        "dakdash://track?number=RM123456789IN&carrier=dtdc"
    );
}

#[tokio::test]
async fn not_found_is_final_and_user_facing() {
    let mut h = harness(FakeBackend::default());
    h.controller.submit("XX000000000IN", &dtdc());
    assert!(h.pump().await);

    match h.controller.state() {
        RequestState::Failure { error, .. } => {
            assert_eq!(error.kind, TrackErrorKind::NotFound);
            assert_eq!(
                error.message,
                "Tracking number not found. Please verify and try again."
            );
        }
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(h.client.transport().calls().len(), 1);
    assert!(h.controller.recent().list().is_empty());
}

#[tokio::test]
async fn slow_first_request_loses_to_later_one() {
    let backend = FakeBackend::default()
        .script(
            "AAAA11111111",
            vec![(Duration::from_millis(150), Ok(shipment("AAAA11111111")))],
        )
        .script(
            "BBBB22222222",
            vec![(Duration::from_millis(10), Ok(shipment("BBBB22222222")))],
        );
    let mut h = harness(backend);

    h.controller.submit("AAAA11111111", &dtdc());
    h.controller.submit("BBBB22222222", &dtdc());

    // B lands first and is applied, then A arrives and is discarded
    assert!(h.pump().await);
    assert!(!h.pump().await);

    match h.controller.state() {
        RequestState::Success { result, .. } => {
            assert_eq!(result.tracking_number, "BBBB22222222")
        }
        other => panic!("unexpected state {other:?}"),
    }
    assert_eq!(h.controller.recent().list(), vec!["BBBB22222222"]);
}

#[tokio::test]
async fn reset_discards_in_flight_result() {
    let backend = FakeBackend::default().script(
        "RM123456789IN",
        vec![(Duration::from_millis(20), Ok(shipment("RM123456789IN")))],
    );
    let mut h = harness(backend);

    h.controller.submit("RM123456789IN", &dtdc());
    h.controller.reset();
    assert!(!h.pump().await);
    assert_eq!(h.controller.state(), &RequestState::Idle);
    assert_eq!(h.controller.location().current(), &Route::Track { params: None });
}

#[tokio::test]
async fn refresh_replays_last_query_after_network_failure() {
    let backend = FakeBackend::default().script(
        "RM123456789IN",
        vec![
            (Duration::ZERO, Err(TransportFailure::Network("connection refused".into()))),
            (Duration::ZERO, Err(TransportFailure::Network("connection refused".into()))),
            (Duration::ZERO, Ok(shipment("RM123456789IN"))),
        ],
    );
    let mut h = harness(backend);

    h.controller.submit("RM123456789IN", &dtdc());
    assert!(h.pump().await);
    match h.controller.state() {
        RequestState::Failure { error, .. } => {
            assert_eq!(error.kind, TrackErrorKind::NetworkUnavailable);
            assert!(error.message.contains("starting up"));
        }
        other => panic!("unexpected state {other:?}"),
    }

    assert_eq!(h.controller.refresh(), Some(Submitted::Issued(2)));
    assert!(h.pump().await);
    assert!(matches!(h.controller.state(), RequestState::Success { .. }));
    assert_eq!(h.client.transport().calls().len(), 3);
}
