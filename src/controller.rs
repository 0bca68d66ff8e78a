//! Tracking request lifecycle.
//!
//! `Idle -> Loading -> Success | Failure`, driven by `submit`, `refresh`,
//! `reset` and the completion of background fetches.
//!
//! Every fetch is tagged with a monotonically increasing sequence number.
//! A completion is applied only if its tag is the latest one issued and the
//! controller is still loading; anything else is a superseded request and
//! is dropped. The network call itself is never aborted.

use chrono::{DateTime, Local};
use tokio::sync::mpsc::UnboundedSender;

use crate::api::TrackError;
use crate::constants::{messages, validation::MIN_TRACKING_LEN};
use crate::recent::RecentSearches;
use crate::router::{Location, Route};
use crate::types::{CarrierCode, TrackingQuery, TrackingResult};

/// Input rejected before any network activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", messages::EMPTY_INPUT)]
    Empty,
    #[error("{}", messages::TOO_SHORT)]
    TooShort,
}

/// Trim and check a raw tracking-number input.
pub fn validate(input: &str, carrier: &CarrierCode) -> Result<TrackingQuery, ValidationError> {
    let number = input.trim();
    if number.is_empty() {
        return Err(ValidationError::Empty);
    }
    if number.chars().count() < MIN_TRACKING_LEN {
        return Err(ValidationError::TooShort);
    }
    Ok(TrackingQuery {
        number: number.to_string(),
        carrier: carrier.clone(),
    })
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestState {
    Idle,
    Loading {
        query: TrackingQuery,
    },
    Success {
        query: TrackingQuery,
        result: TrackingResult,
        fetched_at: DateTime<Local>,
    },
    Failure {
        query: TrackingQuery,
        error: TrackError,
    },
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Loading { .. } => "loading",
            RequestState::Success { .. } => "success",
            RequestState::Failure { .. } => "failure",
        }
    }
}

/// A fetch the worker should perform on the controller's behalf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: TrackingQuery,
}

/// Result of a `submit` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submitted {
    Issued(u64),
    Rejected(ValidationError),
}

pub struct TrackingController {
    state: RequestState,
    /// Query that produced the current or most recent attempt.
    last_query: Option<TrackingQuery>,
    validation_error: Option<ValidationError>,
    seq: u64,
    fetch_tx: UnboundedSender<FetchRequest>,
    recent: RecentSearches,
    location: Location,
}

impl TrackingController {
    pub fn new(
        fetch_tx: UnboundedSender<FetchRequest>,
        recent: RecentSearches,
        location: Location,
    ) -> Self {
        Self {
            state: RequestState::Idle,
            last_query: None,
            validation_error: None,
            seq: 0,
            fetch_tx,
            recent,
            location,
        }
    }

    // ----- getters -----
    pub fn state(&self) -> &RequestState {
        &self.state
    }
    pub fn validation_error(&self) -> Option<ValidationError> {
        self.validation_error
    }
    pub fn last_query(&self) -> Option<&TrackingQuery> {
        self.last_query.as_ref()
    }
    pub fn location(&self) -> &Location {
        &self.location
    }
    pub fn recent(&self) -> &RecentSearches {
        &self.recent
    }
    pub fn latest_seq(&self) -> u64 {
        self.seq
    }
    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        match &self.state {
            RequestState::Success { fetched_at, .. } => Some(*fetched_at),
            _ => None,
        }
    }

    /// Validate and start a fetch.
    ///
    /// Validation failures leave `RequestState` untouched and are exposed
    /// through [`validation_error`](Self::validation_error).
    pub fn submit(&mut self, input: &str, carrier: &CarrierCode) -> Submitted {
        let query = match validate(input, carrier) {
            Ok(q) => q,
            Err(e) => {
                log::debug!("rejected input {input:?}: {e}");
                self.validation_error = Some(e);
                return Submitted::Rejected(e);
            }
        };
        self.validation_error = None;
        self.seq += 1;
        let seq = self.seq;
        log::info!("track #{seq} {} via {}", query.number, query.carrier);

        self.last_query = Some(query.clone());
        self.state = RequestState::Loading {
            query: query.clone(),
        };
        if self.fetch_tx.send(FetchRequest { seq, query }).is_err() {
            log::error!("fetch worker is gone; request #{seq} will not complete");
        }
        Submitted::Issued(seq)
    }

    /// Submit sourced from deep-link parameters at startup.
    pub fn auto_submit_from_parameters(&mut self, number: &str, carrier: &CarrierCode) -> Submitted {
        log::info!("auto-track from link: {number} ({carrier})");
        self.submit(number, carrier)
    }

    /// Re-issue the last query. No-op while loading or with nothing to replay.
    pub fn refresh(&mut self) -> Option<Submitted> {
        if self.state.is_loading() {
            log::debug!("refresh ignored while loading");
            return None;
        }
        let query = self.last_query.clone()?;
        Some(self.submit(&query.number, &query.carrier))
    }

    /// Back to `Idle`, forgetting everything about the current session.
    pub fn reset(&mut self) {
        // invalidates any in-flight completion
        self.seq += 1;
        self.state = RequestState::Idle;
        self.last_query = None;
        self.validation_error = None;
        self.location.replace(Route::Track { params: None });
    }

    /// Close the error banner. The last query stays available to `refresh`.
    pub fn dismiss_error(&mut self) {
        if matches!(self.state, RequestState::Failure { .. }) {
            self.state = RequestState::Idle;
        }
    }

    pub fn clear_validation(&mut self) {
        self.validation_error = None;
    }

    /// Apply the completion of fetch `seq`. Returns `false` when stale.
    pub fn on_fetch_complete(
        &mut self,
        seq: u64,
        outcome: Result<TrackingResult, TrackError>,
    ) -> bool {
        if seq != self.seq {
            log::debug!("dropping stale completion #{seq} (latest #{})", self.seq);
            return false;
        }
        let query = match &self.state {
            RequestState::Loading { query } => query.clone(),
            other => {
                log::debug!("dropping completion #{seq} in state {}", other.name());
                return false;
            }
        };

        match outcome {
            Ok(result) => {
                log::info!("track #{seq} ok: {}", result.status);
                self.recent.add(&query.number);
                self.location
                    .replace(Route::track(&query.number, &query.carrier));
                self.state = RequestState::Success {
                    query,
                    result,
                    fetched_at: Local::now(),
                };
            }
            Err(error) => {
                log::warn!("track #{seq} failed: {:?}", error.kind);
                self.state = RequestState::Failure { query, error };
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::sample_result;
    use crate::api::TrackErrorKind;
    use crate::storage::MemoryStore;
    use std::sync::Arc;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn controller() -> (TrackingController, UnboundedReceiver<FetchRequest>) {
        let (tx, rx) = unbounded_channel();
        let recent = RecentSearches::new(Arc::new(MemoryStore::new()));
        let c = TrackingController::new(tx, recent, Location::new(Route::Track { params: None }));
        (c, rx)
    }

    fn dtdc() -> CarrierCode {
        CarrierCode::from("dtdc")
    }

    fn not_found() -> TrackError {
        TrackError::new(TrackErrorKind::NotFound, messages::NOT_FOUND)
    }

    #[test]
    fn empty_input_is_rejected_without_transition() {
        let (mut c, mut rx) = controller();
        assert_eq!(c.submit("   ", &dtdc()), Submitted::Rejected(ValidationError::Empty));
        assert_eq!(c.state(), &RequestState::Idle);
        assert_eq!(c.validation_error().unwrap().to_string(), "Please enter a tracking number");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn short_inputs_are_rejected_without_transition() {
        let (mut c, mut rx) = controller();
        for input in ["A", "RM1234", "  RM12345  ", "1234567"] {
            assert_eq!(c.submit(input, &dtdc()), Submitted::Rejected(ValidationError::TooShort));
            assert_eq!(c.state(), &RequestState::Idle);
        }
        assert_eq!(c.validation_error().unwrap().to_string(), "Invalid tracking number format");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn validation_error_does_not_replace_result() {
        let (mut c, _rx) = controller();
        let Submitted::Issued(seq) = c.submit("RM123456789IN", &dtdc()) else {
            panic!("expected issue");
        };
        c.on_fetch_complete(seq, Ok(sample_result("RM123456789IN")));
        c.submit("short", &dtdc());
        assert!(matches!(c.state(), RequestState::Success { .. }));
        assert_eq!(c.validation_error(), Some(ValidationError::TooShort));
    }

    #[test]
    fn valid_input_goes_through_loading_to_success() {
        let (mut c, mut rx) = controller();
        let issued = c.submit("  RM123456789IN ", &dtdc());
        assert_eq!(issued, Submitted::Issued(1));

        let req = rx.try_recv().unwrap();
        assert_eq!(req.query.number, "RM123456789IN");
        assert_eq!(
            c.state(),
            &RequestState::Loading {
                query: req.query.clone()
            }
        );

        assert!(c.on_fetch_complete(req.seq, Ok(sample_result("RM123456789IN"))));
        match c.state() {
            RequestState::Success { query, result, .. } => {
                assert_eq!(query.carrier, dtdc());
                assert_eq!(result.status, "In Transit");
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert!(c.fetched_at().is_some());
        assert_eq!(c.recent().list(), vec!["RM123456789IN"]);
        assert_eq!(
            c.location().share_link(),
            "dakdash://track?number=RM123456789IN&carrier=dtdc"
        );
        assert_eq!(c.location().history_len(), 1);
    }

    #[test]
    fn failure_keeps_location_and_recent_untouched() {
        let (mut c, _rx) = controller();
        c.submit("RM123456789IN", &dtdc());
        assert!(c.on_fetch_complete(1, Err(not_found())));
        match c.state() {
            RequestState::Failure { error, .. } => assert_eq!(error.kind, TrackErrorKind::NotFound),
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(c.location().current(), &Route::Track { params: None });
        assert!(c.recent().list().is_empty());
    }

    #[test]
    fn new_submit_clears_previous_result() {
        let (mut c, _rx) = controller();
        c.submit("RM123456789IN", &dtdc());
        c.on_fetch_complete(1, Ok(sample_result("RM123456789IN")));
        c.submit("EE987654321IN", &dtdc());
        assert!(c.state().is_loading());
        assert!(c.fetched_at().is_none());
    }

    #[test]
    fn last_request_wins() {
        let (mut c, mut rx) = controller();
        c.submit("AAAA11111111", &dtdc());
        c.submit("BBBB22222222", &dtdc());
        let a = rx.try_recv().unwrap();
        let b = rx.try_recv().unwrap();

        assert!(c.on_fetch_complete(b.seq, Ok(sample_result("BBBB22222222"))));
        assert!(!c.on_fetch_complete(a.seq, Ok(sample_result("AAAA11111111"))));

        match c.state() {
            RequestState::Success { result, .. } => assert_eq!(result.tracking_number, "BBBB22222222"),
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(c.recent().list(), vec!["BBBB22222222"]);
    }

    #[test]
    fn stale_failure_does_not_override_pending_request() {
        let (mut c, _rx) = controller();
        c.submit("AAAA11111111", &dtdc());
        c.submit("BBBB22222222", &dtdc());
        assert!(!c.on_fetch_complete(1, Err(not_found())));
        assert!(c.state().is_loading());
    }

    #[test]
    fn reset_returns_to_idle_from_every_state() {
        let (mut c, _rx) = controller();

        c.submit("RM123456789IN", &dtdc());
        c.reset();
        assert_eq!(c.state(), &RequestState::Idle);
        assert!(c.last_query().is_none());
        // the in-flight completion lands after reset and is ignored
        assert!(!c.on_fetch_complete(1, Ok(sample_result("RM123456789IN"))));
        assert_eq!(c.state(), &RequestState::Idle);

        let Submitted::Issued(seq) = c.submit("RM123456789IN", &dtdc()) else {
            panic!("expected issue");
        };
        c.on_fetch_complete(seq, Ok(sample_result("RM123456789IN")));
        c.reset();
        assert_eq!(c.state(), &RequestState::Idle);
        assert!(c.fetched_at().is_none());
        assert_eq!(c.location().current(), &Route::Track { params: None });

        let Submitted::Issued(seq) = c.submit("RM123456789IN", &dtdc()) else {
            panic!("expected issue");
        };
        c.on_fetch_complete(seq, Err(not_found()));
        c.submit("x", &dtdc());
        c.reset();
        assert_eq!(c.state(), &RequestState::Idle);
        assert!(c.validation_error().is_none());
    }

    #[test]
    fn refresh_is_ignored_while_loading() {
        let (mut c, mut rx) = controller();
        c.submit("RM123456789IN", &dtdc());
        rx.try_recv().unwrap();
        assert_eq!(c.refresh(), None);
        assert!(rx.try_recv().is_err());
        assert_eq!(c.latest_seq(), 1);
    }

    #[test]
    fn refresh_reissues_same_query_after_success_and_failure() {
        let (mut c, mut rx) = controller();
        c.submit("RM123456789IN", &dtdc());
        let first = rx.try_recv().unwrap();
        c.on_fetch_complete(first.seq, Ok(sample_result("RM123456789IN")));

        assert_eq!(c.refresh(), Some(Submitted::Issued(2)));
        let second = rx.try_recv().unwrap();
        assert_eq!(second.query, first.query);

        c.on_fetch_complete(second.seq, Err(not_found()));
        assert_eq!(c.refresh(), Some(Submitted::Issued(3)));
        assert_eq!(rx.try_recv().unwrap().query, first.query);
    }

    #[test]
    fn refresh_without_query_is_noop() {
        let (mut c, _rx) = controller();
        assert_eq!(c.refresh(), None);
    }

    #[test]
    fn dismiss_error_keeps_query_for_refresh() {
        let (mut c, mut rx) = controller();
        c.submit("RM123456789IN", &dtdc());
        rx.try_recv().unwrap();
        c.on_fetch_complete(1, Err(not_found()));
        c.dismiss_error();
        assert_eq!(c.state(), &RequestState::Idle);
        assert!(rx.try_recv().is_err());
        assert_eq!(c.refresh(), Some(Submitted::Issued(2)));
    }

    #[test]
    fn auto_submit_behaves_like_submit() {
        let (mut c, mut rx) = controller();
        assert_eq!(
            c.auto_submit_from_parameters("RM123456789IN", &dtdc()),
            Submitted::Issued(1)
        );
        assert!(c.state().is_loading());
        assert_eq!(rx.try_recv().unwrap().query.carrier, dtdc());
    }
}
