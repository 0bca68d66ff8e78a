use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::carriers::{self, fallback_carriers};
use crate::constants::ui::{RECENT_VISIBLE, TOAST_DURATION_SECS};
use crate::controller::{RequestState, Submitted, TrackingController, ValidationError};
use crate::router::Route;
use crate::storage::KeyValueStore;
use crate::theme::Theme;
use crate::types::{AppEvent, Carrier, CarrierCode};

/// Which part of the landing view receives Up/Down/Enter
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Focus {
    Input,
    Recent,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct App {
    quit: bool,
    fps: u32,

    // Search bar
    input: String,
    carriers: Vec<Carrier>,
    carrier_code: CarrierCode,

    // Landing view
    focus: Focus,
    recent: Vec<String>,        // cached copy of the store, refreshed after writes
    recent_selection: usize,

    controller: TrackingController,
    store: Arc<dyn KeyValueStore>,
    theme: Theme,

    toast_message: Option<(String, ToastKind, Instant)>,
    frame: usize,
}

impl App {
    pub fn new(
        controller: TrackingController,
        store: Arc<dyn KeyValueStore>,
        default_carrier: CarrierCode,
        fps: u32,
    ) -> Self {
        let theme = Theme::load(store.as_ref());
        let recent = controller.recent().list();
        Self {
            quit: false,
            fps,
            input: String::new(),
            carriers: fallback_carriers(),
            carrier_code: default_carrier,
            focus: Focus::Input,
            recent,
            recent_selection: 0,
            controller,
            store,
            theme,
            toast_message: None,
            frame: 0,
        }
    }

    // ----- getters -----
    pub fn fps(&self) -> u32 { self.fps }
    pub fn quit_flag(&self) -> bool { self.quit }
    pub fn input(&self) -> &str { &self.input }
    pub fn focus(&self) -> Focus { self.focus }
    pub fn theme(&self) -> Theme { self.theme }
    pub fn controller(&self) -> &TrackingController { &self.controller }
    pub fn state(&self) -> &RequestState { self.controller.state() }
    pub fn validation_error(&self) -> Option<ValidationError> { self.controller.validation_error() }
    pub fn carriers(&self) -> &[Carrier] { &self.carriers }
    pub fn carrier_code(&self) -> &CarrierCode { &self.carrier_code }
    pub fn share_link(&self) -> String { self.controller.location().share_link() }

    pub fn carrier_name(&self) -> &str {
        carriers::display_name(&self.carriers, &self.carrier_code)
    }

    pub fn carrier_icon(&self) -> &str {
        self.carriers
            .iter()
            .find(|c| c.code == self.carrier_code)
            .map(|c| c.icon.as_str())
            .unwrap_or("")
    }

    /// Most recent searches shown on the landing view
    pub fn recent_visible(&self) -> &[String] {
        &self.recent[..self.recent.len().min(RECENT_VISIBLE)]
    }

    /// Highlighted recent entry, only while the list has focus
    pub fn recent_selection(&self) -> Option<usize> {
        (self.focus == Focus::Recent && !self.recent_visible().is_empty())
            .then_some(self.recent_selection)
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.frame % SPINNER.len()]
    }

    // ----- toasts -----
    pub fn show_toast(&mut self, msg: String) {
        self.toast_message = Some((msg, ToastKind::Success, Instant::now()));
    }

    pub fn show_error_toast(&mut self, msg: String) {
        self.toast_message = Some((msg, ToastKind::Error, Instant::now()));
    }

    /// Current toast if still within its display window
    pub fn toast_message(&self) -> Option<(&str, ToastKind)> {
        let ttl = Duration::from_secs(TOAST_DURATION_SECS);
        self.toast_message.as_ref().and_then(|(msg, kind, at)| {
            (at.elapsed() < ttl).then_some((msg.as_str(), *kind))
        })
    }

    /// Advance animations; called once per rendered frame.
    pub fn tick(&mut self) {
        if self.state().is_loading() {
            self.frame = self.frame.wrapping_add(1);
        }
    }

    // ----- startup -----

    /// Open the route passed on the command line.
    pub fn open_route(&mut self, route: &Route) {
        if let Some(params) = route.params() {
            self.input = params.number.clone();
            self.carrier_code = params.carrier.clone();
            self.controller
                .auto_submit_from_parameters(&params.number, &params.carrier);
        }
    }

    // ----- search bar -----
    pub fn input_add_char(&mut self, c: char) {
        self.focus = Focus::Input;
        self.input.push(c);
        self.controller.clear_validation();
    }

    pub fn input_backspace(&mut self) {
        self.focus = Focus::Input;
        if self.input.pop().is_some() {
            self.controller.clear_validation();
        }
    }

    pub fn input_clear(&mut self) {
        self.input.clear();
        self.controller.clear_validation();
    }

    pub fn next_carrier(&mut self) {
        self.step_carrier(1);
    }

    pub fn prev_carrier(&mut self) {
        self.step_carrier(-1);
    }

    fn step_carrier(&mut self, delta: isize) {
        if self.carriers.is_empty() {
            return;
        }
        let len = self.carriers.len() as isize;
        let idx = self
            .carriers
            .iter()
            .position(|c| c.code == self.carrier_code)
            .map_or(0, |i| (i as isize + delta).rem_euclid(len));
        self.carrier_code = self.carriers[idx as usize].code.clone();
    }

    // ----- actions -----

    /// Enter: track the typed number, or the highlighted recent entry.
    pub fn track(&mut self) -> Submitted {
        if let Some(idx) = self.recent_selection() {
            if let Some(number) = self.recent_visible().get(idx).cloned() {
                self.input = number;
            }
            self.focus = Focus::Input;
        }
        let carrier = self.carrier_code.clone();
        self.controller.submit(&self.input, &carrier)
    }

    /// F5 / Ctrl+R
    pub fn refresh(&mut self) {
        if let Some(Submitted::Issued(seq)) = self.controller.refresh() {
            log::debug!("refresh issued #{seq}");
        }
    }

    /// Ctrl+N: back to an empty search.
    pub fn new_search(&mut self) {
        self.controller.reset();
        self.input.clear();
        self.focus = Focus::Input;
        self.recent_selection = 0;
        self.reload_recent();
    }

    /// Esc: close whatever is on top.
    pub fn dismiss(&mut self) {
        if self.focus == Focus::Recent {
            self.focus = Focus::Input;
        } else if matches!(self.state(), RequestState::Failure { .. }) {
            self.controller.dismiss_error();
        } else if self.validation_error().is_some() {
            self.controller.clear_validation();
        }
    }

    pub fn recent_up(&mut self) {
        if !self.recent_navigable() {
            return;
        }
        if self.focus == Focus::Recent {
            if self.recent_selection == 0 {
                self.focus = Focus::Input;
            } else {
                self.recent_selection -= 1;
            }
        }
    }

    pub fn recent_down(&mut self) {
        if !self.recent_navigable() {
            return;
        }
        if self.focus == Focus::Input {
            self.focus = Focus::Recent;
            self.recent_selection = 0;
        } else {
            let last = self.recent_visible().len() - 1;
            self.recent_selection = (self.recent_selection + 1).min(last);
        }
    }

    fn recent_navigable(&self) -> bool {
        matches!(self.state(), RequestState::Idle) && !self.recent_visible().is_empty()
    }

    pub fn clear_recent(&mut self) {
        self.controller.recent().clear();
        self.reload_recent();
        self.focus = Focus::Input;
        self.show_toast("Recent searches cleared".to_string());
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.theme.save(self.store.as_ref());
        self.show_toast(format!("Theme: {}", self.theme));
    }

    fn reload_recent(&mut self) {
        self.recent = self.controller.recent().list();
        let visible = self.recent_visible().len();
        if self.recent_selection >= visible {
            self.recent_selection = visible.saturating_sub(1);
        }
    }

    pub fn on_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::Quit => self.quit = true,
            AppEvent::TrackingFinished { seq, outcome } => {
                if self.controller.on_fetch_complete(seq, outcome)
                    && matches!(self.state(), RequestState::Success { .. })
                {
                    self.reload_recent();
                }
            }
            AppEvent::CarriersLoaded(list) => {
                if list.is_empty() {
                    return;
                }
                self.carriers = list;
                if !self.carriers.iter().any(|c| c.code == self.carrier_code) {
                    log::warn!(
                        "carrier {} not offered by backend; keeping it selected",
                        self.carrier_code
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::sample_result;
    use crate::api::{TrackError, TrackErrorKind};
    use crate::controller::FetchRequest;
    use crate::recent::RecentSearches;
    use crate::router::Location;
    use crate::storage::MemoryStore;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn app_with(store: Arc<MemoryStore>) -> (App, UnboundedReceiver<FetchRequest>) {
        let (tx, rx) = unbounded_channel();
        let recent = RecentSearches::new(store.clone());
        let controller = TrackingController::new(tx, recent, Location::default());
        (App::new(controller, store, CarrierCode::default(), 30), rx)
    }

    fn app() -> (App, UnboundedReceiver<FetchRequest>) {
        app_with(Arc::new(MemoryStore::new()))
    }

    fn type_str(app: &mut App, s: &str) {
        s.chars().for_each(|c| app.input_add_char(c));
    }

    #[test]
    fn test_typing_clears_validation_error() {
        let (mut app, _rx) = app();
        type_str(&mut app, "RM1");
        assert_eq!(app.track(), Submitted::Rejected(ValidationError::TooShort));
        assert!(app.validation_error().is_some());
        app.input_add_char('2');
        assert!(app.validation_error().is_none());
    }

    #[test]
    fn test_track_uses_selected_carrier() {
        let (mut app, mut rx) = app();
        app.next_carrier();
        assert_eq!(app.carrier_code().as_str(), "delhivery");
        app.prev_carrier();
        app.prev_carrier();
        assert_eq!(app.carrier_code().as_str(), "ekart");

        type_str(&mut app, "RM123456789IN");
        assert_eq!(app.track(), Submitted::Issued(1));
        assert_eq!(rx.try_recv().unwrap().query.carrier.as_str(), "ekart");
    }

    #[test]
    fn test_success_updates_recent_list() {
        let (mut app, mut rx) = app();
        type_str(&mut app, "RM123456789IN");
        app.track();
        let req = rx.try_recv().unwrap();
        app.on_event(AppEvent::TrackingFinished {
            seq: req.seq,
            outcome: Ok(sample_result("RM123456789IN")),
        });
        assert_eq!(app.recent_visible(), ["RM123456789IN".to_string()]);
        assert!(app.share_link().contains("number=RM123456789IN"));
    }

    #[test]
    fn test_recent_selection_tracks_entry() {
        let store = Arc::new(MemoryStore::new());
        let recent = RecentSearches::new(store.clone());
        for n in ["AAAA11111111", "BBBB22222222", "CCCC33333333"] {
            recent.add(n);
        }
        let (mut app, mut rx) = app_with(store);
        assert_eq!(app.recent_selection(), None);

        app.recent_down();
        app.recent_down();
        assert_eq!(app.recent_selection(), Some(1));
        app.track();
        assert_eq!(app.input(), "BBBB22222222");
        assert_eq!(rx.try_recv().unwrap().query.number, "BBBB22222222");
        assert_eq!(app.focus(), Focus::Input);
    }

    #[test]
    fn test_recent_list_capped_for_display() {
        let store = Arc::new(MemoryStore::new());
        let recent = RecentSearches::new(store.clone());
        for i in 0..8 {
            recent.add(&format!("RM00000000{i}"));
        }
        let (mut app, _rx) = app_with(store);
        assert_eq!(app.recent_visible().len(), RECENT_VISIBLE);
        for _ in 0..10 {
            app.recent_down();
        }
        assert_eq!(app.recent_selection(), Some(RECENT_VISIBLE - 1));
    }

    #[test]
    fn test_esc_dismisses_failure_then_refresh_retries() {
        let (mut app, mut rx) = app();
        type_str(&mut app, "RM123456789IN");
        app.track();
        let req = rx.try_recv().unwrap();
        app.on_event(AppEvent::TrackingFinished {
            seq: req.seq,
            outcome: Err(TrackError::new(TrackErrorKind::ServerError, "boom")),
        });
        assert!(matches!(app.state(), RequestState::Failure { .. }));
        app.dismiss();
        assert_eq!(app.state(), &RequestState::Idle);
        app.refresh();
        assert_eq!(rx.try_recv().unwrap().query, req.query);
    }

    #[test]
    fn test_new_search_resets_everything() {
        let (mut app, _rx) = app();
        type_str(&mut app, "RM123456789IN");
        app.track();
        app.new_search();
        assert_eq!(app.input(), "");
        assert_eq!(app.state(), &RequestState::Idle);
        assert_eq!(app.share_link(), "dakdash://track");
    }

    #[test]
    fn test_open_route_auto_submits() {
        let (mut app, mut rx) = app();
        app.open_route(&Route::track("EE123456789IN", &CarrierCode::from("dtdc")));
        assert_eq!(app.input(), "EE123456789IN");
        assert_eq!(app.carrier_code().as_str(), "dtdc");
        assert!(app.state().is_loading());
        assert_eq!(rx.try_recv().unwrap().query.number, "EE123456789IN");

        let (mut app, mut rx) = app_with(Arc::new(MemoryStore::new()));
        app.open_route(&Route::Home);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_carriers_loaded_replaces_list() {
        let (mut app, _rx) = app();
        app.on_event(AppEvent::CarriersLoaded(vec![Carrier {
            code: CarrierCode::default(),
            name: "India Post (live)".into(),
            icon: String::new(),
        }]));
        assert_eq!(app.carriers().len(), 1);
        assert_eq!(app.carrier_name(), "India Post (live)");
        app.on_event(AppEvent::CarriersLoaded(Vec::new()));
        assert_eq!(app.carriers().len(), 1);
    }

    #[test]
    fn test_theme_toggle_persists() {
        let store = Arc::new(MemoryStore::new());
        let (mut app, _rx) = app_with(store.clone());
        assert_eq!(app.theme(), Theme::Dark);
        app.toggle_theme();
        assert_eq!(app.toast_message().map(|(m, _)| m), Some("Theme: light"));
        let (again, _rx) = app_with(store);
        assert_eq!(again.theme(), Theme::Light);
    }

    #[test]
    fn test_clear_recent() {
        let store = Arc::new(MemoryStore::new());
        RecentSearches::new(store.clone()).add("RM123456789IN");
        let (mut app, _rx) = app_with(store);
        assert_eq!(app.recent_visible().len(), 1);
        app.clear_recent();
        assert!(app.recent_visible().is_empty());
    }
}
