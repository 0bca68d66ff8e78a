//! Deep link router for DakDash
//!
//! A tracking session is fully described by two parameters, the tracking
//! number and the carrier code, so it can be bookmarked and shared.
//!
//! ## Supported Routes
//!
//! - `dakdash://track?number=<n>&carrier=<code>` - Track a parcel on startup
//! - `dakdash://track` - Tracking view with no query
//! - `dakdash://` or `dakdash://home` - Landing view
//!
//! ## Robust Parsing
//!
//! - Case-insensitive scheme: `DAKDASH://`, `dakdash://`
//! - Single-slash and multi-slash variants: `dakdash:/track`, `dakdash:////track`
//! - Path-only and hash forms: `/track?number=...`, `#/track?number=...`
//! - Fragments are stripped; `+` in query values decodes to a space
//!
//! ## Example
//!
//! ```rust,ignore
//! use dakdash::router::{parse, Route};
//!
//! let route = parse("dakdash://track?number=RM123456789IN&carrier=india-post").unwrap();
//! if let Route::Track { params: Some(p) } = route {
//!     println!("{} via {}", p.number, p.carrier);
//! }
//! ```

use crate::types::CarrierCode;

pub const SCHEME: &str = "dakdash";

/// Strip fragment from a URL tail
#[inline]
fn strip_frag(s: &str) -> &str {
    match s.find('#') {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Extract the part after `dakdash:` (case-insensitive, any number of slashes)
#[inline]
fn after_scheme(raw: &str) -> Option<&str> {
    let (scheme, rest) = raw.split_once(':')?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    Some(rest.trim_start_matches('/'))
}

fn decode(value: &str) -> Option<String> {
    let spaced = value.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|v| v.into_owned())
}

/// Parameters that reconstruct a tracking session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackParams {
    pub number: String,
    pub carrier: CarrierCode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Landing view
    Home,
    /// Tracking view, optionally carrying a query
    Track { params: Option<TrackParams> },
}

impl Route {
    pub fn track(number: &str, carrier: &CarrierCode) -> Self {
        Route::Track {
            params: Some(TrackParams {
                number: number.to_string(),
                carrier: carrier.clone(),
            }),
        }
    }

    pub fn params(&self) -> Option<&TrackParams> {
        match self {
            Route::Track { params } => params.as_ref(),
            Route::Home => None,
        }
    }

    /// Shareable `dakdash://` link for this route
    pub fn to_link(&self) -> String {
        match self {
            Route::Home => format!("{SCHEME}://"),
            Route::Track { params: None } => format!("{SCHEME}://track"),
            Route::Track { params: Some(p) } => format!(
                "{SCHEME}://track?number={}&carrier={}",
                urlencoding::encode(&p.number),
                urlencoding::encode(p.carrier.as_str())
            ),
        }
    }
}

/// Parse a route from a deep link, hash route, or path.
///
/// Returns `None` for unknown pages. A missing carrier defaults to
/// [`CarrierCode::DEFAULT`]; a missing or blank number yields a bare
/// track route.
pub fn parse(raw: &str) -> Option<Route> {
    let s = raw.trim();
    let tail = if let Some(rest) = after_scheme(s) {
        rest
    } else if let Some(rest) = s.strip_prefix("#/") {
        rest
    } else {
        s.trim_start_matches('/')
    };
    let tail = strip_frag(tail);

    let (path, query) = match tail.split_once('?') {
        Some((p, q)) => (p, q),
        None => (tail, ""),
    };
    let page = path.trim_matches('/').to_ascii_lowercase();

    match page.as_str() {
        "" | "home" => Some(Route::Home),
        "track" => {
            let mut number = None;
            let mut carrier = None;
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                match k {
                    "number" => number = decode(v),
                    "carrier" => carrier = decode(v),
                    _ => {}
                }
            }
            let params = number
                .filter(|n| !n.trim().is_empty())
                .map(|number| TrackParams {
                    number,
                    carrier: carrier
                        .filter(|c| !c.trim().is_empty())
                        .map(CarrierCode::new)
                        .unwrap_or_default(),
                });
            Some(Route::Track { params })
        }
        _ => None,
    }
}

/// Current navigation location with a history depth counter.
///
/// `replace` rewrites the current entry in place; `push` adds an entry.
#[derive(Clone, Debug)]
pub struct Location {
    current: Route,
    entries: usize,
}

impl Location {
    pub fn new(initial: Route) -> Self {
        Self {
            current: initial,
            entries: 1,
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn history_len(&self) -> usize {
        self.entries
    }

    pub fn replace(&mut self, route: Route) {
        log::debug!("location replace {}", route.to_link());
        self.current = route;
    }

    pub fn push(&mut self, route: Route) {
        log::debug!("location push {}", route.to_link());
        self.current = route;
        self.entries += 1;
    }

    pub fn share_link(&self) -> String {
        self.current.to_link()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}
