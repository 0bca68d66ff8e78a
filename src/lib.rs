//! DakDash - terminal parcel tracker
//!
//! Tracks shipments across Indian carriers against the DakDash backend.
//!
//! ## Architecture
//!
//! - [`controller`] owns the request lifecycle (`Idle -> Loading -> Success | Failure`)
//!   and decides which completions are still current
//! - [`fetch`] performs the network work off the UI loop and reports back as [`AppEvent`]s
//! - [`api`] talks HTTP, classifies failures and retries cold-start timeouts
//! - [`app`] + [`ui`] are the ratatui front end
//!
//! ## Usage
//!
//! ```bash
//! dakdash                                        # landing view
//! dakdash "dakdash://track?number=RM123456789IN&carrier=india-post"
//! dakdash --number EE123456789IN --carrier dtdc
//! ```

// Core modules
pub mod config;
pub mod constants;
pub mod types;

// Network
pub mod api;
pub mod carriers;
pub mod fetch;
pub mod keep_alive;

// State
pub mod controller;
pub mod recent;
pub mod router;
pub mod storage;

// Presentation
pub mod app;
pub mod format;
pub mod theme;
pub mod ui;

// Clipboard (native-only)
#[cfg(feature = "native")]
pub mod platform;

// Re-export commonly used types
pub use app::App;
pub use config::Config;
pub use controller::{RequestState, TrackingController};
pub use types::{AppEvent, CarrierCode, TrackingQuery, TrackingResult};
