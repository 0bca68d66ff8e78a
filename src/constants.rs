//! Application constants
//!
//! Centralized timing, storage keys, limits and user-facing messages.

/// Backend API timing
pub mod api {
    /// Default API endpoint when `DAKDASH_API_URL` is unset
    pub const DEFAULT_API_URL: &str = "http://localhost:8000";

    /// First tracking attempt timeout (ms)
    pub const BASE_TIMEOUT_MS: u64 = 60_000;

    /// Retried tracking attempt timeout (ms)
    ///
    /// A cold-starting backend can take ~50s before it answers; the retry
    /// gets more headroom than the first attempt.
    pub const RETRY_TIMEOUT_MS: u64 = 90_000;

    /// Timeout for carrier listing and health pings (ms)
    pub const LOOKUP_TIMEOUT_MS: u64 = 10_000;
}

/// Keep-alive pinger
pub mod keep_alive {
    /// Default ping interval (seconds)
    pub const INTERVAL_SECS: u64 = 600;
}

/// Client-local persistence
pub mod storage {
    pub const RECENT_SEARCHES_KEY: &str = "dakdash-recent-searches";
    pub const THEME_KEY: &str = "dakdash-theme";

    /// Maximum recent tracking numbers retained
    pub const MAX_RECENT: usize = 10;
}

/// Input validation
pub mod validation {
    /// Minimum trimmed tracking-number length
    pub const MIN_TRACKING_LEN: usize = 8;
}

/// UI layout and display constants
pub mod ui {
    /// Minimum terminal width in columns for usable display
    pub const MIN_WIDTH: u16 = 50;

    /// Minimum terminal height in rows for usable display
    pub const MIN_HEIGHT: u16 = 15;

    /// Recent searches shown on the landing view
    pub const RECENT_VISIBLE: usize = 5;

    /// Duration to show toast notifications (seconds)
    pub const TOAST_DURATION_SECS: u64 = 2;
}

/// User-facing messages
pub mod messages {
    pub const EMPTY_INPUT: &str = "Please enter a tracking number";
    pub const TOO_SHORT: &str = "Invalid tracking number format";

    pub const NOT_FOUND: &str = "Tracking number not found. Please verify and try again.";
    pub const INVALID_FORMAT: &str = "Invalid tracking number format.";
    pub const SERVER_ERROR: &str = "Server error. Please try again later.";
    pub const UNEXPECTED_STATUS: &str = "An unexpected error occurred.";
    pub const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
    pub const TIMEOUT: &str =
        "The request timed out. The server may be starting up. Please wait a moment and try again.";
    pub const NETWORK_UNAVAILABLE: &str =
        "Unable to connect to the server. It may be starting up. Please wait a moment and try again.";
}
