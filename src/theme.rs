//! Color theme system for DakDash
//!
//! Light and dark schemes; the choice is persisted under the `dakdash-theme`
//! key and restored on the next launch.

use ratatui::style::Color;
use std::fmt;

use crate::constants::storage::THEME_KEY;
use crate::storage::KeyValueStore;

/// Available color themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    /// Default, since most terminals run dark
    #[default]
    Dark,
}

impl Theme {
    /// Parse theme name from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme '{s}'. Available: light, dark")),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Get the color scheme for this theme
    pub fn colors(&self) -> ColorScheme {
        match self {
            Theme::Light => ColorScheme::light(),
            Theme::Dark => ColorScheme::dark(),
        }
    }

    /// Restore the saved theme; missing, unreadable or unknown values give the default.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(THEME_KEY) {
            Ok(Some(raw)) => Theme::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("{e}; using default theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                log::error!("Failed to read theme preference: {e:#}");
                Theme::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        if let Err(e) = store.set(THEME_KEY, &self.to_string()) {
            log::error!("Failed to save theme preference: {e:#}");
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Color scheme for a theme
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    /// Background color for normal content
    pub background: Color,
    /// Primary text color
    pub text: Color,
    /// Dimmed text color (for secondary info)
    pub text_dim: Color,
    /// Brand accent (title, focused input, latest timeline entry)
    pub accent: Color,
    /// Border color for panels
    pub border: Color,
    /// Background for selected list items
    pub selection_bg: Color,
    /// Foreground for selected list items
    pub selection_fg: Color,
    /// On-track badge
    pub ok: Color,
    /// Low/medium delay badge
    pub warning: Color,
    /// High delay badge and error banner
    pub danger: Color,
    /// Toast success message color
    pub toast_success: Color,
    /// Toast error message color
    pub toast_error: Color,
}

impl ColorScheme {
    pub fn dark() -> Self {
        Self {
            background: Color::Black,
            text: Color::White,
            text_dim: Color::Gray,
            accent: Color::Rgb(255, 140, 0),
            border: Color::DarkGray,
            selection_bg: Color::Rgb(255, 140, 0),
            selection_fg: Color::Black,
            ok: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            toast_success: Color::Green,
            toast_error: Color::Red,
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::White,
            text: Color::Black,
            text_dim: Color::DarkGray,
            accent: Color::Rgb(200, 90, 0),
            border: Color::Gray,
            selection_bg: Color::Rgb(200, 90, 0),
            selection_fg: Color::White,
            ok: Color::Rgb(0, 128, 0),
            warning: Color::Rgb(170, 110, 0),
            danger: Color::Rgb(190, 0, 0),
            toast_success: Color::Rgb(0, 128, 0),
            toast_error: Color::Rgb(190, 0, 0),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::dark()
    }
}
