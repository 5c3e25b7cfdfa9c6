use serde::{Deserialize, Serialize};

use crate::types::Color;

/// User-tunable rendering and interaction options (spec §6).
///
/// Every field here has a documented default, so a value that fails to
/// parse (bad hex string, non-finite dimension) can always fall back to
/// it — per the `ConfigurationError` policy: log once, never crash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,

    pub font_family: String,
    pub font_size: f64,

    pub shadow_opacity: f64,
    pub frame_padding: f64,

    pub selected_opacity: f64,
    pub hover_opacity: f64,
    pub unselected_opacity: f64,

    pub zoom_on_scroll: bool,
    pub scroll_zoom_speed: f64,
    pub scroll_zoom_inverted: bool,

    pub show_app_code_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_color: "#e6553a".to_string(),
            secondary_color: "#f4c542".to_string(),
            background_color: "#181818".to_string(),
            text_color: "#ececec".to_string(),
            font_family: "monospace".to_string(),
            font_size: 11.0,
            shadow_opacity: 0.0,
            frame_padding: 5.0,
            selected_opacity: 1.0,
            hover_opacity: 0.9,
            unselected_opacity: 0.75,
            zoom_on_scroll: true,
            scroll_zoom_speed: 0.05,
            scroll_zoom_inverted: false,
            show_app_code_only: false,
        }
    }
}

impl Config {
    /// Parse an on-disk TOML config, falling back field-by-field to
    /// defaults for anything missing or malformed rather than failing
    /// the whole load (`ConfigurationError` policy, spec §7).
    pub fn from_toml_str(s: &str) -> Config {
        match toml::from_str(s) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "invalid config, using defaults");
                Config::default()
            }
        }
    }

    /// Resolved `primary_color`, falling back to the default on parse
    /// failure and logging once.
    pub fn primary(&self) -> Color {
        self.resolve(&self.primary_color, Config::default().primary_color)
    }

    pub fn secondary(&self) -> Color {
        self.resolve(&self.secondary_color, Config::default().secondary_color)
    }

    pub fn background(&self) -> Color {
        self.resolve(&self.background_color, Config::default().background_color)
    }

    pub fn text(&self) -> Color {
        self.resolve(&self.text_color, Config::default().text_color)
    }

    fn resolve(&self, value: &str, fallback: String) -> Color {
        Color::parse_hex(value).unwrap_or_else(|err| {
            tracing::warn!(error = %err, value, "invalid hex color, using default");
            // `fallback` is always one of our own defaults, so this can't fail.
            Color::parse_hex(&fallback).unwrap_or(Color::rgba(0.0, 0.0, 0.0, 1.0))
        })
    }

    /// Frame height in pixels: `font_size + 2 * frame_padding` (spec §4.4).
    pub fn frame_height(&self) -> f64 {
        self.font_size + 2.0 * self.frame_padding
    }
}
