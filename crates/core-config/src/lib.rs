//! Configuration loading for the window manager and its status bar.
//!
//! Mirrors the teacher's "parse once, tolerate a missing or malformed file"
//! policy: a config file that fails to parse falls back to built-in defaults
//! rather than aborting startup, and unknown TOML keys are ignored so the
//! format can evolve without breaking older files.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::info;

/// A foreground/background/border color triple, as used for each workspace
/// button state (`inactive`, `active`, `focus`, `urgent`, `binding_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ColorSet {
    #[serde(default = "ColorSet::default_fg")]
    pub text: Color,
    #[serde(default = "ColorSet::default_bg")]
    pub background: Color,
    #[serde(default = "ColorSet::default_border")]
    pub border: Color,
}

impl ColorSet {
    fn default_fg() -> Color {
        Color::WHITE
    }
    fn default_bg() -> Color {
        Color::BLACK
    }
    fn default_border() -> Color {
        Color::BLACK
    }

    pub const fn new(text: Color, background: Color, border: Color) -> Self {
        Self {
            text,
            background,
            border,
        }
    }
}

/// An RGB color, parsed from `#RRGGBB` strings but stored as packed u8s so
/// the renderer never re-parses a string on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color { r: 0xFF, g: 0xFF, b: 0xFF };
    pub const BLACK: Color = Color { r: 0x00, g: 0x00, b: 0x00 };
    /// i3's default focused-workspace background (`#285577`).
    pub const FOCUS_BG: Color = Color { r: 0x28, g: 0x55, b: 0x77 };
    /// i3's default urgent-workspace background (`#900000`).
    pub const URGENT_BG: Color = Color { r: 0x90, g: 0x00, b: 0x00 };

    pub fn parse(s: &str) -> Option<Color> {
        let s = s.strip_prefix('#')?;
        if s.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Color { r, g, b })
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color {s:?}")))
    }
}

impl Default for ColorSet {
    fn default() -> Self {
        Self::new(Color::WHITE, Color::BLACK, Color::BLACK)
    }
}

/// The five workspace-button palette slots (§6 Config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BarColors {
    #[serde(default)]
    pub inactive: ColorSet,
    #[serde(default = "BarColors::default_active")]
    pub active: ColorSet,
    #[serde(default = "BarColors::default_focus")]
    pub focus: ColorSet,
    #[serde(default = "BarColors::default_urgent")]
    pub urgent: ColorSet,
    /// Binding-mode indicator colors. When absent, falls back to `urgent`
    /// (§4.6 palette: "binding-mode colors falling back to urgent colors if
    /// unset").
    pub binding_mode: Option<ColorSet>,
}

impl BarColors {
    fn default_active() -> ColorSet {
        ColorSet::new(Color::WHITE, Color::BLACK, Color::BLACK)
    }
    fn default_focus() -> ColorSet {
        ColorSet::new(Color::WHITE, Color::FOCUS_BG, Color::FOCUS_BG)
    }
    fn default_urgent() -> ColorSet {
        ColorSet::new(Color::WHITE, Color::URGENT_BG, Color::URGENT_BG)
    }

    /// Effective binding-mode colors, resolving the fallback-to-urgent rule.
    pub fn effective_binding_mode(&self) -> ColorSet {
        self.binding_mode.unwrap_or(self.urgent)
    }
}

impl Default for BarColors {
    fn default() -> Self {
        Self {
            inactive: ColorSet::default(),
            active: Self::default_active(),
            focus: Self::default_focus(),
            urgent: Self::default_urgent(),
            binding_mode: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BarPosition {
    #[default]
    Bottom,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HideOnModifier {
    #[default]
    Dock,
    Hide,
    Invisible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HiddenState {
    #[default]
    Show,
    Hide,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrayOutput {
    Named(String),
    #[default]
    Primary,
    None,
}

impl<'de> Deserialize<'de> for TrayOutput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "primary" => TrayOutput::Primary,
            "none" => TrayOutput::None,
            other => TrayOutput::Named(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub struct GapsConfig {
    #[serde(default)]
    pub inner: u32,
    #[serde(default)]
    pub outer: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BarConfig {
    #[serde(default)]
    pub colors: BarColors,
    #[serde(default)]
    pub position: BarPosition,
    #[serde(default)]
    pub hide_on_modifier: HideOnModifier,
    #[serde(default)]
    pub hidden_state: HiddenState,
    /// Raw Xkb-style modifier bitmask; interpretation lives in `InputGrab`.
    #[serde(default)]
    pub modifier: u32,
    #[serde(default)]
    pub tray_output: TrayOutput,
    #[serde(default = "BarConfig::default_tray_padding")]
    pub tray_padding: u32,
    /// `0` means auto-compute from the loaded font (§6).
    #[serde(default)]
    pub bar_height: u32,
    pub separator_symbol: Option<String>,
    #[serde(default)]
    pub disable_binding_mode_indicator: bool,
    /// Mouse button (1-based, as X11 reports) to command-string bindings.
    #[serde(default)]
    pub bindings: BTreeMap<u8, String>,
}

impl BarConfig {
    const fn default_tray_padding() -> u32 {
        2
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub workspace_auto_back_and_forth: bool,
    #[serde(default)]
    pub disable_ws: bool,
    #[serde(default)]
    pub gaps: GapsConfig,
    #[serde(default)]
    pub bar: BarConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,
    pub file: ConfigFile,
}

/// Best-effort config path following XDG conventions, preferring a local
/// working-directory override first (useful for tests and reload-in-place
/// development workflows).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("wmrc.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("wm").join("wmrc.toml");
    }
    PathBuf::from("wmrc.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(target: "config", path = %path.display(), "config_loaded");
                Ok(Config {
                    raw: Some(content),
                    file,
                })
            }
            Err(e) => {
                info!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Clamp a requested gap delta to stay non-negative (§4.3 `gaps ... minus`).
    pub fn clamp_gap(current: u32, delta: i32) -> u32 {
        if delta >= 0 {
            current.saturating_add(delta as u32)
        } else {
            current.saturating_sub(delta.unsigned_abs())
        }
    }
}
