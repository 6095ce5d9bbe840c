use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, time::Duration};

pub mod loader;

pub const DEFAULT_WIDTH: u32 = 128;
pub const DEFAULT_HEIGHT: u32 = 64;
pub const DEFAULT_I2C_ADDR: u8 = 0x3C;
pub const DEFAULT_I2C_BUS: u8 = 1;
pub const DEFAULT_RESET_PIN: Option<u8> = Some(4);
pub const DEFAULT_REFRESH_INTERVAL_SECS: f64 = 1.0;
pub const DEFAULT_ROTATION_INTERVAL_SECS: f64 = 3.0;
pub const DEFAULT_TEXT_FONT: &str = "profont";
pub const DEFAULT_TEXT_SIZE: u32 = 16;
pub const DEFAULT_TEXT_SIZE_LARGE: u32 = 24;
pub const DEFAULT_ICON_FONT: &str = "builtin";
pub const DEFAULT_ICON_SIZE: u32 = 14;
pub const MIN_REFRESH_INTERVAL_SECS: f64 = 0.05;
pub const MIN_ROTATION_INTERVAL_SECS: f64 = 0.001;
/// Upper bound for both timers.
pub const MAX_INTERVAL_SECS: f64 = 86_400.0;
const CONFIG_DIR_NAME: &str = "oled-stats";
const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV: &str = "OLED_STATS_CONFIG";

/// Icon table shipped with the daemon, keyed by slot name.
pub const DEFAULT_ICONS: [(&str, char); 12] = [
    ("hostname", '\u{f108}'),
    ("wifi", '\u{f1eb}'),
    ("lan", '\u{f6ff}'),
    ("offline", '\u{f011}'),
    ("load_normal", '\u{f0e7}'),
    ("load_warn", '\u{f06d}'),
    ("temp_normal", '\u{f2c9}'),
    ("temp_warn", '\u{f06d}'),
    ("mem_normal", '\u{f0ae}'),
    ("mem_warn", '\u{f071}'),
    ("disk_normal", '\u{f0a0}'),
    ("disk_warn", '\u{f071}'),
];

/// Immutable daemon settings loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default = "default_icons")]
    pub icons: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    #[serde(
        default = "default_i2c_address",
        deserialize_with = "de_i2c_address",
        serialize_with = "ser_i2c_address"
    )]
    pub i2c_address: u8,
    #[serde(default)]
    pub rotation: u8,
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,
    #[serde(default = "default_reset_pin")]
    pub reset_pin: Option<u8>,
}

/// Refresh and rotation cadence, both in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    pub refresh_interval: f64,
    pub rotation_interval: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontConfig {
    #[serde(default = "default_text_font")]
    pub text_font: String,
    #[serde(default = "default_text_size")]
    pub text_size: u32,
    #[serde(default = "default_text_size_large")]
    pub text_size_large: u32,
    #[serde(default = "default_icon_font")]
    pub icon_font: String,
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,
}

/// Warning thresholds; values strictly above these switch to the warning icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    pub load_warn: f64,
    pub temp_warn: f64,
    pub mem_warn: f64,
    pub disk_warn: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            timing: TimingConfig::default(),
            fonts: FontConfig::default(),
            thresholds: Thresholds::default(),
            icons: default_icons(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            i2c_address: DEFAULT_I2C_ADDR,
            rotation: 0,
            i2c_bus: DEFAULT_I2C_BUS,
            reset_pin: DEFAULT_RESET_PIN,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            rotation_interval: DEFAULT_ROTATION_INTERVAL_SECS,
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            text_font: default_text_font(),
            text_size: DEFAULT_TEXT_SIZE,
            text_size_large: DEFAULT_TEXT_SIZE_LARGE,
            icon_font: default_icon_font(),
            icon_size: DEFAULT_ICON_SIZE,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            load_warn: 2.0,
            temp_warn: 70.0,
            mem_warn: 80.0,
            disk_warn: 80.0,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        loader::load_from_path(path)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        loader::parse(raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Glyph configured for an icon slot; `None` when missing or blanked out.
    pub fn icon(&self, name: &str) -> Option<char> {
        self.icons.get(name).and_then(|glyph| glyph.chars().next())
    }
}

impl DisplayConfig {
    /// True when the panel is mounted upside down.
    pub fn flipped(&self) -> bool {
        self.rotation == 2
    }
}

impl TimingConfig {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval)
    }

    pub fn rotation(&self) -> Duration {
        Duration::from_secs_f64(self.rotation_interval)
    }
}

impl FontConfig {
    pub fn icons_enabled(&self) -> bool {
        !matches!(
            self.icon_font.trim().to_ascii_lowercase().as_str(),
            "" | "none" | "off" | "disabled"
        )
    }
}

pub(crate) fn validate(cfg: &Config) -> Result<()> {
    let display = &cfg.display;
    if !matches!((display.width, display.height), (128, 64) | (128, 32)) {
        return Err(Error::Config(format!(
            "display.width x display.height must be 128x64 or 128x32 (got {}x{})",
            display.width, display.height
        )));
    }
    if !(0x03..=0x77).contains(&display.i2c_address) {
        return Err(Error::Config(format!(
            "display.i2c_address {:#04x} is outside the 7-bit range",
            display.i2c_address
        )));
    }
    if display.rotation != 0 && display.rotation != 2 {
        return Err(Error::Config(format!(
            "display.rotation must be 0 or 2 (got {})",
            display.rotation
        )));
    }

    let timing = &cfg.timing;
    for (name, value, min) in [
        ("refresh_interval", timing.refresh_interval, MIN_REFRESH_INTERVAL_SECS),
        ("rotation_interval", timing.rotation_interval, MIN_ROTATION_INTERVAL_SECS),
    ] {
        if !(min..=MAX_INTERVAL_SECS).contains(&value) {
            return Err(Error::Config(format!(
                "timing.{name} must be between {min}s and {MAX_INTERVAL_SECS}s (got {value})"
            )));
        }
    }

    let fonts = &cfg.fonts;
    for (name, value) in [
        ("text_size", fonts.text_size),
        ("text_size_large", fonts.text_size_large),
        ("icon_size", fonts.icon_size),
    ] {
        if value == 0 || value > display.height {
            return Err(Error::Config(format!(
                "fonts.{name} must be between 1 and the panel height {} (got {value})",
                display.height
            )));
        }
    }

    let t = &cfg.thresholds;
    for (name, value) in [
        ("load_warn", t.load_warn),
        ("temp_warn", t.temp_warn),
        ("mem_warn", t.mem_warn),
        ("disk_warn", t.disk_warn),
    ] {
        if !value.is_finite() {
            return Err(Error::Config(format!(
                "thresholds.{name} must be a finite number"
            )));
        }
    }
    Ok(())
}

fn parse_i2c_addr(raw: &str) -> std::result::Result<u8, String> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => trimmed.parse::<u8>(),
    };
    parsed.map_err(|_| format!("expected a hex or decimal I2C address (e.g., 0x3C), got '{raw}'"))
}

fn de_i2c_address<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAddr {
        Number(u8),
        Text(String),
    }

    match RawAddr::deserialize(deserializer)? {
        RawAddr::Number(value) => Ok(value),
        RawAddr::Text(text) => parse_i2c_addr(&text).map_err(serde::de::Error::custom),
    }
}

fn ser_i2c_address<S>(addr: &u8, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("{addr:#04X}"))
}

pub(crate) fn default_icons() -> BTreeMap<String, String> {
    DEFAULT_ICONS
        .iter()
        .map(|(name, glyph)| (name.to_string(), glyph.to_string()))
        .collect()
}

fn default_i2c_address() -> u8 {
    DEFAULT_I2C_ADDR
}

fn default_i2c_bus() -> u8 {
    DEFAULT_I2C_BUS
}

fn default_reset_pin() -> Option<u8> {
    DEFAULT_RESET_PIN
}

fn default_text_font() -> String {
    DEFAULT_TEXT_FONT.to_string()
}

fn default_text_size() -> u32 {
    DEFAULT_TEXT_SIZE
}

fn default_text_size_large() -> u32 {
    DEFAULT_TEXT_SIZE_LARGE
}

fn default_icon_font() -> String {
    DEFAULT_ICON_FONT.to_string()
}

fn default_icon_size() -> u32 {
    DEFAULT_ICON_SIZE
}
