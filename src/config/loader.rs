use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

use super::{default_icons, Config, CONFIG_DIR_NAME, CONFIG_ENV, CONFIG_FILE_NAME};

pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        super::validate(&cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    parse(&raw).map_err(|err| match err {
        Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}

pub fn parse(raw: &str) -> Result<Config> {
    let mut cfg: Config = serde_json::from_str(raw)?;

    // User entries overlay the built-in table; an empty string keeps the slot blank.
    let mut icons = default_icons();
    icons.append(&mut cfg.icons);
    cfg.icons = icons;

    super::validate(&cfg)?;
    Ok(cfg)
}

/// Resolve the config location: explicit path, then `OLED_STATS_CONFIG`, then the
/// per-user config directory.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    directories::ProjectDirs::from("", "", CONFIG_DIR_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("HOME not set; cannot locate config directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const FULL: &str = r#"{
        "display": { "width": 128, "height": 32, "i2c_address": "0x3D", "rotation": 2 },
        "timing": { "refresh_interval": 0.5, "rotation_interval": 5 },
        "fonts": { "text_font": "mono", "text_size": 10, "icon_font": "none" },
        "thresholds": { "load_warn": 1.5, "temp_warn": 65, "mem_warn": 90, "disk_warn": 85 },
        "icons": { "wifi": "", "lan": "\uf0e8" }
    }"#;

    #[test]
    fn loads_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from_path(&dir.path().join("missing.json")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parses_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, FULL).unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.display.width, 128);
        assert_eq!(cfg.display.height, 32);
        assert_eq!(cfg.display.i2c_address, 0x3D);
        assert!(cfg.display.flipped());
        assert_eq!(cfg.display.reset_pin, Some(4));
        assert_eq!(cfg.timing.refresh_interval, 0.5);
        assert_eq!(cfg.timing.rotation_interval, 5.0);
        assert_eq!(cfg.fonts.text_font, "mono");
        assert_eq!(cfg.fonts.text_size, 10);
        assert_eq!(cfg.fonts.text_size_large, 24);
        assert!(!cfg.fonts.icons_enabled());
        assert_eq!(cfg.thresholds.load_warn, 1.5);
        assert_eq!(cfg.thresholds.disk_warn, 85.0);
    }

    #[test]
    fn icon_entries_overlay_defaults() {
        let cfg = parse(FULL).unwrap();
        assert_eq!(cfg.icon("wifi"), None);
        assert_eq!(cfg.icon("lan"), Some('\u{f0e8}'));
        assert_eq!(cfg.icon("hostname"), Some('\u{f108}'));
    }

    #[test]
    fn omitted_sections_take_defaults() {
        let cfg = parse(r#"{ "thresholds": { "load_warn": 3, "temp_warn": 60, "mem_warn": 70, "disk_warn": 75 } }"#)
            .unwrap();
        assert_eq!(cfg.display, Config::default().display);
        assert_eq!(cfg.timing, Config::default().timing);
        assert_eq!(cfg.thresholds.load_warn, 3.0);
    }

    #[test]
    fn rejects_missing_threshold() {
        let err = parse(r#"{ "thresholds": { "load_warn": 3, "temp_warn": 60, "mem_warn": 70 } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(format!("{err}").contains("disk_warn"), "{err}");
    }

    #[test]
    fn rejects_missing_display_width() {
        let err = parse(r#"{ "display": { "height": 64 } }"#).unwrap_err();
        assert!(format!("{err}").contains("width"), "{err}");
    }

    #[test]
    fn rejects_unknown_key() {
        let err = parse(r#"{ "timing": { "refresh_interval": 1, "rotation_interval": 3, "nope": 1 } }"#)
            .unwrap_err();
        assert!(format!("{err}").contains("unknown field"), "{err}");
    }

    #[test]
    fn rejects_malformed_json_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ display: ").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{err}").contains("broken.json"), "{err}");
    }

    #[test]
    fn rejects_bad_i2c_address() {
        let err = parse(r#"{ "display": { "width": 128, "height": 64, "i2c_address": "0xZZ" } }"#)
            .unwrap_err();
        assert!(format!("{err}").contains("I2C address"), "{err}");
    }

    #[test]
    fn accepts_numeric_i2c_address_and_null_reset_pin() {
        let cfg = parse(
            r#"{ "display": { "width": 128, "height": 64, "i2c_address": 61, "reset_pin": null } }"#,
        )
        .unwrap();
        assert_eq!(cfg.display.i2c_address, 0x3D);
        assert_eq!(cfg.display.reset_pin, None);
    }

    #[test]
    fn pretty_json_parses_back() {
        let cfg = Config::default();
        let json = cfg.to_json_pretty().unwrap();
        assert_eq!(parse(&json).unwrap(), cfg);
    }

    #[test]
    fn explicit_path_wins() {
        let path = config_path(Some(Path::new("/tmp/custom.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.json"));
    }
}
