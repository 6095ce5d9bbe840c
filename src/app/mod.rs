use crate::{
    cli::RunOptions,
    config::{loader::config_path, Config},
    display::{fonts::icon_font_supported, FrameComposer, OledSink},
    metrics::SystemMetrics,
    Result,
};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

pub mod lifecycle;
pub mod logger;
pub mod render_loop;

use lifecycle::ShutdownSignal;
pub use logger::{LogLevel, Logger};
use render_loop::{MainLoop, ShutdownOutcome};

/// Loaded config plus the command-line switches that shape one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub config_found: bool,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub syslog: bool,
    pub once: bool,
    pub print_config: bool,
}

impl AppConfig {
    /// Resolve the config path, load it (defaults when absent) and merge the
    /// command-line switches.
    pub fn load(opts: RunOptions) -> Result<Self> {
        let path = config_path(opts.config_path.as_deref().map(Path::new))?;
        let found = path.exists();
        let config = Config::load_from_path(&path)?;
        Ok(Self::from_sources(config, path, found, opts))
    }

    pub fn from_sources(config: Config, config_path: PathBuf, config_found: bool, opts: RunOptions) -> Self {
        Self {
            config,
            config_path,
            config_found,
            log_level: opts
                .log_level
                .as_deref()
                .and_then(|s| LogLevel::from_str(s).ok())
                .unwrap_or_default(),
            log_file: opts.log_file,
            syslog: opts.syslog,
            once: opts.once,
            print_config: opts.print_config,
        }
    }
}

pub struct App {
    config: AppConfig,
    logger: Logger,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let logger = if config.print_config {
            Logger::stderr(config.log_level)
        } else {
            Logger::new(config.log_level, config.log_file.clone(), config.syslog)
        };
        Self { config, logger }
    }

    pub fn from_options(opts: RunOptions) -> Result<Self> {
        Ok(Self::new(AppConfig::load(opts)?))
    }

    /// Entry point for the daemon: open the panel, run until a termination
    /// signal, leave the OFFLINE frame behind.
    pub fn run(&self) -> Result<()> {
        let app = &self.config;
        let config = &app.config;
        if app.print_config {
            println!("{}", config.to_json_pretty()?);
            return Ok(());
        }

        if app.config_found {
            self.logger
                .info(format!("config loaded from {}", app.config_path.display()));
        } else {
            self.logger.info(format!(
                "no config at {}; using built-in defaults",
                app.config_path.display()
            ));
        }

        let composer = FrameComposer::new(config)?;
        let fonts = &config.fonts;
        if fonts.icons_enabled() && !icon_font_supported(&fonts.icon_font) {
            self.logger.warn(format!(
                "icon font '{}' is not available; drawing text only",
                fonts.icon_font
            ));
        }

        let shutdown = if app.once {
            None
        } else {
            Some(ShutdownSignal::install()?)
        };

        let display = &config.display;
        let sink = OledSink::open(display, |err| {
            self.logger
                .warn(format!("reset pulse on GPIO failed: {err}"))
        })?;
        self.logger.info(format!(
            "display ready ({}x{} at {:#04x} on i2c-{}, rotation {})",
            display.width, display.height, display.i2c_address, display.i2c_bus, display.rotation
        ));

        let mut main_loop = MainLoop::new(config, &composer, SystemMetrics::new(), sink, &self.logger);
        let Some(shutdown) = shutdown else {
            return main_loop.run_once();
        };
        match main_loop.run(&shutdown)? {
            ShutdownOutcome::OfflineWritten => self.logger.info("stopped"),
            ShutdownOutcome::OfflineFailed | ShutdownOutcome::TimedOut => {
                self.logger.warn("stopped without confirming the offline frame")
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_switches_merge_over_loaded_config() {
        let opts = RunOptions {
            log_level: Some("debug".into()),
            log_file: Some("/tmp/oled.log".into()),
            syslog: true,
            once: true,
            ..RunOptions::default()
        };
        let merged = AppConfig::from_sources(Config::default(), PathBuf::from("/x.json"), false, opts);
        assert_eq!(merged.log_level, LogLevel::Debug);
        assert_eq!(merged.log_file.as_deref(), Some("/tmp/oled.log"));
        assert!(merged.syslog);
        assert!(merged.once);
        assert!(!merged.config_found);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let opts = RunOptions {
            log_level: Some("chatty".into()),
            ..RunOptions::default()
        };
        let merged = AppConfig::from_sources(Config::default(), PathBuf::new(), true, opts);
        assert_eq!(merged.log_level, LogLevel::Info);
    }

    #[test]
    fn load_reads_explicit_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oled.json");
        std::fs::write(
            &path,
            r#"{ "timing": { "refresh_interval": 2, "rotation_interval": 6 } }"#,
        )
        .unwrap();
        let opts = RunOptions {
            config_path: Some(path.display().to_string()),
            ..RunOptions::default()
        };
        let app = AppConfig::load(opts).unwrap();
        assert!(app.config_found);
        assert_eq!(app.config.timing.refresh_interval, 2.0);
    }

    #[test]
    fn load_fails_on_broken_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oled.json");
        std::fs::write(&path, "not json").unwrap();
        let opts = RunOptions {
            config_path: Some(path.display().to_string()),
            ..RunOptions::default()
        };
        assert!(AppConfig::load(opts).is_err());
    }
}
