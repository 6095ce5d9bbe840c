use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::SystemTime;

use syslog::{Facility, Formatter3164, LoggerBackend};

const LEVEL_ENV: &str = "OLED_STATS_LOG_LEVEL";
const PATH_ENV: &str = "OLED_STATS_LOG_PATH";
const SYSLOG_PROCESS: &str = "oled-stats";

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    #[default]
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl FromStr for LogLevel {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(()),
        }
    }
}

type SyslogWriter = syslog::Logger<LoggerBackend, Formatter3164>;

/// Stderr logger with an optional append-only file sink and syslog forwarding.
pub struct Logger {
    level: LogLevel,
    file: Option<std::fs::File>,
    syslog: Option<Mutex<SyslogWriter>>,
}

impl Logger {
    /// `OLED_STATS_LOG_LEVEL` overrides `level`; `OLED_STATS_LOG_PATH` is used
    /// when no file is given. An unopenable file or syslog socket is reported on
    /// stderr and skipped.
    pub fn new(level: LogLevel, file_path: Option<String>, use_syslog: bool) -> Self {
        let env_level = std::env::var(LEVEL_ENV)
            .ok()
            .and_then(|s| LogLevel::from_str(&s).ok());
        let effective_level = env_level.unwrap_or(level);

        let env_file = std::env::var(PATH_ENV).ok().filter(|p| !p.is_empty());
        let path = file_path.or(env_file);
        let file = path.and_then(|p| {
            match std::fs::OpenOptions::new().create(true).append(true).open(&p) {
                Ok(file) => Some(file),
                Err(err) => {
                    eprintln!("[WARN] cannot open log file {p}: {err}");
                    None
                }
            }
        });

        let syslog = if use_syslog {
            let formatter = Formatter3164 {
                facility: Facility::LOG_DAEMON,
                hostname: None,
                process: SYSLOG_PROCESS.into(),
                pid: std::process::id(),
            };
            match syslog::unix(formatter) {
                Ok(writer) => Some(Mutex::new(writer)),
                Err(err) => {
                    eprintln!("[WARN] syslog unavailable: {err}");
                    None
                }
            }
        } else {
            None
        };

        Self {
            level: effective_level,
            file,
            syslog,
        }
    }

    /// Stderr only, ignoring the environment. Used by tests and `--print-config`.
    pub fn stderr(level: LogLevel) -> Self {
        Self {
            level,
            file: None,
            syslog: None,
        }
    }

    pub fn log(&self, level: LogLevel, msg: impl AsRef<str>) {
        if level > self.level {
            return;
        }
        let msg = msg.as_ref();
        let ts = humantime::format_rfc3339_millis(SystemTime::now());
        let line = format!("[{ts}] [{level:?}] {msg}");
        eprintln!("{line}");
        if let Some(file) = self.file.as_ref() {
            if let Ok(mut clone) = file.try_clone() {
                let _ = writeln!(clone, "{line}");
            }
        }
        if let Some(syslog) = self.syslog.as_ref() {
            if let Ok(mut writer) = syslog.lock() {
                let _ = match level {
                    LogLevel::Error => writer.err(msg),
                    LogLevel::Warn => writer.warning(msg),
                    LogLevel::Info => writer.info(msg),
                    LogLevel::Debug | LogLevel::Trace => writer.debug(msg),
                };
            }
        }
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Error, msg);
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Warn, msg);
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Info, msg);
    }

    pub fn debug(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Debug, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(LogLevel::from_str("WARNING"), Ok(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("debug"), Ok(LogLevel::Debug));
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn file_sink_receives_enabled_levels_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oled.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        let logger = Logger {
            level: LogLevel::Info,
            file: Some(file),
            syslog: None,
        };
        logger.info("panel ready");
        logger.debug("hidden detail");
        logger.error("bus gone");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[Info] panel ready"), "{contents}");
        assert!(contents.contains("[Error] bus gone"), "{contents}");
        assert!(!contents.contains("hidden detail"));
    }
}
