pub mod app;
pub mod cli;
pub mod config;
pub mod display;
pub mod metrics;
pub mod oled_driver;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    InvalidArgs(String),
    Config(String),
    MetricUnavailable(&'static str, String),
    DisplayTransport(String),
    ShutdownInterrupted(String),
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidArgs(msg) => write!(f, "invalid arguments: {msg}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::MetricUnavailable(metric, msg) => write!(f, "{metric} unavailable: {msg}"),
            Error::DisplayTransport(msg) => write!(f, "display transport error: {msg}"),
            Error::ShutdownInterrupted(msg) => write!(f, "shutdown interrupted: {msg}"),
            Error::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Config(value.to_string())
    }
}

impl Error {
    /// True when the loop should skip the current tick and keep running.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::DisplayTransport(_) | Error::MetricUnavailable(_, _)
        )
    }
}
