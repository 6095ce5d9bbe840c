//! Host metric reads behind a fallible, swappable interface.
//!
//! Every read either yields a value or `Error::MetricUnavailable`; the caller
//! decides which sentinel to substitute so a failed read never aborts a tick.

use std::net::IpAddr;

use crate::{Error, Result};

mod system;

pub use system::SystemMetrics;

/// Text shown in place of an identity value that cannot be read.
pub const PLACEHOLDER: &str = "--";

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const SKIPPED_PREFIXES: [&str; 6] = ["docker", "br-", "veth", "tailscale", "tun", "tap"];

/// Used/total byte counts for memory or a filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Usage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl Usage {
    pub fn new(used_bytes: u64, total_bytes: u64) -> Self {
        Self {
            used_bytes,
            total_bytes,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.total_bytes as f64) * 100.0
    }

    pub fn used_gb(&self) -> f64 {
        self.used_bytes as f64 / BYTES_PER_GB
    }

    pub fn total_gb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_GB
    }
}

/// OS-level reads used by the render loop.
pub trait MetricSource {
    /// One-minute load average.
    fn read_load(&mut self) -> Result<f64>;
    /// CPU temperature in degrees Celsius.
    fn read_temperature(&mut self) -> Result<f64>;
    fn read_memory(&mut self) -> Result<Usage>;
    /// Usage of the root filesystem.
    fn read_disk(&mut self) -> Result<Usage>;
    fn read_hostname(&mut self) -> Result<String>;
    fn read_lan_ip(&mut self) -> Result<String>;
    fn read_wifi_ip(&mut self) -> Result<String>;
}

/// One sampling round. Numeric fields always hold a value (last-known or zero on
/// failure); identity fields are `None` when unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    pub load: f64,
    pub temperature_c: f64,
    pub memory: Usage,
    pub disk: Usage,
    pub hostname: Option<String>,
    pub lan_ip: Option<String>,
    pub wifi_ip: Option<String>,
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self {
            load: 0.0,
            temperature_c: 0.0,
            memory: Usage::default(),
            disk: Usage::default(),
            hostname: None,
            lan_ip: None,
            wifi_ip: None,
        }
    }
}

impl MetricSnapshot {
    /// Read every metric from `source`. Failed numeric reads keep the value from
    /// `previous` (zero on the first tick); each failure is handed to `on_unavailable`.
    pub fn sample<S, F>(
        source: &mut S,
        previous: Option<&MetricSnapshot>,
        mut on_unavailable: F,
    ) -> Self
    where
        S: MetricSource + ?Sized,
        F: FnMut(&Error),
    {
        let fallback = previous.cloned().unwrap_or_default();
        let report = &mut on_unavailable;

        let load = reported(source.read_load(), report).unwrap_or(fallback.load);
        let temperature_c =
            reported(source.read_temperature(), report).unwrap_or(fallback.temperature_c);
        let memory = reported(source.read_memory(), report).unwrap_or(fallback.memory);
        let disk = reported(source.read_disk(), report).unwrap_or(fallback.disk);
        let hostname = reported(source.read_hostname(), report).or(fallback.hostname);
        let lan_ip = reported(source.read_lan_ip(), report);
        let wifi_ip = reported(source.read_wifi_ip(), report);

        Self {
            load,
            temperature_c,
            memory,
            disk,
            hostname,
            lan_ip,
            wifi_ip,
        }
    }

    pub fn hostname_or_placeholder(&self) -> &str {
        self.hostname.as_deref().unwrap_or(PLACEHOLDER)
    }
}

fn reported<T, F: FnMut(&Error)>(result: Result<T>, on_unavailable: &mut F) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            on_unavailable(&err);
            None
        }
    }
}

/// Physical interface families shown on the identity line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Lan,
    Wifi,
}

/// Classify an interface by name; loopback and virtual interfaces yield `None`.
pub fn classify_interface(name: &str) -> Option<InterfaceKind> {
    if name == "lo" || SKIPPED_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return None;
    }
    if name.starts_with("eth") || name.starts_with("en") {
        Some(InterfaceKind::Lan)
    } else if name.starts_with("wlan") || name.starts_with("wl") {
        Some(InterfaceKind::Wifi)
    } else {
        None
    }
}

/// First IPv4 address of the first interface (by name) of the requested kind.
pub fn pick_address<'a, I>(interfaces: I, kind: InterfaceKind) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, Vec<IpAddr>)>,
{
    let mut candidates: Vec<(&str, Vec<IpAddr>)> = interfaces
        .into_iter()
        .filter(|(name, _)| classify_interface(name) == Some(kind))
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(b.0));
    candidates.into_iter().find_map(|(_, addrs)| {
        addrs
            .into_iter()
            .find(|addr| addr.is_ipv4())
            .map(|addr| addr.to_string())
    })
}

pub(crate) fn unavailable(metric: &'static str, reason: impl Into<String>) -> Error {
    Error::MetricUnavailable(metric, reason.into())
}
