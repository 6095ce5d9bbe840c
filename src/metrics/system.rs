use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

use sysinfo::{Components, Disks, Networks, System};

use super::{pick_address, unavailable, InterfaceKind, MetricSource, Usage};
use crate::Result;

const THERMAL_ROOT: &str = "/sys/class/thermal";
const CPU_SENSOR_LABELS: [&str; 5] = ["cpu", "package", "core", "tctl", "tdie"];

/// Live metrics from the running host via sysinfo and sysfs.
pub struct SystemMetrics {
    system: System,
    disks: Disks,
    components: Components,
    networks: Networks,
    thermal_root: PathBuf,
}

impl SystemMetrics {
    pub fn new() -> Self {
        Self::with_thermal_root(THERMAL_ROOT)
    }

    pub fn with_thermal_root(root: impl Into<PathBuf>) -> Self {
        Self {
            system: System::new(),
            disks: Disks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            thermal_root: root.into(),
        }
    }

    fn interface_address(&mut self, kind: InterfaceKind) -> Option<String> {
        self.networks.refresh(true);
        let interfaces = self.networks.list().iter().map(|(name, data)| {
            let addrs: Vec<IpAddr> = data.ip_networks().iter().map(|net| net.addr).collect();
            (name.as_str(), addrs)
        });
        pick_address(interfaces, kind)
    }

    fn sensor_temperature(&mut self) -> Option<f64> {
        self.components.refresh(true);
        self.components
            .list()
            .iter()
            .filter(|component| {
                let label = component.label().to_ascii_lowercase();
                CPU_SENSOR_LABELS.iter().any(|needle| label.contains(needle))
            })
            .find_map(|component| component.temperature())
            .map(f64::from)
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for SystemMetrics {
    fn read_load(&mut self) -> Result<f64> {
        let load = System::load_average().one;
        if load.is_finite() && load >= 0.0 {
            Ok(load)
        } else {
            Err(unavailable("load", format!("invalid load average {load}")))
        }
    }

    fn read_temperature(&mut self) -> Result<f64> {
        if let Some(celsius) = thermal_zone_temperature(&self.thermal_root) {
            return Ok(celsius);
        }
        self.sensor_temperature()
            .ok_or_else(|| unavailable("temperature", "no thermal zone or cpu sensor"))
    }

    fn read_memory(&mut self) -> Result<Usage> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(unavailable("memory", "total memory reported as zero"));
        }
        Ok(Usage::new(self.system.used_memory().min(total), total))
    }

    fn read_disk(&mut self) -> Result<Usage> {
        self.disks.refresh(true);
        let disk = self
            .disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .or_else(|| self.disks.list().first())
            .ok_or_else(|| unavailable("disk", "no mounted filesystem"))?;
        let total = disk.total_space();
        if total == 0 {
            return Err(unavailable("disk", "root filesystem reports zero size"));
        }
        let used = total.saturating_sub(disk.available_space());
        Ok(Usage::new(used, total))
    }

    fn read_hostname(&mut self) -> Result<String> {
        System::host_name()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| unavailable("hostname", "hostname not reported"))
    }

    fn read_lan_ip(&mut self) -> Result<String> {
        self.interface_address(InterfaceKind::Lan)
            .ok_or_else(|| unavailable("lan ip", "no wired interface with an IPv4 address"))
    }

    fn read_wifi_ip(&mut self) -> Result<String> {
        self.interface_address(InterfaceKind::Wifi)
            .ok_or_else(|| unavailable("wifi ip", "no wireless interface with an IPv4 address"))
    }
}

/// First readable `thermal_zone*/temp` under `root`, converted from millidegrees.
fn thermal_zone_temperature(root: &Path) -> Option<f64> {
    let mut zones: Vec<PathBuf> = fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("thermal_zone"))
        })
        .collect();
    zones.sort();
    zones.into_iter().find_map(|zone| {
        let raw = fs::read_to_string(zone.join("temp")).ok()?;
        raw.trim().parse::<f64>().ok().map(|milli| milli / 1000.0)
    })
}
