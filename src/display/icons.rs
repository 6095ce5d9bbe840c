//! Threshold classification and icon slot names.

use crate::{config::Thresholds, metrics::MetricSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconState {
    Normal,
    Warning,
}

/// Strictly above the threshold is a warning. NaN compares false and stays normal.
pub fn classify(value: f64, threshold: f64) -> IconState {
    if value > threshold {
        IconState::Warning
    } else {
        IconState::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Load,
    Temperature,
    Memory,
    Disk,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Load,
        Metric::Temperature,
        Metric::Memory,
        Metric::Disk,
    ];

    /// Icon table key for this metric in the given state, e.g. `temp_warn`.
    pub fn icon_key(self, state: IconState) -> &'static str {
        match (self, state) {
            (Metric::Load, IconState::Normal) => "load_normal",
            (Metric::Load, IconState::Warning) => "load_warn",
            (Metric::Temperature, IconState::Normal) => "temp_normal",
            (Metric::Temperature, IconState::Warning) => "temp_warn",
            (Metric::Memory, IconState::Normal) => "mem_normal",
            (Metric::Memory, IconState::Warning) => "mem_warn",
            (Metric::Disk, IconState::Normal) => "disk_normal",
            (Metric::Disk, IconState::Warning) => "disk_warn",
        }
    }
}

/// Per-metric icon state for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconStates {
    pub load: IconState,
    pub temperature: IconState,
    pub memory: IconState,
    pub disk: IconState,
}

impl IconStates {
    /// Memory and disk compare their usage percentage against the threshold.
    pub fn classify(snapshot: &MetricSnapshot, thresholds: &Thresholds) -> Self {
        Self {
            load: classify(snapshot.load, thresholds.load_warn),
            temperature: classify(snapshot.temperature_c, thresholds.temp_warn),
            memory: classify(snapshot.memory.percent(), thresholds.mem_warn),
            disk: classify(snapshot.disk.percent(), thresholds.disk_warn),
        }
    }

    pub fn get(&self, metric: Metric) -> IconState {
        match metric {
            Metric::Load => self.load,
            Metric::Temperature => self.temperature,
            Metric::Memory => self.memory,
            Metric::Disk => self.disk,
        }
    }

    pub fn any_warning(&self) -> bool {
        Metric::ALL
            .iter()
            .any(|metric| self.get(*metric) == IconState::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Usage;

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(classify(2.5, 2.0), IconState::Warning);
        assert_eq!(classify(2.0, 2.0), IconState::Normal);
        assert_eq!(classify(1.99, 2.0), IconState::Normal);
    }

    #[test]
    fn nan_is_normal() {
        assert_eq!(classify(f64::NAN, 2.0), IconState::Normal);
    }

    #[test]
    fn classifies_usage_by_percent() {
        let snapshot = MetricSnapshot {
            load: 0.5,
            temperature_c: 71.0,
            memory: Usage::new(81, 100),
            disk: Usage::new(80, 100),
            ..MetricSnapshot::default()
        };
        let states = IconStates::classify(&snapshot, &Thresholds::default());
        assert_eq!(states.load, IconState::Normal);
        assert_eq!(states.temperature, IconState::Warning);
        assert_eq!(states.memory, IconState::Warning);
        assert_eq!(states.disk, IconState::Normal);
        assert!(states.any_warning());
    }

    #[test]
    fn icon_keys_follow_metric_and_state() {
        assert_eq!(Metric::Load.icon_key(IconState::Warning), "load_warn");
        assert_eq!(Metric::Disk.icon_key(IconState::Normal), "disk_normal");
    }
}
