use std::time::{Duration, Instant};

/// Which identity value the first line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    Hostname,
    Lan,
    Wifi,
}

impl RotationPhase {
    pub const CYCLE: [RotationPhase; 3] = [
        RotationPhase::Hostname,
        RotationPhase::Lan,
        RotationPhase::Wifi,
    ];

    pub fn icon_key(self) -> &'static str {
        match self {
            RotationPhase::Hostname => "hostname",
            RotationPhase::Lan => "lan",
            RotationPhase::Wifi => "wifi",
        }
    }
}

/// Time-based Hostname -> Lan -> Wifi cycle.
///
/// The phase is derived from whole intervals elapsed since the start instant,
/// so a slow tick never shifts later switches and a long stall skips ahead
/// instead of replaying the missed phases.
#[derive(Debug, Clone)]
pub struct RotationScheduler {
    started: Instant,
    interval: Duration,
    phase: RotationPhase,
}

impl RotationScheduler {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            started: now,
            interval,
            phase: RotationPhase::Hostname,
        }
    }

    /// Recompute the phase for `now` and return it.
    pub fn update(&mut self, now: Instant) -> RotationPhase {
        let interval = self.interval.as_nanos();
        if interval == 0 {
            return self.phase;
        }
        let elapsed = now.saturating_duration_since(self.started).as_nanos();
        let index = (elapsed / interval) % RotationPhase::CYCLE.len() as u128;
        self.phase = RotationPhase::CYCLE[index as usize];
        self.phase
    }
}
