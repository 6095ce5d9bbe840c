use std::{
    thread,
    time::{Duration, Instant},
};

use crossbeam::channel::{self, RecvTimeoutError};

use super::{lifecycle::ShutdownSignal, Logger};
use crate::{
    config::Config,
    display::{DisplaySink, Frame, FrameComposer, IconStates, RotationScheduler},
    metrics::{MetricSnapshot, MetricSource, PLACEHOLDER},
    Error, Result,
};

/// Upper bound on the final OFFLINE write before the process exits anyway.
pub const FINAL_WRITE_TIMEOUT: Duration = Duration::from_secs(2);
const FINAL_WRITE_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Running,
    ShuttingDown,
    Stopped,
}

/// How the final OFFLINE write ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    OfflineWritten,
    OfflineFailed,
    TimedOut,
}

/// Mutable state carried between ticks.
struct LoopState {
    rotation: RotationScheduler,
    last: Option<MetricSnapshot>,
    consecutive_failures: u32,
    warning: bool,
}

/// Sample, classify, compose and write once per refresh interval until a
/// termination request, then leave the OFFLINE frame on the panel.
pub struct MainLoop<'a, M, S>
where
    M: MetricSource,
    S: DisplaySink + Send + 'static,
{
    config: &'a Config,
    composer: &'a FrameComposer,
    source: M,
    sink: Option<S>,
    logger: &'a Logger,
    state: LoopState,
    phase: LoopPhase,
    final_write_timeout: Duration,
}

impl<'a, M, S> MainLoop<'a, M, S>
where
    M: MetricSource,
    S: DisplaySink + Send + 'static,
{
    pub fn new(
        config: &'a Config,
        composer: &'a FrameComposer,
        source: M,
        sink: S,
        logger: &'a Logger,
    ) -> Self {
        Self {
            config,
            composer,
            source,
            sink: Some(sink),
            logger,
            state: LoopState {
                rotation: RotationScheduler::new(config.timing.rotation(), Instant::now()),
                last: None,
                consecutive_failures: 0,
                warning: false,
            },
            phase: LoopPhase::Running,
            final_write_timeout: FINAL_WRITE_TIMEOUT,
        }
    }

    pub fn with_final_write_timeout(mut self, timeout: Duration) -> Self {
        self.final_write_timeout = timeout;
        self
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    #[cfg(test)]
    pub(crate) fn last_snapshot(&self) -> Option<&MetricSnapshot> {
        self.state.last.as_ref()
    }

    /// Run until `shutdown` fires. Ticks sit on a fixed grid anchored at the
    /// first tick; an overrun skips the missed slots rather than bursting.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> Result<ShutdownOutcome> {
        if self.phase != LoopPhase::Running {
            return Err(Error::InvalidArgs("render loop already stopped".into()));
        }
        let refresh = self.config.timing.refresh();
        self.logger.info(format!(
            "render loop started (refresh {}, rotation {})",
            humantime::format_duration(refresh),
            humantime::format_duration(self.config.timing.rotation()),
        ));

        let mut next_tick = Instant::now();
        while !shutdown.requested() {
            match self.tick(Instant::now()) {
                Ok(()) => self.record_success(),
                Err(err) => self.record_failure(&err),
            }

            let now = Instant::now();
            next_tick += refresh;
            while next_tick <= now {
                next_tick += refresh;
            }
            if shutdown.wait(next_tick - now) {
                break;
            }
        }
        Ok(self.shut_down(shutdown))
    }

    /// Render a single stats frame and release the panel.
    pub fn run_once(&mut self) -> Result<()> {
        let written = self.tick(Instant::now());
        self.phase = LoopPhase::Stopped;
        if let Some(mut sink) = self.sink.take() {
            sink.release()?;
        }
        written
    }

    fn tick(&mut self, now: Instant) -> Result<()> {
        let logger = self.logger;
        let snapshot = MetricSnapshot::sample(&mut self.source, self.state.last.as_ref(), |err| {
            logger.debug(err.to_string())
        });
        let states = IconStates::classify(&snapshot, &self.config.thresholds);
        let rotation = self.state.rotation.update(now);
        let frame = self.composer.compose(&snapshot, &states, rotation);

        let warning = states.any_warning();
        if warning != self.state.warning {
            if warning {
                logger.info(format!("threshold exceeded: {states:?}"));
            } else {
                logger.info("all metrics back under their thresholds");
            }
            self.state.warning = warning;
        }
        self.state.last = Some(snapshot);
        self.write(&frame)
    }

    fn write(&mut self, frame: &Frame) -> Result<()> {
        self.sink
            .as_mut()
            .ok_or_else(|| Error::DisplayTransport("display already released".into()))?
            .write(frame)
    }

    fn record_success(&mut self) {
        if self.state.consecutive_failures > 0 {
            self.logger.info(format!(
                "display recovered after {} failed write(s)",
                self.state.consecutive_failures
            ));
            self.state.consecutive_failures = 0;
        }
    }

    fn record_failure(&mut self, err: &Error) {
        self.state.consecutive_failures += 1;
        let count = self.state.consecutive_failures;
        if !err.is_transient() {
            self.logger.error(format!("frame skipped: {err}"));
        } else if count == 1 {
            self.logger
                .warn(format!("frame skipped: {err}; retrying next tick"));
        } else {
            self.logger
                .debug(format!("frame skipped ({count} in a row): {err}"));
        }
    }

    fn shut_down(&mut self, shutdown: &ShutdownSignal) -> ShutdownOutcome {
        self.phase = LoopPhase::ShuttingDown;
        self.logger
            .info("termination requested; writing offline frame");

        let hostname = self
            .state
            .last
            .as_ref()
            .and_then(|snapshot| snapshot.hostname.clone())
            .or_else(|| self.source.read_hostname().ok())
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let frame = self.composer.compose_offline(&hostname);

        let outcome = match self.sink.take() {
            Some(sink) => self.write_final(sink, frame, shutdown),
            None => ShutdownOutcome::OfflineFailed,
        };
        self.phase = LoopPhase::Stopped;
        outcome
    }

    /// The writer thread owns the sink, writes the frame and releases it. The
    /// loop waits at most `final_write_timeout`; a stuck bus is left behind.
    fn write_final(&self, mut sink: S, frame: Frame, shutdown: &ShutdownSignal) -> ShutdownOutcome {
        let (done_tx, done_rx) = channel::bounded(1);
        let spawned = thread::Builder::new()
            .name("oled-offline".into())
            .spawn(move || {
                let written = sink.write(&frame);
                let released = sink.release();
                let _ = done_tx.send((written, released));
            });
        if let Err(err) = spawned {
            self.logger
                .error(format!("cannot start offline writer: {err}"));
            return ShutdownOutcome::OfflineFailed;
        }

        let deadline = Instant::now() + self.final_write_timeout;
        let signals_seen = shutdown.count();
        let mut repeat_logged = false;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                let err = Error::ShutdownInterrupted(format!(
                    "offline frame not written within {}",
                    humantime::format_duration(self.final_write_timeout)
                ));
                self.logger.warn(err.to_string());
                return ShutdownOutcome::TimedOut;
            }
            match done_rx.recv_timeout(remaining.min(FINAL_WRITE_POLL)) {
                Ok((written, released)) => {
                    if let Err(err) = released {
                        self.logger.warn(format!("display release failed: {err}"));
                    }
                    return match written {
                        Ok(()) => {
                            self.logger.info("offline frame written; display released");
                            ShutdownOutcome::OfflineWritten
                        }
                        Err(err) => {
                            self.logger.error(format!("offline frame failed: {err}"));
                            ShutdownOutcome::OfflineFailed
                        }
                    };
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !repeat_logged && shutdown.count() > signals_seen {
                        self.logger
                            .warn("repeated termination request; still writing offline frame");
                        repeat_logged = true;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.logger
                        .error("offline writer exited without reporting");
                    return ShutdownOutcome::OfflineFailed;
                }
            }
        }
    }
}

impl<M, S> Drop for MainLoop<'_, M, S>
where
    M: MetricSource,
    S: DisplaySink + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            let _ = sink.release();
        }
    }
}
