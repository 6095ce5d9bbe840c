use oled_stats::{
    app::{
        lifecycle::ShutdownSignal,
        render_loop::{LoopPhase, MainLoop, ShutdownOutcome},
        LogLevel, Logger,
    },
    config::Config,
    display::{FrameComposer, MemorySink},
    metrics::{MetricSource, Usage},
    Error, Result,
};
use std::{
    thread,
    time::{Duration, Instant},
};

const GB: u64 = 1024 * 1024 * 1024;

/// Healthy host that requests shutdown from inside its `shutdown_after`-th load read,
/// so the trigger lands mid-tick.
struct HostStub {
    reads: usize,
    shutdown_after: usize,
    signal: ShutdownSignal,
}

impl MetricSource for HostStub {
    fn read_load(&mut self) -> Result<f64> {
        self.reads += 1;
        if self.reads == self.shutdown_after {
            self.signal.trigger();
        }
        Ok(0.3)
    }
    fn read_temperature(&mut self) -> Result<f64> {
        Ok(45.0)
    }
    fn read_memory(&mut self) -> Result<Usage> {
        Ok(Usage::new(GB, 4 * GB))
    }
    fn read_disk(&mut self) -> Result<Usage> {
        Ok(Usage::new(10 * GB, 32 * GB))
    }
    fn read_hostname(&mut self) -> Result<String> {
        Ok("bench-pi".into())
    }
    fn read_lan_ip(&mut self) -> Result<String> {
        Ok("10.1.1.4".into())
    }
    fn read_wifi_ip(&mut self) -> Result<String> {
        Err(Error::MetricUnavailable("wifi ip", "no wlan".into()))
    }
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.timing.refresh_interval = 0.05;
    config.timing.rotation_interval = 0.1;
    config
}

#[test]
fn shutdown_mid_run_writes_exactly_one_offline_frame() {
    let config = fast_config();
    let composer = FrameComposer::new(&config).unwrap();
    let logger = Logger::stderr(LogLevel::Error);
    let sink = MemorySink::new();
    let signal = ShutdownSignal::new();
    let source = HostStub {
        reads: 0,
        shutdown_after: 3,
        signal: signal.clone(),
    };

    let mut main_loop = MainLoop::new(&config, &composer, source, sink.clone(), &logger);
    let outcome = main_loop.run(&signal).unwrap();

    assert_eq!(outcome, ShutdownOutcome::OfflineWritten);
    assert_eq!(main_loop.phase(), LoopPhase::Stopped);
    let frames = sink.frames();
    // Three ticks (the third completes its write) and then the terminal frame.
    assert_eq!(frames.len(), 4);
    let offline = composer.compose_offline("bench-pi");
    assert_eq!(frames.iter().filter(|f| **f == offline).count(), 1);
    assert_eq!(frames.last(), Some(&offline));
    assert_eq!(sink.release_count(), 1);
}

#[test]
fn external_signal_interrupts_the_inter_tick_wait() {
    let mut config = fast_config();
    config.timing.refresh_interval = 30.0;
    let composer = FrameComposer::new(&config).unwrap();
    let logger = Logger::stderr(LogLevel::Error);
    let sink = MemorySink::new();
    let signal = ShutdownSignal::new();
    let source = HostStub {
        reads: 0,
        shutdown_after: usize::MAX,
        signal: signal.clone(),
    };

    let remote = signal.clone();
    let trigger = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        remote.trigger();
    });
    let start = Instant::now();
    let mut main_loop = MainLoop::new(&config, &composer, source, sink.clone(), &logger);
    let outcome = main_loop.run(&signal).unwrap();
    trigger.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(outcome, ShutdownOutcome::OfflineWritten);
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.release_count(), 1);
}

#[test]
fn failed_writes_skip_ticks_without_stopping() {
    let config = fast_config();
    let composer = FrameComposer::new(&config).unwrap();
    let logger = Logger::stderr(LogLevel::Error);
    let sink = MemorySink::new().failing_writes(2);
    let signal = ShutdownSignal::new();
    let source = HostStub {
        reads: 0,
        shutdown_after: 4,
        signal: signal.clone(),
    };

    let mut main_loop = MainLoop::new(&config, &composer, source, sink.clone(), &logger);
    let outcome = main_loop.run(&signal).unwrap();

    assert_eq!(outcome, ShutdownOutcome::OfflineWritten);
    // Ticks 1 and 2 failed, ticks 3 and 4 landed, then OFFLINE.
    assert_eq!(sink.frames().len(), 3);
    assert_eq!(
        sink.frames().last(),
        Some(&composer.compose_offline("bench-pi"))
    );
}

#[test]
fn repeated_signal_does_not_extend_the_final_write() {
    let config = fast_config();
    let composer = FrameComposer::new(&config).unwrap();
    let logger = Logger::stderr(LogLevel::Error);
    let sink = MemorySink::new().with_write_delay(Duration::from_millis(300));
    let signal = ShutdownSignal::new();
    signal.trigger();
    let source = HostStub {
        reads: 0,
        shutdown_after: usize::MAX,
        signal: signal.clone(),
    };

    let remote = signal.clone();
    let again = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        remote.trigger();
    });
    let mut main_loop = MainLoop::new(&config, &composer, source, sink, &logger)
        .with_final_write_timeout(Duration::from_millis(150));
    let start = Instant::now();
    let outcome = main_loop.run(&signal).unwrap();
    again.join().unwrap();

    assert_eq!(outcome, ShutdownOutcome::TimedOut);
    assert!(start.elapsed() < Duration::from_millis(300));
    assert_eq!(signal.count(), 2);
}
