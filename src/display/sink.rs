use std::{
    sync::{Arc, Mutex, MutexGuard},
    thread,
    time::Duration,
};

use embedded_hal_1::i2c::I2c;

use super::Frame;
use crate::{
    config::DisplayConfig,
    oled_driver::{
        hw::{open_bus, pulse_reset, PanelBus},
        Panel,
    },
    Error, Result,
};

/// Destination for composed frames. Acquired once at startup and released once
/// at shutdown; writes after `release` fail.
pub trait DisplaySink {
    fn write(&mut self, frame: &Frame) -> Result<()>;
    fn release(&mut self) -> Result<()>;
}

/// SSD1306 panel behind an I2C bus.
pub struct OledSink<I> {
    panel: Option<Panel<I>>,
}

impl OledSink<PanelBus> {
    /// Pulse the reset line (when configured), open the bus and initialize the
    /// panel. A failed reset pulse is returned through `on_reset_error` and does
    /// not stop the open, since many modules tie reset high on the board.
    pub fn open(config: &DisplayConfig, on_reset_error: impl FnOnce(&Error)) -> Result<Self> {
        if let Some(pin) = config.reset_pin {
            if let Err(err) = pulse_reset(pin) {
                on_reset_error(&err);
            }
        }
        let bus = open_bus(config.i2c_bus)?;
        Self::with_bus(bus, config)
    }
}

impl<I: I2c> OledSink<I> {
    /// Initializes and blanks the panel before the first frame.
    pub fn with_bus(bus: I, config: &DisplayConfig) -> Result<Self> {
        Ok(Self {
            panel: Some(Panel::new(bus, config)?),
        })
    }
}

impl<I: I2c> DisplaySink for OledSink<I> {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        let panel = self
            .panel
            .as_mut()
            .ok_or_else(|| Error::DisplayTransport("display already released".into()))?;
        panel.draw(frame)
    }

    /// Closes the bus and leaves the panel showing its last frame.
    fn release(&mut self) -> Result<()> {
        match self.panel.take() {
            Some(panel) => {
                drop(panel);
                Ok(())
            }
            None => Err(Error::DisplayTransport("display already released".into())),
        }
    }
}

#[derive(Debug, Default)]
struct Recording {
    frames: Vec<Frame>,
    releases: usize,
    released: bool,
    failures_left: usize,
    delay: Option<Duration>,
}

/// In-memory sink that records frames. Clones share one recording, so a test
/// can keep a handle after moving the sink into the render loop.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Recording>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` writes fail with a transport error.
    pub fn failing_writes(self, count: usize) -> Self {
        self.lock().failures_left = count;
        self
    }

    /// Every write blocks for `delay` before completing.
    pub fn with_write_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.lock().frames.clone()
    }

    pub fn release_count(&self) -> usize {
        self.lock().releases
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplaySink for MemorySink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        let mut rec = self.lock();
        if rec.released {
            return Err(Error::DisplayTransport("display already released".into()));
        }
        if rec.failures_left > 0 {
            rec.failures_left -= 1;
            return Err(Error::DisplayTransport("scripted write failure".into()));
        }
        rec.frames.push(frame.clone());
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        let mut rec = self.lock();
        rec.releases += 1;
        if rec.released {
            return Err(Error::DisplayTransport("display already released".into()));
        }
        rec.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oled_driver::tests::MockBus;

    #[test]
    fn oled_sink_clears_then_flushes_frames() {
        let config = DisplayConfig::default();
        let bus = MockBus::default();
        let mut sink = OledSink::with_bus(bus.clone(), &config).unwrap();
        let cleared = bus.data();
        assert!(!cleared.is_empty());
        assert!(cleared.iter().all(|b| *b == 0));

        bus.clear();
        let mut frame = Frame::new(config.width, config.height);
        frame.set_pixel(0, 0, true);
        sink.write(&frame).unwrap();
        let data = bus.data();
        assert_eq!(data.len(), 1024);
        assert_eq!(data[0], 0x01);
    }

    #[test]
    fn oled_sink_rejects_writes_after_release() {
        let config = DisplayConfig::default();
        let bus = MockBus::default();
        let mut sink = OledSink::with_bus(bus.clone(), &config).unwrap();
        sink.release().unwrap();
        bus.clear();
        let frame = Frame::new(config.width, config.height);
        assert!(sink.write(&frame).is_err());
        assert!(sink.release().is_err());
        assert!(bus.addresses().is_empty());
    }

    #[test]
    fn oled_sink_reports_bus_failures_per_write() {
        let config = DisplayConfig::default();
        let bus = MockBus::default();
        let mut sink = OledSink::with_bus(bus.clone(), &config).unwrap();
        let frame = Frame::new(config.width, config.height);
        bus.set_fail(true);
        let err = sink.write(&frame).unwrap_err();
        assert!(err.is_transient(), "{err}");
        bus.set_fail(false);
        sink.write(&frame).unwrap();
    }

    #[test]
    fn memory_sink_records_and_counts_releases() {
        let handle = MemorySink::new().failing_writes(1);
        let mut sink = handle.clone();
        let frame = Frame::new(8, 8);
        assert!(sink.write(&frame).is_err());
        sink.write(&frame).unwrap();
        sink.release().unwrap();
        assert!(sink.write(&frame).is_err());
        assert_eq!(handle.frames().len(), 1);
        assert_eq!(handle.release_count(), 1);
    }
}
