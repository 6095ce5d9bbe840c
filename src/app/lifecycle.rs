use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use crossbeam::channel::{self, Receiver, Sender};

use crate::{Error, Result};

/// Termination requests shared between the signal handler and the main loop.
///
/// Each request bumps a counter and wakes any pending [`ShutdownSignal::wait`],
/// so the inter-tick sleep ends as soon as a signal lands.
#[derive(Clone)]
pub struct ShutdownSignal {
    count: Arc<AtomicUsize>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = channel::unbounded();
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            wake_tx,
            wake_rx,
        }
    }

    /// Route SIGINT, SIGTERM and SIGHUP into a fresh signal. Once per process.
    pub fn install() -> Result<Self> {
        let signal = Self::new();
        let handle = signal.clone();
        ctrlc::set_handler(move || handle.trigger())
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        Ok(signal)
    }

    pub fn trigger(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
        let _ = self.wake_tx.try_send(());
    }

    pub fn requested(&self) -> bool {
        self.count() > 0
    }

    /// Number of requests received so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Sleep for up to `timeout`, returning early on a request. True when
    /// shutdown has been requested.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.requested() {
            return true;
        }
        let _ = self.wake_rx.recv_timeout(timeout);
        self.requested()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
