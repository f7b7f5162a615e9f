//! Delay collaborators that do not burn test wall time.

use std::sync::Mutex;
use std::time::Duration;

use pata_pio::Delay;

/// Returns immediately; settling delays become no-ops.
#[derive(Debug, Default)]
pub struct NoopDelay;

impl Delay for NoopDelay {
    fn spin_delay(&self, _duration: Duration) {}
}

/// Records every requested duration without waiting.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    recorded: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.lock().unwrap().clone()
    }
}

impl Delay for RecordingDelay {
    fn spin_delay(&self, duration: Duration) {
        self.recorded.lock().unwrap().push(duration);
    }
}
