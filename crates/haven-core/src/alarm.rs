//! Audible alarm handling for SOS sessions.
//!
//! The alarm is an exclusive resource with an explicit start and stop. An
//! [`AlarmGuard`] ties the two together: whatever way the guard goes away,
//! the sink is stopped exactly once.

use std::sync::Arc;

/// Something that can make noise.
pub trait AlarmSink: Send + Sync {
    fn start(&self);
    fn stop(&self);
}

/// Owns a running (or runnable) alarm and silences it on drop.
pub struct AlarmGuard {
    sink: Arc<dyn AlarmSink>,
    sounding: bool,
}

impl AlarmGuard {
    #[must_use]
    pub fn new(sink: Arc<dyn AlarmSink>) -> Self {
        Self {
            sink,
            sounding: false,
        }
    }

    /// Start the alarm. Calling it again while sounding is a no-op.
    pub fn sound(&mut self) {
        if !self.sounding {
            self.sink.start();
            self.sounding = true;
        }
    }

    #[must_use]
    pub const fn is_sounding(&self) -> bool {
        self.sounding
    }

    /// Stop the alarm now and release the guard.
    pub fn silence(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.sounding {
            self.sink.stop();
            self.sounding = false;
        }
    }
}

impl Drop for AlarmGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for AlarmGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmGuard")
            .field("sounding", &self.sounding)
            .finish_non_exhaustive()
    }
}
