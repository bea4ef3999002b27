//! Terminal bell alarm for SOS sessions.

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use haven_core::alarm::AlarmSink;
use tokio::task::JoinHandle;

/// How often the bell rings while the alarm sounds.
const RING_EVERY: Duration = Duration::from_secs(1);

/// Rings the terminal bell on stderr until stopped.
#[derive(Debug, Default)]
pub struct TerminalBell {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalBell {
    fn slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl AlarmSink for TerminalBell {
    fn start(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime, alarm stays silent");
            return;
        };
        let mut slot = self.slot();
        if slot.is_some() {
            return;
        }
        *slot = Some(runtime.spawn(async {
            let mut ticker = tokio::time::interval(RING_EVERY);
            loop {
                ticker.tick().await;
                let mut stderr = std::io::stderr();
                let _ = stderr.write_all(b"\x07");
                let _ = stderr.flush();
            }
        }));
        tracing::info!("SOS alarm sounding");
    }

    fn stop(&self) {
        if let Some(task) = self.slot().take() {
            task.abort();
            tracing::info!("SOS alarm silenced");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use haven_core::alarm::AlarmGuard;

    use super::*;

    #[tokio::test]
    async fn guard_drop_stops_the_bell() {
        let bell = Arc::new(TerminalBell::default());
        {
            let mut guard = AlarmGuard::new(bell.clone());
            guard.sound();
            assert!(bell.slot().is_some());
        }
        assert!(bell.slot().is_none());
    }

    #[tokio::test]
    async fn starting_twice_keeps_one_task() {
        let bell = TerminalBell::default();
        bell.start();
        bell.start();
        assert!(bell.slot().is_some());
        bell.stop();
        bell.stop();
        assert!(bell.slot().is_none());
    }

    #[test]
    fn without_a_runtime_the_bell_stays_silent() {
        let bell = TerminalBell::default();
        bell.start();
        assert!(bell.slot().is_none());
    }
}
