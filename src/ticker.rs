use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

/// A callback scheduled every `period` on the current Tokio runtime.
///
/// The first call happens one period after `spawn`. Dropping the guard
/// aborts the task, so no call starts after the guard is gone.
pub struct Repeating {
    handle: JoinHandle<()>,
}

impl Repeating {
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(period: Duration, mut callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                callback();
            }
        });

        Self { handle }
    }

    /// Whether the callback task is still alive. Used for inspection.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Repeating {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Counts whole seconds since it was started.
pub struct SecondsCounter {
    count: Arc<AtomicU64>,
    _timer: Repeating,
}

/// Read-only view of a [`SecondsCounter`] that stays valid after the counter
/// itself is dropped.
#[derive(Debug, Clone)]
pub struct CounterReader {
    count: Arc<AtomicU64>,
}

impl SecondsCounter {
    pub fn start() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        let count = Arc::new(AtomicU64::new(0));
        let ticks = Arc::clone(&count);
        let timer = Repeating::spawn(period, move || {
            ticks.fetch_add(1, Ordering::Relaxed);
        });

        Self {
            count,
            _timer: timer,
        }
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn reader(&self) -> CounterReader {
        CounterReader {
            count: Arc::clone(&self.count),
        }
    }
}

impl CounterReader {
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
