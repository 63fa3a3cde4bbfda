//! Progress reporting and cooperative cancellation for long-running packers.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
};

/// A cloneable flag used to ask a running packer to stop.
///
/// Packers poll the token at the top of their outer loops, so a cancelled
/// packer always finishes its current unit of work first. Timeouts are built
/// by cancelling the token from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

type Listener = Arc<dyn Fn(u32) + Send + Sync>;

/// A progress value between 0 and 100 owned by a single packer.
///
/// The value can be polled from any thread through a [`ProgressHandle`].
/// Components that report progress also call every subscribed listener after
/// each change.
///
/// Progress is advisory. It resets to 0 when a placement attempt fails and is
/// set to 100 when a search finishes, so readers will see it jump backwards
/// between attempts.
pub struct Progress {
    value: Arc<AtomicU32>,
    reports_progress: bool,
    listeners: Vec<Listener>,
}

impl Progress {
    pub fn new(reports_progress: bool) -> Self {
        Self {
            value: Arc::new(AtomicU32::new(0)),
            reports_progress,
            listeners: Vec::new(),
        }
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reports_progress(&self) -> bool {
        self.reports_progress
    }

    pub fn set_reports_progress(&mut self, reports_progress: bool) {
        self.reports_progress = reports_progress;
    }

    /// Registers a callback to run after every change to the value.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    pub fn handle(&self) -> ProgressHandle {
        ProgressHandle {
            value: Arc::clone(&self.value),
        }
    }

    /// Stores a new value, clamped to 100, and notifies listeners if it
    /// changed.
    pub fn set(&self, value: u32) {
        let value = value.min(100);
        let previous = self.value.swap(value, Ordering::Relaxed);

        if previous != value && self.reports_progress {
            for listener in &self.listeners {
                listener(value);
            }
        }
    }

    /// Stores `done / total` as a percentage.
    pub fn set_fraction(&self, done: u64, total: u64) {
        if total == 0 {
            self.set(100);
        } else {
            self.set((done.min(total) * 100 / total) as u32);
        }
    }

    pub fn reset(&self) {
        self.set(0);
    }

    pub fn finish(&self) {
        self.set(100);
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("value", &self.get())
            .field("reports_progress", &self.reports_progress)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A read-only view of a [`Progress`] value that can be sent to other
/// threads.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    value: Arc<AtomicU32>,
}

impl ProgressHandle {
    #[inline]
    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Implemented by every component that exposes a progress value.
pub trait ReportProgress {
    fn progress(&self) -> &Progress;

    fn progress_mut(&mut self) -> &mut Progress;
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn listeners_see_changes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut progress = Progress::new(true);

        let sink = Arc::clone(&seen);
        progress.subscribe(move |value| sink.lock().unwrap().push(value));

        progress.set(10);
        progress.set(10);
        progress.set_fraction(1, 2);
        progress.set(250);
        progress.reset();

        assert_eq!(*seen.lock().unwrap(), vec![10, 50, 100, 0]);
    }

    #[test]
    fn silent_progress_still_updates_value() {
        let seen = Arc::new(AtomicU32::new(0));
        let mut progress = Progress::new(false);

        let sink = Arc::clone(&seen);
        progress.subscribe(move |_| {
            sink.fetch_add(1, Ordering::Relaxed);
        });

        let handle = progress.handle();
        progress.set(42);

        assert_eq!(handle.get(), 42);
        assert_eq!(seen.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let other = token.clone();

        assert!(!token.is_cancelled());
        other.cancel();
        assert!(token.is_cancelled());
    }
}
