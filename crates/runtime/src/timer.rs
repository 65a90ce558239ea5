//! Cancellable per-frame timers.
//!
//! A [`TimerHandle`] represents one running timer. It is released exactly
//! once: by [`TimerHandle::stop`], or when the handle is dropped. Owners keep
//! the handle next to the state it animates, so replacing or tearing down that
//! state always frees the timer.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use foundation::time::Time;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Debug, Default)]
struct TimerTable {
    next_id: AtomicU64,
    started: AtomicU64,
    active: AtomicUsize,
}

/// Shared registry that hands out timers and tracks how many are live.
#[derive(Debug, Clone, Default)]
pub struct Timers {
    table: Arc<TimerTable>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, now: Time) -> TimerHandle {
        let id = TimerId(self.table.next_id.fetch_add(1, Ordering::Relaxed));
        self.table.started.fetch_add(1, Ordering::Relaxed);
        self.table.active.fetch_add(1, Ordering::Relaxed);
        TimerHandle {
            id,
            started_at: now,
            timers: self.clone(),
            running: true,
        }
    }

    /// Timers currently running.
    pub fn active(&self) -> usize {
        self.table.active.load(Ordering::Relaxed)
    }

    /// Timers ever started from this registry.
    pub fn started(&self) -> u64 {
        self.table.started.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    started_at: Time,
    timers: Timers,
    running: bool,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn started_at(&self) -> Time {
        self.started_at
    }

    /// Seconds since the timer started.
    pub fn elapsed(&self, now: Time) -> f64 {
        now.since(self.started_at)
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.timers.table.active.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::Timers;
    use foundation::time::Time;

    #[test]
    fn stop_releases_once() {
        let timers = Timers::new();
        let mut h = timers.start(Time(1.0));
        assert_eq!(timers.active(), 1);
        h.stop();
        h.stop();
        assert_eq!(timers.active(), 0);
        drop(h);
        assert_eq!(timers.active(), 0);
        assert_eq!(timers.started(), 1);
    }

    #[test]
    fn drop_releases_running_timer() {
        let timers = Timers::new();
        {
            let _a = timers.start(Time(0.0));
            let _b = timers.start(Time(0.0));
            assert_eq!(timers.active(), 2);
        }
        assert_eq!(timers.active(), 0);
    }

    #[test]
    fn elapsed_counts_from_start() {
        let timers = Timers::new();
        let h = timers.start(Time(2.0));
        assert_eq!(h.elapsed(Time(2.3)), 2.3 - 2.0);
        assert_eq!(h.elapsed(Time(1.0)), 0.0);
        assert_ne!(h.id(), timers.start(Time(2.0)).id());
    }
}
