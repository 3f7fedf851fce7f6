//! Timer capability used by the call session.
//!
//! Controllers never touch a runtime directly: they receive an
//! `Arc<dyn Scheduler>` at construction. `ManualScheduler` drives virtual
//! time for tests and embedders, `TokioScheduler` runs real timers.
//!
//! Timers are held through `TimerGuard`, which cancels on drop so every exit
//! path releases the timer.

mod manual;
mod realtime;

use std::sync::Arc;
use std::time::Duration;

pub use manual::ManualScheduler;
pub use realtime::TokioScheduler;

/// Smallest period accepted for repeating timers. Zero is clamped up to this.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

pub type OnceTask = Box<dyn FnOnce() + Send + 'static>;
pub type RepeatingTask = Box<dyn FnMut() + Send + 'static>;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`.
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TimerId;

    /// Run `task` every `period`, first firing one period from now.
    fn schedule_repeating(&self, period: Duration, task: RepeatingTask) -> TimerId;

    /// Cancel a timer. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);
}

/// Owns one timer and cancels it when dropped.
pub struct TimerGuard {
    scheduler: Arc<dyn Scheduler>,
    id: TimerId,
}

impl TimerGuard {
    pub fn once(
        scheduler: &Arc<dyn Scheduler>,
        delay: Duration,
        task: impl FnOnce() + Send + 'static,
    ) -> Self {
        let id = scheduler.schedule_once(delay, Box::new(task));
        tracing::debug!(%id, ?delay, "One-shot timer scheduled");
        Self {
            scheduler: Arc::clone(scheduler),
            id,
        }
    }

    pub fn repeating(
        scheduler: &Arc<dyn Scheduler>,
        period: Duration,
        task: impl FnMut() + Send + 'static,
    ) -> Self {
        let id = scheduler.schedule_repeating(period, Box::new(task));
        tracing::debug!(%id, ?period, "Repeating timer scheduled");
        Self {
            scheduler: Arc::clone(scheduler),
            id,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.scheduler.cancel(self.id);
        tracing::debug!(id = %self.id, "Timer released");
    }
}

impl std::fmt::Debug for TimerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerGuard").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn scheduler_is_object_safe() {
        fn _assert(_: &dyn Scheduler) {}
    }

    #[test]
    fn guard_cancels_on_drop() {
        let manual = Arc::new(ManualScheduler::new());
        let scheduler: Arc<dyn Scheduler> = manual.clone();
        let count = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&count);
        let guard = TimerGuard::repeating(&scheduler, Duration::from_secs(1), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        manual.advance(Duration::from_secs(2));
        assert_eq!(count.load(Ordering::SeqCst), 2);

        drop(guard);
        manual.advance(Duration::from_secs(5));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(manual.pending(), 0);
    }

    #[test]
    fn dropping_fired_one_shot_guard_is_harmless() {
        let manual = Arc::new(ManualScheduler::new());
        let scheduler: Arc<dyn Scheduler> = manual.clone();
        let count = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&count);
        let guard = TimerGuard::once(&scheduler, Duration::from_secs(1), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        manual.advance(Duration::from_secs(1));
        drop(guard);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
