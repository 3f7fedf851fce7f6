//! Virtual-time scheduler. Nothing fires until `advance` is called.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{OnceTask, RepeatingTask, Scheduler, TimerId, MIN_PERIOD};

enum Job {
    Once(OnceTask),
    Repeating { period: Duration, task: RepeatingTask },
}

struct Entry {
    due: Duration,
    job: Job,
}

#[derive(Default)]
struct Inner {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerId, Entry>,
    /// Timer whose task is executing outside the lock.
    running: Option<TimerId>,
    running_cancelled: bool,
}

/// Deterministic scheduler over a virtual clock starting at zero.
///
/// Tasks run on the caller's thread inside `advance`, in due order; timers
/// due at the same instant fire in registration order.
#[derive(Default)]
pub struct ManualScheduler {
    inner: Mutex<Inner>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.lock().timers.len()
    }

    /// Move virtual time forward by `by`, firing every timer that falls due.
    /// Returns how many task invocations ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut fired = 0;

        loop {
            let next = {
                let mut inner = self.lock();
                let due = inner
                    .timers
                    .iter()
                    .filter(|(_, entry)| entry.due <= target)
                    .min_by_key(|(id, entry)| (entry.due, **id))
                    .map(|(id, _)| *id);
                match due.and_then(|id| inner.timers.remove(&id).map(|e| (id, e))) {
                    Some((id, entry)) => {
                        inner.now = entry.due;
                        inner.running = Some(id);
                        inner.running_cancelled = false;
                        Some((id, entry))
                    }
                    None => {
                        inner.now = target;
                        None
                    }
                }
            };

            let Some((id, entry)) = next else { break };
            fired += 1;

            match entry.job {
                Job::Once(task) => task(),
                Job::Repeating { period, mut task } => {
                    task();
                    let mut inner = self.lock();
                    if !inner.running_cancelled {
                        inner.timers.insert(
                            id,
                            Entry {
                                due: entry.due + period,
                                job: Job::Repeating { period, task },
                            },
                        );
                    }
                }
            }

            let mut inner = self.lock();
            inner.running = None;
            inner.running_cancelled = false;
        }

        fired
    }

    fn insert(&self, delay: Duration, job: Job) -> TimerId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = TimerId(inner.next_id);
        let due = inner.now + delay;
        inner.timers.insert(id, Entry { due, job });
        id
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TimerId {
        self.insert(delay, Job::Once(task))
    }

    fn schedule_repeating(&self, period: Duration, task: RepeatingTask) -> TimerId {
        let period = period.max(MIN_PERIOD);
        self.insert(period, Job::Repeating { period, task })
    }

    fn cancel(&self, id: TimerId) {
        // Dropped after the lock is released: a task's captures may cancel
        // further timers from their own Drop.
        let removed = {
            let mut inner = self.lock();
            if inner.running == Some(id) {
                inner.running_cancelled = true;
            }
            inner.timers.remove(&id)
        };
        drop(removed);
    }
}
