//! Real-time scheduler backed by tokio timers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};

use super::{OnceTask, RepeatingTask, Scheduler, TimerId, MIN_PERIOD};

type TaskMap = Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>;

fn lock(tasks: &TaskMap) -> MutexGuard<'_, HashMap<TimerId, JoinHandle<()>>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Each timer is a spawned task; cancelling aborts it.
pub struct TokioScheduler {
    handle: Handle,
    next_id: AtomicU64,
    tasks: TaskMap,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Bind to the runtime the caller is running on.
    pub fn from_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// Number of timers still armed.
    pub fn active(&self) -> usize {
        lock(&self.tasks).len()
    }

    fn next_id(&self) -> TimerId {
        TimerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TimerId {
        let id = self.next_id();
        let tasks = Arc::clone(&self.tasks);

        // Held across spawn so the task cannot deregister before it is registered.
        let mut map = lock(&self.tasks);
        let join = self.handle.spawn(async move {
            sleep(delay).await;
            lock(&tasks).remove(&id);
            task();
        });
        map.insert(id, join);
        id
    }

    fn schedule_repeating(&self, period: Duration, mut task: RepeatingTask) -> TimerId {
        let id = self.next_id();
        let period = period.max(MIN_PERIOD);

        let mut map = lock(&self.tasks);
        let join = self.handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                task();
            }
        });
        map.insert(id, join);
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(join) = lock(&self.tasks).remove(&id) {
            join.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, join) in lock(&self.tasks).drain() {
            join.abort();
        }
    }
}
