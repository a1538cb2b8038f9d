//! Repeating-task scheduling behind a small trait.
//!
//! Components that tick on a timer (timeline playback, crisis feed
//! generation) never touch tokio directly. They ask a [`Scheduler`] for a
//! repeating task and hold the returned [`ScheduleHandle`]. Dropping or
//! cancelling the handle ends the task, and so does the task itself by
//! returning [`TickControl::Stop`].
//!
//! Two implementations are provided:
//!
//! - [`TokioScheduler`] -- spawns a task on a tokio runtime driven by
//!   [`tokio::time::interval_at`].
//! - [`ManualScheduler`] -- virtual time for deterministic tests; tasks
//!   fire only when [`ManualScheduler::advance`] moves the clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// What a repeating task wants after running once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    /// Keep the task scheduled.
    Continue,
    /// Finish the task; it will not run again.
    Stop,
}

/// Body of a repeating task.
pub type RepeatingTask = Box<dyn FnMut() -> TickControl + Send>;

/// Something that can run a task every `period`.
pub trait Scheduler: Send + Sync {
    /// Run `task` every `period`, first after one full period has elapsed.
    fn schedule_repeating(&self, period: Duration, task: RepeatingTask) -> ScheduleHandle;
}

/// Ownership token for a scheduled task.
///
/// The task stays active until [`cancel`](Self::cancel) is called, the
/// handle is dropped, or the task returns [`TickControl::Stop`].
#[derive(Debug)]
pub struct ScheduleHandle {
    active: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl ScheduleHandle {
    const fn new(active: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { active, abort }
    }

    /// Stop the task. Ticks already in flight observe the flag and skip.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Whether the task may still run.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tokio
// ---------------------------------------------------------------------------

/// Production scheduler backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Schedule onto the given runtime.
    pub const fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Schedule onto the runtime of the calling context, if any.
    pub fn from_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, period: Duration, mut task: RepeatingTask) -> ScheduleHandle {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let join = self.runtime.spawn(async move {
            let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                if task() == TickControl::Stop {
                    flag.store(false, Ordering::SeqCst);
                    break;
                }
            }
            debug!(period_ms = period.as_millis(), "Repeating task finished");
        });

        ScheduleHandle::new(active, Some(join.abort_handle()))
    }
}

// ---------------------------------------------------------------------------
// Manual (virtual time)
// ---------------------------------------------------------------------------

struct ManualEntry {
    period: Duration,
    next_due: Duration,
    active: Arc<AtomicBool>,
    task: Arc<Mutex<RepeatingTask>>,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    entries: Vec<ManualEntry>,
}

/// Virtual-time scheduler for deterministic tests.
///
/// Nothing runs until [`advance`](Self::advance) is called. Tasks fire in
/// due-time order, each as many times as its period fits into the
/// advanced window.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualScheduler {
    /// Create a scheduler with the virtual clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since creation.
    pub fn now(&self) -> Duration {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).now
    }

    /// Number of tasks that are still active.
    pub fn active_tasks(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.retain(|e| e.active.load(Ordering::SeqCst));
        inner.entries.len()
    }

    /// Move virtual time forward by `by`, running every task that falls due.
    ///
    /// Tasks are invoked without the scheduler lock held, so a task may
    /// schedule or cancel other tasks.
    pub fn advance(&self, by: Duration) {
        let target = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.now.saturating_add(by)
        };

        while let Some((due, active, task)) = self.next_due(target) {
            {
                let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
                inner.now = due;
            }
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            let control = {
                let mut task = task.lock().unwrap_or_else(PoisonError::into_inner);
                (*task)()
            };
            if control == TickControl::Stop {
                active.store(false, Ordering::SeqCst);
            }
        }

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.now = target;
        inner.entries.retain(|e| e.active.load(Ordering::SeqCst));
    }

    /// Pop the earliest active entry due at or before `target`, rescheduling it.
    #[allow(clippy::type_complexity)]
    fn next_due(
        &self,
        target: Duration,
    ) -> Option<(Duration, Arc<AtomicBool>, Arc<Mutex<RepeatingTask>>)> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.retain(|e| e.active.load(Ordering::SeqCst));
        let entry = inner
            .entries
            .iter_mut()
            .filter(|e| e.next_due <= target)
            .min_by_key(|e| e.next_due)?;
        let due = entry.next_due;
        entry.next_due = due.saturating_add(entry.period);
        Some((due, Arc::clone(&entry.active), Arc::clone(&entry.task)))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, period: Duration, task: RepeatingTask) -> ScheduleHandle {
        let active = Arc::new(AtomicBool::new(true));
        let period = period.max(Duration::from_millis(1));
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let next_due = inner.now.saturating_add(period);
        inner.entries.push(ManualEntry {
            period,
            next_due,
            active: Arc::clone(&active),
            task: Arc::new(Mutex::new(task)),
        });
        ScheduleHandle::new(active, None)
    }
}
