//! Timeline playback: drives a [`TimeCursor`] from a [`Scheduler`].
//!
//! At most one repeating task exists per playback. `play` starts it,
//! `pause` cancels it, and the task finishes on its own when the cursor
//! reaches the end of the timeline. A tick that fires after a pause finds
//! the cursor paused and does nothing.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use oracle_types::{PlaybackSpeed, QuickJump, TimelineSnapshot};
use tracing::{debug, info};

use crate::config::TimelineConfig;
use crate::scheduler::{ScheduleHandle, Scheduler, TickControl};
use crate::timeline::{Advance, TimeCursor};

/// Receives a snapshot every time the cursor changes.
pub trait TimelineListener: Send + Sync {
    /// Called after a seek, a transition or a playback tick.
    fn on_change(&self, snapshot: &TimelineSnapshot);
}

/// A listener that ignores every change.
pub struct NoOpTimelineListener;

impl TimelineListener for NoOpTimelineListener {
    fn on_change(&self, _snapshot: &TimelineSnapshot) {}
}

/// Shared, scheduler-driven time cursor.
pub struct TimelinePlayback {
    cursor: Arc<Mutex<TimeCursor>>,
    scheduler: Arc<dyn Scheduler>,
    listener: Arc<dyn TimelineListener>,
    period: Duration,
    task: Mutex<Option<ScheduleHandle>>,
}

impl TimelinePlayback {
    /// Create a paused playback on the present year.
    pub fn new(
        config: &TimelineConfig,
        scheduler: Arc<dyn Scheduler>,
        listener: Arc<dyn TimelineListener>,
    ) -> Self {
        Self {
            cursor: Arc::new(Mutex::new(TimeCursor::new(config))),
            scheduler,
            listener,
            period: config.tick_interval(),
            task: Mutex::new(None),
        }
    }

    /// Current state of the cursor.
    pub fn snapshot(&self) -> TimelineSnapshot {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner).snapshot()
    }

    /// Move the cursor to `year` (clamped). Playback state is unchanged.
    pub fn seek(&self, year: i32) -> TimelineSnapshot {
        let snapshot = self.update(|c| {
            let landed = c.seek(year);
            debug!(requested = year, landed, "Timeline seek");
        });
        self.notify(&snapshot);
        snapshot
    }

    /// Seek to a labelled quick-jump year.
    pub fn jump(&self, jump: QuickJump) -> TimelineSnapshot {
        self.seek(jump.year())
    }

    /// Seek back to the first year.
    pub fn reset(&self) -> TimelineSnapshot {
        let snapshot = self.update(|c| {
            c.reset();
        });
        self.notify(&snapshot);
        snapshot
    }

    /// Start playback. Calling `play` while already playing is a no-op.
    pub fn play(&self) -> TimelineSnapshot {
        let snapshot = self.update(TimeCursor::play);
        self.ensure_task();
        info!(year = snapshot.current_year, speed = snapshot.speed.years(), "Timeline playing");
        self.notify(&snapshot);
        snapshot
    }

    /// Pause playback and cancel the repeating task.
    pub fn pause(&self) -> TimelineSnapshot {
        let snapshot = self.update(TimeCursor::pause);
        self.cancel_task();
        info!(year = snapshot.current_year, "Timeline paused");
        self.notify(&snapshot);
        snapshot
    }

    /// Flip between playing and paused.
    pub fn toggle(&self) -> TimelineSnapshot {
        if self.snapshot().is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Change the playback speed; the next tick uses it.
    pub fn set_speed(&self, speed: PlaybackSpeed) -> TimelineSnapshot {
        let snapshot = self.update(|c| c.set_speed(speed));
        self.notify(&snapshot);
        snapshot
    }

    /// Step the speed through 1 -> 2 -> 5 -> 1.
    pub fn cycle_speed(&self) -> TimelineSnapshot {
        let snapshot = self.update(|c| {
            c.cycle_speed();
        });
        self.notify(&snapshot);
        snapshot
    }

    /// Whether a repeating task is currently scheduled.
    pub fn has_active_task(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(ScheduleHandle::is_active)
    }

    fn update(&self, f: impl FnOnce(&mut TimeCursor)) -> TimelineSnapshot {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cursor);
        cursor.snapshot()
    }

    fn notify(&self, snapshot: &TimelineSnapshot) {
        self.listener.on_change(snapshot);
    }

    fn ensure_task(&self) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(ScheduleHandle::is_active) {
            return;
        }

        let cursor = Arc::clone(&self.cursor);
        let listener = Arc::clone(&self.listener);
        let handle = self.scheduler.schedule_repeating(
            self.period,
            Box::new(move || {
                let (advance, snapshot) = {
                    let mut cursor = cursor.lock().unwrap_or_else(PoisonError::into_inner);
                    let advance = cursor.advance();
                    (advance, cursor.snapshot())
                };
                match advance {
                    Advance::Idle => return TickControl::Stop,
                    Advance::Moved(year) => debug!(year, "Timeline tick"),
                    Advance::ReachedEnd(year) => info!(year, "Timeline reached the end, stopping"),
                }
                listener.on_change(&snapshot);
                if advance.keeps_playing() {
                    TickControl::Continue
                } else {
                    TickControl::Stop
                }
            }),
        );
        *slot = Some(handle);
    }

    fn cancel_task(&self) {
        let handle = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.cancel();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use oracle_types::TimelineLabel;

    use super::*;
    use crate::scheduler::ManualScheduler;

    const TICK: Duration = Duration::from_millis(200);

    fn ticks(n: u64) -> Duration {
        Duration::from_millis(200_u64.saturating_mul(n))
    }

    #[derive(Default)]
    struct Recorder {
        years: Mutex<Vec<i32>>,
    }

    impl TimelineListener for Recorder {
        fn on_change(&self, snapshot: &TimelineSnapshot) {
            self.years.lock().unwrap().push(snapshot.current_year);
        }
    }

    fn playback() -> (TimelinePlayback, ManualScheduler, Arc<Recorder>) {
        let scheduler = ManualScheduler::new();
        let recorder = Arc::new(Recorder::default());
        let playback = TimelinePlayback::new(
            &TimelineConfig::default(),
            Arc::new(scheduler.clone()),
            Arc::clone(&recorder) as Arc<dyn TimelineListener>,
        );
        (playback, scheduler, recorder)
    }

    #[test]
    fn play_advances_one_year_per_tick() {
        let (pb, clock, _) = playback();
        pb.seek(2000);
        pb.play();
        clock.advance(ticks(3));
        assert_eq!(pb.snapshot().current_year, 2003);
        assert!(pb.snapshot().is_playing);
    }

    #[test]
    fn play_twice_starts_one_task() {
        let (pb, clock, _) = playback();
        pb.seek(2000);
        pb.play();
        pb.play();
        assert_eq!(clock.active_tasks(), 1);
        clock.advance(TICK);
        assert_eq!(pb.snapshot().current_year, 2001);
    }

    #[test]
    fn pause_cancels_task_and_freezes_year() {
        let (pb, clock, _) = playback();
        pb.seek(2000);
        pb.play();
        clock.advance(ticks(2));
        let snap = pb.pause();
        assert_eq!(snap.current_year, 2002);
        assert!(!pb.has_active_task());
        clock.advance(ticks(10));
        assert_eq!(pb.snapshot().current_year, 2002);
        assert_eq!(clock.active_tasks(), 0);
    }

    #[test]
    fn playback_stops_at_max_year() {
        let (pb, clock, recorder) = playback();
        pb.seek(2044);
        pb.set_speed(PlaybackSpeed::Fast);
        pb.play();
        clock.advance(ticks(10));

        let snap = pb.snapshot();
        assert_eq!(snap.current_year, 2050);
        assert!(!snap.is_playing);
        assert!(!pb.has_active_task());

        let years = recorder.years.lock().unwrap().clone();
        // seek, speed, play, 2049, 2050 (clamped stop)
        assert_eq!(years, vec![2044, 2044, 2044, 2049, 2050]);
        assert!(years.windows(2).all(|w| w.first() <= w.get(1)));
    }

    #[test]
    fn speed_change_applies_on_next_tick() {
        let (pb, clock, _) = playback();
        pb.seek(2000);
        pb.play();
        clock.advance(TICK);
        pb.cycle_speed();
        clock.advance(TICK);
        assert_eq!(pb.snapshot().current_year, 2003);
    }

    #[test]
    fn seek_while_playing_keeps_playing() {
        let (pb, clock, _) = playback();
        pb.play();
        let snap = pb.seek(1995);
        assert!(snap.is_playing);
        clock.advance(TICK);
        assert_eq!(pb.snapshot().current_year, 1996);
    }

    #[test]
    fn reset_and_jump_notify() {
        let (pb, _, recorder) = playback();
        assert_eq!(pb.reset().current_year, 1990);
        let snap = pb.jump(QuickJump::Ukraine);
        assert_eq!(snap.current_year, 2022);
        assert_eq!(snap.label, TimelineLabel::Historical);
        assert_eq!(recorder.years.lock().unwrap().clone(), vec![1990, 2022]);
    }

    #[test]
    fn replay_after_end_restarts_task() {
        let (pb, clock, _) = playback();
        pb.seek(2050);
        pb.play();
        clock.advance(TICK);
        assert!(!pb.snapshot().is_playing);

        pb.seek(2040);
        pb.play();
        assert!(pb.has_active_task());
        clock.advance(TICK);
        assert_eq!(pb.snapshot().current_year, 2041);
    }

    #[test]
    fn toggle_flips_state() {
        let (pb, clock, _) = playback();
        assert!(pb.toggle().is_playing);
        assert!(!pb.toggle().is_playing);
        assert_eq!(clock.active_tasks(), 0);
    }

    #[test]
    fn dropping_playback_cancels_task() {
        let (pb, clock, _) = playback();
        pb.play();
        assert_eq!(clock.active_tasks(), 1);
        drop(pb);
        assert_eq!(clock.active_tasks(), 0);
    }
}
