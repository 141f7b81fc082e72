//! Delayed-panic countdown
//!
//! Two timers back one countdown: a deadline timer that fires the trigger, and
//! a 1-second tick that republishes the remaining time. Both are always torn
//! down together.

use crate::constants::COUNTDOWN_TICK_MS;
use crate::scheduler::{Millis, Scheduler, TimerHandle, TimerKind};
use log::{debug, info};

#[derive(Debug, Default)]
pub struct DelayedPanicTimer {
    deadline: Option<Millis>,
    deadline_timer: Option<TimerHandle>,
    tick_timer: Option<TimerHandle>,
    remaining_seconds: Option<u64>,
}

/// Seconds left until `deadline`, rounded up and clamped at zero
pub fn remaining_seconds(deadline: Millis, now: Millis) -> u64 {
    deadline.saturating_sub(now).div_ceil(1000)
}

impl DelayedPanicTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_timer.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    pub fn remaining_seconds(&self) -> Option<u64> {
        self.remaining_seconds
    }

    /// Start a countdown of `minutes`, replacing any countdown in progress.
    /// Returns the absolute deadline.
    pub fn arm(&mut self, minutes: u32, now: Millis, sched: &mut Scheduler<TimerKind>) -> Millis {
        self.cancel(sched);

        let deadline = now + u64::from(minutes) * 60_000;
        sched.rearm(&mut self.deadline_timer, deadline, TimerKind::DelayedDeadline);
        self.schedule_tick(now, sched);
        self.deadline = Some(deadline);
        self.remaining_seconds = Some(remaining_seconds(deadline, now));

        info!("Delayed panic armed: triggers in {} minute(s)", minutes);
        deadline
    }

    /// Countdown tick. Returns the freshly published remaining time, or None
    /// for a stale handle.
    pub fn on_tick(
        &mut self,
        handle: TimerHandle,
        now: Millis,
        sched: &mut Scheduler<TimerKind>,
    ) -> Option<u64> {
        if self.tick_timer != Some(handle) {
            return None;
        }
        self.tick_timer = None;
        let deadline = self.deadline?;

        let remaining = remaining_seconds(deadline, now);
        self.remaining_seconds = Some(remaining);
        self.schedule_tick(now, sched);
        debug!("Delayed panic: {} s remaining", remaining);
        Some(remaining)
    }

    /// Deadline reached. Returns true exactly once per armed countdown.
    pub fn on_deadline(&mut self, handle: TimerHandle, sched: &mut Scheduler<TimerKind>) -> bool {
        if self.deadline_timer != Some(handle) {
            return false;
        }
        self.deadline_timer = None;
        sched.cancel_slot(&mut self.tick_timer);
        self.deadline = None;
        self.remaining_seconds = None;
        info!("Delayed panic deadline reached");
        true
    }

    /// Tear down both timers. Returns true if a countdown was running.
    pub fn cancel(&mut self, sched: &mut Scheduler<TimerKind>) -> bool {
        let was_armed = sched.cancel_slot(&mut self.deadline_timer);
        sched.cancel_slot(&mut self.tick_timer);
        self.deadline = None;
        self.remaining_seconds = None;
        was_armed
    }

    fn schedule_tick(&mut self, now: Millis, sched: &mut Scheduler<TimerKind>) {
        let next = now + COUNTDOWN_TICK_MS;
        // The deadline timer covers the final second
        if self.deadline_timer.is_some() && self.deadline.map_or(true, |d| next < d) {
            sched.rearm(&mut self.tick_timer, next, TimerKind::DelayedTick);
        }
    }
}
