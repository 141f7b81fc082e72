//! Logical-time timer queue
//!
//! Every timer in SafeSwipe (hold, long press, zone, countdown, flash) lives in
//! one `Scheduler` owned by the controller. Time is a plain millisecond counter
//! supplied by the caller, so the same code runs against a real clock in the CLI
//! and a simulated one in tests. Timers with equal deadlines fire in the order
//! they were scheduled.

use std::collections::{BTreeMap, HashMap};

/// Milliseconds since the controller started
pub type Millis = u64;

/// What a scheduled timer is for. `Zone` carries the zone index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    SwipeHold,
    LongPress,
    Zone(usize),
    DelayedDeadline,
    DelayedTick,
    ConfirmationFlash,
    EmergencyOverlay,
    Redirect,
    PinErrorClear,
}

/// Handle to one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

pub struct Scheduler<K> {
    next_id: u64,
    queue: BTreeMap<(Millis, u64), K>,
    deadlines: HashMap<u64, Millis>,
}

impl<K> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Schedule `kind` to fire at absolute time `at`
    pub fn schedule(&mut self, at: Millis, kind: K) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.insert((at, id), kind);
        self.deadlines.insert(id, at);
        TimerHandle(id)
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(at) => self.queue.remove(&(at, handle.0)).is_some(),
            None => false,
        }
    }

    /// Take the handle out of `slot` and cancel it
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerHandle>) -> bool {
        match slot.take() {
            Some(handle) => self.cancel(handle),
            None => false,
        }
    }

    /// Arm a timer into `slot`, cancelling whatever the slot held before
    pub fn rearm(&mut self, slot: &mut Option<TimerHandle>, at: Millis, kind: K) -> TimerHandle {
        self.cancel_slot(slot);
        let handle = self.schedule(at, kind);
        *slot = Some(handle);
        handle
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn deadline(&self, handle: TimerHandle) -> Option<Millis> {
        self.deadlines.get(&handle.0).copied()
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Millis> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Millis) -> Option<(TimerHandle, Millis, K)> {
        let (&(at, id), _) = self.queue.iter().next()?;
        if at > now {
            return None;
        }
        let kind = self.queue.remove(&(at, id))?;
        self.deadlines.remove(&id);
        Some((TimerHandle(id), at, kind))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}
