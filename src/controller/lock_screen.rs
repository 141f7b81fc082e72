//! Fake lock screen sub-state machine
//!
//! `Locked` shows a PIN pad that never accepts anything. The secret unlock
//! reveals a nested decoy (`DecoyShown`); a triple tap or Escape goes back to
//! `Locked`. Nothing here ever leaves panic mode.

use super::TimerKind;
use crate::constants::{
    LOCK_PIN_ERROR_MS, LOCK_PIN_LENGTH, LOCK_SECURITY_DELAY_MAX, SECRET_TAP_COUNT,
    SECRET_TAP_WINDOW_MS,
};
use crate::decoy::DecoyKind;
use crate::gesture::counter::WindowedCounter;
use crate::scheduler::{Millis, Scheduler, TimerHandle};
use crate::session::{LockScreenStatus, LockView};
use log::{debug, info};

pub struct LockScreen {
    view: LockView,
    pin_length: usize,
    pin_error: bool,
    security_delay: u8,
    pin_error_timer: Option<TimerHandle>,
    taps: WindowedCounter,
}

impl Default for LockScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl LockScreen {
    pub fn new() -> Self {
        Self {
            view: LockView::Locked,
            pin_length: 0,
            pin_error: false,
            security_delay: 0,
            pin_error_timer: None,
            taps: WindowedCounter::new(SECRET_TAP_WINDOW_MS),
        }
    }

    pub fn view(&self) -> LockView {
        self.view
    }

    pub fn status(&self) -> LockScreenStatus {
        LockScreenStatus {
            view: self.view,
            pin_length: self.pin_length,
            pin_error: self.pin_error,
            security_delay: self.security_delay,
        }
    }

    /// Returns true if the pad changed
    pub fn press_digit(&mut self, now: Millis, sched: &mut Scheduler<TimerKind>) -> bool {
        if self.view != LockView::Locked || self.pin_error {
            return false;
        }
        self.pin_length += 1;
        if self.pin_length >= LOCK_PIN_LENGTH {
            self.pin_error = true;
            self.security_delay = (self.security_delay + 1).min(LOCK_SECURITY_DELAY_MAX);
            sched.rearm(
                &mut self.pin_error_timer,
                now + LOCK_PIN_ERROR_MS,
                TimerKind::PinErrorClear,
            );
            debug!("Fake PIN rejected (attempt {})", self.security_delay);
        }
        true
    }

    pub fn delete_digit(&mut self) -> bool {
        if self.view != LockView::Locked || self.pin_error || self.pin_length == 0 {
            return false;
        }
        self.pin_length -= 1;
        true
    }

    pub fn on_pin_error_elapsed(&mut self, handle: TimerHandle) -> bool {
        if self.pin_error_timer != Some(handle) {
            return false;
        }
        self.pin_error_timer = None;
        self.pin_error = false;
        self.pin_length = 0;
        true
    }

    /// Secret unlock: reveal `decoy` behind the lock screen
    pub fn unlock(&mut self, decoy: DecoyKind) -> bool {
        if self.view != LockView::Locked {
            return false;
        }
        info!("Fake lock screen unlocked to {}", decoy.name());
        self.view = LockView::DecoyShown(decoy);
        self.taps.reset();
        true
    }

    /// One tap on the nested decoy. Returns true when the tap completed the
    /// secret exit back to the lock screen.
    pub fn tap(&mut self, now: Millis) -> bool {
        if !matches!(self.view, LockView::DecoyShown(_)) {
            return false;
        }
        if self.taps.register(now) < SECRET_TAP_COUNT {
            return false;
        }
        self.relock()
    }

    /// Escape inside the nested decoy
    pub fn escape(&mut self) -> bool {
        self.relock()
    }

    pub fn detach(&mut self, sched: &mut Scheduler<TimerKind>) {
        sched.cancel_slot(&mut self.pin_error_timer);
    }

    fn relock(&mut self) -> bool {
        if !matches!(self.view, LockView::DecoyShown(_)) {
            return false;
        }
        debug!("Nested decoy closed, back to lock screen");
        self.view = LockView::Locked;
        self.taps.reset();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourth_digit_shows_error_then_clears() {
        let mut sched = Scheduler::new();
        let mut lock = LockScreen::new();
        for _ in 0..3 {
            assert!(lock.press_digit(0, &mut sched));
        }
        assert!(!lock.status().pin_error);
        assert!(lock.press_digit(100, &mut sched));

        let status = lock.status();
        assert!(status.pin_error);
        assert_eq!(status.security_delay, 1);
        assert!(!lock.press_digit(200, &mut sched), "Pad is frozen during the error");

        let (handle, at, kind) = sched.pop_due(5_000).expect("error clear timer");
        assert_eq!((at, kind), (2_100, TimerKind::PinErrorClear));
        assert!(lock.on_pin_error_elapsed(handle));
        assert_eq!(lock.status().pin_length, 0);
        assert!(!lock.status().pin_error);
    }

    #[test]
    fn test_security_delay_caps() {
        let mut sched = Scheduler::new();
        let mut lock = LockScreen::new();
        for round in 0..5u64 {
            for _ in 0..LOCK_PIN_LENGTH {
                lock.press_digit(round * 10_000, &mut sched);
            }
            let (handle, _, _) = sched.pop_due(round * 10_000 + 5_000).unwrap();
            lock.on_pin_error_elapsed(handle);
        }
        assert_eq!(lock.status().security_delay, LOCK_SECURITY_DELAY_MAX);
    }

    #[test]
    fn test_delete_digit() {
        let mut sched = Scheduler::new();
        let mut lock = LockScreen::new();
        assert!(!lock.delete_digit());
        lock.press_digit(0, &mut sched);
        lock.press_digit(0, &mut sched);
        assert!(lock.delete_digit());
        assert_eq!(lock.status().pin_length, 1);
    }

    #[test]
    fn test_triple_tap_relocks() {
        let mut lock = LockScreen::new();
        assert!(!lock.tap(0), "Taps on the lock screen itself do nothing");
        assert!(lock.unlock(DecoyKind::Calculator));
        assert!(!lock.unlock(DecoyKind::Notes));

        assert!(!lock.tap(1_000));
        assert!(!lock.tap(1_500));
        assert!(lock.tap(2_000));
        assert_eq!(lock.view(), LockView::Locked);
    }

    #[test]
    fn test_slow_taps_do_not_relock() {
        let mut lock = LockScreen::new();
        lock.unlock(DecoyKind::Notes);
        lock.tap(0);
        lock.tap(900);
        assert!(!lock.tap(2_000));
        assert_eq!(lock.view(), LockView::DecoyShown(DecoyKind::Notes));
    }

    #[test]
    fn test_escape_only_from_nested_decoy() {
        let mut lock = LockScreen::new();
        assert!(!lock.escape());
        lock.unlock(DecoyKind::Browser);
        assert!(lock.escape());
        assert_eq!(lock.view(), LockView::Locked);
    }
}
