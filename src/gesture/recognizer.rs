//! Swipe-and-hold, long-press and keyboard trigger detection
//!
//! The recognizer turns raw touch and key events into `GestureEvent`s. It knows
//! nothing about panic state: the controller decides what a completed gesture
//! means. Each concern owns exactly one timer slot, and arming a slot always
//! cancels whatever it held before, so a gesture can never fire twice.

use super::counter::WindowedCounter;
use super::{GestureConfig, GestureEvent, Key, Point};
use crate::scheduler::{Millis, Scheduler, TimerHandle, TimerKind};
use log::{debug, info};

pub struct GestureRecognizer {
    config: GestureConfig,
    /// Where the current contact started (None between contacts)
    touch_start: Option<Point>,
    /// A swipe was already counted for the current contact
    swipe_latched: bool,
    swipes: WindowedCounter,
    hold_timer: Option<TimerHandle>,
    long_press_timer: Option<TimerHandle>,
    combo: WindowedCounter,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        let swipes = WindowedCounter::new(config.swipe_timeout_ms);
        let combo = WindowedCounter::new(config.swipe_timeout_ms);
        Self {
            config,
            touch_start: None,
            swipe_latched: false,
            swipes,
            hold_timer: None,
            long_press_timer: None,
            combo,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Swap in new parameters. Any gesture in progress is abandoned.
    pub fn reconfigure(&mut self, config: GestureConfig, sched: &mut Scheduler<TimerKind>) {
        if config == self.config {
            return;
        }
        self.detach(sched);
        debug!(
            "Recognizer reconfigured: {} swipes, {} ms hold",
            config.swipe_count, config.hold_duration_ms
        );
        *self = Self::new(config);
    }

    pub fn swipe_count(&self) -> u32 {
        self.swipes.count()
    }

    pub fn is_holding(&self) -> bool {
        self.hold_timer.is_some()
    }

    pub fn is_long_pressing(&self) -> bool {
        self.long_press_timer.is_some()
    }

    pub fn on_touch_start(
        &mut self,
        point: Point,
        now: Millis,
        sched: &mut Scheduler<TimerKind>,
    ) -> Vec<GestureEvent> {
        self.touch_start = Some(point);
        self.swipe_latched = false;

        if self.long_press_timer.is_none() {
            sched.rearm(
                &mut self.long_press_timer,
                now + self.config.long_press_ms,
                TimerKind::LongPress,
            );
        }
        Vec::new()
    }

    pub fn on_touch_move(
        &mut self,
        point: Point,
        now: Millis,
        sched: &mut Scheduler<TimerKind>,
    ) -> Vec<GestureEvent> {
        let Some(start) = self.touch_start else {
            debug!("Ignoring touch move without a touch start");
            return Vec::new();
        };
        if self.swipe_latched || !self.is_upward_swipe(start, point) {
            return Vec::new();
        }

        self.swipe_latched = true;
        let mut events = vec![self.count_swipe(now)];

        if self.swipes.count() >= self.config.swipe_count && self.hold_timer.is_none() {
            let deadline = now + self.config.hold_duration_ms;
            sched.rearm(&mut self.hold_timer, deadline, TimerKind::SwipeHold);
            debug!("Hold for {} ms to activate", self.config.hold_duration_ms);
            events.push(GestureEvent::HoldArmed { deadline });
        }
        events
    }

    pub fn on_touch_end(
        &mut self,
        point: Option<Point>,
        now: Millis,
        sched: &mut Scheduler<TimerKind>,
    ) -> Vec<GestureEvent> {
        let mut events = Vec::new();

        // Fallback for platforms that never deliver touch moves. Only the
        // vertical travel is checked here.
        if let (Some(start), Some(end)) = (self.touch_start, point) {
            if !self.swipe_latched && start.y - end.y > self.config.swipe_threshold_px {
                events.push(self.count_swipe(now));
            }
        }

        self.touch_start = None;
        self.swipe_latched = false;

        if sched.cancel_slot(&mut self.hold_timer) {
            debug!("Hold interrupted by release - swipe count reset");
            self.swipes.reset();
            events.push(GestureEvent::HoldCancelled);
        }
        sched.cancel_slot(&mut self.long_press_timer);
        events
    }

    pub fn on_key_down(&mut self, key: &Key, now: Millis) -> Vec<GestureEvent> {
        let mut events = Vec::new();

        if self.config.trigger_key.as_ref() == Some(key) {
            info!("Keyboard trigger ({} key)", key);
            events.push(GestureEvent::TriggerKeyPressed { key: key.clone() });
        }

        if *key == self.config.combo_key {
            let presses = self.combo.register(now);
            debug!("{} press {} of {}", key, presses, self.config.combo_presses);
            if presses >= self.config.combo_presses {
                info!("Keyboard trigger (triple {})", key);
                self.combo.reset();
                events.push(GestureEvent::KeyboardComboDetected {
                    key: key.clone(),
                    presses,
                });
            }
        }
        events
    }

    /// The hold timer fired without being interrupted
    pub fn on_hold_elapsed(&mut self, handle: TimerHandle) -> Option<GestureEvent> {
        if self.hold_timer != Some(handle) {
            return None;
        }
        self.hold_timer = None;
        self.swipes.reset();
        info!("Swipe-and-hold gesture completed");
        Some(GestureEvent::HoldCompleted)
    }

    pub fn on_long_press_elapsed(&mut self, handle: TimerHandle) -> Option<GestureEvent> {
        if self.long_press_timer != Some(handle) {
            return None;
        }
        self.long_press_timer = None;
        info!("Long press gesture completed");
        Some(GestureEvent::LongPressCompleted)
    }

    /// Cancel every timer and forget all progress
    pub fn detach(&mut self, sched: &mut Scheduler<TimerKind>) {
        sched.cancel_slot(&mut self.hold_timer);
        sched.cancel_slot(&mut self.long_press_timer);
        self.touch_start = None;
        self.swipe_latched = false;
        self.swipes.reset();
        self.combo.reset();
    }

    fn is_upward_swipe(&self, start: Point, current: Point) -> bool {
        let dy = start.y - current.y;
        let dx = (start.x - current.x).abs();
        dy > self.config.swipe_threshold_px && dx < dy / 2.0
    }

    fn count_swipe(&mut self, now: Millis) -> GestureEvent {
        let count = self.swipes.register(now);
        debug!("Swipe {} of {}", count, self.config.swipe_count);
        GestureEvent::SwipeDetected {
            count,
            required: self.config.swipe_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swipe(
        rec: &mut GestureRecognizer,
        sched: &mut Scheduler<TimerKind>,
        at: Millis,
    ) -> Vec<GestureEvent> {
        rec.on_touch_start(Point::new(200.0, 700.0), at, sched);
        rec.on_touch_move(Point::new(210.0, 400.0), at + 50, sched)
    }

    fn release(rec: &mut GestureRecognizer, sched: &mut Scheduler<TimerKind>, at: Millis) {
        rec.on_touch_end(Some(Point::new(210.0, 400.0)), at, sched);
    }

    #[test]
    fn test_consecutive_swipes_accumulate() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        swipe(&mut rec, &mut sched, 0);
        release(&mut rec, &mut sched, 100);
        swipe(&mut rec, &mut sched, 400);
        release(&mut rec, &mut sched, 500);

        assert_eq!(rec.swipe_count(), 2);
        assert!(!rec.is_holding());
    }

    #[test]
    fn test_only_one_swipe_per_contact() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        rec.on_touch_start(Point::new(100.0, 800.0), 0, &mut sched);
        rec.on_touch_move(Point::new(100.0, 600.0), 20, &mut sched);
        rec.on_touch_move(Point::new(100.0, 300.0), 40, &mut sched);
        rec.on_touch_end(Some(Point::new(100.0, 300.0)), 60, &mut sched);

        assert_eq!(rec.swipe_count(), 1);
    }

    #[test]
    fn test_diagonal_and_short_moves_rejected() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        rec.on_touch_start(Point::new(0.0, 800.0), 0, &mut sched);
        // dy = 200, dx = 150 > dy / 2
        assert!(rec.on_touch_move(Point::new(150.0, 600.0), 10, &mut sched).is_empty());
        rec.on_touch_end(None, 20, &mut sched);

        rec.on_touch_start(Point::new(0.0, 800.0), 30, &mut sched);
        // dy = 150 is not strictly greater than the threshold
        assert!(rec.on_touch_move(Point::new(0.0, 650.0), 40, &mut sched).is_empty());

        assert_eq!(rec.swipe_count(), 0);
    }

    #[test]
    fn test_reaching_count_arms_single_hold_timer() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        swipe(&mut rec, &mut sched, 0);
        release(&mut rec, &mut sched, 100);
        swipe(&mut rec, &mut sched, 300);
        release(&mut rec, &mut sched, 400);
        let events = swipe(&mut rec, &mut sched, 600);

        assert!(events.contains(&GestureEvent::HoldArmed { deadline: 1_650 }));
        assert!(rec.is_holding());
        // hold + long press
        assert_eq!(sched.len(), 2);
    }

    #[test]
    fn test_release_during_hold_cancels_and_resets() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig {
            swipe_count: 1,
            ..GestureConfig::default()
        });

        swipe(&mut rec, &mut sched, 0);
        let events = rec.on_touch_end(None, 500, &mut sched);

        assert_eq!(events, vec![GestureEvent::HoldCancelled]);
        assert_eq!(rec.swipe_count(), 0);
        assert!(sched.is_empty(), "No timer may survive the release");
    }

    #[test]
    fn test_hold_elapsed_completes_once() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig {
            swipe_count: 1,
            ..GestureConfig::default()
        });

        swipe(&mut rec, &mut sched, 0);
        let (handle, _, kind) = sched.pop_due(1_050).expect("hold timer due");
        assert_eq!(kind, TimerKind::SwipeHold);

        assert_eq!(rec.on_hold_elapsed(handle), Some(GestureEvent::HoldCompleted));
        assert_eq!(rec.on_hold_elapsed(handle), None);
        assert_eq!(rec.swipe_count(), 0);
    }

    #[test]
    fn test_touch_end_fallback_counts_unlatched_swipe() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        rec.on_touch_start(Point::new(50.0, 700.0), 0, &mut sched);
        let events = rec.on_touch_end(Some(Point::new(50.0, 300.0)), 80, &mut sched);

        assert_eq!(
            events,
            vec![GestureEvent::SwipeDetected {
                count: 1,
                required: 3
            }]
        );
    }

    #[test]
    fn test_touch_end_fallback_ignores_horizontal_drift() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        // dy = 200, dx = 180: rejected as a move, accepted on release
        rec.on_touch_start(Point::new(0.0, 700.0), 0, &mut sched);
        assert!(rec.on_touch_move(Point::new(180.0, 500.0), 20, &mut sched).is_empty());
        rec.on_touch_end(Some(Point::new(180.0, 500.0)), 40, &mut sched);
        assert_eq!(rec.swipe_count(), 1);

        // Not far enough up
        rec.on_touch_start(Point::new(0.0, 700.0), 100, &mut sched);
        rec.on_touch_end(Some(Point::new(0.0, 550.0)), 140, &mut sched);
        assert_eq!(rec.swipe_count(), 1);
    }

    #[test]
    fn test_long_press_cancelled_on_release() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        rec.on_touch_start(Point::new(10.0, 10.0), 0, &mut sched);
        assert!(rec.is_long_pressing());
        rec.on_touch_end(None, 2_999, &mut sched);
        assert!(!rec.is_long_pressing());
        assert!(sched.pop_due(10_000).is_none());
    }

    #[test]
    fn test_triple_escape_combo() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let esc = Key::escape();

        assert!(rec.on_key_down(&esc, 0).is_empty());
        assert!(rec.on_key_down(&esc, 600).is_empty());
        let events = rec.on_key_down(&esc, 1_200);
        assert_eq!(
            events,
            vec![GestureEvent::KeyboardComboDetected {
                key: esc.clone(),
                presses: 3
            }]
        );
        // Counter starts over after firing
        assert!(rec.on_key_down(&esc, 1_300).is_empty());
    }

    #[test]
    fn test_slow_escape_presses_do_not_fire() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let esc = Key::escape();

        rec.on_key_down(&esc, 0);
        rec.on_key_down(&esc, 500);
        assert!(rec.on_key_down(&esc, 1_500).is_empty());
    }

    #[test]
    fn test_trigger_key_fires_immediately() {
        let mut rec = GestureRecognizer::new(GestureConfig {
            trigger_key: Some(Key::new("p")),
            ..GestureConfig::default()
        });

        let events = rec.on_key_down(&Key::new("p"), 0);
        assert_eq!(
            events,
            vec![GestureEvent::TriggerKeyPressed { key: Key::new("p") }]
        );
        assert!(rec.on_key_down(&Key::new("q"), 10).is_empty());
    }

    #[test]
    fn test_detach_clears_all_timers() {
        let mut sched = Scheduler::new();
        let mut rec = GestureRecognizer::new(GestureConfig {
            swipe_count: 1,
            ..GestureConfig::default()
        });

        swipe(&mut rec, &mut sched, 0);
        assert_eq!(sched.len(), 2);
        rec.detach(&mut sched);
        assert!(sched.is_empty());
        assert_eq!(rec.swipe_count(), 0);
    }
}
