//! Raw input routing
//!
//! Touches go to the recognizer, to every zone and (while a nested decoy is
//! showing) to the secret-tap counter. Keys go to the recognizer and the lock
//! screen. Gesture events coming back are turned into trigger requests.

use super::{PanicController, TriggerSource};
use crate::constants::ZONE_HAPTIC_PULSE_MS;
use crate::gesture::{GestureEvent, InputEvent, Key};
use crate::scheduler::Millis;
use log::debug;

impl PanicController {
    /// Apply one input event at `now`, after firing every timer due by then
    pub fn handle_input(&mut self, event: InputEvent, now: Millis) {
        self.advance_to(now);
        let now = self.now;

        let events = match event {
            InputEvent::TouchStart(point) => {
                if self.lock_screen.as_mut().is_some_and(|lock| lock.tap(now)) {
                    self.sync_lock_screen();
                }
                for zone in &mut self.zones {
                    zone.on_touch_start(point, now, &mut self.sched);
                }
                self.recognizer.on_touch_start(point, now, &mut self.sched)
            }
            InputEvent::TouchMove(point) => {
                self.recognizer.on_touch_move(point, now, &mut self.sched)
            }
            InputEvent::TouchEnd(point) => {
                for zone in &mut self.zones {
                    zone.release(&mut self.sched);
                }
                self.recognizer.on_touch_end(point, now, &mut self.sched)
            }
            InputEvent::KeyDown(key) => {
                if key == Key::escape()
                    && self.lock_screen.as_mut().is_some_and(|lock| lock.escape())
                {
                    self.sync_lock_screen();
                }
                self.recognizer.on_key_down(&key, now)
            }
            InputEvent::KeyUp(_) => Vec::new(),
            InputEvent::ZoneKeyDown { zone, key } => {
                match self.zones.get_mut(zone) {
                    Some(target) => target.on_key_down(&key, now, &mut self.sched),
                    None => debug!("Key for unknown zone {} ignored", zone),
                }
                Vec::new()
            }
            InputEvent::ZoneKeyUp { zone, key } => {
                if let Some(target) = self.zones.get_mut(zone) {
                    target.on_key_up(&key, &mut self.sched);
                }
                Vec::new()
            }
        };

        self.handle_gesture_events(events);
    }

    pub(super) fn handle_gesture_events(&mut self, events: Vec<GestureEvent>) {
        for event in events {
            debug!("Gesture: {:?}", event);
            let source = match event {
                GestureEvent::HoldCompleted => TriggerSource::SwipeHold,
                GestureEvent::LongPressCompleted => TriggerSource::LongPress,
                GestureEvent::LongPressZoneActivated { zone, .. } => {
                    let haptics = self.zones.get(zone).is_some_and(|z| z.config().haptics);
                    if haptics {
                        if let Err(e) = self.platform.vibrate(&[ZONE_HAPTIC_PULSE_MS]) {
                            debug!("Zone haptic unavailable: {:#}", e);
                        }
                    }
                    TriggerSource::Zone
                }
                GestureEvent::KeyboardComboDetected { .. }
                | GestureEvent::TriggerKeyPressed { .. } => TriggerSource::Keyboard,
                GestureEvent::SwipeDetected { .. }
                | GestureEvent::HoldArmed { .. }
                | GestureEvent::HoldCancelled => continue,
            };
            self.fire_trigger(source);
        }
    }
}
