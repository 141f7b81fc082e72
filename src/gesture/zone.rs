//! Long-press zones
//!
//! A zone is a small fixed square at a screen corner or the center. Pressing
//! it (touch, mouse, or Enter/Space while focused) arms one timer; releasing
//! before it expires cancels it. Visibility is a rendering concern only and
//! never changes detection.

use super::{tenths_to_ms, GestureEvent, Key, Point};
use crate::constants::ZONE_SIZE_PX;
use crate::scheduler::{Millis, Scheduler, TimerHandle, TimerKind};
use crate::settings::{PanicSettings, ZoneLocation};
use log::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneConfig {
    pub location: ZoneLocation,
    pub duration_ms: Millis,
    /// Request a vibration when the zone fires
    pub haptics: bool,
}

impl ZoneConfig {
    pub fn from_settings(settings: &PanicSettings) -> Self {
        Self {
            location: settings.long_press_zone_location,
            duration_ms: tenths_to_ms(settings.long_press_duration),
            haptics: settings.vibration_feedback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

impl ZoneLocation {
    /// Resolve the location to its on-screen square for a viewport of `width` x `height`
    pub fn rect(self, (width, height): (f64, f64)) -> Rect {
        let size = ZONE_SIZE_PX;
        let (x, y) = match self {
            ZoneLocation::TopLeft => (0.0, 0.0),
            ZoneLocation::TopRight => (width - size, 0.0),
            ZoneLocation::BottomLeft => (0.0, height - size),
            ZoneLocation::BottomRight => (width - size, height - size),
            ZoneLocation::Center => ((width - size) / 2.0, (height - size) / 2.0),
        };
        Rect {
            x: x.max(0.0),
            y: y.max(0.0),
            width: size,
            height: size,
        }
    }
}

pub struct LongPressZone {
    index: usize,
    config: ZoneConfig,
    rect: Rect,
    timer: Option<TimerHandle>,
}

impl LongPressZone {
    pub fn new(index: usize, config: ZoneConfig, viewport: (f64, f64)) -> Self {
        let rect = config.location.rect(viewport);
        debug!(
            "Long-press zone {} attached at {} ({} ms)",
            index,
            config.location.label(),
            config.duration_ms
        );
        Self {
            index,
            config,
            rect,
            timer: None,
        }
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn is_pressed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn press(&mut self, now: Millis, sched: &mut Scheduler<TimerKind>) {
        sched.rearm(
            &mut self.timer,
            now + self.config.duration_ms,
            TimerKind::Zone(self.index),
        );
    }

    /// Returns true if a pending press was cut short
    pub fn release(&mut self, sched: &mut Scheduler<TimerKind>) -> bool {
        sched.cancel_slot(&mut self.timer)
    }

    pub fn on_touch_start(&mut self, point: Point, now: Millis, sched: &mut Scheduler<TimerKind>) {
        if self.rect.contains(point) {
            self.press(now, sched);
        }
    }

    pub fn on_key_down(&mut self, key: &Key, now: Millis, sched: &mut Scheduler<TimerKind>) {
        // Auto-repeat keydowns must not restart the countdown
        if key.is_activation() && !self.is_pressed() {
            self.press(now, sched);
        }
    }

    pub fn on_key_up(&mut self, key: &Key, sched: &mut Scheduler<TimerKind>) {
        if key.is_activation() {
            self.release(sched);
        }
    }

    pub fn on_elapsed(&mut self, handle: TimerHandle) -> Option<GestureEvent> {
        if self.timer != Some(handle) {
            return None;
        }
        self.timer = None;
        info!("Long-press zone at {} activated", self.config.location.label());
        Some(GestureEvent::LongPressZoneActivated {
            zone: self.index,
            location: self.config.location,
        })
    }

    pub fn detach(&mut self, sched: &mut Scheduler<TimerKind>) {
        self.release(sched);
    }

    /// Screen-reader label for the zone
    pub fn accessibility_label(&self) -> String {
        format!(
            "Long press emergency zone at {}. Hold for {:.1} seconds to activate panic mode",
            self.config.location.label(),
            self.config.duration_ms as f64 / 1000.0
        )
    }
}

/// Zones are only drawn when both accessibility toggles are on
pub fn zones_visible(settings: &PanicSettings) -> bool {
    settings.accessibility_mode && settings.show_trigger_zones
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: (f64, f64) = (400.0, 800.0);

    fn zone(location: ZoneLocation, tenths: u32) -> LongPressZone {
        LongPressZone::new(
            0,
            ZoneConfig {
                location,
                duration_ms: tenths_to_ms(tenths),
                haptics: false,
            },
            VIEWPORT,
        )
    }

    #[test]
    fn test_location_rects() {
        assert_eq!(
            ZoneLocation::BottomRight.rect(VIEWPORT),
            Rect {
                x: 340.0,
                y: 740.0,
                width: 60.0,
                height: 60.0
            }
        );
        assert_eq!(ZoneLocation::TopLeft.rect(VIEWPORT).x, 0.0);
        let center = ZoneLocation::Center.rect(VIEWPORT);
        assert!(center.contains(Point::new(200.0, 400.0)));
    }

    #[test]
    fn test_touch_outside_zone_ignored() {
        let mut sched = Scheduler::new();
        let mut zone = zone(ZoneLocation::BottomRight, 15);
        zone.on_touch_start(Point::new(10.0, 10.0), 0, &mut sched);
        assert!(!zone.is_pressed());
        assert!(sched.is_empty());
    }

    #[test]
    fn test_duration_converted_from_tenths() {
        let mut sched = Scheduler::new();
        let mut zone = zone(ZoneLocation::BottomRight, 15);
        zone.on_touch_start(Point::new(390.0, 790.0), 100, &mut sched);
        assert_eq!(sched.next_deadline(), Some(1_600));
    }

    #[test]
    fn test_release_before_expiry_cancels() {
        let mut sched = Scheduler::new();
        let mut zone = zone(ZoneLocation::TopLeft, 15);
        zone.press(0, &mut sched);
        assert!(zone.release(&mut sched));
        assert!(sched.pop_due(10_000).is_none());
        assert!(!zone.release(&mut sched));
    }

    #[test]
    fn test_expiry_reports_location() {
        let mut sched = Scheduler::new();
        let mut zone = zone(ZoneLocation::Center, 10);
        zone.press(0, &mut sched);
        let (handle, at, _) = sched.pop_due(1_000).expect("zone timer due");
        assert_eq!(at, 1_000);
        assert_eq!(
            zone.on_elapsed(handle),
            Some(GestureEvent::LongPressZoneActivated {
                zone: 0,
                location: ZoneLocation::Center
            })
        );
        assert!(!zone.is_pressed());
    }

    #[test]
    fn test_expiry_reports_own_index() {
        let mut sched = Scheduler::new();
        let config = ZoneConfig {
            location: ZoneLocation::TopLeft,
            duration_ms: 500,
            haptics: true,
        };
        let mut zone = LongPressZone::new(2, config, VIEWPORT);
        zone.press(0, &mut sched);
        let (handle, _, kind) = sched.pop_due(500).expect("zone timer due");
        assert_eq!(kind, TimerKind::Zone(2));
        assert_eq!(
            zone.on_elapsed(handle),
            Some(GestureEvent::LongPressZoneActivated {
                zone: 2,
                location: ZoneLocation::TopLeft
            })
        );
    }

    #[test]
    fn test_keyboard_press_and_release() {
        let mut sched = Scheduler::new();
        let mut zone = zone(ZoneLocation::TopRight, 20);

        zone.on_key_down(&Key::new("a"), 0, &mut sched);
        assert!(!zone.is_pressed());

        zone.on_key_down(&Key::enter(), 0, &mut sched);
        zone.on_key_down(&Key::enter(), 500, &mut sched);
        assert_eq!(sched.next_deadline(), Some(2_000), "Key repeat must not restart");

        zone.on_key_up(&Key::enter(), &mut sched);
        assert!(sched.is_empty());
    }

    #[test]
    fn test_accessibility_label() {
        let zone = zone(ZoneLocation::BottomRight, 15);
        assert_eq!(
            zone.accessibility_label(),
            "Long press emergency zone at bottom right. Hold for 1.5 seconds to activate panic mode"
        );
    }

    #[test]
    fn test_visibility_needs_both_toggles() {
        let mut settings = PanicSettings::default();
        assert!(!zones_visible(&settings));
        settings.accessibility_mode = true;
        assert!(!zones_visible(&settings));
        settings.show_trigger_zones = true;
        assert!(zones_visible(&settings));
    }
}
