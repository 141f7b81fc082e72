pub mod counter;
pub mod recognizer;
pub mod zone;

use crate::constants::{
    KEY_COMBO_DEFAULT, KEY_COMBO_PRESSES, LONG_PRESS_DURATION_MS, SWIPE_THRESHOLD_PX,
    SWIPE_TIMEOUT_MS,
};
use crate::scheduler::Millis;
use crate::settings::{PanicSettings, ZoneLocation};
use std::fmt;

/// Screen coordinate in CSS pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Keyboard key by its DOM-style name ("Escape", "Enter", " ", "p")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn escape() -> Self {
        Self::new("Escape")
    }

    pub fn enter() -> Self {
        Self::new("Enter")
    }

    pub fn space() -> Self {
        Self::new(" ")
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Enter and Space activate focused controls
    pub fn is_activation(&self) -> bool {
        self.0 == "Enter" || self.0 == " "
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == " " {
            f.write_str("Space")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Raw input delivered to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    TouchStart(Point),
    TouchMove(Point),
    /// Final position of the contact, when the platform reports one
    TouchEnd(Option<Point>),
    KeyDown(Key),
    KeyUp(Key),
    /// Key pressed while a long-press zone has keyboard focus
    ZoneKeyDown { zone: usize, key: Key },
    ZoneKeyUp { zone: usize, key: Key },
}

/// Discrete events produced by the detectors
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    SwipeDetected { count: u32, required: u32 },
    HoldArmed { deadline: Millis },
    HoldCompleted,
    HoldCancelled,
    LongPressCompleted,
    LongPressZoneActivated { zone: usize, location: ZoneLocation },
    KeyboardComboDetected { key: Key, presses: u32 },
    TriggerKeyPressed { key: Key },
}

impl GestureEvent {
    /// Whether this event should flip the session into panic
    pub fn is_trigger(&self) -> bool {
        matches!(
            self,
            GestureEvent::HoldCompleted
                | GestureEvent::LongPressCompleted
                | GestureEvent::LongPressZoneActivated { .. }
                | GestureEvent::KeyboardComboDetected { .. }
                | GestureEvent::TriggerKeyPressed { .. }
        )
    }
}

/// Recognizer parameters, derived from the settings snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct GestureConfig {
    pub swipe_count: u32,
    pub hold_duration_ms: Millis,
    pub swipe_timeout_ms: Millis,
    pub swipe_threshold_px: f64,
    pub long_press_ms: Millis,
    /// Single key that fires immediately (None = keyboard triggers disabled)
    pub trigger_key: Option<Key>,
    pub combo_key: Key,
    pub combo_presses: u32,
}

impl GestureConfig {
    pub fn from_settings(settings: &PanicSettings) -> Self {
        Self {
            swipe_count: settings.swipe_count,
            hold_duration_ms: tenths_to_ms(settings.hold_duration),
            trigger_key: settings
                .enable_keyboard_triggers
                .then(|| Key::new(settings.keyboard_trigger_key.clone())),
            ..Self::default()
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_count: crate::constants::SWIPE_COUNT_DEFAULT,
            hold_duration_ms: tenths_to_ms(crate::constants::HOLD_DURATION_DEFAULT_TENTHS),
            swipe_timeout_ms: SWIPE_TIMEOUT_MS,
            swipe_threshold_px: SWIPE_THRESHOLD_PX,
            long_press_ms: LONG_PRESS_DURATION_MS,
            trigger_key: None,
            combo_key: Key::new(KEY_COMBO_DEFAULT),
            combo_presses: KEY_COMBO_PRESSES,
        }
    }
}

/// Settings store durations in tenths of a second
pub fn tenths_to_ms(tenths: u32) -> Millis {
    u64::from(tenths) * 100
}
