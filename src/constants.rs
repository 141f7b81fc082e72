//! Centralized constants for SafeSwipe
//!
//! This module contains all fixed numerical values used throughout
//! the application. Each constant includes documentation on its purpose,
//! unit, and recommended value range.

// ============================================================================
// SWIPE GESTURE
// ============================================================================

/// Minimum upward travel for a touch contact to count as a swipe.
/// Unit: pixels
/// Range: Fixed, tuned for reliable detection on phones
pub const SWIPE_THRESHOLD_PX: f64 = 150.0;

/// Maximum gap between consecutive swipes for them to accumulate.
/// Unit: milliseconds
/// Range: Fixed, also used as the triple-Escape window
pub const SWIPE_TIMEOUT_MS: u64 = 700;

/// Default number of swipes before the hold phase starts.
/// Unit: count
pub const SWIPE_COUNT_DEFAULT: u32 = 3;

/// Minimum configurable swipe count.
/// Unit: count
pub const SWIPE_COUNT_MIN: u32 = 1;

/// Maximum configurable swipe count.
/// Unit: count
pub const SWIPE_COUNT_MAX: u32 = 10;

/// Default hold duration after the last swipe.
/// Unit: tenths of a second (10 = 1.0s)
pub const HOLD_DURATION_DEFAULT_TENTHS: u32 = 10;

/// Minimum configurable hold duration.
/// Unit: tenths of a second
pub const HOLD_DURATION_MIN_TENTHS: u32 = 1;

/// Maximum configurable hold duration.
/// Unit: tenths of a second
pub const HOLD_DURATION_MAX_TENTHS: u32 = 100;

// ============================================================================
// LONG PRESS
// ============================================================================

/// Press-and-hold anywhere on screen fires the trigger after this long.
/// Unit: milliseconds
/// Range: Fixed, deliberately much longer than any normal tap
pub const LONG_PRESS_DURATION_MS: u64 = 3000;

/// Default long-press zone duration.
/// Unit: tenths of a second (15 = 1.5s)
pub const ZONE_DURATION_DEFAULT_TENTHS: u32 = 15;

/// Minimum configurable long-press zone duration.
/// Unit: tenths of a second
pub const ZONE_DURATION_MIN_TENTHS: u32 = 5;

/// Maximum configurable long-press zone duration.
/// Unit: tenths of a second
pub const ZONE_DURATION_MAX_TENTHS: u32 = 100;

/// Short pulse requested when a long-press zone fires with haptics on.
/// Unit: milliseconds
pub const ZONE_HAPTIC_PULSE_MS: u64 = 50;

/// Edge length of the square long-press zone.
/// Unit: pixels
pub const ZONE_SIZE_PX: f64 = 60.0;

// ============================================================================
// KEYBOARD
// ============================================================================

/// Presses of the combo key needed to fire the trigger.
/// Unit: count
pub const KEY_COMBO_PRESSES: u32 = 3;

/// Key used for the triple-press combo.
pub const KEY_COMBO_DEFAULT: &str = "Escape";

/// Default single-key trigger (only active with keyboard triggers enabled).
pub const KEYBOARD_TRIGGER_KEY_DEFAULT: &str = "Escape";

// ============================================================================
// DECOY VIEWS
// ============================================================================

/// Rolling window for the triple-tap secret exit inside a decoy.
/// Unit: milliseconds
pub const SECRET_TAP_WINDOW_MS: u64 = 1000;

/// Taps needed inside the window to leave a decoy view.
/// Unit: count
pub const SECRET_TAP_COUNT: u32 = 3;

/// Lifetime of the "panic mode activated" confirmation flash.
/// Unit: milliseconds
pub const CONFIRMATION_FLASH_MS: u64 = 700;

/// Lifetime of the plain decoy's "activating emergency mode" overlay.
/// Unit: milliseconds
pub const EMERGENCY_OVERLAY_MS: u64 = 800;

/// Delay between trigger and the external-site redirect.
/// Unit: milliseconds
pub const REDIRECT_DELAY_MS: u64 = 800;

/// Digits on the fake lock screen PIN pad before the fake error shows.
/// Unit: count
pub const LOCK_PIN_LENGTH: usize = 4;

/// Time the fake PIN error stays up before the pad clears.
/// Unit: milliseconds
pub const LOCK_PIN_ERROR_MS: u64 = 2000;

/// Cap for the fake lock screen's security-delay counter.
/// Unit: count
pub const LOCK_SECURITY_DELAY_MAX: u8 = 3;

// ============================================================================
// HAPTICS
// ============================================================================

/// Vibration pattern: vibrate, pause, longer vibrate.
/// Unit: milliseconds per segment
pub const VIBRATION_PATTERN_MS: [u64; 3] = [100, 50, 200];

// ============================================================================
// DELAYED PANIC
// ============================================================================

/// Countdown publishing resolution.
/// Unit: milliseconds
pub const COUNTDOWN_TICK_MS: u64 = 1000;

/// Default delayed panic duration.
/// Unit: minutes
pub const DELAYED_PANIC_DEFAULT_MINUTES: u32 = 5;

/// Minimum delayed panic duration.
/// Unit: minutes
pub const DELAYED_PANIC_MIN_MINUTES: u32 = 1;

/// Maximum delayed panic duration (one day).
/// Unit: minutes
pub const DELAYED_PANIC_MAX_MINUTES: u32 = 1440;

// ============================================================================
// RUNTIME
// ============================================================================

/// Background ticker interval for the interactive runtime.
/// Unit: milliseconds
/// Recommended range: 10-100 (timer precision vs. CPU usage)
pub const TICKER_INTERVAL_MS: u64 = 25;

/// Notices kept in the session before the oldest is dropped.
/// Unit: count
pub const NOTICE_HISTORY_LIMIT: usize = 16;

/// Default viewport used when none is given.
/// Unit: pixels
pub const DEFAULT_VIEWPORT: (f64, f64) = (390.0, 844.0);

// ============================================================================
// FILE PERMISSIONS
// ============================================================================

/// Settings file permissions (user read/write only).
/// Unit: Unix permission bits (octal)
pub const SETTINGS_FILE_PERMISSIONS: u32 = 0o600;

/// Permission mask to check for group/other access.
/// Unit: Unix permission bits (octal)
pub const SETTINGS_PERMISSION_MASK_GROUP_OTHER: u32 = 0o077;
