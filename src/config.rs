//! Environment overrides for SafeSwipe
//!
//! The settings file is the primary configuration source (see the store
//! module). These environment variables can optionally override it for one
//! run without touching the file:
//!
//! - SAFESWIPE_SETTINGS: Path of the settings file
//! - SAFESWIPE_SWIPE_COUNT: Swipes before the hold phase (1-10)
//! - SAFESWIPE_DELAYED_PANIC_MINUTES: Arm delayed panic for this many minutes (1-1440)

use crate::constants::{
    DELAYED_PANIC_MAX_MINUTES, DELAYED_PANIC_MIN_MINUTES, SWIPE_COUNT_MAX, SWIPE_COUNT_MIN,
};
use crate::settings::SettingsPatch;
use log::{debug, info, warn};
use std::env;
use std::path::PathBuf;

pub const SETTINGS_PATH_VAR: &str = "SAFESWIPE_SETTINGS";
pub const SWIPE_COUNT_VAR: &str = "SAFESWIPE_SWIPE_COUNT";
pub const DELAYED_PANIC_VAR: &str = "SAFESWIPE_DELAYED_PANIC_MINUTES";

/// Parse the SAFESWIPE_SETTINGS environment variable
pub fn parse_settings_path() -> Option<PathBuf> {
    match env::var(SETTINGS_PATH_VAR) {
        Ok(val) if !val.trim().is_empty() => {
            info!("Settings file set via environment variable: {}", val);
            Some(PathBuf::from(val))
        }
        Ok(_) => {
            warn!("{} is empty. Using default settings path.", SETTINGS_PATH_VAR);
            None
        }
        Err(_) => {
            debug!("{} not set.", SETTINGS_PATH_VAR);
            None
        }
    }
}

/// Parse the SAFESWIPE_SWIPE_COUNT environment variable
///
/// Returns Some(count) if valid (1-10), None if not set or invalid
pub fn parse_swipe_count() -> Option<u32> {
    parse_ranged(SWIPE_COUNT_VAR, "swipe count", SWIPE_COUNT_MIN, SWIPE_COUNT_MAX)
}

/// Parse the SAFESWIPE_DELAYED_PANIC_MINUTES environment variable
///
/// Returns Some(minutes) if valid (1-1440), None if not set or invalid
pub fn parse_delayed_panic_minutes() -> Option<u32> {
    parse_ranged(
        DELAYED_PANIC_VAR,
        "delayed panic minutes",
        DELAYED_PANIC_MIN_MINUTES,
        DELAYED_PANIC_MAX_MINUTES,
    )
}

/// Collect every valid override into one patch
pub fn env_overrides() -> SettingsPatch {
    let mut patch = SettingsPatch {
        swipe_count: parse_swipe_count(),
        ..SettingsPatch::default()
    };
    if let Some(minutes) = parse_delayed_panic_minutes() {
        patch.delayed_panic_enabled = Some(true);
        patch.delayed_panic_minutes = Some(minutes);
    }
    patch
}

fn parse_ranged(var: &str, what: &str, min: u32, max: u32) -> Option<u32> {
    match env::var(var) {
        Ok(val) => match val.parse::<u32>() {
            Ok(n) if (min..=max).contains(&n) => {
                info!("{} set via environment variable: {}", what, n);
                Some(n)
            }
            Ok(n) => {
                warn!(
                    "Invalid {}: {} (must be {}-{}). Using settings file.",
                    what, n, min, max
                );
                None
            }
            Err(e) => {
                warn!("Failed to parse {}: {}. Using settings file.", var, e);
                None
            }
        },
        Err(_) => {
            debug!("{} not set.", var);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its variable so parallel tests never race on one name

    #[test]
    fn test_parse_swipe_count_values() {
        env::set_var(SWIPE_COUNT_VAR, "1");
        assert_eq!(parse_swipe_count(), Some(1), "Should accept minimum");

        env::set_var(SWIPE_COUNT_VAR, "10");
        assert_eq!(parse_swipe_count(), Some(10), "Should accept maximum");

        env::set_var(SWIPE_COUNT_VAR, "0");
        assert_eq!(parse_swipe_count(), None, "Should reject 0");

        env::set_var(SWIPE_COUNT_VAR, "11");
        assert_eq!(parse_swipe_count(), None, "Should reject 11");

        env::set_var(SWIPE_COUNT_VAR, "three");
        assert_eq!(parse_swipe_count(), None, "Should reject non-numeric value");

        env::remove_var(SWIPE_COUNT_VAR);
        assert_eq!(parse_swipe_count(), None, "Should return None when not set");
    }

    #[test]
    fn test_parse_delayed_panic_boundaries() {
        env::set_var(DELAYED_PANIC_VAR, "1440");
        assert_eq!(parse_delayed_panic_minutes(), Some(1440));

        env::set_var(DELAYED_PANIC_VAR, "1441");
        assert_eq!(parse_delayed_panic_minutes(), None);

        env::set_var(DELAYED_PANIC_VAR, "-5");
        assert_eq!(parse_delayed_panic_minutes(), None);

        env::remove_var(DELAYED_PANIC_VAR);
    }

    #[test]
    fn test_parse_settings_path() {
        env::set_var(SETTINGS_PATH_VAR, "/tmp/safeswipe/settings.toml");
        assert_eq!(
            parse_settings_path(),
            Some(PathBuf::from("/tmp/safeswipe/settings.toml"))
        );

        env::set_var(SETTINGS_PATH_VAR, "  ");
        assert_eq!(parse_settings_path(), None);

        env::remove_var(SETTINGS_PATH_VAR);
        assert_eq!(parse_settings_path(), None);
    }

    #[test]
    fn test_parse_ranged_unset_variable() {
        env::remove_var("SAFESWIPE_TEST_UNSET_VALUE");
        assert_eq!(parse_ranged("SAFESWIPE_TEST_UNSET_VALUE", "value", 1, 5), None);

        env::set_var("SAFESWIPE_TEST_RANGED_VALUE", "3");
        assert_eq!(parse_ranged("SAFESWIPE_TEST_RANGED_VALUE", "value", 1, 5), Some(3));
        env::remove_var("SAFESWIPE_TEST_RANGED_VALUE");
    }
}
