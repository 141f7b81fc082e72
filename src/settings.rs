//! Panic settings and protected-app records
//!
//! `PanicSettings` is the full configuration record. Every field has a default,
//! and a missing field on read falls back to that default. Updates go through
//! `SettingsPatch`, which only overwrites the fields it carries.
//!
//! Field names on disk are the camelCase names shared with the settings store.

use crate::constants::{
    DELAYED_PANIC_DEFAULT_MINUTES, DELAYED_PANIC_MAX_MINUTES, DELAYED_PANIC_MIN_MINUTES,
    HOLD_DURATION_DEFAULT_TENTHS, HOLD_DURATION_MAX_TENTHS, HOLD_DURATION_MIN_TENTHS,
    KEYBOARD_TRIGGER_KEY_DEFAULT, SWIPE_COUNT_DEFAULT, SWIPE_COUNT_MAX, SWIPE_COUNT_MIN,
    ZONE_DURATION_DEFAULT_TENTHS, ZONE_DURATION_MAX_TENTHS, ZONE_DURATION_MIN_TENTHS,
};
use crate::decoy::DecoyType;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Where the long-press zone sits on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ZoneLocation {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl ZoneLocation {
    pub const ALL: [ZoneLocation; 5] = [
        ZoneLocation::TopLeft,
        ZoneLocation::TopRight,
        ZoneLocation::BottomLeft,
        ZoneLocation::BottomRight,
        ZoneLocation::Center,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneLocation::TopLeft => "top_left",
            ZoneLocation::TopRight => "top_right",
            ZoneLocation::BottomLeft => "bottom_left",
            ZoneLocation::BottomRight => "bottom_right",
            ZoneLocation::Center => "center",
        }
    }

    /// Human-readable name for labels
    pub fn label(self) -> &'static str {
        match self {
            ZoneLocation::TopLeft => "top left",
            ZoneLocation::TopRight => "top right",
            ZoneLocation::BottomLeft => "bottom left",
            ZoneLocation::BottomRight => "bottom right",
            ZoneLocation::Center => "center",
        }
    }
}

impl From<String> for ZoneLocation {
    fn from(value: String) -> Self {
        Self::ALL
            .into_iter()
            .find(|loc| loc.as_str() == value)
            .unwrap_or_else(|| {
                log::warn!("Unknown long-press zone location '{}', using bottom_right", value);
                ZoneLocation::BottomRight
            })
    }
}

impl From<ZoneLocation> for String {
    fn from(value: ZoneLocation) -> Self {
        value.as_str().to_string()
    }
}

/// Fake system alert shown over the plain decoy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum SystemAlertType {
    #[default]
    LowBattery,
    SystemUpdate,
    StorageFull,
    NetworkLost,
}

impl SystemAlertType {
    pub const ALL: [SystemAlertType; 4] = [
        SystemAlertType::LowBattery,
        SystemAlertType::SystemUpdate,
        SystemAlertType::StorageFull,
        SystemAlertType::NetworkLost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SystemAlertType::LowBattery => "low_battery",
            SystemAlertType::SystemUpdate => "system_update",
            SystemAlertType::StorageFull => "storage_full",
            SystemAlertType::NetworkLost => "network_lost",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SystemAlertType::LowBattery => "Low Battery Warning",
            SystemAlertType::SystemUpdate => "System Update Required",
            SystemAlertType::StorageFull => "Storage Almost Full",
            SystemAlertType::NetworkLost => "Network Connection Lost",
        }
    }
}

impl From<String> for SystemAlertType {
    fn from(value: String) -> Self {
        Self::ALL
            .into_iter()
            .find(|alert| alert.as_str() == value)
            .unwrap_or_else(|| {
                log::warn!("Unknown system alert type '{}', using low_battery", value);
                SystemAlertType::LowBattery
            })
    }
}

impl From<SystemAlertType> for String {
    fn from(value: SystemAlertType) -> Self {
        value.as_str().to_string()
    }
}

/// What happens to a protected app when panic triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisguiseType {
    #[default]
    Hide,
    Disguise,
    Crash,
    Uninstall,
}

/// Full panic configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanicSettings {
    // Trigger
    pub gesture_type: String,
    pub swipe_count: u32,
    /// Tenths of a second
    pub hold_duration: u32,
    pub work_with_screen_locked: bool,
    pub vibration_feedback: bool,
    // Clean-up
    pub clear_browser_tabs: bool,
    pub clear_clipboard: bool,
    pub clear_browser_history: bool,
    pub burn_mode: bool,
    // Decoy
    pub decoy_type: DecoyType,
    pub randomize_decoy: bool,
    pub fake_system_alert: bool,
    pub system_alert_type: SystemAlertType,
    pub disable_notifications: bool,
    pub randomize_external_site: bool,
    // Long-press zone
    pub enable_long_press_zone: bool,
    pub long_press_zone_location: ZoneLocation,
    /// Tenths of a second
    pub long_press_duration: u32,
    pub enable_fake_lock_screen: bool,
    // Timed panic
    pub delayed_panic_enabled: bool,
    pub delayed_panic_minutes: u32,
    // Accessibility
    pub accessibility_mode: bool,
    pub show_trigger_zones: bool,
    pub high_contrast_mode: bool,
    pub larger_text: bool,
    pub reduce_motion: bool,
    pub enable_keyboard_triggers: bool,
    pub keyboard_trigger_key: String,
    pub enable_voice_instructions: bool,
}

impl Default for PanicSettings {
    fn default() -> Self {
        Self {
            gesture_type: "triple_swipe_up".to_string(),
            swipe_count: SWIPE_COUNT_DEFAULT,
            hold_duration: HOLD_DURATION_DEFAULT_TENTHS,
            work_with_screen_locked: true,
            vibration_feedback: true,
            clear_browser_tabs: true,
            clear_clipboard: true,
            clear_browser_history: true,
            burn_mode: false,
            decoy_type: DecoyType::FakeLockScreen,
            randomize_decoy: false,
            fake_system_alert: true,
            system_alert_type: SystemAlertType::LowBattery,
            disable_notifications: true,
            randomize_external_site: false,
            enable_long_press_zone: false,
            long_press_zone_location: ZoneLocation::BottomRight,
            long_press_duration: ZONE_DURATION_DEFAULT_TENTHS,
            enable_fake_lock_screen: false,
            delayed_panic_enabled: false,
            delayed_panic_minutes: DELAYED_PANIC_DEFAULT_MINUTES,
            accessibility_mode: false,
            show_trigger_zones: false,
            high_contrast_mode: false,
            larger_text: false,
            reduce_motion: false,
            enable_keyboard_triggers: false,
            keyboard_trigger_key: KEYBOARD_TRIGGER_KEY_DEFAULT.to_string(),
            enable_voice_instructions: false,
        }
    }
}

impl PanicSettings {
    /// Check numeric ranges and required strings
    pub fn validate(&self) -> Result<()> {
        check_range(
            "swipeCount",
            self.swipe_count,
            SWIPE_COUNT_MIN,
            SWIPE_COUNT_MAX,
        )?;
        check_range(
            "holdDuration",
            self.hold_duration,
            HOLD_DURATION_MIN_TENTHS,
            HOLD_DURATION_MAX_TENTHS,
        )?;
        check_range(
            "longPressDuration",
            self.long_press_duration,
            ZONE_DURATION_MIN_TENTHS,
            ZONE_DURATION_MAX_TENTHS,
        )?;
        check_range(
            "delayedPanicMinutes",
            self.delayed_panic_minutes,
            DELAYED_PANIC_MIN_MINUTES,
            DELAYED_PANIC_MAX_MINUTES,
        )?;
        if self.keyboard_trigger_key.is_empty() {
            bail!("keyboardTriggerKey must not be empty");
        }
        Ok(())
    }

    /// Whether a trigger should show the fake lock screen flow
    pub fn uses_fake_lock_screen(&self) -> bool {
        self.enable_fake_lock_screen || self.decoy_type == DecoyType::FakeLockScreen
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if !(min..=max).contains(&value) {
        bail!("{} must be {}-{} (got {})", field, min, max, value);
    }
    Ok(())
}

/// Partial update: `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub gesture_type: Option<String>,
    pub swipe_count: Option<u32>,
    pub hold_duration: Option<u32>,
    pub work_with_screen_locked: Option<bool>,
    pub vibration_feedback: Option<bool>,
    pub clear_browser_tabs: Option<bool>,
    pub clear_clipboard: Option<bool>,
    pub clear_browser_history: Option<bool>,
    pub burn_mode: Option<bool>,
    pub decoy_type: Option<DecoyType>,
    pub randomize_decoy: Option<bool>,
    pub fake_system_alert: Option<bool>,
    pub system_alert_type: Option<SystemAlertType>,
    pub disable_notifications: Option<bool>,
    pub randomize_external_site: Option<bool>,
    pub enable_long_press_zone: Option<bool>,
    pub long_press_zone_location: Option<ZoneLocation>,
    pub long_press_duration: Option<u32>,
    pub enable_fake_lock_screen: Option<bool>,
    pub delayed_panic_enabled: Option<bool>,
    pub delayed_panic_minutes: Option<u32>,
    pub accessibility_mode: Option<bool>,
    pub show_trigger_zones: Option<bool>,
    pub high_contrast_mode: Option<bool>,
    pub larger_text: Option<bool>,
    pub reduce_motion: Option<bool>,
    pub enable_keyboard_triggers: Option<bool>,
    pub keyboard_trigger_key: Option<String>,
    pub enable_voice_instructions: Option<bool>,
}

macro_rules! merge_fields {
    ($patch:expr, $target:expr, $($field:ident),* $(,)?) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = value.clone();
            }
        )*
    };
}

impl SettingsPatch {
    /// Overwrite the fields this patch carries
    pub fn apply_to(&self, settings: &mut PanicSettings) {
        merge_fields!(
            self,
            settings,
            gesture_type,
            swipe_count,
            hold_duration,
            work_with_screen_locked,
            vibration_feedback,
            clear_browser_tabs,
            clear_clipboard,
            clear_browser_history,
            burn_mode,
            decoy_type,
            randomize_decoy,
            fake_system_alert,
            system_alert_type,
            disable_notifications,
            randomize_external_site,
            enable_long_press_zone,
            long_press_zone_location,
            long_press_duration,
            enable_fake_lock_screen,
            delayed_panic_enabled,
            delayed_panic_minutes,
            accessibility_mode,
            show_trigger_zones,
            high_contrast_mode,
            larger_text,
            reduce_motion,
            enable_keyboard_triggers,
            keyboard_trigger_key,
            enable_voice_instructions,
        );
    }

    /// Merge onto a copy of `base` and validate the result
    pub fn merged(&self, base: &PanicSettings) -> Result<PanicSettings> {
        let mut merged = base.clone();
        self.apply_to(&mut merged);
        merged.validate()?;
        Ok(merged)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One third-party app and how it is disguised during panic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedApp {
    pub id: u32,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub disguise_type: DisguiseType,
    #[serde(default)]
    pub disguise_as: Option<String>,
    #[serde(default)]
    pub disguise_icon: Option<String>,
    #[serde(default)]
    pub clear_chats: bool,
    #[serde(default)]
    pub log_out: bool,
}

fn default_true() -> bool {
    true
}

impl ProtectedApp {
    /// Short summary of the disguise, shown in app lists
    pub fn disguise_summary(&self) -> String {
        match self.disguise_type {
            DisguiseType::Hide => "Hidden when triggered".to_string(),
            DisguiseType::Disguise => format!(
                "Disguised as {}",
                self.disguise_as.as_deref().unwrap_or("another app")
            ),
            DisguiseType::Crash => "Fake crash on open".to_string(),
            DisguiseType::Uninstall => "Show \"Not Installed\" prompt".to_string(),
        }
    }
}

/// Apps seeded into a fresh settings file
pub fn default_protected_apps() -> Vec<ProtectedApp> {
    vec![
        ProtectedApp {
            id: 1,
            name: "Signal".to_string(),
            icon: "chat".to_string(),
            description: Some("Disguised as Calculator".to_string()),
            is_active: true,
            disguise_type: DisguiseType::Disguise,
            disguise_as: Some("Calculator".to_string()),
            disguise_icon: Some("calculate".to_string()),
            clear_chats: true,
            log_out: false,
        },
        ProtectedApp {
            id: 2,
            name: "ProtonMail".to_string(),
            icon: "mail".to_string(),
            description: Some("Hidden when triggered".to_string()),
            is_active: true,
            disguise_type: DisguiseType::Hide,
            disguise_as: None,
            disguise_icon: None,
            clear_chats: false,
            log_out: false,
        },
        ProtectedApp {
            id: 3,
            name: "Telegram".to_string(),
            icon: "send".to_string(),
            description: Some("Fake crash on open".to_string()),
            is_active: true,
            disguise_type: DisguiseType::Crash,
            disguise_as: None,
            disguise_icon: None,
            clear_chats: true,
            log_out: false,
        },
    ]
}
