//! Decoy selection
//!
//! Maps the settings snapshot and panic state to the decoy the presentation
//! layer should draw. Selection is deterministic unless randomization is
//! requested, in which case every resolution draws afresh from the injected
//! `RandomSource`.

use crate::session::PanicState;
use crate::settings::{PanicSettings, SystemAlertType};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an external decoy site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalSite {
    Weather,
    Recipes,
    Homework,
    News,
}

impl ExternalSite {
    pub const ALL: [ExternalSite; 4] = [
        ExternalSite::Weather,
        ExternalSite::Recipes,
        ExternalSite::Homework,
        ExternalSite::News,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExternalSite::Weather => "weather",
            ExternalSite::Recipes => "recipes",
            ExternalSite::Homework => "homework",
            ExternalSite::News => "news",
        }
    }

    /// URL used when randomization is off
    pub fn fixed_url(self) -> &'static str {
        match self {
            ExternalSite::Weather => "https://weather.com",
            ExternalSite::Recipes => "https://allrecipes.com",
            ExternalSite::Homework => "https://classroom.google.com",
            ExternalSite::News => "https://news.google.com",
        }
    }

    /// Candidates for a randomized pick
    pub fn pool(self) -> [&'static str; 3] {
        match self {
            ExternalSite::Weather => [
                "https://weather.com",
                "https://accuweather.com",
                "https://weather.gov",
            ],
            ExternalSite::Recipes => [
                "https://allrecipes.com",
                "https://foodnetwork.com/recipes",
                "https://epicurious.com",
            ],
            ExternalSite::Homework => [
                "https://canvas.instructure.com",
                "https://classroom.google.com",
                "https://studygroups.com",
            ],
            ExternalSite::News => [
                "https://news.google.com",
                "https://reuters.com",
                "https://apnews.com",
            ],
        }
    }
}

const EXTERNAL_SITE_PREFIX: &str = "external_site_";

/// Configured decoy choice. Unrecognized stored values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DecoyType {
    FakeLockScreen,
    Calculator,
    Notes,
    Gallery,
    Browser,
    Clock,
    ExternalSite(ExternalSite),
    Unknown(String),
}

impl DecoyType {
    pub fn parse(value: &str) -> Self {
        match value {
            "fake_lock_screen" => DecoyType::FakeLockScreen,
            "calculator" => DecoyType::Calculator,
            "notes" => DecoyType::Notes,
            "gallery" => DecoyType::Gallery,
            "browser" => DecoyType::Browser,
            "clock" => DecoyType::Clock,
            other => other
                .strip_prefix(EXTERNAL_SITE_PREFIX)
                .and_then(|site| ExternalSite::ALL.into_iter().find(|s| s.as_str() == site))
                .map(DecoyType::ExternalSite)
                .unwrap_or_else(|| DecoyType::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for DecoyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoyType::FakeLockScreen => f.write_str("fake_lock_screen"),
            DecoyType::Calculator => f.write_str("calculator"),
            DecoyType::Notes => f.write_str("notes"),
            DecoyType::Gallery => f.write_str("gallery"),
            DecoyType::Browser => f.write_str("browser"),
            DecoyType::Clock => f.write_str("clock"),
            DecoyType::ExternalSite(site) => write!(f, "{}{}", EXTERNAL_SITE_PREFIX, site.as_str()),
            DecoyType::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for DecoyType {
    fn from(value: String) -> Self {
        DecoyType::parse(&value)
    }
}

impl From<DecoyType> for String {
    fn from(value: DecoyType) -> Self {
        value.to_string()
    }
}

/// What the presentation layer renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoyKind {
    FakeLockScreen,
    Calculator,
    Notes,
    Gallery,
    Browser,
    Clock,
    ExternalSite(ExternalSite),
}

impl DecoyKind {
    pub fn name(self) -> &'static str {
        match self {
            DecoyKind::FakeLockScreen => "fake lock screen",
            DecoyKind::Calculator => "calculator",
            DecoyKind::Notes => "notes",
            DecoyKind::Gallery => "gallery",
            DecoyKind::Browser => "browser",
            DecoyKind::Clock => "clock",
            DecoyKind::ExternalSite(site) => site.as_str(),
        }
    }
}

/// In-app decoys eligible for `randomizeDecoy`
pub const IN_APP_DECOYS: [DecoyKind; 5] = [
    DecoyKind::Calculator,
    DecoyKind::Notes,
    DecoyKind::Gallery,
    DecoyKind::Browser,
    DecoyKind::Clock,
];

#[derive(Debug, Clone, PartialEq)]
pub struct DecoyDescriptor {
    pub kind: DecoyKind,
    /// Target for external-site decoys
    pub redirect_url: Option<String>,
    /// Fake alert layered over plain decoys
    pub system_alert: Option<SystemAlertType>,
    pub larger_text: bool,
    pub high_contrast: bool,
    pub reduce_motion: bool,
}

/// Uniform index source, injectable so tests can script picks
pub trait RandomSource: Send {
    /// Return an index in `0..len`. `len` is never zero.
    fn next_index(&mut self, len: usize) -> usize;
}

/// Random source backed by the operating system
#[derive(Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_index(&mut self, len: usize) -> usize {
        let len = len as u64;
        // Rejection sampling keeps the pick unbiased
        let zone = u64::MAX - (u64::MAX % len);
        loop {
            let mut bytes = [0u8; 8];
            if let Err(e) = getrandom::getrandom(&mut bytes) {
                warn!("OS random source unavailable ({}), using first candidate", e);
                return 0;
            }
            let value = u64::from_le_bytes(bytes);
            if value < zone {
                return (value % len) as usize;
            }
        }
    }
}

/// Replays a fixed list of indices, wrapping around
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    picks: Vec<usize>,
    position: usize,
}

impl SequenceRandom {
    pub fn new(picks: Vec<usize>) -> Self {
        Self { picks, position: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn next_index(&mut self, len: usize) -> usize {
        if self.picks.is_empty() {
            return 0;
        }
        let pick = self.picks[self.position % self.picks.len()];
        self.position += 1;
        pick % len
    }
}

fn pick<T: Copy>(candidates: &[T], rng: &mut dyn RandomSource) -> T {
    candidates[rng.next_index(candidates.len())]
}

/// Resolve the decoy for the current state. `None` means show the real app.
pub fn resolve(
    settings: &PanicSettings,
    state: PanicState,
    rng: &mut dyn RandomSource,
) -> Option<DecoyDescriptor> {
    match state {
        PanicState::Idle => None,
        PanicState::Triggered => Some(select(settings, rng)),
    }
}

/// Pick the decoy shown on trigger
pub fn select(settings: &PanicSettings, rng: &mut dyn RandomSource) -> DecoyDescriptor {
    let (kind, redirect_url) = if settings.uses_fake_lock_screen() {
        (DecoyKind::FakeLockScreen, None)
    } else {
        match &settings.decoy_type {
            DecoyType::ExternalSite(site) => {
                let url = if settings.randomize_external_site {
                    pick(&site.pool(), rng)
                } else {
                    site.fixed_url()
                };
                (DecoyKind::ExternalSite(*site), Some(url.to_string()))
            }
            _ if settings.randomize_decoy => (pick(&IN_APP_DECOYS, rng), None),
            other => (in_app_kind(other), None),
        }
    };

    let system_alert = (settings.fake_system_alert && kind != DecoyKind::FakeLockScreen)
        .then_some(settings.system_alert_type);

    DecoyDescriptor {
        kind,
        redirect_url,
        system_alert,
        larger_text: settings.larger_text,
        high_contrast: settings.high_contrast_mode,
        reduce_motion: settings.reduce_motion,
    }
}

/// Decoy revealed after "unlocking" the fake lock screen
pub fn resolve_unlocked(settings: &PanicSettings, rng: &mut dyn RandomSource) -> DecoyKind {
    match &settings.decoy_type {
        DecoyType::ExternalSite(_) => DecoyKind::Browser,
        _ if settings.randomize_decoy => pick(&IN_APP_DECOYS, rng),
        DecoyType::FakeLockScreen => DecoyKind::Calculator,
        other => in_app_kind(other),
    }
}

fn in_app_kind(decoy_type: &DecoyType) -> DecoyKind {
    match decoy_type {
        DecoyType::Calculator => DecoyKind::Calculator,
        DecoyType::Notes => DecoyKind::Notes,
        DecoyType::Gallery => DecoyKind::Gallery,
        DecoyType::Browser => DecoyKind::Browser,
        DecoyType::Clock => DecoyKind::Clock,
        DecoyType::FakeLockScreen => DecoyKind::FakeLockScreen,
        DecoyType::ExternalSite(site) => DecoyKind::ExternalSite(*site),
        DecoyType::Unknown(raw) => {
            warn!("Unknown decoy type '{}', falling back to clock", raw);
            DecoyKind::Clock
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn plain(decoy_type: DecoyType) -> PanicSettings {
        PanicSettings {
            decoy_type,
            enable_fake_lock_screen: false,
            ..PanicSettings::default()
        }
    }

    #[test]
    fn test_parse_round_trips_known_values() {
        for raw in [
            "fake_lock_screen",
            "calculator",
            "notes",
            "gallery",
            "browser",
            "clock",
            "external_site_weather",
            "external_site_news",
        ] {
            assert_eq!(DecoyType::parse(raw).to_string(), raw);
        }
        assert_eq!(
            DecoyType::parse("external_site_sports"),
            DecoyType::Unknown("external_site_sports".to_string())
        );
    }

    #[test]
    fn test_idle_resolves_to_nothing() {
        let mut rng = SequenceRandom::new(vec![0]);
        assert!(resolve(&PanicSettings::default(), PanicState::Idle, &mut rng).is_none());
    }

    #[test]
    fn test_default_resolves_to_fake_lock_screen() {
        let mut rng = SequenceRandom::new(vec![0]);
        let decoy = resolve(&PanicSettings::default(), PanicState::Triggered, &mut rng)
            .expect("triggered state must resolve");
        assert_eq!(decoy.kind, DecoyKind::FakeLockScreen);
        assert!(decoy.system_alert.is_none());
    }

    #[test]
    fn test_fake_lock_switch_overrides_decoy_type() {
        let settings = PanicSettings {
            decoy_type: DecoyType::Notes,
            enable_fake_lock_screen: true,
            ..PanicSettings::default()
        };
        let mut rng = SequenceRandom::new(vec![0]);
        let decoy = resolve(&settings, PanicState::Triggered, &mut rng).unwrap();
        assert_eq!(decoy.kind, DecoyKind::FakeLockScreen);
    }

    #[test]
    fn test_fixed_external_site_is_stable() {
        let settings = plain(DecoyType::ExternalSite(ExternalSite::Weather));
        let mut rng = OsRandom;
        for _ in 0..20 {
            let decoy = resolve(&settings, PanicState::Triggered, &mut rng).unwrap();
            assert_eq!(decoy.redirect_url.as_deref(), Some("https://weather.com"));
            assert_eq!(decoy.kind, DecoyKind::ExternalSite(ExternalSite::Weather));
        }
    }

    #[test]
    fn test_randomized_external_site_uses_scripted_picks() {
        let settings = PanicSettings {
            randomize_external_site: true,
            ..plain(DecoyType::ExternalSite(ExternalSite::News))
        };
        let mut rng = SequenceRandom::new(vec![2, 1]);
        let first = resolve(&settings, PanicState::Triggered, &mut rng).unwrap();
        let second = resolve(&settings, PanicState::Triggered, &mut rng).unwrap();
        assert_eq!(first.redirect_url.as_deref(), Some("https://apnews.com"));
        assert_eq!(second.redirect_url.as_deref(), Some("https://reuters.com"));
    }

    #[test]
    fn test_randomized_weather_covers_pool() {
        let settings = PanicSettings {
            randomize_external_site: true,
            ..plain(DecoyType::ExternalSite(ExternalSite::Weather))
        };
        let mut rng = OsRandom;
        let seen: HashSet<String> = (0..300)
            .filter_map(|_| resolve(&settings, PanicState::Triggered, &mut rng))
            .filter_map(|d| d.redirect_url)
            .collect();
        let pool: HashSet<String> = ExternalSite::Weather
            .pool()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(seen, pool);
    }

    #[test]
    fn test_unknown_decoy_falls_back_to_clock() {
        let settings = plain(DecoyType::Unknown("hologram".to_string()));
        let mut rng = SequenceRandom::new(vec![0]);
        let decoy = resolve(&settings, PanicState::Triggered, &mut rng).unwrap();
        assert_eq!(decoy.kind, DecoyKind::Clock);
    }

    #[test]
    fn test_plain_decoy_carries_system_alert() {
        let settings = PanicSettings {
            system_alert_type: SystemAlertType::StorageFull,
            larger_text: true,
            ..plain(DecoyType::Calculator)
        };
        let mut rng = SequenceRandom::new(vec![0]);
        let decoy = resolve(&settings, PanicState::Triggered, &mut rng).unwrap();
        assert_eq!(decoy.kind, DecoyKind::Calculator);
        assert_eq!(decoy.system_alert, Some(SystemAlertType::StorageFull));
        assert!(decoy.larger_text);
    }

    #[test]
    fn test_randomize_decoy_picks_in_app() {
        let settings = PanicSettings {
            randomize_decoy: true,
            ..plain(DecoyType::Clock)
        };
        let mut rng = SequenceRandom::new(vec![1, 2]);
        let first = resolve(&settings, PanicState::Triggered, &mut rng).unwrap();
        let second = resolve(&settings, PanicState::Triggered, &mut rng).unwrap();
        assert_eq!(first.kind, DecoyKind::Notes);
        assert_eq!(second.kind, DecoyKind::Gallery);
    }

    #[test]
    fn test_unlocked_decoy_mapping() {
        let mut rng = SequenceRandom::new(vec![0]);
        assert_eq!(
            resolve_unlocked(&PanicSettings::default(), &mut rng),
            DecoyKind::Calculator
        );
        assert_eq!(
            resolve_unlocked(&plain(DecoyType::ExternalSite(ExternalSite::Recipes)), &mut rng),
            DecoyKind::Browser
        );
        assert_eq!(resolve_unlocked(&plain(DecoyType::Notes), &mut rng), DecoyKind::Notes);
    }
}
