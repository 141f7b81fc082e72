//! Panic lifecycle controller
//!
//! The controller is the single owner of the settings snapshot and the panic
//! session. Every input, timer and request is applied in one turn against a
//! logical clock: `advance_to(now)` first fires every timer due at or before
//! `now`, in deadline order, and only then is the new input applied.
//!
//! Trigger is idempotent. The first trigger runs the side effects and picks a
//! decoy; a trigger while already in panic only refreshes `last_triggered_at`
//! and redisplays the confirmation flash.

pub mod input;
pub mod lock_screen;

use crate::constants::{
    CONFIRMATION_FLASH_MS, DEFAULT_VIEWPORT, EMERGENCY_OVERLAY_MS, REDIRECT_DELAY_MS,
    VIBRATION_PATTERN_MS,
};
use crate::decoy::{self, DecoyKind, OsRandom, RandomSource};
use crate::delayed::DelayedPanicTimer;
use crate::gesture::recognizer::GestureRecognizer;
use crate::gesture::zone::{zones_visible, LongPressZone, ZoneConfig};
use crate::gesture::GestureConfig;
use crate::platform::{Platform, SimulatedPlatform};
use crate::scheduler::{Millis, Scheduler, TimerHandle};
pub use crate::scheduler::TimerKind;
use crate::session::{
    DelayedPanicStatus, LockView, Notice, PanicSession, SessionEvent, Subscribers,
};
use crate::settings::{PanicSettings, ProtectedApp, SettingsPatch};
use crate::store::SettingsStore;
use anyhow::{Context, Result};
use lock_screen::LockScreen;
use log::{debug, info, warn};
use std::sync::mpsc::Receiver;

/// Where a trigger request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Manual,
    SwipeHold,
    LongPress,
    Zone,
    Keyboard,
    Delayed,
}

impl TriggerSource {
    pub fn label(self) -> &'static str {
        match self {
            TriggerSource::Manual => "manual",
            TriggerSource::SwipeHold => "swipe and hold",
            TriggerSource::LongPress => "long press",
            TriggerSource::Zone => "long-press zone",
            TriggerSource::Keyboard => "keyboard",
            TriggerSource::Delayed => "delayed panic",
        }
    }
}

/// Collaborators the controller is built from
pub struct ControllerParts {
    pub store: Box<dyn SettingsStore>,
    pub platform: Box<dyn Platform>,
    pub rng: Box<dyn RandomSource>,
    pub viewport: (f64, f64),
}

impl ControllerParts {
    /// Simulated platform, OS randomness and the default viewport
    pub fn new(store: impl SettingsStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            platform: Box::new(SimulatedPlatform::default()),
            rng: Box::new(OsRandom),
            viewport: DEFAULT_VIEWPORT,
        }
    }

    pub fn platform(mut self, platform: impl Platform + 'static) -> Self {
        self.platform = Box::new(platform);
        self
    }

    pub fn rng(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn viewport(mut self, viewport: (f64, f64)) -> Self {
        self.viewport = viewport;
        self
    }
}

pub struct PanicController {
    now: Millis,
    settings: PanicSettings,
    session: PanicSession,
    sched: Scheduler<TimerKind>,
    viewport: (f64, f64),
    recognizer: GestureRecognizer,
    zones: Vec<LongPressZone>,
    delayed: DelayedPanicTimer,
    lock_screen: Option<LockScreen>,
    flash_timer: Option<TimerHandle>,
    overlay_timer: Option<TimerHandle>,
    redirect_timer: Option<TimerHandle>,
    pending_redirect: Option<String>,
    store: Box<dyn SettingsStore>,
    platform: Box<dyn Platform>,
    rng: Box<dyn RandomSource>,
    subscribers: Subscribers,
}

impl PanicController {
    /// Load settings and attach every detector. A store failure falls back to
    /// defaults and leaves a notice.
    pub fn start(parts: ControllerParts, now: Millis) -> Self {
        let ControllerParts {
            mut store,
            platform,
            rng,
            viewport,
        } = parts;

        let (settings, load_error) = match store.get_settings() {
            Ok(settings) => (settings, None),
            Err(e) => (PanicSettings::default(), Some(e)),
        };

        let mut controller = Self {
            now,
            recognizer: GestureRecognizer::new(GestureConfig::from_settings(&settings)),
            settings,
            session: PanicSession::default(),
            sched: Scheduler::new(),
            viewport,
            zones: Vec::new(),
            delayed: DelayedPanicTimer::new(),
            lock_screen: None,
            flash_timer: None,
            overlay_timer: None,
            redirect_timer: None,
            pending_redirect: None,
            store,
            platform,
            rng,
            subscribers: Subscribers::default(),
        };

        if let Some(e) = load_error {
            warn!("Failed to load settings, using defaults: {:#}", e);
            controller.notice(format!("Settings could not be loaded, using defaults: {}", e));
        }

        controller.rebuild_zones();
        if controller.settings.delayed_panic_enabled {
            controller.arm_delayed();
        }
        controller.sync_delayed();
        info!(
            "Panic controller started ({} swipes + {:.1}s hold)",
            controller.settings.swipe_count,
            f64::from(controller.settings.hold_duration) / 10.0
        );
        controller
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn session(&self) -> &PanicSession {
        &self.session
    }

    pub fn settings(&self) -> &PanicSettings {
        &self.settings
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    pub fn zones(&self) -> &[LongPressZone] {
        &self.zones
    }

    /// Whether zones should be drawn. Detection does not depend on this.
    pub fn zones_visible(&self) -> bool {
        zones_visible(&self.settings)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.sched.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.sched.len()
    }

    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.subscribers.subscribe()
    }

    /// Fire every timer due at or before `now`
    pub fn advance_to(&mut self, now: Millis) {
        while let Some((handle, at, kind)) = self.sched.pop_due(now) {
            self.now = self.now.max(at);
            self.on_timer(handle, kind);
        }
        self.now = self.now.max(now);
    }

    pub fn trigger(&mut self, now: Millis) {
        self.advance_to(now);
        self.fire_trigger(TriggerSource::Manual);
    }

    /// Leave panic mode. Safe to call when idle.
    pub fn reset(&mut self, now: Millis) {
        self.advance_to(now);
        if !self.session.is_triggered {
            debug!("Reset requested while idle");
            return;
        }

        if let Some(mut lock) = self.lock_screen.take() {
            lock.detach(&mut self.sched);
        }
        self.sched.cancel_slot(&mut self.flash_timer);
        self.sched.cancel_slot(&mut self.overlay_timer);
        if self.sched.cancel_slot(&mut self.redirect_timer) {
            debug!("Pending redirect cancelled");
        }
        self.pending_redirect = None;

        self.session.is_triggered = false;
        self.session.active_decoy = None;
        self.session.lock_screen = None;
        self.session.confirmation_visible = false;
        self.session.emergency_overlay_visible = false;

        info!("Panic mode reset");
        self.publish(SessionEvent::Reset);
    }

    /// The hidden exit control inside a decoy
    pub fn secret_exit(&mut self, now: Millis) {
        if self.session.is_triggered {
            info!("Secret exit used");
        }
        self.reset(now);
    }

    /// Dismissing the fake system alert counts as a secret exit.
    /// Returns false when no alert is showing.
    pub fn dismiss_system_alert(&mut self, now: Millis) -> bool {
        self.advance_to(now);
        let showing = self
            .session
            .active_decoy
            .as_ref()
            .is_some_and(|d| d.system_alert.is_some());
        if showing {
            self.secret_exit(now);
        }
        showing
    }

    /// Merge `patch` into the in-memory settings. An invalid patch is rejected
    /// and nothing changes. A valid patch is applied even if saving it fails.
    /// Unsaved changes and run-only overrides survive later updates.
    pub fn update_settings(
        &mut self,
        patch: &SettingsPatch,
        now: Millis,
    ) -> Result<PanicSettings> {
        self.advance_to(now);
        let merged = patch
            .merged(&self.settings)
            .context("Rejected settings update")?;

        match self.store.update_settings(patch) {
            Ok(_) => debug!("Settings update saved"),
            Err(e) => {
                warn!("Failed to save settings: {:#}", e);
                self.notice(format!("Settings could not be saved: {}", e));
            }
        }
        self.apply_settings(merged);
        Ok(self.settings.clone())
    }

    /// Apply a patch for this run only, without saving it
    pub fn override_settings(
        &mut self,
        patch: &SettingsPatch,
        now: Millis,
    ) -> Result<PanicSettings> {
        self.advance_to(now);
        let merged = patch
            .merged(&self.settings)
            .context("Rejected settings override")?;
        info!("Applying settings overrides for this run");
        self.apply_settings(merged);
        Ok(self.settings.clone())
    }

    /// Stop the countdown and switch delayed panic off
    pub fn cancel_delayed_panic(&mut self, now: Millis) {
        self.advance_to(now);
        let was_running = self.delayed.cancel(&mut self.sched);

        if self.settings.delayed_panic_enabled {
            self.settings.delayed_panic_enabled = false;
            let patch = SettingsPatch {
                delayed_panic_enabled: Some(false),
                ..SettingsPatch::default()
            };
            if let Err(e) = self.store.update_settings(&patch) {
                warn!("Failed to save delayed panic cancellation: {:#}", e);
                self.notice(format!("Settings could not be saved: {}", e));
            }
        }
        self.sync_delayed();

        if was_running {
            info!("Delayed panic cancelled");
        }
        self.publish(SessionEvent::DelayedPanicCancelled);
    }

    /// Fake lock screen: the secret unlock that reveals the nested decoy
    pub fn unlock_lock_screen(&mut self, now: Millis) -> bool {
        self.advance_to(now);
        let Some(lock) = self.lock_screen.as_mut() else {
            return false;
        };
        if lock.view() != LockView::Locked {
            return false;
        }
        let kind: DecoyKind = decoy::resolve_unlocked(&self.settings, self.rng.as_mut());
        let changed = lock.unlock(kind);
        if changed {
            self.sync_lock_screen();
        }
        changed
    }

    /// One tap anywhere on the nested decoy
    pub fn lock_screen_tap(&mut self, now: Millis) -> bool {
        self.advance_to(now);
        let relocked = match self.lock_screen.as_mut() {
            Some(lock) => lock.tap(now),
            None => false,
        };
        if relocked {
            self.sync_lock_screen();
        }
        relocked
    }

    pub fn press_lock_digit(&mut self, now: Millis) -> bool {
        self.advance_to(now);
        let changed = match self.lock_screen.as_mut() {
            Some(lock) => lock.press_digit(now, &mut self.sched),
            None => false,
        };
        if changed {
            self.sync_lock_screen();
        }
        changed
    }

    pub fn delete_lock_digit(&mut self, now: Millis) -> bool {
        self.advance_to(now);
        let changed = self
            .lock_screen
            .as_mut()
            .is_some_and(|lock| lock.delete_digit());
        if changed {
            self.sync_lock_screen();
        }
        changed
    }

    /// Resize the screen. Zones are re-resolved for the new size.
    pub fn set_viewport(&mut self, viewport: (f64, f64)) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.rebuild_zones();
        }
    }

    pub fn protected_apps(&mut self) -> Result<Vec<ProtectedApp>> {
        self.store.get_protected_apps()
    }

    pub fn add_protected_app(&mut self, app: ProtectedApp) -> Result<ProtectedApp> {
        let added = self
            .store
            .add_protected_app(app)
            .context("Failed to add protected app")?;
        info!("Protected app added: {} (id {})", added.name, added.id);
        Ok(added)
    }

    pub fn update_protected_app(&mut self, app: ProtectedApp) -> Result<()> {
        let name = app.name.clone();
        self.store
            .update_protected_app(app)
            .context("Failed to update protected app")?;
        info!("Protected app updated: {}", name);
        Ok(())
    }

    pub fn delete_protected_app(&mut self, id: u32) -> Result<bool> {
        let removed = self
            .store
            .delete_protected_app(id)
            .context("Failed to delete protected app")?;
        if removed {
            info!("Protected app {} deleted", id);
        }
        Ok(removed)
    }

    /// Tear down every detector and timer
    pub fn shutdown(&mut self) {
        self.recognizer.detach(&mut self.sched);
        for zone in &mut self.zones {
            zone.detach(&mut self.sched);
        }
        self.zones.clear();
        self.delayed.cancel(&mut self.sched);
        if let Some(mut lock) = self.lock_screen.take() {
            lock.detach(&mut self.sched);
        }
        self.sched.cancel_slot(&mut self.flash_timer);
        self.sched.cancel_slot(&mut self.overlay_timer);
        self.sched.cancel_slot(&mut self.redirect_timer);
        self.sync_delayed();
        info!("Panic controller stopped");
    }

    fn on_timer(&mut self, handle: TimerHandle, kind: TimerKind) {
        match kind {
            TimerKind::SwipeHold => {
                if let Some(event) = self.recognizer.on_hold_elapsed(handle) {
                    self.handle_gesture_events(vec![event]);
                }
            }
            TimerKind::LongPress => {
                if let Some(event) = self.recognizer.on_long_press_elapsed(handle) {
                    self.handle_gesture_events(vec![event]);
                }
            }
            TimerKind::Zone(index) => {
                let event = self
                    .zones
                    .get_mut(index)
                    .and_then(|zone| zone.on_elapsed(handle));
                if let Some(event) = event {
                    self.handle_gesture_events(vec![event]);
                }
            }
            TimerKind::DelayedTick => {
                if let Some(remaining) = self.delayed.on_tick(handle, self.now, &mut self.sched) {
                    self.sync_delayed();
                    self.publish(SessionEvent::CountdownTick {
                        remaining_seconds: remaining,
                    });
                }
            }
            TimerKind::DelayedDeadline => {
                if self.delayed.on_deadline(handle, &mut self.sched) {
                    self.sync_delayed();
                    self.publish(SessionEvent::DelayedPanicFired);
                    self.fire_trigger(TriggerSource::Delayed);
                }
            }
            TimerKind::ConfirmationFlash => {
                if self.flash_timer == Some(handle) {
                    self.flash_timer = None;
                    self.session.confirmation_visible = false;
                    self.publish(SessionEvent::ViewChanged);
                }
            }
            TimerKind::EmergencyOverlay => {
                if self.overlay_timer == Some(handle) {
                    self.overlay_timer = None;
                    self.session.emergency_overlay_visible = false;
                    self.publish(SessionEvent::ViewChanged);
                }
            }
            TimerKind::Redirect => {
                if self.redirect_timer == Some(handle) {
                    self.redirect_timer = None;
                    if let Some(url) = self.pending_redirect.take() {
                        log_failure("redirect", self.platform.open_url(&url));
                        self.publish(SessionEvent::Redirected { url });
                    }
                }
            }
            TimerKind::PinErrorClear => {
                let cleared = self
                    .lock_screen
                    .as_mut()
                    .is_some_and(|lock| lock.on_pin_error_elapsed(handle));
                if cleared {
                    self.sync_lock_screen();
                }
            }
        }
    }

    pub(crate) fn fire_trigger(&mut self, source: TriggerSource) {
        let now = self.now;

        if self.session.is_triggered {
            debug!("Already in panic mode, {} trigger ignored", source.label());
            self.session.last_triggered_at = Some(now);
            self.show_confirmation();
            self.publish(SessionEvent::Retriggered { at: now });
            return;
        }

        info!("PANIC MODE TRIGGERED ({})", source.label());
        self.session.is_triggered = true;
        self.session.last_triggered_at = Some(now);
        self.session.trigger_count += 1;

        if self.delayed.cancel(&mut self.sched) {
            info!("Pending delayed panic superseded by trigger");
        }
        self.sync_delayed();

        if self.settings.vibration_feedback {
            log_failure("vibrate", self.platform.vibrate(&VIBRATION_PATTERN_MS));
        }
        self.run_cleanup();

        let decoy = decoy::select(&self.settings, self.rng.as_mut());
        info!("Showing {} decoy", decoy.kind.name());

        if decoy.kind == DecoyKind::FakeLockScreen {
            self.lock_screen = Some(LockScreen::new());
        } else if let Some(url) = &decoy.redirect_url {
            self.pending_redirect = Some(url.clone());
            self.sched.rearm(
                &mut self.redirect_timer,
                now + REDIRECT_DELAY_MS,
                TimerKind::Redirect,
            );
        } else {
            self.session.emergency_overlay_visible = true;
            self.sched.rearm(
                &mut self.overlay_timer,
                now + EMERGENCY_OVERLAY_MS,
                TimerKind::EmergencyOverlay,
            );
        }

        self.session.active_decoy = Some(decoy.clone());
        self.session.lock_screen = self.lock_screen.as_ref().map(LockScreen::status);
        self.show_confirmation();
        self.publish(SessionEvent::Triggered { at: now, decoy });
    }

    /// Each step is independent; a failure is logged and the rest still run
    fn run_cleanup(&mut self) {
        if self.settings.clear_browser_tabs {
            log_failure("clear browser tabs", self.platform.clear_browser_tabs());
        }
        if self.settings.clear_clipboard {
            log_failure("clear clipboard", self.platform.clear_clipboard());
        }
        if self.settings.clear_browser_history {
            log_failure("clear browser history", self.platform.clear_browser_history());
        }

        match self.store.get_protected_apps() {
            Ok(apps) => {
                for app in apps.iter().filter(|app| app.is_active) {
                    log_failure(&format!("disguise {}", app.name), self.platform.disguise_app(app));
                }
            }
            Err(e) => {
                warn!("Failed to read protected apps: {:#}", e);
                self.notice(format!("Protected apps could not be read: {}", e));
            }
        }

        if self.settings.burn_mode {
            log_failure("wipe app data", self.platform.burn_app_data());
        }
    }

    fn show_confirmation(&mut self) {
        self.session.confirmation_visible = true;
        self.sched.rearm(
            &mut self.flash_timer,
            self.now + CONFIRMATION_FLASH_MS,
            TimerKind::ConfirmationFlash,
        );
    }

    fn apply_settings(&mut self, next: PanicSettings) {
        let previous = std::mem::replace(&mut self.settings, next);

        self.recognizer
            .reconfigure(GestureConfig::from_settings(&self.settings), &mut self.sched);

        let zone_changed = previous.enable_long_press_zone != self.settings.enable_long_press_zone
            || ZoneConfig::from_settings(&previous) != ZoneConfig::from_settings(&self.settings);
        if zone_changed {
            self.rebuild_zones();
        }

        match (previous.delayed_panic_enabled, self.settings.delayed_panic_enabled) {
            (_, false) => {
                if self.delayed.cancel(&mut self.sched) {
                    info!("Delayed panic disabled");
                }
            }
            (false, true) => self.arm_delayed(),
            (true, true) => {
                if previous.delayed_panic_minutes != self.settings.delayed_panic_minutes {
                    self.arm_delayed();
                }
            }
        }
        self.sync_delayed();

        info!("Settings updated");
        self.publish(SessionEvent::SettingsUpdated);
    }

    fn arm_delayed(&mut self) {
        let deadline = self
            .delayed
            .arm(self.settings.delayed_panic_minutes, self.now, &mut self.sched);
        self.sync_delayed();
        self.publish(SessionEvent::DelayedPanicArmed { deadline });
    }

    fn rebuild_zones(&mut self) {
        for zone in &mut self.zones {
            zone.detach(&mut self.sched);
        }
        if !self.zones.is_empty() {
            info!("Long-press zone detached");
        }
        self.zones.clear();

        if self.settings.enable_long_press_zone {
            let config = ZoneConfig::from_settings(&self.settings);
            let zone = LongPressZone::new(0, config, self.viewport);
            info!("Long-press zone attached: {}", zone.accessibility_label());
            self.zones.push(zone);
        }
    }

    fn sync_delayed(&mut self) {
        self.session.delayed_panic = DelayedPanicStatus {
            enabled: self.settings.delayed_panic_enabled,
            remaining_seconds: self.delayed.remaining_seconds(),
            deadline: self.delayed.deadline(),
        };
    }

    fn sync_lock_screen(&mut self) {
        let status = self.lock_screen.as_ref().map(LockScreen::status);
        self.session.lock_screen = status.clone();
        if let Some(status) = status {
            self.publish(SessionEvent::LockScreenChanged(status));
        }
    }

    fn notice(&mut self, message: String) {
        let notice = Notice {
            at: self.now,
            message,
        };
        self.session.push_notice(notice.clone());
        self.publish(SessionEvent::Notice(notice));
    }

    fn publish(&mut self, event: SessionEvent) {
        self.subscribers.broadcast(event);
    }
}

fn log_failure(action: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!("Could not {}: {:#}", action, e);
    }
}
