// Library interface for SafeSwipe
// The CLI and the tests drive the panic controller through this crate

pub mod config;
pub mod constants;
pub mod controller;
pub mod decoy;
pub mod delayed;
pub mod gesture;
pub mod platform;
pub mod scheduler;
pub mod script;
pub mod session;
pub mod settings;
pub mod store;

use anyhow::{Context, Result};
use constants::TICKER_INTERVAL_MS;
use controller::{ControllerParts, PanicController};
use gesture::InputEvent;
use log::{debug, info};
use parking_lot::Mutex;
use scheduler::Millis;
use session::{PanicSession, SessionEvent};
use settings::{PanicSettings, SettingsPatch};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Real-time wrapper around the panic controller
///
/// Calls are stamped with the time elapsed since construction. A background
/// ticker fires due timers between inputs so holds and countdowns complete
/// without further input.
pub struct SafeSwipeCore {
    controller: Arc<Mutex<PanicController>>,
    started: Instant,
    running: Arc<AtomicBool>,
}

impl SafeSwipeCore {
    pub fn new(parts: ControllerParts) -> Self {
        let controller = PanicController::start(parts, 0);
        Self {
            controller: Arc::new(Mutex::new(controller)),
            started: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Milliseconds since start
    pub fn now(&self) -> Millis {
        elapsed_ms(self.started)
    }

    pub fn controller(&self) -> Arc<Mutex<PanicController>> {
        self.controller.clone()
    }

    pub fn handle_input(&self, event: InputEvent) {
        let now = self.now();
        self.controller.lock().handle_input(event, now);
    }

    pub fn trigger(&self) {
        let now = self.now();
        self.controller.lock().trigger(now);
    }

    pub fn reset(&self) {
        let now = self.now();
        self.controller.lock().reset(now);
    }

    pub fn cancel_delayed_panic(&self) {
        let now = self.now();
        self.controller.lock().cancel_delayed_panic(now);
    }

    pub fn update_settings(&self, patch: &SettingsPatch) -> Result<PanicSettings> {
        let now = self.now();
        self.controller.lock().update_settings(patch, now)
    }

    /// Apply one script command at the current time
    pub fn apply(&self, command: script::Command) -> Result<()> {
        let now = self.now();
        script::apply(&mut self.controller.lock(), command, now)
    }

    /// Snapshot of the session
    pub fn session(&self) -> PanicSession {
        self.controller.lock().session().clone()
    }

    pub fn settings(&self) -> PanicSettings {
        self.controller.lock().settings().clone()
    }

    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.controller.lock().subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the timer ticker thread
    pub fn start_background_threads(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Background threads already running");
            return Ok(());
        }
        self.start_ticker_thread()?;
        info!("Background threads started");
        Ok(())
    }

    /// Stop the ticker and tear down every timer
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.controller.lock().shutdown();
    }

    /// Background thread that fires due timers in real time
    fn start_ticker_thread(&self) -> Result<()> {
        let controller = self.controller.clone();
        let running = self.running.clone();
        let started = self.started;
        thread::Builder::new()
            .name("timer-ticker".to_string())
            .spawn(move || {
                info!("Timer ticker thread started");
                while running.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(TICKER_INTERVAL_MS));
                    controller.lock().advance_to(elapsed_ms(started));
                }
                debug!("Timer ticker thread stopped");
            })
            .context("Failed to spawn timer ticker thread")?;
        Ok(())
    }
}

impl Drop for SafeSwipeCore {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn elapsed_ms(started: Instant) -> Millis {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(Millis::MAX)
}
