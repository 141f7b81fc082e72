//! Best-effort platform side effects
//!
//! Everything panic mode asks of the device goes through `Platform`. Each call
//! may fail independently; the controller logs the failure and moves on. The
//! shipped implementation only logs what it would do.

use crate::settings::{DisguiseType, ProtectedApp};
use anyhow::{bail, Result};
use log::info;

pub trait Platform: Send {
    /// Vibrate with an on/off pattern in milliseconds
    fn vibrate(&mut self, pattern: &[u64]) -> Result<()>;

    fn clear_browser_tabs(&mut self) -> Result<()>;

    /// Overwrite the clipboard with an empty string
    fn clear_clipboard(&mut self) -> Result<()>;

    fn clear_browser_history(&mut self) -> Result<()>;

    /// Apply one protected app's disguise and its chat/session flags
    fn disguise_app(&mut self, app: &ProtectedApp) -> Result<()>;

    /// Wipe local app data (burn mode)
    fn burn_app_data(&mut self) -> Result<()>;

    /// Navigate away to an external decoy site
    fn open_url(&mut self, url: &str) -> Result<()>;
}

/// Logs every action instead of performing it
#[derive(Debug, Default, Clone)]
pub struct SimulatedPlatform {
    /// Report vibration as unsupported, like a desktop browser
    pub no_vibration: bool,
}

impl Platform for SimulatedPlatform {
    fn vibrate(&mut self, pattern: &[u64]) -> Result<()> {
        if self.no_vibration {
            bail!("vibration is not supported on this device");
        }
        info!("[PANIC MODE] Would vibrate with pattern {:?}", pattern);
        Ok(())
    }

    fn clear_browser_tabs(&mut self) -> Result<()> {
        info!("[PANIC MODE] Would clear browser tabs");
        Ok(())
    }

    fn clear_clipboard(&mut self) -> Result<()> {
        info!("[PANIC MODE] Would clear clipboard");
        Ok(())
    }

    fn clear_browser_history(&mut self) -> Result<()> {
        info!("[PANIC MODE] Would clear browser history");
        Ok(())
    }

    fn disguise_app(&mut self, app: &ProtectedApp) -> Result<()> {
        match app.disguise_type {
            DisguiseType::Hide => info!("[PANIC MODE] Would hide {}", app.name),
            DisguiseType::Disguise => info!(
                "[PANIC MODE] Would disguise {} as {}",
                app.name,
                app.disguise_as.as_deref().unwrap_or("another app")
            ),
            DisguiseType::Crash => info!("[PANIC MODE] Would make {} appear to crash", app.name),
            DisguiseType::Uninstall => {
                info!("[PANIC MODE] Would make {} appear uninstalled", app.name)
            }
        }
        if app.clear_chats {
            info!("[PANIC MODE] Would clear chats in {}", app.name);
        }
        if app.log_out {
            info!("[PANIC MODE] Would log out of {}", app.name);
        }
        Ok(())
    }

    fn burn_app_data(&mut self) -> Result<()> {
        info!("[PANIC MODE] Would wipe local app data");
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        info!("[PANIC MODE] Would redirect to: {}", url);
        Ok(())
    }
}

/// Every call the controller made, in order. Used by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Vibrate(Vec<u64>),
    ClearTabs,
    ClearClipboard,
    ClearHistory,
    DisguiseApp(String),
    BurnAppData,
    OpenUrl(String),
}

/// Records calls into a shared log and can be told to fail some of them
#[derive(Debug, Default, Clone)]
pub struct RecordingPlatform {
    pub calls: std::sync::Arc<parking_lot::Mutex<Vec<PlatformCall>>>,
    pub fail_vibrate: bool,
    pub fail_clipboard: bool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().push(call);
    }
}

impl Platform for RecordingPlatform {
    fn vibrate(&mut self, pattern: &[u64]) -> Result<()> {
        if self.fail_vibrate {
            bail!("vibration unsupported");
        }
        self.record(PlatformCall::Vibrate(pattern.to_vec()));
        Ok(())
    }

    fn clear_browser_tabs(&mut self) -> Result<()> {
        self.record(PlatformCall::ClearTabs);
        Ok(())
    }

    fn clear_clipboard(&mut self) -> Result<()> {
        if self.fail_clipboard {
            bail!("clipboard API unavailable");
        }
        self.record(PlatformCall::ClearClipboard);
        Ok(())
    }

    fn clear_browser_history(&mut self) -> Result<()> {
        self.record(PlatformCall::ClearHistory);
        Ok(())
    }

    fn disguise_app(&mut self, app: &ProtectedApp) -> Result<()> {
        self.record(PlatformCall::DisguiseApp(app.name.clone()));
        Ok(())
    }

    fn burn_app_data(&mut self) -> Result<()> {
        self.record(PlatformCall::BurnAppData);
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        self.record(PlatformCall::OpenUrl(url.to_string()));
        Ok(())
    }
}
