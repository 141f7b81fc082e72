//! Settings store
//!
//! The controller reads configuration through `SettingsStore` and never touches
//! persistence directly. `FileStore` keeps everything in one TOML file:
//!
//! ```toml
//! [settings]
//! swipeCount = 3
//! holdDuration = 10
//!
//! [[protectedApps]]
//! id = 1
//! name = "Signal"
//! ```
//!
//! `MemoryStore` is the in-process variant used by tests and replay runs.

use crate::constants::{SETTINGS_FILE_PERMISSIONS, SETTINGS_PERMISSION_MASK_GROUP_OTHER};
use crate::settings::{default_protected_apps, PanicSettings, ProtectedApp, SettingsPatch};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub trait SettingsStore: Send {
    fn get_settings(&mut self) -> Result<PanicSettings>;

    /// Merge `patch` into the stored record and return the result
    fn update_settings(&mut self, patch: &SettingsPatch) -> Result<PanicSettings>;

    fn get_protected_apps(&mut self) -> Result<Vec<ProtectedApp>>;

    /// Replace the app with the same id
    fn update_protected_app(&mut self, app: ProtectedApp) -> Result<()>;

    /// Store a new app. The id on `app` is ignored and a fresh one assigned.
    fn add_protected_app(&mut self, app: ProtectedApp) -> Result<ProtectedApp>;

    /// Returns false if no app had that id
    fn delete_protected_app(&mut self, id: u32) -> Result<bool>;
}

/// Everything the store persists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredData {
    #[serde(default)]
    pub settings: PanicSettings,
    #[serde(default = "default_protected_apps")]
    pub protected_apps: Vec<ProtectedApp>,
}

impl Default for StoredData {
    fn default() -> Self {
        Self {
            settings: PanicSettings::default(),
            protected_apps: default_protected_apps(),
        }
    }
}

impl StoredData {
    fn apply_patch(&mut self, patch: &SettingsPatch) -> Result<PanicSettings> {
        self.settings = patch.merged(&self.settings)?;
        Ok(self.settings.clone())
    }

    fn replace_app(&mut self, app: ProtectedApp) -> Result<()> {
        match self.protected_apps.iter_mut().find(|a| a.id == app.id) {
            Some(slot) => {
                *slot = app;
                Ok(())
            }
            None => bail!("No protected app with id {}", app.id),
        }
    }

    fn insert_app(&mut self, mut app: ProtectedApp) -> ProtectedApp {
        app.id = self
            .protected_apps
            .iter()
            .map(|a| a.id)
            .max()
            .map_or(1, |max| max + 1);
        self.protected_apps.push(app.clone());
        app
    }

    fn remove_app(&mut self, id: u32) -> bool {
        let before = self.protected_apps.len();
        self.protected_apps.retain(|a| a.id != id);
        self.protected_apps.len() != before
    }
}

/// Shared in-memory store. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    data: StoredData,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: PanicSettings) -> Self {
        let store = Self::new();
        store.inner.lock().data.settings = settings;
        store
    }

    pub fn from_data(data: StoredData) -> Self {
        let store = Self::new();
        store.inner.lock().data = data;
        store
    }

    /// Make every subsequent read fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().fail_reads = fail;
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    pub fn snapshot(&self) -> StoredData {
        self.inner.lock().data.clone()
    }

    fn read(&self) -> Result<parking_lot::MutexGuard<'_, MemoryInner>> {
        let inner = self.inner.lock();
        if inner.fail_reads {
            bail!("settings store is unavailable");
        }
        Ok(inner)
    }

    fn write<T>(&self, change: impl FnOnce(&mut StoredData) -> Result<T>) -> Result<T> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            bail!("settings store rejected the write");
        }
        change(&mut inner.data)
    }
}

impl SettingsStore for MemoryStore {
    fn get_settings(&mut self) -> Result<PanicSettings> {
        Ok(self.read()?.data.settings.clone())
    }

    fn update_settings(&mut self, patch: &SettingsPatch) -> Result<PanicSettings> {
        self.write(|data| data.apply_patch(patch))
    }

    fn get_protected_apps(&mut self) -> Result<Vec<ProtectedApp>> {
        Ok(self.read()?.data.protected_apps.clone())
    }

    fn update_protected_app(&mut self, app: ProtectedApp) -> Result<()> {
        self.write(|data| data.replace_app(app))
    }

    fn add_protected_app(&mut self, app: ProtectedApp) -> Result<ProtectedApp> {
        self.write(|data| Ok(data.insert_app(app)))
    }

    fn delete_protected_app(&mut self, id: u32) -> Result<bool> {
        self.write(|data| Ok(data.remove_app(id)))
    }
}

/// TOML-backed store. Every operation reads the file afresh, so external
/// edits are picked up at the next decision point.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the store at the standard location
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Get the standard settings file path
    ///
    /// - macOS: `~/Library/Application Support/safeswipe/settings.toml`
    /// - Linux: `~/.config/safeswipe/settings.toml`
    /// - Windows: `%APPDATA%\safeswipe\settings.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("safeswipe");
        Ok(config_dir.join("settings.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a fresh file with default settings and the default protected apps
    pub fn create_default(&self) -> Result<StoredData> {
        let data = StoredData::default();
        self.save(&data)?;
        Ok(data)
    }

    /// Load the file. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Failed to read the file
    /// - TOML parsing fails
    /// - A value is out of range
    pub fn load(&self) -> Result<StoredData> {
        if !self.path.exists() {
            debug!(
                "Settings file {} not found, using defaults",
                self.path.display()
            );
            return Ok(StoredData::default());
        }

        #[cfg(unix)]
        {
            let metadata =
                fs::metadata(&self.path).context("Failed to read settings file metadata")?;
            let mode = metadata.permissions().mode();
            if mode & SETTINGS_PERMISSION_MASK_GROUP_OTHER != 0 {
                warn!(
                    "Settings file has permissive permissions: {:o}. Should be 600 (user read/write only).",
                    mode & 0o777
                );
            }
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;
        let data: StoredData =
            toml::from_str(&contents).context("Failed to parse settings file")?;
        data.settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        Ok(data)
    }

    /// Creates the parent directory if needed and restricts the file to the owner
    pub fn save(&self, data: &StoredData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }

        let contents = toml::to_string_pretty(data).context("Failed to serialize settings")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;

        #[cfg(unix)]
        {
            let mut permissions = fs::metadata(&self.path)?.permissions();
            permissions.set_mode(SETTINGS_FILE_PERMISSIONS);
            fs::set_permissions(&self.path, permissions)
                .context("Failed to set settings file permissions")?;
        }

        info!("Settings saved to: {}", self.path.display());
        Ok(())
    }

    fn modify<T>(&self, change: impl FnOnce(&mut StoredData) -> Result<T>) -> Result<T> {
        let mut data = self.load()?;
        let out = change(&mut data)?;
        self.save(&data)?;
        Ok(out)
    }
}

impl SettingsStore for FileStore {
    fn get_settings(&mut self) -> Result<PanicSettings> {
        Ok(self.load()?.settings)
    }

    fn update_settings(&mut self, patch: &SettingsPatch) -> Result<PanicSettings> {
        self.modify(|data| data.apply_patch(patch))
    }

    fn get_protected_apps(&mut self) -> Result<Vec<ProtectedApp>> {
        Ok(self.load()?.protected_apps)
    }

    fn update_protected_app(&mut self, app: ProtectedApp) -> Result<()> {
        self.modify(|data| data.replace_app(app))
    }

    fn add_protected_app(&mut self, app: ProtectedApp) -> Result<ProtectedApp> {
        self.modify(|data| Ok(data.insert_app(app)))
    }

    fn delete_protected_app(&mut self, id: u32) -> Result<bool> {
        self.modify(|data| Ok(data.remove_app(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DisguiseType;

    fn app(name: &str) -> ProtectedApp {
        ProtectedApp {
            id: 0,
            name: name.to_string(),
            icon: "apps".to_string(),
            description: None,
            is_active: true,
            disguise_type: DisguiseType::Uninstall,
            disguise_as: None,
            disguise_icon: None,
            clear_chats: false,
            log_out: true,
        }
    }

    #[test]
    fn test_memory_store_assigns_next_id() {
        let mut store = MemoryStore::new();
        let added = store.add_protected_app(app("WhatsApp")).unwrap();
        assert_eq!(added.id, 4);
        assert_eq!(store.get_protected_apps().unwrap().len(), 4);

        assert!(store.delete_protected_app(2).unwrap());
        assert!(!store.delete_protected_app(2).unwrap());
        let added = store.add_protected_app(app("Wire")).unwrap();
        assert_eq!(added.id, 5);
    }

    #[test]
    fn test_empty_store_starts_ids_at_one() {
        let mut data = StoredData {
            settings: PanicSettings::default(),
            protected_apps: Vec::new(),
        };
        assert_eq!(data.insert_app(app("Session")).id, 1);
    }

    #[test]
    fn test_update_unknown_app_fails() {
        let mut store = MemoryStore::new();
        let mut ghost = app("Ghost");
        ghost.id = 99;
        assert!(store.update_protected_app(ghost).is_err());
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let mut store = MemoryStore::new();
        store.set_fail_writes(true);
        let patch = SettingsPatch {
            burn_mode: Some(true),
            ..SettingsPatch::default()
        };
        assert!(store.update_settings(&patch).is_err());
        assert!(!store.snapshot().settings.burn_mode);

        store.set_fail_reads(true);
        assert!(store.get_settings().is_err());
    }

    #[test]
    fn test_memory_store_rejects_invalid_patch() {
        let mut store = MemoryStore::new();
        let patch = SettingsPatch {
            hold_duration: Some(0),
            ..SettingsPatch::default()
        };
        assert!(store.update_settings(&patch).is_err());
        assert_eq!(store.snapshot().settings, PanicSettings::default());
    }
}
