//! Player settings and preferences
//!
//! Persisted as JSON in LocalStorage under [`SETTINGS_KEY`]. Missing or
//! corrupt data silently falls back to the defaults; storage failures are
//! logged and never reach the caller.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// LocalStorage key
pub const SETTINGS_KEY: &str = "zeroedin-settings";

/// Loading animation shown before the range opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreloaderKind {
    #[default]
    Scope,
    Rifle,
    Range,
    Calibration,
}

impl PreloaderKind {
    pub const ALL: [PreloaderKind; 4] = [
        PreloaderKind::Scope,
        PreloaderKind::Rifle,
        PreloaderKind::Range,
        PreloaderKind::Calibration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreloaderKind::Scope => "scope",
            PreloaderKind::Rifle => "rifle",
            PreloaderKind::Range => "range",
            PreloaderKind::Calibration => "calibration",
        }
    }

    /// Display name for the settings panel
    pub fn name(&self) -> &'static str {
        match self {
            PreloaderKind::Scope => "Rifle Scope",
            PreloaderKind::Rifle => "Air Rifle",
            PreloaderKind::Range => "Range Setup",
            PreloaderKind::Calibration => "Calibration",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PreloaderKind::Scope => "Focus through a sniper scope",
            PreloaderKind::Rifle => "Pump up the pressure",
            PreloaderKind::Range => "Prepare the shooting range",
            PreloaderKind::Calibration => "Zero in your optics",
        }
    }
}

impl fmt::Display for PreloaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreloaderKind {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scope" => Ok(PreloaderKind::Scope),
            "rifle" => Ok(PreloaderKind::Rifle),
            "range" => Ok(PreloaderKind::Range),
            "calibration" => Ok(PreloaderKind::Calibration),
            _ => Err(RangeError::UnknownPreloader(s.to_string())),
        }
    }
}

/// Persisted preferences. Fields absent from stored JSON take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub preloader: PreloaderKind,
}

/// Partial update for [`SettingsStore::set`]; `None` keeps the current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsPatch {
    pub preloader: Option<PreloaderKind>,
}

impl SettingsPatch {
    pub fn preloader(preloader: PreloaderKind) -> Self {
        Self {
            preloader: Some(preloader),
        }
    }

    fn apply(&self, settings: &mut Settings) {
        if let Some(preloader) = self.preloader {
            settings.preloader = preloader;
        }
    }
}

/// String key-value backend (LocalStorage in the browser)
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, RangeError>;
    fn set(&self, key: &str, value: &str) -> Result<(), RangeError>;
}

/// In-memory backend (native builds and tests)
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, RangeError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RangeError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `window.localStorage` (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, RangeError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| RangeError::Storage("localStorage unavailable".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, RangeError> {
        Self::storage()?
            .get_item(key)
            .map_err(|err| RangeError::Storage(format!("getItem failed: {:?}", err)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RangeError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| RangeError::Storage(format!("setItem failed: {:?}", err)))
    }
}

/// Settings cache in front of a storage backend
pub struct SettingsStore<S: KeyValueStorage> {
    storage: S,
    current: Settings,
}

impl<S: KeyValueStorage> SettingsStore<S> {
    /// Open the store, loading whatever is persisted
    pub fn new(storage: S) -> Self {
        let current = Self::read(&storage).unwrap_or_else(|err| {
            log::warn!("Using default settings: {}", err);
            Settings::default()
        });
        Self { storage, current }
    }

    fn read(storage: &S) -> Result<Settings, RangeError> {
        match storage.get(SETTINGS_KEY)? {
            Some(json) => {
                let settings = serde_json::from_str(&json)?;
                log::info!("Loaded settings from storage");
                Ok(settings)
            }
            None => Ok(Settings::default()),
        }
    }

    pub fn get(&self) -> Settings {
        self.current.clone()
    }

    /// Merge `patch` over the current settings and persist the result.
    /// The in-memory value is updated even if persisting fails.
    pub fn set(&mut self, patch: SettingsPatch) -> Settings {
        patch.apply(&mut self.current);
        if let Err(err) = self.persist() {
            log::warn!("Settings not saved: {}", err);
        }
        self.current.clone()
    }

    fn persist(&self) -> Result<(), RangeError> {
        let json = serde_json::to_string(&self.current)?;
        self.storage.set(SETTINGS_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend whose every call fails
    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, RangeError> {
            Err(RangeError::Storage("denied".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), RangeError> {
            Err(RangeError::Storage("quota exceeded".into()))
        }
    }

    fn seeded(json: &str) -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.set(SETTINGS_KEY, json).unwrap();
        storage
    }

    #[test]
    fn test_missing_data_uses_default() {
        let store = SettingsStore::new(MemoryStorage::new());
        assert_eq!(store.get().preloader, PreloaderKind::Scope);
    }

    #[test]
    fn test_corrupt_data_uses_default() {
        let store = SettingsStore::new(seeded("{not json"));
        assert_eq!(store.get(), Settings::default());

        let store = SettingsStore::new(seeded(r#"{"preloader":"laser"}"#));
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn test_partial_data_merges_over_defaults() {
        let store = SettingsStore::new(seeded(r#"{}"#));
        assert_eq!(store.get(), Settings::default());

        let store = SettingsStore::new(seeded(r#"{"preloader":"rifle","theme":"dark"}"#));
        assert_eq!(store.get().preloader, PreloaderKind::Rifle);
    }

    #[test]
    fn test_set_persists() {
        let mut store = SettingsStore::new(MemoryStorage::new());
        let updated = store.set(SettingsPatch::preloader(PreloaderKind::Calibration));
        assert_eq!(updated.preloader, PreloaderKind::Calibration);

        let json = store.storage().get(SETTINGS_KEY).unwrap().unwrap();
        assert_eq!(json, r#"{"preloader":"calibration"}"#);

        // Empty patch keeps the value
        assert_eq!(store.set(SettingsPatch::default()).preloader, PreloaderKind::Calibration);
    }

    #[test]
    fn test_broken_backend_never_fails() {
        let mut store = SettingsStore::new(BrokenStorage);
        assert_eq!(store.get(), Settings::default());
        let updated = store.set(SettingsPatch::preloader(PreloaderKind::Range));
        assert_eq!(updated.preloader, PreloaderKind::Range);
        assert_eq!(store.get().preloader, PreloaderKind::Range);
    }

    #[test]
    fn test_preloader_parse() {
        for kind in PreloaderKind::ALL {
            assert_eq!(kind.as_str().parse::<PreloaderKind>().unwrap(), kind);
            assert!(!kind.name().is_empty());
            assert!(!kind.description().is_empty());
        }
        assert_eq!(" Scope ".parse::<PreloaderKind>().unwrap(), PreloaderKind::Scope);
        assert!(matches!(
            "laser".parse::<PreloaderKind>(),
            Err(RangeError::UnknownPreloader(_))
        ));
    }
}
