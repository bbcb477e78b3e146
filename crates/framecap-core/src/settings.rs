//! Capture settings and the configuration store they persist through.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FrameCaptureError, Result};

/// Config section all add-on keys live under.
pub const CONFIG_SECTION: &str = "ADDON";
/// Key for [`CaptureSettings::capture_enabled`].
pub const KEY_ENABLE_CAPTURE: &str = "FC_EnableCapture";
/// Key for [`CaptureSettings::export_depth`].
pub const KEY_EXPORT_DEPTH: &str = "FC_ExportDepth";
/// Key for [`CaptureSettings::export_normal`].
pub const KEY_EXPORT_NORMAL: &str = "FC_ExportNormal";

/// User-facing capture toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Whether the trigger key starts a capture.
    pub capture_enabled: bool,

    /// Whether a capture exports the depth texture.
    pub export_depth: bool,

    /// Whether a capture exports the normal texture.
    pub export_normal: bool,
}

impl CaptureSettings {
    /// Reads the settings from `store`. Keys that are missing keep their defaults.
    pub fn load(store: &dyn ConfigStore) -> Self {
        let defaults = Self::default();
        let get = |key: &str, default: bool| store.get_bool(CONFIG_SECTION, key).unwrap_or(default);
        Self {
            capture_enabled: get(KEY_ENABLE_CAPTURE, defaults.capture_enabled),
            export_depth: get(KEY_EXPORT_DEPTH, defaults.export_depth),
            export_normal: get(KEY_EXPORT_NORMAL, defaults.export_normal),
        }
    }

    /// Writes all settings to `store`, stopping at the first key that fails.
    pub fn save(&self, store: &mut dyn ConfigStore) -> Result<()> {
        for (key, value) in [
            (KEY_ENABLE_CAPTURE, self.capture_enabled),
            (KEY_EXPORT_DEPTH, self.export_depth),
            (KEY_EXPORT_NORMAL, self.export_normal),
        ] {
            store.set_bool(CONFIG_SECTION, key, value).map_err(|e| {
                log::warn!("Failed to write {CONFIG_SECTION}.{key}: {e}");
                FrameCaptureError::ConfigAccess {
                    section: CONFIG_SECTION.to_string(),
                    key: key.to_string(),
                }
            })?;
        }
        Ok(())
    }
}

/// Boolean key/value store persisted by the host across sessions.
pub trait ConfigStore {
    /// Returns the value of `section.key`, or `None` if it was never set.
    fn get_bool(&self, section: &str, key: &str) -> Option<bool>;

    /// Sets `section.key` to `value`.
    fn set_bool(&mut self, section: &str, key: &str, value: bool) -> Result<()>;
}

type Sections = BTreeMap<String, BTreeMap<String, bool>>;

/// In-memory store, for hosts that persist elsewhere and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    sections: Sections,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.sections.get(section)?.get(key).copied()
    }

    fn set_bool(&mut self, section: &str, key: &str, value: bool) -> Result<()> {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a JSON file of the form `{"SECTION": {"key": bool}}`.
///
/// Every `set_bool` rewrites the file.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
    sections: Sections,
}

impl JsonConfigStore {
    /// Opens the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sections = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, starting empty", path.display());
                Sections::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, sections })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.sections)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl ConfigStore for JsonConfigStore {
    fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.sections.get(section)?.get(key).copied()
    }

    fn set_bool(&mut self, section: &str, key: &str, value: bool) -> Result<()> {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_off() {
        let settings = CaptureSettings::load(&MemoryConfigStore::new());
        assert_eq!(settings, CaptureSettings::default());
        assert!(!settings.capture_enabled);
        assert!(!settings.export_depth);
        assert!(!settings.export_normal);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryConfigStore::new();
        let settings = CaptureSettings {
            capture_enabled: true,
            export_depth: false,
            export_normal: true,
        };
        settings.save(&mut store).unwrap();
        assert_eq!(store.get_bool(CONFIG_SECTION, KEY_EXPORT_NORMAL), Some(true));
        assert_eq!(CaptureSettings::load(&store), settings);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut store = MemoryConfigStore::new();
        store.set_bool(CONFIG_SECTION, KEY_EXPORT_DEPTH, true).unwrap();
        let settings = CaptureSettings::load(&store);
        assert!(settings.export_depth);
        assert!(!settings.capture_enabled);
    }

    #[test]
    fn test_json_store_persists() {
        let dir = std::env::temp_dir().join(format!("framecap-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("framecap.json");
        let _ = std::fs::remove_file(&path);

        {
            let mut store = JsonConfigStore::open(&path).unwrap();
            assert_eq!(store.get_bool(CONFIG_SECTION, KEY_ENABLE_CAPTURE), None);
            store.set_bool(CONFIG_SECTION, KEY_ENABLE_CAPTURE, true).unwrap();
        }

        let reopened = JsonConfigStore::open(&path).unwrap();
        assert_eq!(reopened.get_bool(CONFIG_SECTION, KEY_ENABLE_CAPTURE), Some(true));
        assert_eq!(reopened.path(), path.as_path());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir = std::env::temp_dir().join(format!("framecap-config-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("framecap.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(JsonConfigStore::open(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_reports_failing_key() {
        let dir = std::env::temp_dir().join(format!("framecap-config-ro-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        // Parent directory missing, so every flush fails.
        let mut store = JsonConfigStore::open(dir.join("nested").join("framecap.json")).unwrap();
        let err = CaptureSettings::default().save(&mut store).unwrap_err();
        assert!(matches!(
            err,
            FrameCaptureError::ConfigAccess { ref key, .. } if key == KEY_ENABLE_CAPTURE
        ));
    }
}
