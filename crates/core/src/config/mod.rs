//! Host settings: the global source of hook configuration
//!
//! Settings live in a JSON5 file (comments and trailing commas allowed) so the
//! same file an editor writes can be read as-is. Keys may be flat and dotted,
//! VS Code style, or nested:
//!
//! ```json
//! {
//!   // flat
//!   "hooks.preCommit": [{ "command": "cargo fmt --check", "abortOnFailure": true }],
//!   // nested
//!   "hooks": { "fileSave": { "script": "~/bin/on-save.sh" } }
//! }
//! ```
//!
//! A flat key wins over the nested path for the same name.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::env::{HOOKWORK_CONFIG_DIR, HOOKWORK_SETTINGS};
use crate::hooks::SettingsSource;

/// File name of the settings file inside the config directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: Map<String, Value>,
    path: Option<PathBuf>,
}

impl Settings {
    /// Settings with no values, e.g. when no settings file exists
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse settings text. The top level must be an object.
    pub fn from_json5(content: &str) -> Result<Self> {
        let value: Value = json5::from_str(content).context("settings are not valid JSON5")?;
        match value {
            Value::Object(values) => Ok(Self { values, path: None }),
            other => anyhow::bail!("settings must be a JSON object, got {}", other),
        }
    }

    /// Load settings from `path`. A missing file yields empty settings.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings file at {}", path.display());
            return Ok(Self {
                values: Map::new(),
                path: Some(path.to_path_buf()),
            });
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut settings = Self::from_json5(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        settings.path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// `$HOOKWORK_SETTINGS`, then `$HOOKWORK_CONFIG_DIR/settings.json`, then
    /// the platform config directory
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(HOOKWORK_SETTINGS) {
            return expand_path(Path::new(&path));
        }
        if let Ok(dir) = std::env::var(HOOKWORK_CONFIG_DIR) {
            return Ok(expand_path(Path::new(&dir))?.join(SETTINGS_FILE_NAME));
        }
        let dirs = ProjectDirs::from("dev", "hookwork", "hookwork")
            .context("could not determine the user config directory")?;
        Ok(dirs.config_dir().join(SETTINGS_FILE_NAME))
    }

    /// File these settings were loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a dotted key, trying the flat form before the nested one
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }
        let mut parts = key.split('.');
        let first = self.values.get(parts.next()?)?;
        parts.try_fold(first, |value, part| value.get(part))
    }
}

impl SettingsSource for Settings {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

/// Settings backed by a file that is re-read whenever it changes on disk.
///
/// Lookups never fail: a missing or broken file reads as empty settings, with
/// a warning for the broken case.
#[derive(Debug)]
pub struct SettingsFile {
    path: PathBuf,
    cache: Mutex<CachedSettings>,
}

#[derive(Debug, Default)]
struct CachedSettings {
    modified: Option<SystemTime>,
    loaded: bool,
    settings: Settings,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(CachedSettings::default()),
        }
    }

    fn current(&self) -> Settings {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if !cache.loaded || cache.modified != modified {
            cache.settings = match Settings::load_from(&self.path) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Ignoring settings: {:#}", e);
                    Settings::empty()
                }
            };
            cache.modified = modified;
            cache.loaded = true;
        }
        cache.settings.clone()
    }
}

impl SettingsSource for SettingsFile {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.current().get(key).cloned()
    }
}

/// Expand `~` and `${VAR}` in a user-supplied path
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("failed to expand path {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
