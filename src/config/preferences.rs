//! Persisted user preferences
//!
//! Preferences live in a small JSON object. Only `"theme"` is interpreted;
//! any other keys are carried through untouched so a newer build's settings
//! survive a round trip through an older one. Reading never fails: a missing
//! file gives defaults and a broken one gives defaults plus a warning.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ui::theme::Theme;

/// Environment variable overriding the preferences file location
pub const PREFERENCES_ENV: &str = "SEQDRAW_PREFERENCES";

const APP_DIR: &str = "seqdraw";
const FILE_NAME: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Failed to read preferences from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Preferences file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to create preferences directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Stored theme choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    /// Follow the operating system
    #[default]
    System,
}

impl ThemePreference {
    /// Effective theme, asking the OS only when the choice is `System`
    pub fn resolve(self, system: impl FnOnce() -> Theme) -> Theme {
        match self {
            ThemePreference::Light => Theme::Light,
            ThemePreference::Dark => Theme::Dark,
            ThemePreference::System => system(),
        }
    }
}

impl From<Theme> for ThemePreference {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Light => ThemePreference::Light,
            Theme::Dark => ThemePreference::Dark,
        }
    }
}

// Unknown or mistyped values fall back to the OS theme instead of
// discarding the whole file.
impl<'de> Deserialize<'de> for ThemePreference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let pref = match value.as_str().map(str::to_ascii_lowercase).as_deref() {
            Some("light") => ThemePreference::Light,
            Some("dark") => ThemePreference::Dark,
            Some("system") => ThemePreference::System,
            _ => {
                tracing::warn!(value = %value, "unrecognized theme preference; following the OS");
                ThemePreference::System
            }
        };
        Ok(pref)
    }
}

/// Mapping of option name to value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: ThemePreference,

    /// Keys this build does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JSON file holding the preferences
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$SEQDRAW_PREFERENCES` or the per-user config directory
    pub fn default_location() -> Self {
        Self::new(default_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file, or `None` when it does not exist
    pub fn try_load(&self) -> Result<Option<Preferences>, PreferencesError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PreferencesError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| PreferencesError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Reads the file, falling back to defaults on any problem
    pub fn load(&self) -> Preferences {
        match self.try_load() {
            Ok(Some(prefs)) => {
                tracing::debug!(path = %self.path.display(), theme = ?prefs.theme, "preferences loaded");
                prefs
            }
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "no preferences file; using defaults");
                Preferences::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable preferences");
                Preferences::default()
            }
        }
    }

    pub fn save(&self, prefs: &Preferences) -> Result<(), PreferencesError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| PreferencesError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let mut text = serde_json::to_string_pretty(prefs)?;
        text.push('\n');
        fs::write(&self.path, text).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os(PREFERENCES_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .or_else(|| dirs::home_dir().map(|home| home.join(format!(".{APP_DIR}"))))
        .unwrap_or_default()
        .join(FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> PreferencesStore {
        PreferencesStore::new(dir.path().join("nested").join(FILE_NAME))
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.try_load().unwrap().is_none());
        assert_eq!(store.load(), Preferences::default());
        assert_eq!(store.load().theme, ThemePreference::System);
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "{ theme: dark").unwrap();
        let store = PreferencesStore::new(&path);

        assert!(matches!(store.try_load(), Err(PreferencesError::Parse { .. })));
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn save_then_load_keeps_theme_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"theme": "light", "zoom": 2}"#).unwrap();

        let mut prefs = store.load();
        assert_eq!(prefs.theme, ThemePreference::Light);
        prefs.theme = ThemePreference::Dark;
        store.save(&prefs).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["zoom"], 2);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Preferences::default()).unwrap();
        assert!(store.path().is_file());
    }

    #[test]
    fn unknown_theme_value_follows_the_os() {
        let prefs: Preferences = serde_json::from_str(r#"{"theme": "solarized"}"#).unwrap();
        assert_eq!(prefs.theme, ThemePreference::System);
        let prefs: Preferences = serde_json::from_str(r#"{"theme": "DARK"}"#).unwrap();
        assert_eq!(prefs.theme, ThemePreference::Dark);
    }

    #[test]
    fn resolve_only_asks_the_os_for_system() {
        assert_eq!(ThemePreference::Dark.resolve(|| panic!("not asked")), Theme::Dark);
        assert_eq!(ThemePreference::System.resolve(|| Theme::Dark), Theme::Dark);
        assert_eq!(ThemePreference::from(Theme::Light), ThemePreference::Light);
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let store = PreferencesStore::new(dir.path());
        assert!(matches!(
            store.save(&Preferences::default()),
            Err(PreferencesError::Write { .. })
        ));
    }
}
