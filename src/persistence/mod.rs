use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::catalog::{is_valid_theme_key, ThemeType};
use crate::config::{app_config_path, config_env_dirs, ConfigPathError, APP_DIR};
use crate::resolver::DEFAULT_THEME_KEY;

pub const THEME_KEY_STORAGE_KEY: &str = "app-theme";
pub const THEME_TYPE_STORAGE_KEY: &str = "app-theme-type";
const SELECTION_FILE: &str = "selection.json";

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to read selection store: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write selection store: {path}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to parse selection store")]
    Parse(#[from] serde_json::Error),
    #[error("selection storage is unavailable")]
    Unavailable,
}

impl From<ConfigPathError> for PersistenceError {
    fn from(error: ConfigPathError) -> Self {
        match error {
            ConfigPathError::MissingHomeDirectory => Self::MissingHomeDirectory,
        }
    }
}

/// The user's theme choice; the only mutable state of the theme subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub theme_key: String,
    pub theme_type: ThemeType,
}

impl Selection {
    pub fn new(theme_key: impl Into<String>, theme_type: ThemeType) -> Self {
        Self {
            theme_key: theme_key.into(),
            theme_type,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(DEFAULT_THEME_KEY, ThemeType::Glass)
    }
}

/// Flat string key/value storage in the shape of browser local storage.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> PersistenceResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> PersistenceResult<()>;
}

/// Storage backed by a flat JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn with_default_path() -> PersistenceResult<Self> {
        let (xdg_config_home, home) = config_env_dirs();
        Self::with_config_dirs(xdg_config_home.as_deref(), home.as_deref())
    }

    fn with_config_dirs(
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
    ) -> PersistenceResult<Self> {
        let path = app_config_path(APP_DIR, SELECTION_FILE, xdg_config_home, home)?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> PersistenceResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let serialized = fs::read_to_string(&self.path).map_err(|source| PersistenceError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&serialized)?)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        // Keep unrelated keys; a corrupt file is replaced.
        let mut entries = self.read_entries().unwrap_or_else(|err| {
            tracing::warn!(
                ?err,
                path = %self.path.display(),
                "discarding unreadable selection store"
            );
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());

        let serialized = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, serialized).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> PersistenceResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PersistenceError::Unavailable)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> PersistenceResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PersistenceError::Unavailable)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and writes the [`Selection`] as two independent storage keys.
/// Neither direction ever fails: reads degrade to the fallback selection and
/// failed writes are logged and dropped.
#[derive(Debug)]
pub struct SelectionStore<S> {
    storage: S,
    fallback: Selection,
}

impl<S: KeyValueStorage> SelectionStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_fallback(storage, Selection::default())
    }

    pub fn with_fallback(storage: S, fallback: Selection) -> Self {
        Self { storage, fallback }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn fallback(&self) -> &Selection {
        &self.fallback
    }

    pub fn load(&self) -> Selection {
        let theme_key = self
            .read_key(THEME_KEY_STORAGE_KEY)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .filter(|value| {
                let valid = is_valid_theme_key(value);
                if !valid {
                    tracing::warn!(key = %value, "ignoring malformed persisted theme key");
                }
                valid
            })
            .unwrap_or_else(|| self.fallback.theme_key.clone());
        let theme_type = self
            .read_key(THEME_TYPE_STORAGE_KEY)
            .map(|value| ThemeType::parse_or_default(&value))
            .unwrap_or(self.fallback.theme_type);

        Selection {
            theme_key,
            theme_type,
        }
    }

    pub fn save(&self, selection: &Selection) {
        let writes = [
            (THEME_KEY_STORAGE_KEY, selection.theme_key.as_str()),
            (THEME_TYPE_STORAGE_KEY, selection.theme_type.as_str()),
        ];
        for (key, value) in writes {
            if let Err(err) = self.storage.set_item(key, value) {
                tracing::warn!(?err, key, "failed to persist theme selection");
            }
        }
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(?err, key, "theme selection storage unreadable; using default");
                None
            }
        }
    }
}
