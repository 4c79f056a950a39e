//! Persistent key-value store.
//!
//! A small TOML table of string entries in the platform config directory.
//! Holds the saved server URL and the stored user alongside the auth token.
//! Writes go through a temp file and rename so a crash mid-save never
//! leaves a truncated store behind.

use crate::{AppError, AppResult};

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// Key holding the plaintext auth token.
pub const KEY_USER_TOKEN: &str = "user_token";
/// Key holding the stored user record as a JSON string.
pub const KEY_USER: &str = "user";
/// Key holding the normalized server URL.
pub const KEY_SERVER_URL: &str = "server_url";

/// On-disk key-value store backed by a TOML file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl Store {
    /// Load the store from the platform config directory, creating an
    /// empty one when no file exists yet.
    #[track_caller]
    pub fn load() -> AppResult<Self> {
        Self::open(&Self::default_path()?)
    }

    /// Load the store from an explicit path.
    #[track_caller]
    pub fn open(path: &Path) -> AppResult<Self> {
        let entries = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str(&contents).map_err(|e| AppError::Storage {
                reason: format!("Failed to parse store file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Read a stored value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Write a value and persist the store.
    #[instrument(skip(self, value))]
    pub fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Remove a value and persist the store. Removing an absent key still
    /// rewrites the file.
    #[instrument(skip(self))]
    pub fn remove(&mut self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        self.save()
    }

    #[track_caller]
    fn save(&self) -> AppResult<()> {
        let contents = toml::to_string_pretty(&self.entries).map_err(|e| AppError::Storage {
            reason: format!("Failed to serialize store: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling temp file, then rename into place.
        let temp_path = self.path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), "Store saved");
        Ok(())
    }

    #[track_caller]
    fn default_path() -> AppResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "voice-coach", "Voice-Coach").ok_or_else(|| {
            AppError::Storage {
                reason: "Could not determine config directory".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;
        Ok(dirs.config_dir().join("store.toml"))
    }
}
