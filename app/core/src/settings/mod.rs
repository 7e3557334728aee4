//! Persisted settings.
//!
//! One JSON document with two fixed namespaces: `purchase` (the verified
//! premium flag) and `changer` (rotation enabled + interval). Values are
//! plain booleans and enums; anything richer belongs to the collection
//! store, not here. A missing or corrupt file degrades to defaults with a
//! warning, never an error at startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings file name inside the app data directory.
const SETTINGS_FILE: &str = "settings.json";

/// App data directory name.
const APP_DIR: &str = "mural";

// ============================================================================
// Changer Config
// ============================================================================

/// The fixed ordered set of rotation intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangerInterval {
    #[default]
    ThirtyMinutes,
    OneHour,
    SixHours,
    OneDay,
    ThreeDays,
}

impl ChangerInterval {
    /// All allowed values, in menu order.
    pub const ALL: [Self; 5] = [
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::SixHours,
        Self::OneDay,
        Self::ThreeDays,
    ];

    /// The interval length in seconds.
    #[must_use]
    pub const fn as_secs(self) -> u64 {
        match self {
            Self::ThirtyMinutes => 30 * 60,
            Self::OneHour => 60 * 60,
            Self::SixHours => 6 * 60 * 60,
            Self::OneDay => 24 * 60 * 60,
            Self::ThreeDays => 3 * 24 * 60 * 60,
        }
    }

    /// The interval as a [`Duration`].
    #[must_use]
    pub const fn duration(self) -> Duration { Duration::from_secs(self.as_secs()) }
}

/// The `changer` namespace: rotation on/off and its interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangerSettings {
    /// Whether automatic rotation is on.
    #[serde(default)]
    pub enabled: bool,
    /// The rotation interval.
    #[serde(default)]
    pub interval: ChangerInterval,
}

// ============================================================================
// Document
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct PurchaseSettings {
    #[serde(default)]
    premium: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    purchase: PurchaseSettings,
    #[serde(default)]
    changer: ChangerSettings,
}

/// Errors from persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The per-user data directory could not be determined.
    #[error("no user data directory available")]
    NoDataDir,
    /// Reading or writing the settings file failed.
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    /// The document could not be serialized.
    #[error("settings serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// Store
// ============================================================================

/// The persisted settings store.
///
/// Reads happen against the in-memory document; every setter writes the
/// whole document back through a temp-file rename so a crash mid-write
/// never leaves a torn file.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    doc: Mutex<SettingsDocument>,
}

impl SettingsStore {
    /// Opens the store at the default per-user location.
    ///
    /// # Errors
    ///
    /// [`SettingsError::NoDataDir`] when the platform data directory is
    /// unavailable.
    pub fn open_default() -> Result<Self, SettingsError> {
        let dir = dirs::data_dir().ok_or(SettingsError::NoDataDir)?;
        Ok(Self::open(dir.join(APP_DIR).join(SETTINGS_FILE)))
    }

    /// Opens the store at `path`, loading the existing document if any.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = load_or_default(&path);
        Self { path, doc: Mutex::new(doc) }
    }

    /// Whether the premium purchase has been verified.
    #[must_use]
    pub fn is_premium(&self) -> bool { self.doc.lock().purchase.premium }

    /// Records the verified premium state.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when the write fails; the in-memory
    /// value is updated regardless so the session stays consistent.
    pub fn set_premium(&self, premium: bool) -> Result<(), SettingsError> {
        let mut doc = self.doc.lock();
        doc.purchase.premium = premium;
        self.save(&doc)
    }

    /// The current changer namespace.
    #[must_use]
    pub fn changer(&self) -> ChangerSettings { self.doc.lock().changer }

    /// Persists the changer namespace.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingsError`] when the write fails.
    pub fn set_changer(&self, changer: ChangerSettings) -> Result<(), SettingsError> {
        let mut doc = self.doc.lock();
        doc.changer = changer;
        self.save(&doc)
    }

    /// Where the document lives on disk.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    fn save(&self, doc: &SettingsDocument) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn load_or_default(path: &Path) -> SettingsDocument {
    let Ok(raw) = fs::read_to_string(path) else {
        return SettingsDocument::default();
    };
    match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "unreadable settings, using defaults");
            SettingsDocument::default()
        }
    }
}
