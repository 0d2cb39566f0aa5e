use super::{Pace, Preferences};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("preferences at {path} are corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("in-memory preferences are unusable after a panic while they were held")]
    Poisoned,
}

/// Durable home of the rider's preferences.
pub trait PreferenceStore {
    fn load(&self) -> Result<Preferences, PreferencesError>;
    fn save(&self, prefs: &Preferences) -> Result<(), PreferencesError>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PreferencesError {
        PreferencesError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(&self) -> Result<Preferences, PreferencesError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", self.path.display());
                return Ok(Preferences::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|source| PreferencesError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, prefs: &Preferences) -> Result<(), PreferencesError> {
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, prefs).map_err(|source| {
            PreferencesError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Preferences>,
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Result<Preferences, PreferencesError> {
        let saved = self.saved.lock().map_err(|_| PreferencesError::Poisoned)?;
        Ok(saved.clone())
    }

    fn save(&self, prefs: &Preferences) -> Result<(), PreferencesError> {
        let mut saved = self.saved.lock().map_err(|_| PreferencesError::Poisoned)?;
        *saved = prefs.clone();
        Ok(())
    }
}

/// Current preferences plus the store they are written through to.
///
/// Every mutation is persisted before it returns.
pub struct PreferencesManager<S: PreferenceStore> {
    store: S,
    current: Preferences,
}

impl<S: PreferenceStore> PreferencesManager<S> {
    pub fn open(store: S) -> Result<Self, PreferencesError> {
        let current = store.load()?;
        Ok(Self { store, current })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.current
    }

    pub fn is_pinned(&self, route: &str) -> bool {
        self.current.is_pinned(route)
    }

    pub fn toggle_pin(&mut self, route: &str) -> Result<bool, PreferencesError> {
        let pinned = self.current.toggle_pin(route);
        self.store.save(&self.current)?;
        Ok(pinned)
    }

    pub fn pace(&self) -> Pace {
        self.current.pace
    }

    pub fn set_pace(&mut self, pace: Pace) -> Result<(), PreferencesError> {
        self.current.pace = pace;
        self.store.save(&self.current)
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.current.speed_multiplier()
    }
}
