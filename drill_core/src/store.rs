//! Tiered key/value persistence with file locking.
//!
//! The store holds an ordered list of directory tiers: a transient tier
//! (runtime directory, cleared on logout/reboot) followed by the durable data
//! directory. Reads return the first readable, unexpired entry; writes go to
//! every tier. Each key is one JSON envelope file per tier.

use crate::beat::clamp_bpm;
use crate::config::Config;
use crate::types::ExerciseDescriptor;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persisted practice queue
pub const QUEUE_KEY: &str = "exercise_list";

/// Persisted tempo and sound preference
pub const METRONOME_KEY: &str = "metronome_settings";

/// Tempo in effect before a temporary override
pub const TEMPO_BACKUP_KEY: &str = "tempo_override";

/// Stored wrapper carrying write time and optional expiry
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    saved_at: DateTime<Utc>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    value: T,
}

/// Metronome preferences shared by the CLI and playback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetronomeSettings {
    pub bpm: u32,
    pub sound_on: bool,
}

impl MetronomeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bpm: clamp_bpm(config.metronome.default_bpm),
            sound_on: config.metronome.sound_enabled,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TieredStore {
    tiers: Vec<PathBuf>,
}

impl TieredStore {
    /// Transient tier first, durable tier second
    pub fn new(runtime_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            tiers: vec![runtime_dir.into(), data_dir.into()],
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.data.runtime_dir, &config.data.data_dir)
    }

    pub fn tiers(&self) -> &[PathBuf] {
        &self.tiers
    }

    fn entry_path(tier: &Path, key: &str) -> PathBuf {
        tier.join(format!("{}.json", key))
    }

    /// First readable, unexpired value across the tiers
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.tiers
            .iter()
            .find_map(|tier| read_entry(&Self::entry_path(tier, key)))
    }

    /// Write the value to every tier
    pub fn save<T: Serialize>(&self, key: &str, value: &T, max_age: Option<Duration>) -> Result<()> {
        for tier in &self.tiers {
            write_entry(&Self::entry_path(tier, key), value, max_age)?;
        }
        Ok(())
    }

    /// Write the value to the transient tier only
    pub fn save_transient<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        max_age: Option<Duration>,
    ) -> Result<()> {
        let tier = self
            .tiers
            .first()
            .ok_or_else(|| Error::Other("Store has no tiers".into()))?;
        write_entry(&Self::entry_path(tier, key), value, max_age)
    }

    /// Delete the key from every tier
    pub fn remove(&self, key: &str) -> Result<()> {
        for tier in &self.tiers {
            let path = Self::entry_path(tier, key);
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Removed {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Persisted practice queue, empty when nothing is stored.
    ///
    /// Entries are decoded one by one so a single bad descriptor is reported
    /// by position instead of silently emptying the queue.
    pub fn load_queue(&self) -> Result<Vec<ExerciseDescriptor>> {
        let entries: Vec<serde_json::Value> = match self.load(QUEUE_KEY) {
            Some(entries) => entries,
            None => return Ok(Vec::new()),
        };
        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                serde_json::from_value(entry).map_err(|e| {
                    Error::InvalidExercise(format!("Exercise {}: {}", i + 1, e))
                })
            })
            .collect()
    }

    pub fn save_queue(&self, exercises: &[ExerciseDescriptor]) -> Result<()> {
        self.save(QUEUE_KEY, &exercises, None)
    }

    /// Persisted metronome settings, falling back to the configured defaults
    pub fn load_metronome(&self, config: &Config) -> MetronomeSettings {
        match self.load::<MetronomeSettings>(METRONOME_KEY) {
            Some(settings) => MetronomeSettings {
                bpm: clamp_bpm(settings.bpm),
                ..settings
            },
            None => MetronomeSettings::from_config(config),
        }
    }

    pub fn save_metronome(&self, settings: &MetronomeSettings) -> Result<()> {
        self.save(METRONOME_KEY, settings, None)
    }
}

/// Read one envelope with a shared lock. Missing, unreadable, corrupted and
/// expired entries all yield `None`.
fn read_entry<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open store entry {:?}: {}. Skipping.", path, e);
            return None;
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock store entry {:?}: {}. Skipping.", path, e);
        return None;
    }

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let _ = file.unlock();
    if let Err(e) = read {
        tracing::warn!("Failed to read store entry {:?}: {}. Skipping.", path, e);
        return None;
    }

    match serde_json::from_str::<Envelope<T>>(&contents) {
        Ok(envelope) => {
            if envelope.expires_at.is_some_and(|at| at <= Utc::now()) {
                tracing::debug!("Store entry {:?} expired at {:?}", path, envelope.expires_at);
                return None;
            }
            tracing::debug!("Loaded store entry {:?}", path);
            Some(envelope.value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse store entry {:?}: {}. Skipping.", path, e);
            None
        }
    }
}

/// Atomically replace one envelope: temp file, exclusive lock, sync, rename
fn write_entry<T: Serialize>(path: &Path, value: &T, max_age: Option<Duration>) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let saved_at = Utc::now();
    let expires_at = max_age
        .map(|age| {
            saved_at.checked_add_signed(age).ok_or_else(|| {
                Error::Other(format!("Expiry {} is out of range for {:?}", age, path))
            })
        })
        .transpose()?;
    let envelope = Envelope {
        saved_at,
        expires_at,
        value,
    };

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(&envelope)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved store entry {:?}", path);
    Ok(())
}
