//! Configuration file support for Fretdrill.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fretdrill/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub metronome: MetronomeConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub queue: QueueConfig,
}

/// Storage locations for the durable and transient store tiers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_runtime_dir")]
    pub runtime_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            runtime_dir: default_runtime_dir(),
        }
    }
}

/// Metronome defaults used before any settings have been saved
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetronomeConfig {
    #[serde(default = "default_bpm")]
    pub default_bpm: u32,

    #[serde(default)]
    pub sound_enabled: bool,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            default_bpm: default_bpm(),
            sound_enabled: false,
        }
    }
}

/// Playback timing parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Length of the "get ready" countdown before each exercise
    #[serde(default = "default_ready_seconds")]
    pub ready_seconds: u32,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Missed beat boundaries replayed in a single poll before the rest collapse
    #[serde(default = "default_max_catch_up_beats")]
    pub max_catch_up_beats: u32,

    #[serde(default = "default_override_backup_ttl_minutes")]
    pub override_backup_ttl_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ready_seconds: default_ready_seconds(),
            frame_interval_ms: default_frame_interval_ms(),
            max_catch_up_beats: default_max_catch_up_beats(),
            override_backup_ttl_minutes: default_override_backup_ttl_minutes(),
        }
    }
}

/// Longest accepted tempo backup lifetime (one week)
pub const MAX_OVERRIDE_BACKUP_TTL_MINUTES: i64 = 7 * 24 * 60;

impl SessionConfig {
    /// Lifetime of the tempo override backup, kept within 1 minute and
    /// [`MAX_OVERRIDE_BACKUP_TTL_MINUTES`]
    pub fn override_backup_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(
            self.override_backup_ttl_minutes
                .clamp(1, MAX_OVERRIDE_BACKUP_TTL_MINUTES),
        )
    }
}

/// Queue validation policy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_min_random_chords")]
    pub min_random_chords: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_random_chords: default_min_random_chords(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local/share"),
        Err(_) => std::env::temp_dir(),
    });
    base.join("fretdrill")
}

fn default_runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("fretdrill")
}

fn default_bpm() -> u32 {
    40
}

fn default_ready_seconds() -> u32 {
    4
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_max_catch_up_beats() -> u32 {
    4
}

fn default_override_backup_ttl_minutes() -> i64 {
    30
}

fn default_min_random_chords() -> usize {
    4
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the session cannot work with
    pub fn validate(&self) -> Result<()> {
        let ttl = self.session.override_backup_ttl_minutes;
        if !(1..=MAX_OVERRIDE_BACKUP_TTL_MINUTES).contains(&ttl) {
            return Err(Error::Config(format!(
                "session.override_backup_ttl_minutes must be between 1 and {}, got {}",
                MAX_OVERRIDE_BACKUP_TTL_MINUTES, ttl
            )));
        }
        if self.session.frame_interval_ms == 0 {
            return Err(Error::Config(
                "session.frame_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".config"),
            Err(_) => std::env::temp_dir(),
        });
        base.join("fretdrill").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
