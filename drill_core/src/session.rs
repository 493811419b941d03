//! Session context: tempo, metronome side effects and the RNG shared by
//! visualizations.
//!
//! The tempo is owned here rather than in a global. Exercises that need a
//! fixed tempo take a temporary override, and the value it replaced is stashed
//! in the transient store tier so an interrupted session can put it back the
//! next time a context is created.

use crate::beat::{clamp_bpm, BeatClock, DEFAULT_MAX_CATCH_UP};
use crate::config::Config;
use crate::store::{MetronomeSettings, TieredStore, TEMPO_BACKUP_KEY};
use crate::{Error, Result};
use rand::rngs::StdRng;

// ============================================================================
// Metronome
// ============================================================================

/// Audible beat side effect
pub trait Metronome {
    fn tick(&mut self);

    /// Secondary click; defaults to a normal tick
    fn tock(&mut self) {
        self.tick();
    }
}

/// Metronome that makes no sound
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentMetronome;

impl Metronome for SilentMetronome {
    fn tick(&mut self) {}
}

// ============================================================================
// Session persistence
// ============================================================================

/// What the session needs from persistence
pub trait SessionStore {
    fn save_settings(&self, settings: &MetronomeSettings) -> Result<()>;

    /// Remember the tempo in effect before an override
    fn stash_tempo(&self, previous_bpm: u32) -> Result<()>;

    fn recover_tempo(&self) -> Option<u32>;

    fn clear_tempo(&self) -> Result<()>;
}

/// Session persistence on top of the tiered store
#[derive(Clone, Debug)]
pub struct PersistedSession {
    store: TieredStore,
    backup_ttl: chrono::Duration,
}

impl PersistedSession {
    pub fn new(store: TieredStore, config: &Config) -> Self {
        Self {
            store,
            backup_ttl: config.session.override_backup_ttl(),
        }
    }
}

impl SessionStore for PersistedSession {
    fn save_settings(&self, settings: &MetronomeSettings) -> Result<()> {
        self.store.save_metronome(settings)
    }

    fn stash_tempo(&self, previous_bpm: u32) -> Result<()> {
        self.store
            .save_transient(TEMPO_BACKUP_KEY, &previous_bpm, Some(self.backup_ttl))
    }

    fn recover_tempo(&self) -> Option<u32> {
        self.store.load(TEMPO_BACKUP_KEY)
    }

    fn clear_tempo(&self) -> Result<()> {
        self.store.remove(TEMPO_BACKUP_KEY)
    }
}

// ============================================================================
// Session Context
// ============================================================================

pub struct SessionContext {
    bpm: u32,
    sound_enabled: bool,
    metronome: Box<dyn Metronome>,
    /// Tempo to restore when the active override ends
    override_previous: Option<u32>,
    max_catch_up_beats: u32,
    rng: StdRng,
    store: Box<dyn SessionStore>,
}

impl SessionContext {
    /// Create a context, restoring any tempo left behind by an override that
    /// never ended.
    pub fn new(
        settings: MetronomeSettings,
        metronome: Box<dyn Metronome>,
        store: Box<dyn SessionStore>,
        rng: StdRng,
    ) -> Self {
        let mut session = Self {
            bpm: clamp_bpm(settings.bpm),
            sound_enabled: settings.sound_on,
            metronome,
            override_previous: None,
            max_catch_up_beats: DEFAULT_MAX_CATCH_UP,
            rng,
            store,
        };

        if let Some(previous) = session.store.recover_tempo() {
            tracing::warn!(
                "Restoring tempo {} left behind by an interrupted override (was {})",
                previous,
                session.bpm
            );
            session.set_bpm(previous, true);
            if let Err(e) = session.store.clear_tempo() {
                tracing::warn!("Failed to clear tempo backup: {}", e);
            }
        }

        session
    }

    /// Cap on beat boundaries replayed after a stall
    pub fn with_max_catch_up(mut self, beats: u32) -> Self {
        self.max_catch_up_beats = beats;
        self
    }

    /// Beat clock for a visualization starting at `now_ms`
    pub fn beat_clock(&self, subdivision: u32, now_ms: u64) -> BeatClock {
        BeatClock::new(subdivision, now_ms).with_max_catch_up(self.max_catch_up_beats)
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Change the tempo (clamped). Returns the applied value.
    pub fn set_bpm(&mut self, bpm: u32, persist: bool) -> u32 {
        self.bpm = clamp_bpm(bpm);
        tracing::debug!("Tempo set to {} (persist: {})", self.bpm, persist);
        if persist {
            self.persist_settings();
        }
        self.bpm
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn set_sound_enabled(&mut self, enabled: bool, persist: bool) {
        self.sound_enabled = enabled;
        if persist {
            self.persist_settings();
        }
    }

    pub fn settings(&self) -> MetronomeSettings {
        MetronomeSettings {
            bpm: self.bpm,
            sound_on: self.sound_enabled,
        }
    }

    /// Beat click, audible only when sound is enabled
    pub fn metronome_tick(&mut self) {
        if self.sound_enabled {
            self.metronome.tick();
        }
    }

    pub fn metronome_tock(&mut self) {
        if self.sound_enabled {
            self.metronome.tock();
        }
    }

    /// Temporarily switch to `bpm`. Only one override may be active.
    pub fn begin_tempo_override(&mut self, bpm: u32) -> Result<()> {
        if let Some(previous) = self.override_previous {
            return Err(Error::State(format!(
                "A tempo override is already active (restores to {})",
                previous
            )));
        }

        let previous = self.bpm;
        if let Err(e) = self.store.stash_tempo(previous) {
            tracing::warn!("Failed to stash tempo backup: {}", e);
        }
        self.override_previous = Some(previous);
        self.set_bpm(bpm, false);
        tracing::info!("Tempo override {} -> {}", previous, self.bpm);
        Ok(())
    }

    /// Restore the tempo replaced by the active override. Returns false when
    /// no override was active.
    pub fn end_tempo_override(&mut self) -> bool {
        let Some(previous) = self.override_previous.take() else {
            return false;
        };
        self.set_bpm(previous, false);
        if let Err(e) = self.store.clear_tempo() {
            tracing::warn!("Failed to clear tempo backup: {}", e);
        }
        tracing::info!("Tempo override ended, restored {}", self.bpm);
        true
    }

    pub fn has_tempo_override(&self) -> bool {
        self.override_previous.is_some()
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn persist_settings(&self) {
        if let Err(e) = self.store.save_settings(&self.settings()) {
            tracing::warn!("Failed to save metronome settings: {}", e);
        }
    }
}
