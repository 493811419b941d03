//! Strumming drill: walks an eighth-note pattern at a fixed tempo and changes
//! chord every bar.

use super::{Frame, FrameOutcome, Helpers, Visualization};
use crate::beat::BeatClock;
use crate::types::{ExerciseDescriptor, ExerciseKind, ExercisePayload, StrumPattern, STRUM_SLOTS};
use crate::{Error, Result};
use rand::Rng;

/// Tempo held for the whole strumming exercise
pub const STRUM_TEMPO: u32 = 100;

pub struct Strumming {
    pattern: StrumPattern,
    chords: Vec<String>,
    current: String,
    next: String,
    /// Eighth notes played so far
    sub_ticks: u64,
    slot: Option<usize>,
    beats: BeatClock,
}

fn random_chord<R: Rng>(rng: &mut R, chords: &[String]) -> String {
    chords[rng.random_range(0..chords.len())].clone()
}

pub fn start(
    descriptor: &ExerciseDescriptor,
    now_ms: u64,
    helpers: &mut Helpers<'_>,
) -> Result<Box<dyn Visualization>> {
    let (pattern, chords) = match &descriptor.payload {
        ExercisePayload::Strumming { pattern, chords } if !chords.is_empty() => {
            (*pattern, chords.clone())
        }
        _ => {
            return Err(Error::Visualization(format!(
                "'{}' has no chords to strum",
                descriptor.name
            )))
        }
    };

    helpers.begin_tempo_override(STRUM_TEMPO)?;

    let current = random_chord(helpers.rng(), &chords);
    let next = random_chord(helpers.rng(), &chords);
    let drill = Strumming {
        pattern,
        chords,
        current,
        next,
        sub_ticks: 0,
        slot: None,
        beats: helpers.beat_clock(ExerciseKind::Strumming.subdivision(), now_ms),
    };

    tracing::debug!("Strumming {} at {} bpm", pattern.name(), helpers.bpm());
    helpers.present(&drill.frame());
    Ok(Box::new(drill))
}

impl Strumming {
    fn frame(&self) -> Frame {
        Frame::Strum {
            pattern: self.pattern,
            slot: self.slot,
            current: self.current.clone(),
            next: self.next.clone(),
        }
    }

    fn eighth(&mut self, helpers: &mut Helpers<'_>) {
        let slot = (self.sub_ticks % STRUM_SLOTS as u64) as usize;

        // Only down strums click
        if self.pattern.is_active(slot) && StrumPattern::is_down(slot) {
            helpers.metronome_tick();
        }

        // New bar, new chord
        if slot == 0 && self.sub_ticks != 0 {
            let next = random_chord(helpers.rng(), &self.chords);
            self.current = std::mem::replace(&mut self.next, next);
        }

        self.slot = Some(slot);
        self.sub_ticks += 1;
    }
}

impl Visualization for Strumming {
    fn on_frame(&mut self, now_ms: u64, helpers: &mut Helpers<'_>) -> Result<FrameOutcome> {
        if helpers.is_paused() {
            self.beats.hold(now_ms);
            return Ok(FrameOutcome::Continue);
        }

        let eighths = self.beats.poll(now_ms, helpers.bpm());
        for _ in 0..eighths {
            self.eighth(helpers);
        }
        if eighths > 0 {
            helpers.present(&self.frame());
        }
        Ok(FrameOutcome::Continue)
    }

    fn cleanup(&mut self, helpers: &mut Helpers<'_>) {
        helpers.end_tempo_override();
        helpers.clear();
    }
}
