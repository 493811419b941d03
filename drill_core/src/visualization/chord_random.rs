//! Random chord changes: the next chord is drawn from the set, never repeating
//! the current one.

use super::{Frame, FrameOutcome, Helpers, Visualization};
use crate::beat::BeatClock;
use crate::types::{ExerciseDescriptor, ExercisePayload};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::Rng;

pub struct ChordRandom {
    chords: Vec<String>,
    current: String,
    next: String,
    beats: BeatClock,
}

/// Pick a chord other than `exclude`. Falls back to the first chord when
/// nothing else is left.
pub fn pick_chord(rng: &mut StdRng, chords: &[String], exclude: Option<&str>) -> String {
    let candidates: Vec<&String> = chords
        .iter()
        .filter(|chord| Some(chord.as_str()) != exclude)
        .collect();
    if candidates.is_empty() {
        return chords.first().cloned().unwrap_or_default();
    }
    candidates[rng.random_range(0..candidates.len())].clone()
}

pub fn start(
    descriptor: &ExerciseDescriptor,
    now_ms: u64,
    helpers: &mut Helpers<'_>,
) -> Result<Box<dyn Visualization>> {
    let chords = match &descriptor.payload {
        ExercisePayload::ChordRandom { chords } if !chords.is_empty() => chords.clone(),
        _ => {
            return Err(Error::Visualization(format!(
                "'{}' has no chords to pick from",
                descriptor.name
            )))
        }
    };

    let current = pick_chord(helpers.rng(), &chords, None);
    let next = pick_chord(helpers.rng(), &chords, Some(current.as_str()));
    let drill = ChordRandom {
        chords,
        current,
        next,
        beats: helpers.beat_clock(1, now_ms),
    };
    helpers.present(&drill.frame());
    Ok(Box::new(drill))
}

impl ChordRandom {
    fn frame(&self) -> Frame {
        Frame::Chords {
            current: self.current.clone(),
            next: self.next.clone(),
        }
    }
}

impl Visualization for ChordRandom {
    fn on_frame(&mut self, now_ms: u64, helpers: &mut Helpers<'_>) -> Result<FrameOutcome> {
        if helpers.is_paused() {
            self.beats.hold(now_ms);
            return Ok(FrameOutcome::Continue);
        }

        let beats = self.beats.poll(now_ms, helpers.bpm());
        for _ in 0..beats {
            helpers.metronome_tick();
            let next = pick_chord(helpers.rng(), &self.chords, Some(self.next.as_str()));
            self.current = std::mem::replace(&mut self.next, next);
        }
        if beats > 0 {
            helpers.present(&self.frame());
        }
        Ok(FrameOutcome::Continue)
    }

    fn cleanup(&mut self, helpers: &mut Helpers<'_>) {
        helpers.clear();
    }
}
