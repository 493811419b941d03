//! Chord changes from one chord to each target in turn.

use super::{Frame, FrameOutcome, Helpers, Visualization};
use crate::beat::BeatClock;
use crate::types::{ExerciseDescriptor, ExercisePayload};
use crate::{Error, Result};

pub struct ChordFromTo {
    /// `from, to[0], from, to[1], ...`
    sequence: Vec<String>,
    index: usize,
    beats: BeatClock,
}

/// Interleave the home chord with every target
pub fn chord_sequence(from: &str, to: &[String]) -> Vec<String> {
    to.iter()
        .flat_map(|target| [from.to_string(), target.clone()])
        .collect()
}

pub fn start(
    descriptor: &ExerciseDescriptor,
    now_ms: u64,
    helpers: &mut Helpers<'_>,
) -> Result<Box<dyn Visualization>> {
    let sequence = match &descriptor.payload {
        ExercisePayload::ChordFromTo { from, to } => chord_sequence(from, to),
        _ => Vec::new(),
    };
    if sequence.is_empty() {
        return Err(Error::Visualization(format!(
            "'{}' has no chord changes",
            descriptor.name
        )));
    }

    let drill = ChordFromTo {
        sequence,
        index: 0,
        beats: helpers.beat_clock(1, now_ms),
    };
    helpers.present(&drill.frame());
    Ok(Box::new(drill))
}

impl ChordFromTo {
    fn frame(&self) -> Frame {
        let next = (self.index + 1) % self.sequence.len();
        Frame::Chords {
            current: self.sequence[self.index].clone(),
            next: self.sequence[next].clone(),
        }
    }
}

impl Visualization for ChordFromTo {
    fn on_frame(&mut self, now_ms: u64, helpers: &mut Helpers<'_>) -> Result<FrameOutcome> {
        if helpers.is_paused() {
            self.beats.hold(now_ms);
            return Ok(FrameOutcome::Continue);
        }

        let beats = self.beats.poll(now_ms, helpers.bpm());
        for _ in 0..beats {
            helpers.metronome_tick();
            self.index = (self.index + 1) % self.sequence.len();
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
