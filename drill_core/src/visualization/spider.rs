//! Spider walk: a scrolling window of fretboard positions, one step per beat.

use super::{Frame, FrameOutcome, Helpers, Visualization, SPIDER_WINDOW};
use crate::beat::BeatClock;
use crate::types::{ExerciseDescriptor, ExercisePayload, SpiderStep};
use crate::{Error, Result};

pub struct SpiderWalk {
    positions: Vec<SpiderStep>,
    window: [SpiderStep; SPIDER_WINDOW],
    /// Position that enters the window on the next beat
    next_index: usize,
    beats: BeatClock,
}

pub fn start(
    descriptor: &ExerciseDescriptor,
    now_ms: u64,
    helpers: &mut Helpers<'_>,
) -> Result<Box<dyn Visualization>> {
    let positions = match &descriptor.payload {
        ExercisePayload::SpiderWalk { positions } if !positions.is_empty() => positions.clone(),
        _ => {
            return Err(Error::Visualization(format!(
                "'{}' has no spider positions",
                descriptor.name
            )))
        }
    };

    let len = positions.len();
    let window = std::array::from_fn(|i| positions[i % len]);
    let walk = SpiderWalk {
        next_index: SPIDER_WINDOW % len,
        positions,
        window,
        beats: helpers.beat_clock(1, now_ms),
    };

    tracing::debug!("Spider walk '{}' with {} steps", descriptor.name, len);
    helpers.present(&walk.frame());
    Ok(Box::new(walk))
}

impl SpiderWalk {
    fn frame(&self) -> Frame {
        Frame::Spider {
            window: self.window,
        }
    }

    /// Drop the played column and pull in the next position
    fn shift(&mut self) {
        self.window.rotate_left(1);
        self.window[SPIDER_WINDOW - 1] = self.positions[self.next_index];
        self.next_index = (self.next_index + 1) % self.positions.len();
    }
}

impl Visualization for SpiderWalk {
    fn on_frame(&mut self, now_ms: u64, helpers: &mut Helpers<'_>) -> Result<FrameOutcome> {
        if helpers.is_paused() {
            self.beats.hold(now_ms);
            return Ok(FrameOutcome::Continue);
        }

        let beats = self.beats.poll(now_ms, helpers.bpm());
        for _ in 0..beats {
            helpers.metronome_tick();
            self.shift();
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

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::*;
    use crate::types::GuitarString;

    fn descriptor(steps: usize) -> ExerciseDescriptor {
        let positions = (1..=steps as u8)
            .map(|fret| SpiderStep::note(GuitarString::LowE, fret))
            .collect();
        ExerciseDescriptor::spider_walk("Test walk", 60, positions)
    }

    fn fret_at(frame: &Frame, column: usize) -> Option<u8> {
        match frame {
            Frame::Spider { window } => window[column].position().map(|p| p.fret),
            _ => panic!("Expected spider frame"),
        }
    }

    #[test]
    fn test_window_scrolls_one_column_per_beat() {
        let mut harness = Harness::new(60);
        let mut walk = start(&descriptor(10), 0, &mut harness.helpers(60, false)).unwrap();

        let first = harness.surface.last_frame().unwrap();
        assert_eq!(fret_at(&first, 0), Some(1));
        assert_eq!(fret_at(&first, 7), Some(8));

        walk.on_frame(999, &mut harness.helpers(60, false)).unwrap();
        assert_eq!(harness.metronome.ticks(), 0);

        walk.on_frame(1_000, &mut harness.helpers(59, false)).unwrap();
        assert_eq!(harness.metronome.ticks(), 1);
        let frame = harness.surface.last_frame().unwrap();
        assert_eq!(fret_at(&frame, 0), Some(2));
        assert_eq!(fret_at(&frame, 7), Some(9));
    }

    #[test]
    fn test_short_walk_wraps() {
        let mut harness = Harness::new(60);
        let mut walk = start(&descriptor(3), 0, &mut harness.helpers(60, false)).unwrap();

        let first = harness.surface.last_frame().unwrap();
        assert_eq!(fret_at(&first, 3), Some(1));

        walk.on_frame(1_000, &mut harness.helpers(60, false)).unwrap();
        let frame = harness.surface.last_frame().unwrap();
        // 8 % 3 == 2, so fret 3 enters next
        assert_eq!(fret_at(&frame, 7), Some(3));
    }

    #[test]
    fn test_paused_walk_holds_position() {
        let mut harness = Harness::new(60);
        let mut walk = start(&descriptor(10), 0, &mut harness.helpers(60, false)).unwrap();

        for now in (0..5_000).step_by(16) {
            walk.on_frame(now, &mut harness.helpers(60, true)).unwrap();
        }
        assert_eq!(harness.metronome.ticks(), 0);
        assert_eq!(harness.surface.frames().len(), 1);
    }

    #[test]
    fn test_empty_walk_is_rejected() {
        let mut harness = Harness::new(60);
        let empty = ExerciseDescriptor::spider_walk("Empty", 60, Vec::new());
        assert!(start(&empty, 0, &mut harness.helpers(60, false)).is_err());
    }
}
