//! Beat cadence derived from a mutable tempo and a wall-clock reference.
//!
//! A [`BeatClock`] remembers the time of the last beat boundary. Every fired
//! beat advances that reference by exactly one nominal interval, so rounding
//! never accumulates into drift, and a tempo change only affects the interval
//! that is still in flight.

/// Slowest supported tempo
pub const MIN_BPM: u32 = 10;

/// Fastest supported tempo
pub const MAX_BPM: u32 = 200;

/// Beat boundaries replayed in one poll before the remainder is collapsed
pub const DEFAULT_MAX_CATCH_UP: u32 = 4;

pub fn clamp_bpm(bpm: u32) -> u32 {
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// Nominal milliseconds between boundaries: `60000 / bpm / subdivision`
pub fn beat_interval_ms(bpm: u32, subdivision: u32) -> f64 {
    60_000.0 / f64::from(clamp_bpm(bpm)) / f64::from(subdivision.max(1))
}

#[derive(Clone, Debug)]
pub struct BeatClock {
    subdivision: u32,
    reference_ms: f64,
    held_since: Option<u64>,
    max_catch_up: u32,
}

impl BeatClock {
    pub fn new(subdivision: u32, now_ms: u64) -> Self {
        Self {
            subdivision: subdivision.max(1),
            reference_ms: now_ms as f64,
            held_since: None,
            max_catch_up: DEFAULT_MAX_CATCH_UP,
        }
    }

    pub fn with_max_catch_up(mut self, max_catch_up: u32) -> Self {
        self.max_catch_up = max_catch_up.max(1);
        self
    }

    pub fn subdivision(&self) -> u32 {
        self.subdivision
    }

    pub fn interval_ms(&self, bpm: u32) -> f64 {
        beat_interval_ms(bpm, self.subdivision)
    }

    /// True at most once per boundary; advances the reference by one interval
    /// when it fires.
    pub fn has_elapsed(&mut self, now_ms: u64, bpm: u32) -> bool {
        self.release(now_ms);
        let interval = self.interval_ms(bpm);
        if now_ms as f64 - self.reference_ms >= interval {
            self.reference_ms += interval;
            true
        } else {
            false
        }
    }

    /// Number of boundaries crossed since the last poll.
    ///
    /// Up to `max_catch_up` boundaries are reported individually. Anything
    /// beyond that (a stalled host) is skipped, keeping the reference aligned
    /// to the nominal grid.
    pub fn poll(&mut self, now_ms: u64, bpm: u32) -> u32 {
        let mut fired = 0;
        while self.has_elapsed(now_ms, bpm) {
            fired += 1;
            if fired >= self.max_catch_up {
                let interval = self.interval_ms(bpm);
                let behind = now_ms as f64 - self.reference_ms;
                if behind >= interval {
                    let skipped = (behind / interval).floor();
                    self.reference_ms += skipped * interval;
                    tracing::debug!("Collapsed {} missed beat boundaries", skipped);
                }
                break;
            }
        }
        fired
    }

    /// Freeze beat measurement. Time between the first `hold` and the next
    /// poll is excluded from the cadence.
    pub fn hold(&mut self, now_ms: u64) {
        if self.held_since.is_none() {
            self.held_since = Some(now_ms);
        }
    }

    pub fn is_held(&self) -> bool {
        self.held_since.is_some()
    }

    /// Restart the cadence with a boundary at `now_ms`
    pub fn reset(&mut self, now_ms: u64) {
        self.reference_ms = now_ms as f64;
        self.held_since = None;
    }

    fn release(&mut self, now_ms: u64) {
        if let Some(since) = self.held_since.take() {
            self.reference_ms += now_ms.saturating_sub(since) as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_lengths() {
        assert_eq!(beat_interval_ms(120, 1), 500.0);
        assert_eq!(beat_interval_ms(120, 2), 250.0);
        assert_eq!(beat_interval_ms(60, 1), 1000.0);
    }

    #[test]
    fn test_bpm_is_clamped() {
        assert_eq!(clamp_bpm(0), MIN_BPM);
        assert_eq!(clamp_bpm(500), MAX_BPM);
        assert_eq!(clamp_bpm(96), 96);
        assert_eq!(beat_interval_ms(1, 1), 6000.0);
    }

    #[test]
    fn test_fires_once_per_boundary_at_frame_rate() {
        let mut clock = BeatClock::new(1, 0);
        let mut beats = 0;
        let mut now = 0;
        while now < 2_000 {
            now += 16;
            beats += clock.poll(now, 120);
        }
        assert_eq!(beats, 4);
    }

    #[test]
    fn test_has_elapsed_advances_by_nominal_interval() {
        let mut clock = BeatClock::new(1, 0);
        // Late poll: the reference still lands on the 500ms grid
        assert!(clock.has_elapsed(730, 120));
        assert!(!clock.has_elapsed(999, 120));
        assert!(clock.has_elapsed(1_000, 120));
    }

    #[test]
    fn test_multiple_boundaries_in_one_poll() {
        let mut clock = BeatClock::new(2, 0);
        // 250ms eighth notes, 800ms gap
        assert_eq!(clock.poll(800, 120), 3);
        assert_eq!(clock.poll(999, 120), 0);
        assert_eq!(clock.poll(1_000, 120), 1);
    }

    #[test]
    fn test_bpm_change_is_not_retroactive() {
        let mut clock = BeatClock::new(1, 0);
        assert_eq!(clock.poll(1_000, 60), 1);

        // Halfway through the next beat the tempo doubles; the boundary that
        // already fired stays put and the next one is 500ms after it.
        assert_eq!(clock.poll(1_400, 120), 0);
        assert_eq!(clock.poll(1_500, 120), 1);
        assert_eq!(clock.poll(2_000, 120), 1);
    }

    #[test]
    fn test_hold_excludes_paused_time() {
        let mut clock = BeatClock::new(1, 0);
        assert_eq!(clock.poll(500, 60), 0);

        for now in (500..10_500).step_by(16) {
            clock.hold(now);
        }
        assert!(clock.is_held());

        // 10s held, the pending beat is still 500ms away
        assert_eq!(clock.poll(10_500, 60), 0);
        assert!(!clock.is_held());
        assert_eq!(clock.poll(10_999, 60), 0);
        assert_eq!(clock.poll(11_000, 60), 1);
    }

    #[test]
    fn test_stall_is_capped_and_collapsed() {
        let mut clock = BeatClock::new(1, 0).with_max_catch_up(4);

        // 10.1s stall at 120 bpm crosses 20 boundaries
        assert_eq!(clock.poll(10_100, 120), 4);
        assert_eq!(clock.poll(10_100, 120), 0);
        assert_eq!(clock.poll(10_499, 120), 0);
        assert_eq!(clock.poll(10_500, 120), 1);
    }

    #[test]
    fn test_reset_restarts_cadence() {
        let mut clock = BeatClock::new(1, 0);
        clock.hold(100);
        clock.reset(5_000);
        assert!(!clock.is_held());
        assert_eq!(clock.poll(5_999, 60), 0);
        assert_eq!(clock.poll(6_000, 60), 1);
    }
}
