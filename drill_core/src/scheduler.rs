//! Frame loops that drive a [`Runner`].
//!
//! The runner never reschedules itself; these loops call
//! [`Runner::on_frame`] at a fixed cadence, either against the wall clock or
//! by stepping a [`ManualClock`].

use crate::clock::ManualClock;
use crate::runner::Runner;
use crate::Result;
use std::time::Duration;

/// Returned by a frame callback to keep going or stop the loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Drive the runner in real time. `control` runs after every frame and
/// handles input and rendering; an error from it ends the loop.
pub fn run_realtime<F>(runner: &mut Runner, frame: Duration, mut control: F) -> Result<()>
where
    F: FnMut(&mut Runner) -> Result<LoopControl>,
{
    tracing::debug!("Frame loop started ({:?} per frame)", frame);
    loop {
        runner.on_frame();
        if control(runner)? == LoopControl::Stop {
            break;
        }
        std::thread::sleep(frame);
    }
    tracing::debug!("Frame loop stopped");
    Ok(())
}

/// Fast-forward playback by stepping a manual clock
#[derive(Clone, Debug)]
pub struct Simulation {
    clock: ManualClock,
    step_ms: u64,
}

impl Simulation {
    pub fn new(clock: ManualClock, step_ms: u64) -> Self {
        Self {
            clock,
            step_ms: step_ms.max(1),
        }
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Run frames covering `ms` milliseconds
    pub fn advance(&self, runner: &mut Runner, ms: u64) {
        let mut elapsed = 0;
        while elapsed < ms {
            let step = self.step_ms.min(ms - elapsed);
            self.clock.advance(step);
            elapsed += step;
            runner.on_frame();
        }
    }

    /// Run frames until `done` returns true or `max_ms` of simulated time
    /// passes. Returns whether `done` was reached.
    pub fn run_until<P>(&self, runner: &mut Runner, max_ms: u64, mut done: P) -> bool
    where
        P: FnMut(&mut Runner) -> bool,
    {
        let mut elapsed = 0;
        while elapsed < max_ms {
            self.clock.advance(self.step_ms);
            elapsed += self.step_ms;
            runner.on_frame();
            if done(runner) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ExerciseQueue;
    use crate::runner::{RunnerEvent, RunnerOptions, RunnerState};
    use crate::clock::Clock;
    use crate::session::test_support::MemoryStore;
    use crate::session::{SessionContext, SilentMetronome};
    use crate::store::MetronomeSettings;
    use crate::types::ExerciseDescriptor;
    use crate::visualization::Stage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn runner(clock: &ManualClock, seconds: &[u32]) -> Runner {
        let session = SessionContext::new(
            MetronomeSettings {
                bpm: 60,
                sound_on: false,
            },
            Box::new(SilentMetronome),
            Box::new(MemoryStore::default()),
            StdRng::seed_from_u64(5),
        );
        let exercises = seconds
            .iter()
            .map(|&s| ExerciseDescriptor::chord_from_to("C", vec!["G".into()], s))
            .collect();
        Runner::new(
            ExerciseQueue::new(exercises),
            session,
            Stage::new(),
            clock.shared(),
            RunnerOptions::default(),
        )
    }

    #[test]
    fn test_run_until_complete() {
        let clock = ManualClock::new(0);
        let mut runner = runner(&clock, &[2, 3]);
        runner.play().unwrap();

        let sim = Simulation::new(clock, 16);
        let mut events = Vec::new();
        let done = sim.run_until(&mut runner, 60_000, |r| {
            events.extend(r.take_events());
            r.state() == RunnerState::Complete
        });
        assert!(done);
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == RunnerEvent::WorkoutComplete)
                .count(),
            1
        );
        // 4s ready + 2s + 4s ready + 3s, give or take a frame
        assert!(sim.clock().now_ms() >= 13_000);
        assert!(sim.clock().now_ms() < 13_100);
    }

    #[test]
    fn test_run_until_gives_up() {
        let clock = ManualClock::new(0);
        let mut runner = runner(&clock, &[600]);
        runner.play().unwrap();

        let sim = Simulation::new(clock, 100);
        assert!(!sim.run_until(&mut runner, 10_000, |r| r.state() == RunnerState::Complete));
        assert_eq!(sim.clock().now_ms(), 10_000);
        assert_eq!(runner.state(), RunnerState::Active);
    }

    #[test]
    fn test_advance_steps_exact_time() {
        let clock = ManualClock::new(0);
        let mut runner = runner(&clock, &[10]);
        runner.play().unwrap();

        let sim = Simulation::new(clock, 16);
        sim.advance(&mut runner, 4_000);
        assert_eq!(sim.clock().now_ms(), 4_000);
        assert_eq!(runner.state(), RunnerState::Active);
    }

    #[test]
    fn test_realtime_loop_stops_on_request() {
        let clock = ManualClock::new(0);
        let mut runner = runner(&clock, &[10]);
        let mut frames = 0;
        run_realtime(&mut runner, Duration::from_millis(1), |_| {
            frames += 1;
            Ok(if frames == 3 {
                LoopControl::Stop
            } else {
                LoopControl::Continue
            })
        })
        .unwrap();
        assert_eq!(frames, 3);
    }

    #[test]
    fn test_realtime_loop_propagates_errors() {
        let clock = ManualClock::new(0);
        let mut runner = runner(&clock, &[]);
        let result = run_realtime(&mut runner, Duration::from_millis(1), |r| {
            r.play()?;
            Ok(LoopControl::Continue)
        });
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
