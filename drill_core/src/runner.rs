//! Exercise runner state machine.
//!
//! The runner is the single owner of "what is playing". It walks the queue
//! through a get-ready countdown, the active exercise (timer plus mounted
//! visualization) and completion, and it fully tears down the previous
//! exercise before anything new is created, so at most one visualization and
//! one exercise timer are ever alive.
//!
//! The runner is driven by [`Runner::on_frame`], called once per frame by a
//! scheduler. User intents (`play`, `pause`, `next`, `previous`) are plain
//! method calls between frames. Everything observable is reported as
//! [`RunnerEvent`]s.

use crate::clock::SharedClock;
use crate::config::{Config, QueueConfig};
use crate::queue::ExerciseQueue;
use crate::session::SessionContext;
use crate::timer::{CountdownTimer, TimerEvent};
use crate::visualization::{FrameOutcome, Helpers, Mounted, Registry, Stage};
use crate::{Error, Result};

/// Render target exercises are mounted into
pub const EXECUTION_AREA: &str = "execution_area";

// ============================================================================
// Public state
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    ReadyCountdown,
    Active,
    PausedActive,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunnerEvent {
    ReadyStarted {
        index: usize,
        name: String,
        duration_seconds: u32,
    },
    ReadyTick {
        index: usize,
        remaining: u32,
    },
    ReadyCancelled {
        index: usize,
    },
    ExerciseStarted {
        index: usize,
        name: String,
    },
    TimerTick {
        index: usize,
        remaining: u32,
    },
    Paused {
        index: usize,
    },
    Resumed {
        index: usize,
    },
    ExerciseCompleted {
        index: usize,
    },
    VisualizationFailed {
        index: usize,
        message: String,
    },
    WorkoutComplete,
}

/// Which controls should be usable right now
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controls {
    pub play_enabled: bool,
    pub previous_enabled: bool,
    pub next_enabled: bool,
    /// True while the play control acts as pause
    pub playing: bool,
}

#[derive(Clone, Debug)]
pub struct RunnerOptions {
    pub ready_seconds: u32,
    /// Stage surface the visualization renders into
    pub target: String,
    pub rules: QueueConfig,
}

impl RunnerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ready_seconds: config.session.ready_seconds,
            target: EXECUTION_AREA.to_string(),
            rules: config.queue.clone(),
        }
    }
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// ============================================================================
// Runner
// ============================================================================

struct ActiveExercise {
    timer: CountdownTimer,
    /// `None` when the render target was missing
    visualization: Option<Mounted>,
    paused: bool,
}

enum Phase {
    Idle,
    Ready(CountdownTimer),
    Active(ActiveExercise),
    Complete,
}

pub struct Runner {
    queue: ExerciseQueue,
    session: SessionContext,
    stage: Stage,
    registry: Registry,
    clock: SharedClock,
    options: RunnerOptions,
    phase: Phase,
    events: Vec<RunnerEvent>,
}

impl Runner {
    pub fn new(
        queue: ExerciseQueue,
        session: SessionContext,
        stage: Stage,
        clock: SharedClock,
        options: RunnerOptions,
    ) -> Self {
        Self {
            queue,
            session,
            stage,
            registry: Registry::with_defaults(),
            clock,
            options,
            phase: Phase::Idle,
            events: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn state(&self) -> RunnerState {
        match &self.phase {
            Phase::Idle => RunnerState::Idle,
            Phase::Ready(_) => RunnerState::ReadyCountdown,
            Phase::Active(active) if active.paused => RunnerState::PausedActive,
            Phase::Active(_) => RunnerState::Active,
            Phase::Complete => RunnerState::Complete,
        }
    }

    /// True unless a countdown or an unpaused exercise is running
    pub fn is_paused(&self) -> bool {
        !matches!(
            self.state(),
            RunnerState::ReadyCountdown | RunnerState::Active
        )
    }

    pub fn controls(&self) -> Controls {
        let has_exercises = !self.queue.is_empty();
        match self.phase {
            Phase::Complete => Controls {
                play_enabled: has_exercises,
                previous_enabled: false,
                next_enabled: false,
                playing: false,
            },
            _ => Controls {
                play_enabled: has_exercises,
                previous_enabled: self.queue.has_previous(),
                next_enabled: self.queue.has_next(),
                playing: !self.is_paused(),
            },
        }
    }

    /// Seconds left on whatever countdown is visible
    pub fn remaining_seconds(&self) -> Option<u32> {
        match &self.phase {
            Phase::Ready(countdown) => Some(countdown.remaining()),
            Phase::Active(active) => Some(active.timer.remaining()),
            Phase::Idle | Phase::Complete => None,
        }
    }

    pub fn queue(&self) -> &ExerciseQueue {
        &self.queue
    }

    /// Edit the queue. Only allowed while nothing is playing.
    pub fn queue_mut(&mut self) -> Result<&mut ExerciseQueue> {
        match self.phase {
            Phase::Idle => Ok(&mut self.queue),
            Phase::Complete => {
                self.phase = Phase::Idle;
                Ok(&mut self.queue)
            }
            _ => Err(Error::State(
                "The practice queue cannot be edited during playback".into(),
            )),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Drain buffered events
    pub fn take_events(&mut self) -> Vec<RunnerEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // User intents
    // ------------------------------------------------------------------------

    /// Start the current exercise, or resume a paused one
    pub fn play(&mut self) -> Result<()> {
        match &mut self.phase {
            Phase::Idle | Phase::Complete => {
                self.queue.validate(&self.options.rules)?;
                self.begin_ready();
            }
            Phase::Active(active) if active.paused => {
                active.paused = false;
                active.timer.resume();
                tracing::info!("Resumed exercise {}", self.queue.index() + 1);
                self.events.push(RunnerEvent::Resumed {
                    index: self.queue.index(),
                });
            }
            Phase::Ready(_) | Phase::Active(_) => {}
        }
        Ok(())
    }

    /// Pause the active exercise. A pending get-ready countdown is cancelled.
    pub fn pause(&mut self) {
        let index = self.queue.index();
        match &mut self.phase {
            Phase::Ready(_) => {
                self.teardown();
                tracing::info!("Get-ready countdown cancelled");
            }
            Phase::Active(active) if !active.paused => {
                active.paused = true;
                active.timer.pause();
                tracing::info!("Paused exercise {}", index + 1);
                self.events.push(RunnerEvent::Paused { index });
            }
            _ => {}
        }
    }

    /// Play/pause button
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_paused() {
            self.play()
        } else {
            self.pause();
            Ok(())
        }
    }

    /// Go to the next exercise. Returns false when there is none or the
    /// workout is complete.
    pub fn next(&mut self) -> bool {
        if !self.queue.has_next() {
            return false;
        }
        self.navigate(ExerciseQueue::advance)
    }

    /// Go to the previous exercise. Returns false at the first one or when
    /// the workout is complete.
    pub fn previous(&mut self) -> bool {
        if !self.queue.has_previous() {
            return false;
        }
        self.navigate(ExerciseQueue::retreat)
    }

    /// Tear down whatever is playing. Used on exit.
    pub fn shutdown(&mut self) {
        if !matches!(self.phase, Phase::Idle | Phase::Complete) {
            tracing::info!("Shutting down playback");
        }
        self.teardown();
    }

    // ------------------------------------------------------------------------
    // Frame handling
    // ------------------------------------------------------------------------

    /// Advance countdowns and the active visualization by one frame
    pub fn on_frame(&mut self) {
        let now = self.clock.now_ms();
        let index = self.queue.index();

        match &mut self.phase {
            Phase::Ready(countdown) => {
                let mut ready = false;
                for event in countdown.poll() {
                    match event {
                        TimerEvent::Tick { remaining } => {
                            self.events.push(RunnerEvent::ReadyTick { index, remaining })
                        }
                        TimerEvent::Completed => ready = true,
                        TimerEvent::Cancelled => {}
                    }
                }
                if ready {
                    self.enter_active(now);
                }
            }
            Phase::Active(_) => self.frame_active(now),
            Phase::Idle | Phase::Complete => {}
        }
    }

    fn frame_active(&mut self, now: u64) {
        let index = self.queue.index();
        let Phase::Active(active) = &mut self.phase else {
            return;
        };

        let mut failure = None;
        if let Some(visualization) = active.visualization.as_mut() {
            let surface = self.stage.surface_mut(&self.options.target);
            let mut helpers = Helpers::new(
                &mut self.session,
                surface,
                active.timer.remaining(),
                active.paused,
            );
            match visualization.frame(now, &mut helpers) {
                Ok(FrameOutcome::Continue) => {}
                Ok(FrameOutcome::Finished) => {
                    visualization.cleanup(&mut helpers);
                }
                Err(e) => failure = Some(e),
            }
        }

        if let Some(e) = failure {
            self.fail(index, e);
            return;
        }

        let mut completed = false;
        for event in active.timer.poll() {
            match event {
                TimerEvent::Tick { remaining } => {
                    self.events.push(RunnerEvent::TimerTick { index, remaining })
                }
                TimerEvent::Completed => completed = true,
                TimerEvent::Cancelled => {}
            }
        }

        if completed {
            self.complete_exercise();
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn navigate(&mut self, step: fn(&mut ExerciseQueue) -> bool) -> bool {
        match self.phase {
            Phase::Complete => false,
            Phase::Idle => step(&mut self.queue),
            Phase::Ready(_) | Phase::Active(_) => {
                self.teardown();
                step(&mut self.queue);
                tracing::info!("Navigated to exercise {}", self.queue.index() + 1);
                self.begin_ready();
                true
            }
        }
    }

    fn begin_ready(&mut self) {
        let index = self.queue.index();
        let Some(exercise) = self.queue.current() else {
            self.phase = Phase::Idle;
            return;
        };

        let mut countdown = CountdownTimer::new(self.options.ready_seconds, self.clock.clone());
        countdown.start();

        tracing::info!(
            "Get ready for exercise {}: {} ({}s)",
            index + 1,
            exercise.name,
            exercise.duration_seconds
        );
        self.events.push(RunnerEvent::ReadyStarted {
            index,
            name: exercise.name.clone(),
            duration_seconds: exercise.duration_seconds,
        });
        self.phase = Phase::Ready(countdown);
    }

    fn enter_active(&mut self, now: u64) {
        let index = self.queue.index();
        let Some(descriptor) = self.queue.current().cloned() else {
            self.phase = Phase::Idle;
            return;
        };

        let mut timer = CountdownTimer::new(descriptor.duration_seconds, self.clock.clone());

        let visualization = match self.stage.surface_mut(&self.options.target) {
            None => {
                tracing::warn!(
                    "Render target '{}' not found, running '{}' without a visualization",
                    self.options.target,
                    descriptor.name
                );
                None
            }
            Some(surface) => {
                let mut helpers =
                    Helpers::new(&mut self.session, Some(surface), timer.remaining(), false);
                match self.registry.mount(&descriptor, now, &mut helpers) {
                    Ok(mounted) => Some(mounted),
                    Err(e) => {
                        tracing::error!(
                            "Failed to start visualization for '{}': {}",
                            descriptor.name,
                            e
                        );
                        helpers.clear();
                        self.phase = Phase::Idle;
                        self.events.push(RunnerEvent::VisualizationFailed {
                            index,
                            message: e.to_string(),
                        });
                        return;
                    }
                }
            }
        };

        timer.start();
        tracing::info!("Started exercise {}: {}", index + 1, descriptor.name);
        self.events.push(RunnerEvent::ExerciseStarted {
            index,
            name: descriptor.name,
        });
        self.phase = Phase::Active(ActiveExercise {
            timer,
            visualization,
            paused: false,
        });
    }

    fn complete_exercise(&mut self) {
        let index = self.queue.index();
        self.teardown();
        self.events.push(RunnerEvent::ExerciseCompleted { index });

        if self.queue.advance() {
            self.begin_ready();
        } else {
            tracing::info!("Workout complete");
            self.phase = Phase::Complete;
            self.events.push(RunnerEvent::WorkoutComplete);
        }
    }

    fn fail(&mut self, index: usize, error: Error) {
        tracing::error!("Exercise {} failed: {}", index + 1, error);
        self.teardown();
        self.events.push(RunnerEvent::VisualizationFailed {
            index,
            message: error.to_string(),
        });
    }

    /// Cancel a pending countdown or clean up the active exercise. Leaves the
    /// runner Idle.
    fn teardown(&mut self) {
        let index = self.queue.index();
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Ready(mut countdown) => {
                if countdown.cancel().is_some() {
                    self.events.push(RunnerEvent::ReadyCancelled { index });
                }
            }
            Phase::Active(mut active) => {
                if let Some(mut visualization) = active.visualization.take() {
                    let surface = self.stage.surface_mut(&self.options.target);
                    let mut helpers = Helpers::new(
                        &mut self.session,
                        surface,
                        active.timer.remaining(),
                        true,
                    );
                    visualization.cleanup(&mut helpers);
                }
                active.timer.cancel();
                tracing::debug!("Tore down exercise {}", index + 1);
            }
            Phase::Idle | Phase::Complete => {}
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.teardown();
    }
}
