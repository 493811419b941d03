#![forbid(unsafe_code)]

//! Core engine for the Fretdrill guitar practice trainer.
//!
//! This crate provides:
//! - Domain types (exercise descriptors, spider steps, strum patterns)
//! - Chord library and spider-walk pattern catalog
//! - Countdown timer and beat clock
//! - Exercise queue and the runner state machine
//! - Visualization contract and the built-in exercise visualizations
//! - Session context (tempo, metronome) and tiered persistence

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod clock;
pub mod timer;
pub mod beat;
pub mod queue;
pub mod store;
pub mod session;
pub mod visualization;
pub mod runner;
pub mod scheduler;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use queue::ExerciseQueue;
pub use store::{MetronomeSettings, TieredStore};
pub use session::{Metronome, PersistedSession, SessionContext};
pub use visualization::{Frame, Stage, Surface};
pub use runner::{Controls, Runner, RunnerEvent, RunnerOptions, RunnerState, EXECUTION_AREA};
pub use scheduler::{run_realtime, LoopControl, Simulation};
