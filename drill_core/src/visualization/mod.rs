//! Exercise visualization contract.
//!
//! A visualization is a polled frame handler. The runner mounts one when an
//! exercise becomes active, calls [`Visualization::on_frame`] every frame with
//! a [`Helpers`] bundle, and guarantees [`Visualization::cleanup`] runs exactly
//! once on every exit path through the [`Mounted`] wrapper.
//!
//! Presentation is delegated to a [`Surface`]: visualizations only describe
//! what is on screen as a [`Frame`].

pub mod chord_from_to;
pub mod chord_random;
pub mod spider;
pub mod strumming;

use crate::beat::BeatClock;
use crate::session::SessionContext;
use crate::types::{ExerciseDescriptor, ExerciseKind, SpiderStep, StrumPattern};
use crate::{Error, Result};
use rand::rngs::StdRng;
use std::collections::HashMap;

/// Number of spider steps shown at once; column 0 is the one to play now
pub const SPIDER_WINDOW: usize = 8;

// ============================================================================
// Presentation
// ============================================================================

/// Snapshot of what an exercise wants displayed
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Spider {
        window: [SpiderStep; SPIDER_WINDOW],
    },
    Chords {
        current: String,
        next: String,
    },
    Strum {
        pattern: StrumPattern,
        /// Highlighted eighth-note slot, `None` before the first beat
        slot: Option<usize>,
        current: String,
        next: String,
    },
}

/// Render target
pub trait Surface {
    fn present(&mut self, frame: &Frame);
    fn clear(&mut self);
}

/// Named render targets
#[derive(Default)]
pub struct Stage {
    surfaces: HashMap<String, Box<dyn Surface>>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, surface: Box<dyn Surface>) {
        self.surfaces.insert(name.into(), surface);
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Surface>> {
        self.surfaces.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.surfaces.contains_key(name)
    }

    pub fn surface_mut(&mut self, name: &str) -> Option<&mut dyn Surface> {
        self.surfaces
            .get_mut(name)
            .map(|surface| &mut **surface as &mut dyn Surface)
    }
}

// ============================================================================
// Helpers bundle
// ============================================================================

/// Everything a visualization may touch while handling a frame
pub struct Helpers<'a> {
    session: &'a mut SessionContext,
    surface: Option<&'a mut dyn Surface>,
    remaining_seconds: u32,
    paused: bool,
}

impl<'a> Helpers<'a> {
    pub fn new(
        session: &'a mut SessionContext,
        surface: Option<&'a mut dyn Surface>,
        remaining_seconds: u32,
        paused: bool,
    ) -> Self {
        Self {
            session,
            surface,
            remaining_seconds,
            paused,
        }
    }

    pub fn metronome_tick(&mut self) {
        self.session.metronome_tick();
    }

    pub fn metronome_tock(&mut self) {
        self.session.metronome_tock();
    }

    pub fn bpm(&self) -> u32 {
        self.session.bpm()
    }

    pub fn beat_clock(&self, subdivision: u32, now_ms: u64) -> BeatClock {
        self.session.beat_clock(subdivision, now_ms)
    }

    pub fn set_bpm(&mut self, bpm: u32, persist: bool) -> u32 {
        self.session.set_bpm(bpm, persist)
    }

    pub fn begin_tempo_override(&mut self, bpm: u32) -> Result<()> {
        self.session.begin_tempo_override(bpm)
    }

    pub fn end_tempo_override(&mut self) -> bool {
        self.session.end_tempo_override()
    }

    /// Seconds left on the exercise timer
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn rng(&mut self) -> &mut StdRng {
        self.session.rng_mut()
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    pub fn present(&mut self, frame: &Frame) {
        if let Some(surface) = self.surface.as_deref_mut() {
            surface.present(frame);
        }
    }

    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_deref_mut() {
            surface.clear();
        }
    }
}

// ============================================================================
// Visualization contract
// ============================================================================

/// Result of handling one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    /// The visualization stopped itself and wants to be cleaned up
    Finished,
}

pub trait Visualization {
    /// Handle one frame. While paused the visualization keeps being polled
    /// but must not advance beats.
    fn on_frame(&mut self, now_ms: u64, helpers: &mut Helpers<'_>) -> Result<FrameOutcome>;

    /// Release everything taken at start (tempo overrides, the surface)
    fn cleanup(&mut self, helpers: &mut Helpers<'_>);
}

/// Builds a visualization for a descriptor. Runs once, when the exercise
/// becomes active.
pub type Factory =
    fn(&ExerciseDescriptor, u64, &mut Helpers<'_>) -> Result<Box<dyn Visualization>>;

/// A started visualization with exactly-once cleanup
pub struct Mounted {
    kind: ExerciseKind,
    inner: Box<dyn Visualization>,
    cleaned: bool,
}

impl Mounted {
    pub fn new(kind: ExerciseKind, inner: Box<dyn Visualization>) -> Self {
        Self {
            kind,
            inner,
            cleaned: false,
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn is_live(&self) -> bool {
        !self.cleaned
    }

    /// Forward a frame; a cleaned-up visualization receives no more frames
    pub fn frame(&mut self, now_ms: u64, helpers: &mut Helpers<'_>) -> Result<FrameOutcome> {
        if self.cleaned {
            return Ok(FrameOutcome::Finished);
        }
        self.inner.on_frame(now_ms, helpers)
    }

    /// Run cleanup once. Returns false if it already ran.
    pub fn cleanup(&mut self, helpers: &mut Helpers<'_>) -> bool {
        if self.cleaned {
            return false;
        }
        self.cleaned = true;
        self.inner.cleanup(helpers);
        tracing::debug!("Cleaned up {} visualization", self.kind);
        true
    }
}

/// Maps each exercise kind to its factory
#[derive(Clone)]
pub struct Registry {
    factories: HashMap<ExerciseKind, Factory>,
}

impl Registry {
    /// Empty registry with no visualizations
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The built-in visualization for every exercise kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ExerciseKind::SpiderWalk, spider::start);
        registry.register(ExerciseKind::ChordFromTo, chord_from_to::start);
        registry.register(ExerciseKind::ChordRandom, chord_random::start);
        registry.register(ExerciseKind::Strumming, strumming::start);
        registry
    }

    pub fn register(&mut self, kind: ExerciseKind, factory: Factory) {
        self.factories.insert(kind, factory);
    }

    /// Start the visualization for `descriptor`
    pub fn mount(
        &self,
        descriptor: &ExerciseDescriptor,
        now_ms: u64,
        helpers: &mut Helpers<'_>,
    ) -> Result<Mounted> {
        let factory = self.factories.get(&descriptor.kind).ok_or_else(|| {
            Error::Visualization(format!("No visualization registered for {}", descriptor.kind))
        })?;
        let inner = factory(descriptor, now_ms, helpers)?;
        Ok(Mounted::new(descriptor.kind, inner))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::session::test_support::{CountingMetronome, MemoryStore};
    use crate::store::MetronomeSettings;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Frames presented to a [`RecordingSurface`]
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Recorded {
        pub frames: Vec<Frame>,
        pub clears: usize,
    }

    /// Surface that keeps every frame it is shown. Clones share the record.
    #[derive(Clone, Debug, Default)]
    pub struct RecordingSurface {
        record: Rc<RefCell<Recorded>>,
    }

    impl RecordingSurface {
        pub fn frames(&self) -> Vec<Frame> {
            self.record.borrow().frames.clone()
        }

        pub fn last_frame(&self) -> Option<Frame> {
            self.record.borrow().frames.last().cloned()
        }

        pub fn clears(&self) -> usize {
            self.record.borrow().clears
        }
    }

    impl Surface for RecordingSurface {
        fn present(&mut self, frame: &Frame) {
            self.record.borrow_mut().frames.push(frame.clone());
        }

        fn clear(&mut self) {
            self.record.borrow_mut().clears += 1;
        }
    }

    pub struct Harness {
        pub session: SessionContext,
        pub surface: RecordingSurface,
        pub metronome: CountingMetronome,
    }

    impl Harness {
        pub fn new(bpm: u32) -> Self {
            let metronome = CountingMetronome::default();
            let session = SessionContext::new(
                MetronomeSettings { bpm, sound_on: true },
                Box::new(metronome.clone()),
                Box::new(MemoryStore::default()),
                StdRng::seed_from_u64(42),
            );
            Self {
                session,
                surface: RecordingSurface::default(),
                metronome,
            }
        }

        pub fn helpers(&mut self, remaining: u32, paused: bool) -> Helpers<'_> {
            Helpers::new(
                &mut self.session,
                Some(&mut self.surface as &mut dyn Surface),
                remaining,
                paused,
            )
        }
    }
}
