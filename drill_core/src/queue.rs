//! Ordered practice queue with index navigation.

use crate::config::QueueConfig;
use crate::types::ExerciseDescriptor;
use crate::{Error, Result};

/// Ordered list of exercises plus the current position.
///
/// Navigation past either end is a no-op. Editing operations are only reached
/// through the runner while nothing is playing.
#[derive(Clone, Debug, Default)]
pub struct ExerciseQueue {
    exercises: Vec<ExerciseDescriptor>,
    index: usize,
}

impl ExerciseQueue {
    pub fn new(exercises: Vec<ExerciseDescriptor>) -> Self {
        Self {
            exercises,
            index: 0,
        }
    }

    pub fn current(&self) -> Option<&ExerciseDescriptor> {
        self.exercises.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.exercises.len()
    }

    /// Move to the next exercise. Returns false at the last one.
    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Move to the previous exercise. Returns false at the first one.
    pub fn retreat(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn push(&mut self, exercise: ExerciseDescriptor) {
        self.exercises.push(exercise);
    }

    /// Remove an entry, keeping the current position on the same exercise
    /// where possible
    pub fn remove(&mut self, index: usize) -> Option<ExerciseDescriptor> {
        if index >= self.exercises.len() {
            return None;
        }
        let removed = self.exercises.remove(index);
        if index < self.index || self.index >= self.exercises.len() {
            self.index = self.index.saturating_sub(1);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.exercises.clear();
        self.index = 0;
    }

    pub fn exercises(&self) -> &[ExerciseDescriptor] {
        &self.exercises
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExerciseDescriptor> {
        self.exercises.iter()
    }

    pub fn total_duration_seconds(&self) -> u64 {
        self.exercises
            .iter()
            .map(|e| u64::from(e.duration_seconds))
            .sum()
    }

    /// Reject an empty queue or any malformed entry before playback
    pub fn validate(&self, rules: &QueueConfig) -> Result<()> {
        if self.exercises.is_empty() {
            return Err(Error::Config(
                "Practice queue is empty, add an exercise first".into(),
            ));
        }
        for (i, exercise) in self.exercises.iter().enumerate() {
            exercise.validate(rules).map_err(|e| match e {
                Error::InvalidExercise(msg) => {
                    Error::InvalidExercise(format!("Exercise {}: {}", i + 1, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Human readable queue listing
    pub fn summary(&self) -> Vec<String> {
        let total_minutes = self.total_duration_seconds().div_ceil(60);
        let mut lines = vec![format!("Practice Queue (Total: {} minutes)", total_minutes)];
        lines.extend(self.exercises.iter().enumerate().map(|(i, e)| {
            format!("{}. {} ({})", i + 1, e.name, format_duration(e.duration_seconds))
        }));
        lines
    }
}

impl From<Vec<ExerciseDescriptor>> for ExerciseQueue {
    fn from(exercises: Vec<ExerciseDescriptor>) -> Self {
        Self::new(exercises)
    }
}

/// `3min`, `90s`
pub fn format_duration(seconds: u32) -> String {
    if seconds % 60 == 0 {
        format!("{}min", seconds / 60)
    } else {
        format!("{}s", seconds)
    }
}
