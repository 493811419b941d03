//! Core domain types for the guitar practice trainer.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise kinds and their payloads
//! - Fretboard positions for spider walks
//! - Eighth-note strum patterns
//! - The exercise descriptor that makes up one queue entry

use crate::config::QueueConfig;
use crate::{catalog, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Exercise Kinds
// ============================================================================

/// Type of practice exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    SpiderWalk,
    ChordFromTo,
    ChordRandom,
    Strumming,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::SpiderWalk,
        ExerciseKind::ChordFromTo,
        ExerciseKind::ChordRandom,
        ExerciseKind::Strumming,
    ];

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            ExerciseKind::SpiderWalk => "Spider Walk",
            ExerciseKind::ChordFromTo => "Chord Changes From/To",
            ExerciseKind::ChordRandom => "Random Chord Changes",
            ExerciseKind::Strumming => "Strumming",
        }
    }

    /// Beat subdivision the visualization runs at (2 = eighth notes)
    pub fn subdivision(self) -> u32 {
        match self {
            ExerciseKind::Strumming => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Fretboard Types
// ============================================================================

/// Guitar string, ordered as displayed (high e on top)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuitarString {
    HighE,
    B,
    G,
    D,
    A,
    LowE,
}

impl GuitarString {
    /// Strings in display-row order
    pub const ALL: [GuitarString; 6] = [
        GuitarString::HighE,
        GuitarString::B,
        GuitarString::G,
        GuitarString::D,
        GuitarString::A,
        GuitarString::LowE,
    ];

    /// Display row (0 = high e, 5 = low E)
    pub fn row(self) -> usize {
        match self {
            GuitarString::HighE => 0,
            GuitarString::B => 1,
            GuitarString::G => 2,
            GuitarString::D => 3,
            GuitarString::A => 4,
            GuitarString::LowE => 5,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            GuitarString::HighE => 'e',
            GuitarString::B => 'B',
            GuitarString::G => 'G',
            GuitarString::D => 'D',
            GuitarString::A => 'A',
            GuitarString::LowE => 'E',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'e' => Some(GuitarString::HighE),
            'B' => Some(GuitarString::B),
            'G' => Some(GuitarString::G),
            'D' => Some(GuitarString::D),
            'A' => Some(GuitarString::A),
            'E' => Some(GuitarString::LowE),
            _ => None,
        }
    }
}

/// Highest fret accepted in a spider position
pub const MAX_FRET: u8 = 24;

/// A fretted note
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FretPosition {
    pub string: GuitarString,
    pub fret: u8,
}

/// One step of a spider walk: a fretted note or a rest.
///
/// Serialized as `"E,1"` for a note and `","` for a rest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpiderStep(pub Option<FretPosition>);

impl SpiderStep {
    pub const REST: SpiderStep = SpiderStep(None);

    pub fn note(string: GuitarString, fret: u8) -> Self {
        SpiderStep(Some(FretPosition { string, fret }))
    }

    pub fn position(&self) -> Option<FretPosition> {
        self.0
    }

    pub fn is_rest(&self) -> bool {
        self.0.is_none()
    }
}

impl FromStr for SpiderStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "," {
            return Ok(SpiderStep::REST);
        }

        let (string, fret) = trimmed
            .split_once(',')
            .ok_or_else(|| Error::InvalidExercise(format!("Invalid spider step '{}'", s)))?;

        let mut chars = string.trim().chars();
        let string = match (chars.next(), chars.next()) {
            (Some(c), None) => GuitarString::from_symbol(c),
            _ => None,
        }
        .ok_or_else(|| Error::InvalidExercise(format!("Unknown string in spider step '{}'", s)))?;

        let fret: u8 = fret
            .trim()
            .parse()
            .map_err(|_| Error::InvalidExercise(format!("Invalid fret in spider step '{}'", s)))?;
        if fret > MAX_FRET {
            return Err(Error::InvalidExercise(format!(
                "Fret {} out of range in spider step '{}'",
                fret, s
            )));
        }

        Ok(SpiderStep::note(string, fret))
    }
}

impl TryFrom<String> for SpiderStep {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SpiderStep> for String {
    fn from(step: SpiderStep) -> Self {
        step.to_string()
    }
}

impl fmt::Display for SpiderStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(pos) => write!(f, "{},{}", pos.string.symbol(), pos.fret),
            None => f.write_str(","),
        }
    }
}

// ============================================================================
// Strumming
// ============================================================================

/// Number of eighth-note slots in a strum pattern (one 4/4 bar)
pub const STRUM_SLOTS: usize = 8;

/// Which eighth-note slots of a bar are strummed.
///
/// Even slots are down strums ("1 2 3 4"), odd slots are up strums ("+").
/// Serialized as eight `0`/`1` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct StrumPattern([bool; STRUM_SLOTS]);

impl StrumPattern {
    pub fn new(slots: [bool; STRUM_SLOTS]) -> Self {
        StrumPattern(slots)
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.0[slot % STRUM_SLOTS]
    }

    pub fn is_down(slot: usize) -> bool {
        slot % 2 == 0
    }

    pub fn any_active(&self) -> bool {
        self.0.iter().any(|&s| s)
    }

    /// Pattern name such as `D-DU-UDU`
    pub fn name(&self) -> String {
        self.0
            .iter()
            .enumerate()
            .map(|(i, &active)| match (active, Self::is_down(i)) {
                (false, _) => '-',
                (true, true) => 'D',
                (true, false) => 'U',
            })
            .collect()
    }
}

impl FromStr for StrumPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.len() != STRUM_SLOTS {
            return Err(Error::InvalidExercise(format!(
                "Strum pattern '{}' must have {} slots",
                s, STRUM_SLOTS
            )));
        }

        let mut slots = [false; STRUM_SLOTS];
        for (i, c) in chars.into_iter().enumerate() {
            slots[i] = match c.to_ascii_uppercase() {
                '-' | '.' => false,
                'D' if Self::is_down(i) => true,
                'U' if !Self::is_down(i) => true,
                other => {
                    return Err(Error::InvalidExercise(format!(
                        "Unexpected '{}' at slot {} of strum pattern '{}'",
                        other,
                        i + 1,
                        s
                    )))
                }
            };
        }
        Ok(StrumPattern(slots))
    }
}

impl TryFrom<Vec<u8>> for StrumPattern {
    type Error = Error;

    fn try_from(values: Vec<u8>) -> Result<Self> {
        if values.len() != STRUM_SLOTS {
            return Err(Error::InvalidExercise(format!(
                "Strum pattern needs {} slots, got {}",
                STRUM_SLOTS,
                values.len()
            )));
        }
        let mut slots = [false; STRUM_SLOTS];
        for (slot, value) in slots.iter_mut().zip(values) {
            *slot = match value {
                0 => false,
                1 => true,
                other => {
                    return Err(Error::InvalidExercise(format!(
                        "Strum slot must be 0 or 1, got {}",
                        other
                    )))
                }
            };
        }
        Ok(StrumPattern(slots))
    }
}

impl From<StrumPattern> for Vec<u8> {
    fn from(pattern: StrumPattern) -> Self {
        pattern.0.iter().map(|&s| u8::from(s)).collect()
    }
}

// ============================================================================
// Exercise Descriptor
// ============================================================================

/// Kind-specific exercise data.
///
/// Variants are tried in declaration order when deserializing, so the payload
/// with the most required fields comes first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExercisePayload {
    Strumming {
        pattern: StrumPattern,
        chords: Vec<String>,
    },
    ChordFromTo {
        from: String,
        to: Vec<String>,
    },
    SpiderWalk {
        positions: Vec<SpiderStep>,
    },
    ChordRandom {
        chords: Vec<String>,
    },
}

impl ExercisePayload {
    pub fn kind(&self) -> ExerciseKind {
        match self {
            ExercisePayload::Strumming { .. } => ExerciseKind::Strumming,
            ExercisePayload::ChordFromTo { .. } => ExerciseKind::ChordFromTo,
            ExercisePayload::SpiderWalk { .. } => ExerciseKind::SpiderWalk,
            ExercisePayload::ChordRandom { .. } => ExerciseKind::ChordRandom,
        }
    }
}

/// Immutable configuration for one queue entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDescriptor {
    pub kind: ExerciseKind,
    pub name: String,
    pub duration_seconds: u32,
    pub payload: ExercisePayload,
}

impl ExerciseDescriptor {
    pub fn spider_walk(name: impl Into<String>, duration_seconds: u32, positions: Vec<SpiderStep>) -> Self {
        Self {
            kind: ExerciseKind::SpiderWalk,
            name: name.into(),
            duration_seconds,
            payload: ExercisePayload::SpiderWalk { positions },
        }
    }

    pub fn chord_from_to(from: impl Into<String>, to: Vec<String>, duration_seconds: u32) -> Self {
        let from = from.into();
        Self {
            kind: ExerciseKind::ChordFromTo,
            name: format!("Chord Changes From {} to {}", from, to.join(",")),
            duration_seconds,
            payload: ExercisePayload::ChordFromTo { from, to },
        }
    }

    pub fn chord_random(chords: Vec<String>, duration_seconds: u32) -> Self {
        Self {
            kind: ExerciseKind::ChordRandom,
            name: format!("Chord Changes Random to {}", chords.join(",")),
            duration_seconds,
            payload: ExercisePayload::ChordRandom { chords },
        }
    }

    pub fn strumming(pattern: StrumPattern, chords: Vec<String>, duration_seconds: u32) -> Self {
        Self {
            kind: ExerciseKind::Strumming,
            name: format!("Strum {}", pattern.name()),
            duration_seconds,
            payload: ExercisePayload::Strumming { pattern, chords },
        }
    }

    /// Check the descriptor invariants before it is allowed into playback
    pub fn validate(&self, rules: &QueueConfig) -> Result<()> {
        if self.duration_seconds == 0 {
            return Err(Error::InvalidExercise(format!(
                "'{}' must last at least one second",
                self.name
            )));
        }

        if self.payload.kind() != self.kind {
            return Err(Error::InvalidExercise(format!(
                "'{}' is a {} exercise but carries a {} payload",
                self.name,
                self.kind,
                self.payload.kind()
            )));
        }

        match &self.payload {
            ExercisePayload::SpiderWalk { positions } => {
                if positions.iter().all(SpiderStep::is_rest) {
                    return Err(Error::InvalidExercise(format!(
                        "'{}' has no fretted positions",
                        self.name
                    )));
                }
            }
            ExercisePayload::ChordFromTo { from, to } => {
                if to.is_empty() {
                    return Err(Error::InvalidExercise(format!(
                        "'{}' needs at least one target chord",
                        self.name
                    )));
                }
                check_chords(std::iter::once(from).chain(to.iter()))?;
            }
            ExercisePayload::ChordRandom { chords } => {
                if chords.len() < rules.min_random_chords {
                    return Err(Error::InvalidExercise(format!(
                        "Random chord changes need at least {} chords, '{}' has {}",
                        rules.min_random_chords,
                        self.name,
                        chords.len()
                    )));
                }
                check_chords(chords.iter())?;
            }
            ExercisePayload::Strumming { pattern, chords } => {
                if chords.is_empty() {
                    return Err(Error::InvalidExercise(format!(
                        "'{}' needs at least one chord",
                        self.name
                    )));
                }
                if !pattern.any_active() {
                    return Err(Error::InvalidExercise(format!(
                        "'{}' needs at least one strum",
                        self.name
                    )));
                }
                check_chords(chords.iter())?;
            }
        }

        Ok(())
    }
}

fn check_chords<'a>(chords: impl Iterator<Item = &'a String>) -> Result<()> {
    for chord in chords {
        if !catalog::is_known_chord(chord) {
            return Err(Error::InvalidExercise(format!("Unknown chord '{}'", chord)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chords(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_spider_step_parsing() {
        assert_eq!(
            "E,1".parse::<SpiderStep>().unwrap(),
            SpiderStep::note(GuitarString::LowE, 1)
        );
        assert_eq!(
            "e,12".parse::<SpiderStep>().unwrap(),
            SpiderStep::note(GuitarString::HighE, 12)
        );
        assert_eq!(",".parse::<SpiderStep>().unwrap(), SpiderStep::REST);
        assert_eq!("".parse::<SpiderStep>().unwrap(), SpiderStep::REST);
        assert!("X,1".parse::<SpiderStep>().is_err());
        assert!("E,99".parse::<SpiderStep>().is_err());
        assert!("E1".parse::<SpiderStep>().is_err());
    }

    #[test]
    fn test_strum_pattern_name_and_parse() {
        let pattern: StrumPattern = "D-DU-UDU".parse().unwrap();
        assert_eq!(pattern.name(), "D-DU-UDU");
        assert!(pattern.is_active(0));
        assert!(!pattern.is_active(1));
        assert!(pattern.is_active(3));

        // Up strokes are only allowed on the "+" slots
        assert!("U-------".parse::<StrumPattern>().is_err());
        assert!("D-D".parse::<StrumPattern>().is_err());
    }

    #[test]
    fn test_descriptor_json_shape() {
        let json = r#"{
            "kind": "strumming",
            "name": "Strum D-DU-UDU",
            "duration_seconds": 60,
            "payload": { "pattern": [1,0,1,1,0,1,1,1], "chords": ["C", "G"] }
        }"#;
        let descriptor: ExerciseDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.kind, ExerciseKind::Strumming);
        assert_eq!(descriptor.payload.kind(), ExerciseKind::Strumming);
        descriptor.validate(&QueueConfig::default()).unwrap();

        let json = r#"{
            "kind": "spider_walk",
            "name": "Diagonal",
            "duration_seconds": 30,
            "payload": { "positions": [",", "E,1", "A,2"] }
        }"#;
        let descriptor: ExerciseDescriptor = serde_json::from_str(json).unwrap();
        match descriptor.payload {
            ExercisePayload::SpiderWalk { ref positions } => {
                assert_eq!(positions.len(), 3);
                assert!(positions[0].is_rest());
            }
            _ => panic!("Expected spider walk payload"),
        }
    }

    #[test]
    fn test_kind_payload_mismatch_rejected() {
        let json = r#"{
            "kind": "strumming",
            "name": "Broken",
            "duration_seconds": 60,
            "payload": { "chords": ["C", "G", "D", "A"] }
        }"#;
        let descriptor: ExerciseDescriptor = serde_json::from_str(json).unwrap();
        let err = descriptor.validate(&QueueConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidExercise(_)));
    }

    #[test]
    fn test_validation_rules() {
        let rules = QueueConfig::default();

        let zero = ExerciseDescriptor::chord_from_to("C", chords(&["G"]), 0);
        assert!(zero.validate(&rules).is_err());

        let few = ExerciseDescriptor::chord_random(chords(&["A", "C", "D"]), 60);
        assert!(few.validate(&rules).is_err());
        let relaxed = QueueConfig { min_random_chords: 3 };
        assert!(few.validate(&relaxed).is_ok());

        let unknown = ExerciseDescriptor::chord_from_to("C", chords(&["H7"]), 60);
        assert!(unknown.validate(&rules).is_err());

        let silent = ExerciseDescriptor::strumming(
            StrumPattern::new([false; STRUM_SLOTS]),
            chords(&["C"]),
            60,
        );
        assert!(silent.validate(&rules).is_err());

        let rests = ExerciseDescriptor::spider_walk("Rests", 60, vec![SpiderStep::REST; 4]);
        assert!(rests.validate(&rules).is_err());
    }

    #[test]
    fn test_default_names() {
        let from_to = ExerciseDescriptor::chord_from_to("C", chords(&["G", "Am"]), 60);
        assert_eq!(from_to.name, "Chord Changes From C to G,Am");

        let random = ExerciseDescriptor::chord_random(chords(&["A", "C", "D", "E"]), 60);
        assert_eq!(random.name, "Chord Changes Random to A,C,D,E");

        let strum = ExerciseDescriptor::strumming("D-DU-UDU".parse().unwrap(), chords(&["C"]), 60);
        assert_eq!(strum.name, "Strum D-DU-UDU");
    }
}
