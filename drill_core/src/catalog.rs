//! Built-in chord library and spider-walk pattern catalog.

use crate::types::{GuitarString, SpiderStep};
use once_cell::sync::Lazy;

/// Chords that have diagrams and may appear in chord drills
pub const CHORDS: [&str; 9] = ["A", "Am", "C", "D", "Dm", "E", "Em", "F", "G"];

pub fn is_known_chord(name: &str) -> bool {
    CHORDS.contains(&name)
}

/// A named spider-walk sequence
#[derive(Clone, Debug)]
pub struct SpiderPattern {
    pub name: &'static str,
    pub steps: Vec<SpiderStep>,
}

/// Cached pattern catalog - built once and reused
static SPIDER_PATTERNS: Lazy<Vec<SpiderPattern>> = Lazy::new(build_spider_patterns);

/// All built-in spider-walk patterns
pub fn spider_patterns() -> &'static [SpiderPattern] {
    &SPIDER_PATTERNS
}

/// Look up a spider-walk pattern by name (case-insensitive)
pub fn spider_pattern(name: &str) -> Option<&'static SpiderPattern> {
    SPIDER_PATTERNS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

// Compact notation: `E1` is low E string fret 1, `e4` high e fret 4, `-` a rest.
const WOVEN: &str = "- - - - E1 A3 E2 A4 E3 A1 E4 A2 - A1 D3 A2 D4 A3 D1 A4 D2 - \
    D1 G3 D2 G4 D3 G1 D4 G2 - G1 B3 G2 B4 G3 B1 G4 B2 - B1 e3 B2 e4 B3 e1 B4 e2 - - \
    e2 B4 e1 B3 e4 B2 e3 B1 - B2 G4 B1 G3 B4 G2 B3 G1 - G2 D4 G1 D3 G4 D2 G3 D1 - \
    D2 A4 D1 A3 D4 A2 D3 A1 - A2 E4 A1 E3 A4 E2 A3 E1 - - -";

const WOVEN_STRETCH: &str = "- - - - E1 A3 E2 A4 E3 A1 E4 A2 E1 D3 E2 D4 E3 D1 E4 D2 \
    E1 G3 E2 G4 E3 G1 E4 G2 E1 B3 E2 B4 E3 B1 E4 B2 E1 e3 E2 e4 E3 e1 E4 e2 - - -";

const WOVEN_SPACED: &str = "- - - - E1 D3 E2 D4 E3 D1 E4 D2 - A1 G3 A2 G4 A3 G1 A4 G2 - \
    D1 B3 D2 B4 D3 B1 D4 B2 - G1 e3 G2 e4 G3 e1 G4 e2 - - -";

const SPACED_13: &str = "- - - - E1 E3 D3 D1 A1 A3 G3 G1 D1 D3 B3 B1 G1 G3 e3 e1 \
    e1 e3 G3 G1 B1 B3 D3 D1 G1 G3 A3 A1 D1 D3 E3 E1 - - -";

const TRIANGLE: &str = "- - - - E1 A2 D3 G4 G4 D2 A3 E4 A1 D2 G3 B4 B1 G2 D3 A4 \
    D1 G2 B3 e4 e1 B2 G3 D4 D1 G2 B3 e4 e1 B2 G3 D4 A1 D2 G3 B4 B1 G2 D3 A4 \
    E1 A2 D3 G4 G1 D2 A3 E4 - - -";

const DIAGONAL_ASC: &str = "- - - - E1 A2 D3 G4 A1 D2 G3 B4 D1 G2 B3 e4 e1 B2 G3 D4 \
    B1 G2 D3 A4 G1 D2 A3 E4 - - -";

const DIAGONAL_DESC: &str = "- - - - E4 A3 D2 G1 A4 D3 G2 B1 D4 G3 B2 e1 e4 B3 G2 D1 \
    B4 G3 D2 A1 G4 D3 A2 E1 - - -";

const STRETCH_143: &str = "- - - - E1 e4 e1 E4 A1 B4 B1 A3 D1 G3 G1 D3 A1 B4 B1 A3 - - -";

fn build_spider_patterns() -> Vec<SpiderPattern> {
    vec![
        SpiderPattern {
            name: "1234 - 1 to 5",
            steps: ladder(1, 5),
        },
        SpiderPattern {
            name: "1234 - 5 to 9",
            steps: ladder(5, 9),
        },
        notation("Woven", WOVEN),
        notation("Woven Stretch", WOVEN_STRETCH),
        notation("Woven Spaced", WOVEN_SPACED),
        notation("13 Spaced", SPACED_13),
        notation("Triangle", TRIANGLE),
        notation("Diagonal Asc", DIAGONAL_ASC),
        notation("Diagonal Desc", DIAGONAL_DESC),
        notation("143 Stretch", STRETCH_143),
    ]
}

/// Chromatic 1-2-3-4 ladder: up all six strings, back down, then shift one
/// fret higher, for every start fret in `first..=last`.
fn ladder(first: u8, last: u8) -> Vec<SpiderStep> {
    let ascending = [
        GuitarString::LowE,
        GuitarString::A,
        GuitarString::D,
        GuitarString::G,
        GuitarString::B,
        GuitarString::HighE,
    ];

    let mut steps = vec![SpiderStep::REST; 4];
    for start in first..=last {
        for string in ascending {
            steps.extend((start..start + 4).map(|fret| SpiderStep::note(string, fret)));
        }
        steps.push(SpiderStep::REST);
        for string in ascending.iter().rev() {
            steps.extend((start..start + 4).rev().map(|fret| SpiderStep::note(*string, fret)));
        }
        steps.push(SpiderStep::REST);
        steps.push(SpiderStep::REST);
    }
    steps.push(SpiderStep::REST);
    steps
}

fn notation(name: &'static str, source: &str) -> SpiderPattern {
    let steps = source
        .split_whitespace()
        .map(|token| {
            parse_token(token).unwrap_or_else(|| {
                tracing::warn!("Ignoring bad token '{}' in spider pattern {}", token, name);
                SpiderStep::REST
            })
        })
        .collect();
    SpiderPattern { name, steps }
}

fn parse_token(token: &str) -> Option<SpiderStep> {
    if token == "-" {
        return Some(SpiderStep::REST);
    }
    let mut chars = token.chars();
    let string = GuitarString::from_symbol(chars.next()?)?;
    let fret = chars.as_str().parse().ok()?;
    Some(SpiderStep::note(string, fret))
}
