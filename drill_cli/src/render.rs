//! Plain-text rendering of exercise frames and runner events.

use drill_core::queue::format_duration;
use drill_core::session::Metronome;
use drill_core::visualization::SPIDER_WINDOW;
use drill_core::{Frame, GuitarString, RunnerEvent, SpiderStep, StrumPattern, Surface, STRUM_SLOTS};
use std::io::{self, Write};

/// Surface that prints each frame to stdout
pub struct TerminalSurface {
    enabled: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// Accepts frames but prints nothing (simulation output is the event log)
    pub fn quiet() -> Self {
        Self { enabled: false }
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for TerminalSurface {
    fn present(&mut self, frame: &Frame) {
        if !self.enabled {
            return;
        }
        println!();
        for line in render_frame(frame) {
            println!("  {}", line);
        }
    }

    fn clear(&mut self) {
        if self.enabled {
            println!();
        }
    }
}

/// Terminal bell on every click
pub struct TerminalMetronome;

impl Metronome for TerminalMetronome {
    fn tick(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

pub fn render_frame(frame: &Frame) -> Vec<String> {
    match frame {
        Frame::Spider { window } => render_spider(window),
        Frame::Chords { current, next } => {
            vec![format!("Now: {:<4} Next: {}", current, next)]
        }
        Frame::Strum {
            pattern,
            slot,
            current,
            next,
        } => {
            let mut lines = render_strum(pattern, *slot);
            lines.push(format!("Now: {:<4} Next: {}", current, next));
            lines
        }
    }
}

/// Six string rows, high e on top. Column 0 is the note to play now.
fn render_spider(window: &[SpiderStep; SPIDER_WINDOW]) -> Vec<String> {
    GuitarString::ALL
        .iter()
        .map(|string| {
            let cells: Vec<String> = window
                .iter()
                .enumerate()
                .map(|(column, step)| {
                    let cell = match step.position() {
                        Some(pos) if pos.string == *string => pos.fret.to_string(),
                        _ => "-".to_string(),
                    };
                    if column == 0 {
                        format!("[{:>2}]", cell)
                    } else {
                        format!(" {:>2} ", cell)
                    }
                })
                .collect();
            format!("{}|{}", string.symbol(), cells.join(""))
        })
        .collect()
}

fn render_strum(pattern: &StrumPattern, slot: Option<usize>) -> Vec<String> {
    let counts: Vec<String> = (0..STRUM_SLOTS)
        .map(|i| {
            if StrumPattern::is_down(i) {
                format!(" {} ", i / 2 + 1)
            } else {
                " + ".to_string()
            }
        })
        .collect();

    let strokes: Vec<String> = pattern
        .name()
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if slot == Some(i) {
                format!("[{}]", c)
            } else {
                format!(" {} ", c)
            }
        })
        .collect();

    vec![counts.join(""), strokes.join("")]
}

/// One-line description of an event. Tick events are only described when
/// `ticks` is set.
pub fn describe(event: &RunnerEvent, ticks: bool) -> Option<String> {
    let line = match event {
        RunnerEvent::ReadyStarted {
            index,
            name,
            duration_seconds,
        } => format!(
            "[{}] Get ready: {} ({})",
            index + 1,
            name,
            format_duration(*duration_seconds)
        ),
        RunnerEvent::ReadyTick { remaining, .. } if ticks => {
            format!("    Starting in {}", remaining)
        }
        RunnerEvent::ReadyCancelled { index } => format!("[{}] Countdown cancelled", index + 1),
        RunnerEvent::ExerciseStarted { index, name } => format!("[{}] Go: {}", index + 1, name),
        RunnerEvent::TimerTick { remaining, .. } if ticks => {
            format!("    {}:{:02} left", remaining / 60, remaining % 60)
        }
        RunnerEvent::Paused { index } => format!("[{}] Paused", index + 1),
        RunnerEvent::Resumed { index } => format!("[{}] Resumed", index + 1),
        RunnerEvent::ExerciseCompleted { index } => format!("[{}] Done", index + 1),
        RunnerEvent::VisualizationFailed { index, message } => {
            format!("[{}] Could not start exercise: {}", index + 1, message)
        }
        RunnerEvent::WorkoutComplete => "Workout complete!".to_string(),
        RunnerEvent::ReadyTick { .. } | RunnerEvent::TimerTick { .. } => return None,
    };
    Some(line)
}
