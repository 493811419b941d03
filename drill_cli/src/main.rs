mod render;

use clap::{Parser, Subcommand};
use drill_core::beat::clamp_bpm;
use drill_core::catalog;
use drill_core::session::SilentMetronome;
use drill_core::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use render::{describe, TerminalMetronome, TerminalSurface};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fretdrill")]
#[command(about = "Guitar practice trainer with timed exercise drills", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory (durable store tier)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override runtime directory (transient store tier)
    #[arg(long, global = true)]
    runtime_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an exercise to the practice queue
    Add {
        #[command(subcommand)]
        exercise: AddExercise,
    },

    /// Show the practice queue (default)
    Queue,

    /// Remove an exercise by its position in the queue
    Remove {
        /// 1-based position as shown by `queue`
        index: usize,
    },

    /// Remove every exercise from the queue
    Clear,

    /// Show or change the metronome settings
    Metronome {
        #[arg(long)]
        bpm: Option<u32>,

        #[arg(long)]
        sound: Option<bool>,
    },

    /// List spider-walk patterns and known chords
    Patterns,

    /// Play the practice queue
    Run {
        /// Fast-forward with a simulated clock and print the event log
        #[arg(long)]
        simulate: bool,

        /// Seed for chord selection
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Subcommand)]
enum AddExercise {
    /// Spider walk over a built-in pattern
    Spider {
        #[arg(long)]
        pattern: String,

        #[command(flatten)]
        length: Length,
    },

    /// Alternate from one chord to each target chord
    FromTo {
        #[arg(long)]
        from: String,

        #[arg(long, value_delimiter = ',', required = true)]
        to: Vec<String>,

        #[command(flatten)]
        length: Length,
    },

    /// Random changes between a set of chords
    Random {
        #[arg(long, value_delimiter = ',', required = true)]
        chords: Vec<String>,

        #[command(flatten)]
        length: Length,
    },

    /// Strum a pattern such as D-DU-UDU over random chords
    Strum {
        #[arg(long)]
        pattern: String,

        #[arg(long, value_delimiter = ',', required = true)]
        chords: Vec<String>,

        #[command(flatten)]
        length: Length,
    },
}

#[derive(clap::Args)]
struct Length {
    /// Exercise length in minutes
    #[arg(long, default_value_t = 1, conflicts_with = "seconds")]
    minutes: u32,

    /// Exercise length in seconds
    #[arg(long)]
    seconds: Option<u32>,
}

impl Length {
    fn seconds(&self) -> u32 {
        self.seconds.unwrap_or(self.minutes.saturating_mul(60))
    }
}

fn main() -> Result<()> {
    // Initialize logging
    drill_core::logging::init();

    let cli = Cli::parse();

    // Resolve store tiers
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        if cli.runtime_dir.is_none() {
            config.data.runtime_dir = data_dir.join("runtime");
        }
        config.data.data_dir = data_dir;
    }
    if let Some(runtime_dir) = cli.runtime_dir {
        config.data.runtime_dir = runtime_dir;
    }
    let store = TieredStore::from_config(&config);

    match cli.command {
        Some(Commands::Add { exercise }) => cmd_add(&store, exercise, &config),
        Some(Commands::Queue) | None => cmd_queue(&store),
        Some(Commands::Remove { index }) => cmd_remove(&store, index),
        Some(Commands::Clear) => cmd_clear(&store),
        Some(Commands::Metronome { bpm, sound }) => cmd_metronome(&store, bpm, sound, &config),
        Some(Commands::Patterns) => cmd_patterns(),
        Some(Commands::Run { simulate, seed }) => cmd_run(store, simulate, seed, &config),
    }
}

fn build_exercise(exercise: AddExercise) -> Result<ExerciseDescriptor> {
    let descriptor = match exercise {
        AddExercise::Spider { pattern, length } => {
            let found = catalog::spider_pattern(&pattern).ok_or_else(|| {
                Error::InvalidExercise(format!(
                    "Unknown spider pattern '{}' (see `fretdrill patterns`)",
                    pattern
                ))
            })?;
            ExerciseDescriptor::spider_walk(
                format!("Spider Walk {}", found.name),
                length.seconds(),
                found.steps.clone(),
            )
        }
        AddExercise::FromTo { from, to, length } => {
            ExerciseDescriptor::chord_from_to(from, to, length.seconds())
        }
        AddExercise::Random { chords, length } => {
            ExerciseDescriptor::chord_random(chords, length.seconds())
        }
        AddExercise::Strum {
            pattern,
            chords,
            length,
        } => ExerciseDescriptor::strumming(pattern.parse()?, chords, length.seconds()),
    };
    Ok(descriptor)
}

fn cmd_add(store: &TieredStore, exercise: AddExercise, config: &Config) -> Result<()> {
    let descriptor = build_exercise(exercise)?;
    descriptor.validate(&config.queue)?;

    let mut queue = ExerciseQueue::new(store.load_queue()?);
    println!("✓ Added: {}", descriptor.name);
    queue.push(descriptor);
    store.save_queue(queue.exercises())?;
    tracing::info!("Queue now holds {} exercises", queue.len());

    print_queue(&queue);
    Ok(())
}

fn cmd_queue(store: &TieredStore) -> Result<()> {
    let queue = ExerciseQueue::new(store.load_queue()?);
    if queue.is_empty() {
        println!("Practice queue is empty.");
        println!("  Add one with `fretdrill add ...`");
        return Ok(());
    }
    print_queue(&queue);
    Ok(())
}

fn cmd_remove(store: &TieredStore, index: usize) -> Result<()> {
    let mut queue = ExerciseQueue::new(store.load_queue()?);
    let removed = index
        .checked_sub(1)
        .and_then(|i| queue.remove(i))
        .ok_or_else(|| {
            Error::Other(format!(
                "No exercise at position {} (queue has {})",
                index,
                queue.len()
            ))
        })?;
    store.save_queue(queue.exercises())?;

    println!("✓ Removed: {}", removed.name);
    Ok(())
}

fn cmd_clear(store: &TieredStore) -> Result<()> {
    store.save_queue(&[])?;
    println!("✓ Practice queue cleared");
    Ok(())
}

fn cmd_metronome(
    store: &TieredStore,
    bpm: Option<u32>,
    sound: Option<bool>,
    config: &Config,
) -> Result<()> {
    let mut settings = store.load_metronome(config);
    if bpm.is_some() || sound.is_some() {
        if let Some(bpm) = bpm {
            settings.bpm = clamp_bpm(bpm);
        }
        if let Some(sound) = sound {
            settings.sound_on = sound;
        }
        store.save_metronome(&settings)?;
        println!("✓ Metronome settings saved");
    }

    println!("  Tempo: {} bpm", settings.bpm);
    println!("  Sound: {}", if settings.sound_on { "on" } else { "off" });
    Ok(())
}

fn cmd_patterns() -> Result<()> {
    println!("Spider patterns:");
    for pattern in catalog::spider_patterns() {
        println!("  {} ({} steps)", pattern.name, pattern.steps.len());
    }
    println!();
    println!("Chords: {}", catalog::CHORDS.join(", "));
    Ok(())
}

fn print_queue(queue: &ExerciseQueue) {
    for line in queue.summary() {
        println!("{}", line);
    }
}

// ============================================================================
// Playback
// ============================================================================

fn cmd_run(store: TieredStore, simulate: bool, seed: Option<u64>, config: &Config) -> Result<()> {
    let queue = ExerciseQueue::new(store.load_queue()?);
    let settings = store.load_metronome(config);
    let rng = StdRng::seed_from_u64(seed.unwrap_or_else(clock_seed));

    let metronome: Box<dyn Metronome> = if simulate {
        Box::new(SilentMetronome)
    } else {
        Box::new(TerminalMetronome)
    };
    let session = SessionContext::new(
        settings,
        metronome,
        Box::new(PersistedSession::new(store, config)),
        rng,
    )
    .with_max_catch_up(config.session.max_catch_up_beats);

    let mut stage = Stage::new();
    let surface = if simulate {
        TerminalSurface::quiet()
    } else {
        TerminalSurface::new()
    };
    stage.add(EXECUTION_AREA, Box::new(surface));

    if simulate {
        let clock = ManualClock::new(0);
        let runner = Runner::new(
            queue,
            session,
            stage,
            clock.shared(),
            RunnerOptions::from_config(config),
        );
        run_simulated(runner, clock, config)
    } else {
        let runner = Runner::new(
            queue,
            session,
            stage,
            std::rc::Rc::new(SystemClock::new()),
            RunnerOptions::from_config(config),
        );
        run_interactive(runner, config)
    }
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn run_simulated(mut runner: Runner, clock: ManualClock, config: &Config) -> Result<()> {
    runner.play()?;

    // Every exercise plus its countdown, with a minute of slack
    let ready_ms = u64::from(config.session.ready_seconds) * 1_000;
    let limit_ms = runner.queue().total_duration_seconds() * 1_000
        + ready_ms * runner.queue().len() as u64
        + 60_000;

    let sim = Simulation::new(clock, config.session.frame_interval_ms);
    let finished = sim.run_until(&mut runner, limit_ms, |runner| {
        for event in runner.take_events() {
            if let Some(line) = describe(&event, false) {
                println!("{}", line);
            }
        }
        runner.state() == RunnerState::Complete
    });

    runner.shutdown();
    if !finished {
        return Err(Error::Other(format!(
            "Playback did not finish within {} simulated seconds",
            limit_ms / 1_000
        )));
    }
    println!(
        "  Simulated {}s of practice",
        sim.clock().now_ms() / 1_000
    );
    Ok(())
}

/// Line commands read from stdin
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Toggle,
    Next,
    Previous,
    Faster,
    Slower,
    Sound,
    Quit,
}

/// BPM step for `+` / `-`
const BPM_STEP: u32 = 5;

fn parse_input(line: &str) -> Option<Input> {
    match line.trim() {
        "" | "p" => Some(Input::Toggle),
        "n" => Some(Input::Next),
        "b" => Some(Input::Previous),
        "+" => Some(Input::Faster),
        "-" => Some(Input::Slower),
        "s" => Some(Input::Sound),
        "q" => Some(Input::Quit),
        _ => None,
    }
}

fn spawn_input_reader() -> mpsc::Receiver<Input> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_input(&line) {
                Some(input) => {
                    if tx.send(input).is_err() {
                        return;
                    }
                }
                None => eprintln!("Unknown command '{}'", line.trim()),
            }
        }
        // Closed stdin ends the session
        let _ = tx.send(Input::Quit);
    });
    rx
}

fn run_interactive(mut runner: Runner, config: &Config) -> Result<()> {
    runner.play()?;

    println!("─────────────────────────────────────────");
    println!("Enter/'p' play-pause  'n' next  'b' previous");
    println!("'+'/'-' tempo  's' sound  'q' quit");
    println!("─────────────────────────────────────────");

    let inputs = spawn_input_reader();
    let frame = Duration::from_millis(config.session.frame_interval_ms.max(1));

    run_realtime(&mut runner, frame, |runner| {
        let mut quit = false;
        while let Ok(input) = inputs.try_recv() {
            match input {
                Input::Toggle => runner.toggle()?,
                Input::Next => {
                    if !runner.next() {
                        println!("  No next exercise");
                    }
                }
                Input::Previous => {
                    if !runner.previous() {
                        println!("  No previous exercise");
                    }
                }
                Input::Faster | Input::Slower => change_tempo(runner, &input),
                Input::Sound => toggle_sound(runner),
                Input::Quit => quit = true,
            }
        }

        for event in runner.take_events() {
            if let Some(line) = describe(&event, true) {
                println!("{}", line);
            }
        }

        if quit || runner.state() == RunnerState::Complete {
            Ok(LoopControl::Stop)
        } else {
            Ok(LoopControl::Continue)
        }
    })?;

    runner.shutdown();
    Ok(())
}

fn change_tempo(runner: &mut Runner, input: &Input) {
    let session = runner.session_mut();
    if session.has_tempo_override() {
        println!("  Tempo is fixed for this exercise");
        return;
    }
    let bpm = match input {
        Input::Faster => session.bpm().saturating_add(BPM_STEP),
        _ => session.bpm().saturating_sub(BPM_STEP),
    };
    let applied = session.set_bpm(bpm, true);
    println!("  Tempo: {} bpm", applied);
}

fn toggle_sound(runner: &mut Runner) {
    let session = runner.session_mut();
    let enabled = !session.sound_enabled();
    session.set_sound_enabled(enabled, true);
    println!("  Sound: {}", if enabled { "on" } else { "off" });
}
