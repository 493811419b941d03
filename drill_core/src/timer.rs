//! Pausable, cancellable countdown timer.
//!
//! The timer counts whole seconds down to zero. It is polled by the frame
//! loop; each poll re-measures wall-clock time since the last counted second,
//! so a stalled host (suspended process, backgrounded terminal) is corrected in
//! a single step instead of replaying every missed second.
//!
//! Completion and cancellation are ordinary state transitions reported as
//! [`TimerEvent`]s and exposed through [`CountdownTimer::outcome`].

use crate::clock::SharedClock;

const SECOND_MS: u64 = 1_000;

/// Lifecycle of a countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl TimerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TimerStatus::Completed | TimerStatus::Cancelled)
    }
}

/// Something the owner of the timer has to react to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// One or more whole seconds elapsed
    Tick { remaining: u32 },
    /// Reached zero; emitted exactly once
    Completed,
    /// Cancelled before reaching zero; emitted exactly once
    Cancelled,
}

/// How a countdown ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownOutcome {
    Completed,
    Cancelled,
}

pub struct CountdownTimer {
    total_seconds: u32,
    remaining: u32,
    status: TimerStatus,
    /// Wall-clock time of the last counted second boundary
    last_tick_ms: u64,
    /// Progress into the current second, kept across a pause
    carried_ms: u64,
    clock: SharedClock,
}

impl CountdownTimer {
    pub fn new(total_seconds: u32, clock: SharedClock) -> Self {
        Self {
            total_seconds,
            remaining: total_seconds,
            status: TimerStatus::Idle,
            last_tick_ms: 0,
            carried_ms: 0,
            clock,
        }
    }

    /// Begin (or resume) counting. No-op while running or once terminal.
    pub fn start(&mut self) {
        match self.status {
            TimerStatus::Idle | TimerStatus::Paused => {
                let now = self.clock.now_ms();
                self.last_tick_ms = now.saturating_sub(self.carried_ms);
                self.carried_ms = 0;
                self.status = TimerStatus::Running;
            }
            TimerStatus::Running | TimerStatus::Completed | TimerStatus::Cancelled => {}
        }
    }

    /// Halt measurement, keeping the remaining time and the partial second
    pub fn pause(&mut self) {
        if self.status == TimerStatus::Running {
            self.carried_ms = self.clock.now_ms().saturating_sub(self.last_tick_ms);
            self.status = TimerStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        self.start();
    }

    /// Halt and reset to the full duration
    pub fn stop(&mut self) {
        if !self.status.is_terminal() {
            self.status = TimerStatus::Idle;
        }
        self.remaining = self.total_seconds;
        self.carried_ms = 0;
    }

    /// Terminal cancellation. Returns the event only on the first call.
    pub fn cancel(&mut self) -> Option<TimerEvent> {
        if self.status.is_terminal() {
            return None;
        }
        self.status = TimerStatus::Cancelled;
        self.carried_ms = 0;
        Some(TimerEvent::Cancelled)
    }

    /// Account for elapsed wall-clock time
    pub fn poll(&mut self) -> Vec<TimerEvent> {
        if self.status != TimerStatus::Running {
            return Vec::new();
        }

        if self.remaining == 0 {
            self.status = TimerStatus::Completed;
            return vec![TimerEvent::Completed];
        }

        let now = self.clock.now_ms();
        let whole_seconds = now.saturating_sub(self.last_tick_ms) / SECOND_MS;
        if whole_seconds == 0 {
            return Vec::new();
        }

        if whole_seconds > 1 {
            tracing::debug!(
                "Countdown stalled for {}s, correcting in one step",
                whole_seconds
            );
        }

        let elapsed = u32::try_from(whole_seconds).unwrap_or(u32::MAX);
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.last_tick_ms += whole_seconds * SECOND_MS;

        let mut events = vec![TimerEvent::Tick {
            remaining: self.remaining,
        }];
        if self.remaining == 0 {
            self.status = TimerStatus::Completed;
            events.push(TimerEvent::Completed);
        }
        events
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Settled result, once the countdown has completed or been cancelled
    pub fn outcome(&self) -> Option<CountdownOutcome> {
        match self.status {
            TimerStatus::Completed => Some(CountdownOutcome::Completed),
            TimerStatus::Cancelled => Some(CountdownOutcome::Cancelled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn timer(total: u32) -> (ManualClock, CountdownTimer) {
        let clock = ManualClock::new(10_000);
        let timer = CountdownTimer::new(total, clock.shared());
        (clock, timer)
    }

    /// Poll once per 16ms frame for `ms` milliseconds
    fn run_frames(clock: &ManualClock, timer: &mut CountdownTimer, ms: u64) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        let mut elapsed = 0;
        while elapsed < ms {
            let step = 16.min(ms - elapsed);
            clock.advance(step);
            elapsed += step;
            events.extend(timer.poll());
        }
        events
    }

    #[test]
    fn test_counts_down_and_completes_once() {
        let (clock, mut timer) = timer(3);
        timer.start();

        let events = run_frames(&clock, &mut timer, 5_000);
        assert_eq!(
            events,
            vec![
                TimerEvent::Tick { remaining: 2 },
                TimerEvent::Tick { remaining: 1 },
                TimerEvent::Tick { remaining: 0 },
                TimerEvent::Completed,
            ]
        );
        assert_eq!(timer.outcome(), Some(CountdownOutcome::Completed));
    }

    #[test]
    fn test_ticks_are_monotonic() {
        let (clock, mut timer) = timer(10);
        timer.start();

        let mut last = u32::MAX;
        let mut completions = 0;
        for stall in [1_000u64, 2_500, 16, 1_200, 4_000, 3_000] {
            clock.advance(stall);
            for event in timer.poll() {
                match event {
                    TimerEvent::Tick { remaining } => {
                        assert!(remaining <= last);
                        last = remaining;
                    }
                    TimerEvent::Completed => completions += 1,
                    TimerEvent::Cancelled => panic!("unexpected cancel"),
                }
            }
        }
        assert_eq!(last, 0);
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_stall_is_corrected_in_one_tick() {
        let (clock, mut timer) = timer(60);
        timer.start();

        run_frames(&clock, &mut timer, 1_000);
        assert_eq!(timer.remaining(), 59);

        // Host stalls for 7 seconds between polls
        clock.advance(7_000);
        assert_eq!(timer.poll(), vec![TimerEvent::Tick { remaining: 52 }]);
    }

    #[test]
    fn test_stall_past_zero_never_goes_negative() {
        let (clock, mut timer) = timer(3);
        timer.start();

        clock.advance(10_000);
        assert_eq!(
            timer.poll(),
            vec![TimerEvent::Tick { remaining: 0 }, TimerEvent::Completed]
        );
        clock.advance(5_000);
        assert!(timer.poll().is_empty());
    }

    #[test]
    fn test_pause_resume_keeps_partial_second() {
        let (clock, mut timer) = timer(10);
        timer.start();

        clock.advance(600);
        assert!(timer.poll().is_empty());
        timer.pause();
        assert_eq!(timer.status(), TimerStatus::Paused);

        // Time spent paused does not count
        clock.advance(30_000);
        assert!(timer.poll().is_empty());
        assert_eq!(timer.remaining(), 10);

        timer.resume();
        clock.advance(399);
        assert!(timer.poll().is_empty());
        clock.advance(1);
        assert_eq!(timer.poll(), vec![TimerEvent::Tick { remaining: 9 }]);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (clock, mut timer) = timer(5);
        timer.start();
        clock.advance(900);
        timer.start();
        clock.advance(100);
        assert_eq!(timer.poll(), vec![TimerEvent::Tick { remaining: 4 }]);
    }

    #[test]
    fn test_cancel_is_terminal_and_idempotent() {
        let (clock, mut timer) = timer(5);
        timer.start();

        assert_eq!(timer.cancel(), Some(TimerEvent::Cancelled));
        assert_eq!(timer.cancel(), None);
        assert_eq!(timer.outcome(), Some(CountdownOutcome::Cancelled));

        // Never resurrected
        timer.start();
        timer.resume();
        clock.advance(3_000);
        assert!(timer.poll().is_empty());
        assert_eq!(timer.status(), TimerStatus::Cancelled);
    }

    #[test]
    fn test_cancel_after_completion_is_noop() {
        let (clock, mut timer) = timer(1);
        timer.start();
        clock.advance(1_000);
        timer.poll();
        assert_eq!(timer.cancel(), None);
        assert_eq!(timer.outcome(), Some(CountdownOutcome::Completed));
    }

    #[test]
    fn test_stop_resets_remaining() {
        let (clock, mut timer) = timer(5);
        timer.start();
        clock.advance(2_000);
        timer.poll();
        assert_eq!(timer.remaining(), 3);

        timer.stop();
        assert_eq!(timer.remaining(), 5);
        assert_eq!(timer.status(), TimerStatus::Idle);
        clock.advance(3_000);
        assert!(timer.poll().is_empty());
    }
}
