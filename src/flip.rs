//! Flip animation state machine.
//!
//! ```text
//! Idle --[flip input]--> Animating(PreMidpoint)
//! Animating(PreMidpoint) --[midpoint timer]--> Animating(PostMidpoint)   reveal new card
//! Animating(PostMidpoint) --[end timer]--> Idle                          input re-enabled
//! ```
//!
//! Both timers are scheduled relative to the start of the flip and cannot be
//! cancelled. Timers go through a [`Scheduler`] and time is read from a
//! [`Clock`], so tests can drive the animation with a [`ManualClock`].

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Default delay from flip start to the content swap.
pub const DEFAULT_MIDPOINT_MS: u64 = 250;

/// Default delay from flip start to the end of the animation.
pub const DEFAULT_END_MS: u64 = 500;

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed epoch.
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Timer callbacks of a flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Midpoint,
    End,
}

/// Accepts timers to fire at an absolute clock time.
pub trait Scheduler {
    fn schedule(&mut self, at: Duration, event: TimerEvent);
}

/// Pending timers, released in deadline order once their time has come.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: Vec<(Duration, TimerEvent)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|(at, _)| *at).min()
    }

    /// Remove and return every timer due at `now`. Equal deadlines keep
    /// scheduling order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<TimerEvent> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(at, _)| *at <= now);
        self.pending = rest;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, event)| event).collect()
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, at: Duration, event: TimerEvent) {
        self.pending.push((at, event));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipPhase {
    PreMidpoint,
    PostMidpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipState {
    #[default]
    Idle,
    Animating(FlipPhase),
}

impl FlipState {
    pub fn is_flipping(&self) -> bool {
        matches!(self, FlipState::Animating(_))
    }
}

/// Flip delays, both measured from the start of the flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipTiming {
    pub midpoint_ms: u64,
    pub end_ms: u64,
}

impl Default for FlipTiming {
    fn default() -> Self {
        Self {
            midpoint_ms: DEFAULT_MIDPOINT_MS,
            end_ms: DEFAULT_END_MS,
        }
    }
}

impl FlipTiming {
    /// Timing with `end_ms` raised to at least `midpoint_ms`.
    pub fn normalized(self) -> Self {
        Self {
            midpoint_ms: self.midpoint_ms,
            end_ms: self.end_ms.max(self.midpoint_ms),
        }
    }

    pub fn midpoint(&self) -> Duration {
        Duration::from_millis(self.midpoint_ms)
    }

    pub fn end(&self) -> Duration {
        Duration::from_millis(self.end_ms)
    }
}

/// What the owner of the controller must do after a timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipStep {
    /// Present the card under the (already advanced) cursor.
    Reveal,
    /// Clear the flipping style; input is accepted again.
    Settle,
}

#[derive(Debug, Clone, Default)]
pub struct FlipController {
    state: FlipState,
    timing: FlipTiming,
}

impl FlipController {
    pub fn new(timing: FlipTiming) -> Self {
        Self {
            state: FlipState::Idle,
            timing: timing.normalized(),
        }
    }

    pub fn state(&self) -> FlipState {
        self.state
    }

    pub fn timing(&self) -> FlipTiming {
        self.timing
    }

    pub fn accepts_input(&self) -> bool {
        self.state == FlipState::Idle
    }

    /// Start a flip at `now`, scheduling both timers.
    ///
    /// Returns false, scheduling nothing, when a flip is already running.
    pub fn begin(&mut self, now: Duration, scheduler: &mut dyn Scheduler) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.state = FlipState::Animating(FlipPhase::PreMidpoint);
        scheduler.schedule(now + self.timing.midpoint(), TimerEvent::Midpoint);
        scheduler.schedule(now + self.timing.end(), TimerEvent::End);
        true
    }

    /// Apply a fired timer.
    pub fn on_timer(&mut self, event: TimerEvent) -> Option<FlipStep> {
        match (self.state, event) {
            (FlipState::Animating(FlipPhase::PreMidpoint), TimerEvent::Midpoint) => {
                self.state = FlipState::Animating(FlipPhase::PostMidpoint);
                Some(FlipStep::Reveal)
            }
            (FlipState::Animating(FlipPhase::PostMidpoint), TimerEvent::End) => {
                self.state = FlipState::Idle;
                Some(FlipStep::Settle)
            }
            (state, event) => {
                log::warn!("ignoring {:?} timer in state {:?}", event, state);
                None
            }
        }
    }
}
