//! Work/break interval countdown.
//!
//! `TimerController` is the only mutator of `TimerState`. It owns at most one
//! `TickHandle`: every transition into running acquires one, every transition
//! out of running (pause, reset, phase completion, drop) cancels it.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::notify::Notifier;
use crate::scheduler::{TickHandle, TickId, TickScheduler};
use crate::util::format_clock;

pub const WORK_DURATION: u32 = 25 * 60;
pub const BREAK_DURATION: u32 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    #[strum(serialize = "Focus Time")]
    Work,
    #[strum(serialize = "Break Time")]
    Break,
}

impl Phase {
    pub fn next(self) -> Phase {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }
}

/// Full length of each phase, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    work_secs: u32,
    break_secs: u32,
}

impl Durations {
    pub fn new(work_secs: u32, break_secs: u32) -> Result<Self, ConfigError> {
        if work_secs == 0 {
            return Err(ConfigError::ZeroDuration("work"));
        }
        if break_secs == 0 {
            return Err(ConfigError::ZeroDuration("break"));
        }
        Ok(Self {
            work_secs,
            break_secs,
        })
    }

    pub fn from_minutes(work_mins: u32, break_mins: u32) -> Result<Self, ConfigError> {
        Self::new(work_mins.saturating_mul(60), break_mins.saturating_mul(60))
    }

    pub fn of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_secs,
            Phase::Break => self.break_secs,
        }
    }

    pub fn longest(&self) -> u32 {
        self.work_secs.max(self.break_secs)
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work_secs: WORK_DURATION,
            break_secs: BREAK_DURATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub is_running: bool,
    pub completed_cycles: u32,
}

impl TimerState {
    pub fn fresh(durations: &Durations) -> Self {
        Self {
            phase: Phase::Work,
            remaining_secs: durations.of(Phase::Work),
            is_running: false,
            completed_cycles: 0,
        }
    }
}

pub struct TimerController {
    state: TimerState,
    durations: Durations,
    scheduler: Arc<dyn TickScheduler>,
    notifier: Box<dyn Notifier>,
    tick_handle: Option<TickHandle>,
}

impl fmt::Debug for TimerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerController")
            .field("state", &self.state)
            .field("durations", &self.durations)
            .field("ticking", &self.tick_handle.is_some())
            .finish()
    }
}

impl TimerController {
    pub fn new(
        durations: Durations,
        scheduler: Arc<dyn TickScheduler>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            state: TimerState::fresh(&durations),
            durations,
            scheduler,
            notifier,
            tick_handle: None,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn durations(&self) -> &Durations {
        &self.durations
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn start(&mut self) {
        if self.state.is_running || self.state.remaining_secs == 0 {
            return;
        }
        self.state.is_running = true;
        self.tick_handle = Some(self.scheduler.schedule_tick());
        log::debug!(
            "timer started: {} with {}s left",
            self.state.phase,
            self.state.remaining_secs
        );
    }

    pub fn pause(&mut self) {
        self.state.is_running = false;
        self.stop_ticking();
    }

    pub fn toggle(&mut self) {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Back to the full length of the current phase; phase and cycle count stay.
    pub fn reset(&mut self) {
        self.pause();
        self.state.remaining_secs = self.durations.of(self.state.phase);
    }

    /// One elapsed second. Ignored unless running, so a tick that was already
    /// queued when the handle got cancelled does nothing.
    pub fn tick(&mut self) {
        if !self.state.is_running || self.state.remaining_secs == 0 {
            return;
        }
        self.state.remaining_secs -= 1;
        if self.state.remaining_secs == 0 {
            self.complete_phase();
        }
    }

    /// A tick posted by the scheduler. Only the handle currently held counts;
    /// ticks from a cancelled handle that were still in flight are dropped.
    pub fn on_scheduled_tick(&mut self, id: TickId) {
        if self.tick_id() == Some(id) {
            self.tick();
        } else {
            log::trace!("stale tick {:?} ignored", id);
        }
    }

    /// Id of the live tick handle, if running
    pub fn tick_id(&self) -> Option<TickId> {
        self.tick_handle.as_ref().map(TickHandle::id)
    }

    fn complete_phase(&mut self) {
        self.pause();

        let finished = self.state.phase;
        if finished == Phase::Work {
            self.state.completed_cycles += 1;
        }
        self.state.phase = finished.next();
        self.state.remaining_secs = self.durations.of(self.state.phase);
        log::info!(
            "{} finished, {} completed cycle(s)",
            finished,
            self.state.completed_cycles
        );

        if let Err(e) = self.notifier.notify(finished) {
            log::debug!("completion alert failed: {}", e);
        }
    }

    /// Share of the current phase already elapsed, in [0, 1]
    pub fn progress_fraction(&self) -> f64 {
        let total = self.durations.of(self.state.phase) as f64;
        let elapsed = total - self.state.remaining_secs as f64;
        (elapsed / total).clamp(0.0, 1.0)
    }

    pub fn clock(&self) -> String {
        format_clock(self.state.remaining_secs)
    }

    fn stop_ticking(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            handle.cancel();
        }
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.stop_ticking();
    }
}
