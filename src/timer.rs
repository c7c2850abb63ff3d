//! Countdown for one exam section, driven by an external tick source.

use std::time::Duration;

use crate::error::TimerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Halted before running out; the remaining time is kept.
    Stopped,
    Expired,
}

/// Signals produced by [`SectionTimer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A warning threshold was crossed; `remaining` is the threshold itself.
    Warning { remaining: Duration },
    Expired,
}

/// How close the clock is to running out, for colouring the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertLevel {
    Normal,
    Caution,
    Urgent,
}

#[derive(Debug, Clone)]
pub struct SectionTimer {
    state: TimerState,
    duration: Duration,
    remaining: Duration,
    // descending, zero excluded
    warnings: Vec<Duration>,
    next_warning: usize,
}

impl Default for SectionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            duration: Duration::ZERO,
            remaining: Duration::ZERO,
            warnings: Vec::new(),
            next_warning: 0,
        }
    }

    /// Timer that announces each threshold once as remaining time falls to it.
    pub fn with_warnings(thresholds: impl IntoIterator<Item = Duration>) -> Self {
        let mut warnings: Vec<Duration> = thresholds
            .into_iter()
            .filter(|t| !t.is_zero())
            .collect();
        warnings.sort_unstable_by(|a, b| b.cmp(a));
        warnings.dedup();
        Self {
            warnings,
            ..Self::new()
        }
    }

    pub fn start(&mut self, duration: Duration) -> Result<(), TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::InvalidState {
                state: self.state,
                action: "start",
            });
        }
        if duration.is_zero() {
            return Err(TimerError::InvalidDuration);
        }
        self.duration = duration;
        self.remaining = duration;
        // thresholds at or above the budget would fire immediately
        self.next_warning = self.warnings.iter().take_while(|&&t| t >= duration).count();
        self.state = TimerState::Running;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        if self.state != TimerState::Running {
            return Err(TimerError::InvalidState {
                state: self.state,
                action: "pause",
            });
        }
        self.state = TimerState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        if self.state != TimerState::Paused {
            return Err(TimerError::InvalidState {
                state: self.state,
                action: "resume",
            });
        }
        self.state = TimerState::Running;
        Ok(())
    }

    /// Advances a running timer. Expiry is reported on exactly one tick.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<TimerEvent> {
        if self.state != TimerState::Running {
            return Vec::new();
        }
        self.remaining = self.remaining.saturating_sub(elapsed);

        let mut events = Vec::new();
        while let Some(&threshold) = self.warnings.get(self.next_warning) {
            if self.remaining > threshold {
                break;
            }
            self.next_warning += 1;
            events.push(TimerEvent::Warning {
                remaining: threshold,
            });
        }
        if self.remaining.is_zero() {
            self.state = TimerState::Expired;
            events.push(TimerEvent::Expired);
        }
        events
    }

    /// Halts a running or paused countdown. No effect in any other state.
    pub fn stop(&mut self) {
        if matches!(self.state, TimerState::Running | TimerState::Paused) {
            self.state = TimerState::Stopped;
        }
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.duration = Duration::ZERO;
        self.remaining = Duration::ZERO;
        self.next_warning = 0;
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn elapsed(&self) -> Duration {
        self.duration.saturating_sub(self.remaining)
    }

    pub fn alert_level(&self) -> AlertLevel {
        match self.state {
            TimerState::Idle | TimerState::Stopped => AlertLevel::Normal,
            TimerState::Expired => AlertLevel::Urgent,
            TimerState::Running | TimerState::Paused => {
                match (self.warnings.last(), self.warnings.first()) {
                    (Some(&urgent), _) if self.remaining <= urgent => AlertLevel::Urgent,
                    (_, Some(&caution)) if self.remaining <= caution => AlertLevel::Caution,
                    _ => AlertLevel::Normal,
                }
            }
        }
    }

    /// Remaining time as `MM:SS`, rounding partial seconds up.
    pub fn clock(&self) -> String {
        format_clock(self.remaining)
    }
}

pub fn format_clock(d: Duration) -> String {
    let secs = d.as_millis().div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
