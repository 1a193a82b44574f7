//! Urgency countdown.
//!
//! One tick per second, driven by a periodic scheduler entry. The countdown
//! itself holds no timer; the session cancels the periodic entry once
//! `tick()` reports that zero was reached.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Finished,
}

/// Result of a single one-second tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTick {
    pub remaining_secs: u64,
    pub display: String,
    /// True on the tick that reached zero.
    pub finished: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    state: CountdownState,
    remaining_secs: u64,
}

impl Countdown {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            state: CountdownState::Idle,
            remaining_secs: initial_secs,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn display(&self) -> String {
        format_display(self.remaining_secs)
    }

    /// Begin ticking. Returns `false` if there is nothing left to count.
    pub fn start(&mut self) -> bool {
        match self.state {
            CountdownState::Idle if self.remaining_secs > 0 => {
                self.state = CountdownState::Running;
                true
            }
            CountdownState::Idle => {
                self.state = CountdownState::Finished;
                false
            }
            _ => false,
        }
    }

    /// Stop without reaching zero (session teardown).
    pub fn stop(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Finished;
        }
    }

    /// Advance by one second. `None` once the countdown is not running.
    pub fn tick(&mut self) -> Option<CountdownTick> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let finished = self.remaining_secs == 0;
        if finished {
            self.state = CountdownState::Finished;
        }
        Some(CountdownTick {
            remaining_secs: self.remaining_secs,
            display: self.display(),
            finished,
        })
    }
}

/// `M:SS`, minutes unpadded, seconds zero-padded.
pub fn format_display(total_secs: u64) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
