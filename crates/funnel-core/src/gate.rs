//! Unlock gate.
//!
//! Content stays hidden until the video has played `unlock_threshold_secs`
//! or a fallback deadline passes, whichever comes first.
//!
//! ## State Transitions
//!
//! ```text
//! Locked { progress } -> Unlocked { cause }
//! ```
//!
//! `Unlocked` is terminal. The only way into it is `GateState::unlock`,
//! which consumes the locked state, so nothing can construct a path back.

use serde::{Deserialize, Serialize};

/// Why the gate opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockCause {
    /// The progress source reached the threshold.
    Progress,
    /// The fallback deadline elapsed first.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum GateState {
    Locked { progress_percent: f64 },
    Unlocked { cause: UnlockCause },
}

impl GateState {
    fn unlock(self, cause: UnlockCause) -> GateState {
        match self {
            GateState::Locked { .. } => GateState::Unlocked { cause },
            unlocked => unlocked,
        }
    }
}

/// What a progress report changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateTransition {
    /// Already unlocked; report ignored.
    Unchanged,
    /// Still locked, progress published.
    Progress(f64),
    /// This report opened the gate.
    Unlocked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockGate {
    state: GateState,
    unlock_threshold_secs: f64,
    fallback_grace_secs: f64,
}

impl UnlockGate {
    pub fn new(unlock_threshold_secs: f64, fallback_grace_secs: f64) -> Self {
        Self {
            state: GateState::Locked {
                progress_percent: 0.0,
            },
            unlock_threshold_secs,
            fallback_grace_secs,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, GateState::Unlocked { .. })
    }

    /// 0..=100. Pinned at 100 once unlocked.
    pub fn progress_percent(&self) -> f64 {
        match self.state {
            GateState::Locked { progress_percent } => progress_percent,
            GateState::Unlocked { .. } => 100.0,
        }
    }

    /// Delay after session start at which the fallback forces the unlock.
    pub fn fallback_delay_ms(&self) -> u64 {
        ((self.unlock_threshold_secs + self.fallback_grace_secs).max(0.0) * 1000.0).round() as u64
    }

    /// Feed the playback position of the video.
    ///
    /// Non-finite or negative positions count as zero. Progress never moves
    /// backwards while locked, so a seek back does not shrink the bar.
    pub fn report_progress(&mut self, current_time_secs: f64) -> GateTransition {
        let GateState::Locked { progress_percent } = self.state else {
            return GateTransition::Unchanged;
        };

        let position = if current_time_secs.is_finite() {
            current_time_secs.max(0.0)
        } else {
            0.0
        };

        if position >= self.unlock_threshold_secs {
            self.state = self.state.unlock(UnlockCause::Progress);
            return GateTransition::Unlocked;
        }

        let percent = (position / self.unlock_threshold_secs * 100.0).min(100.0);
        let percent = percent.max(progress_percent);
        self.state = GateState::Locked {
            progress_percent: percent,
        };
        GateTransition::Progress(percent)
    }

    /// Open the gate regardless of progress. Returns `true` if this call did it.
    pub fn force_unlock(&mut self, cause: UnlockCause) -> bool {
        if self.is_unlocked() {
            return false;
        }
        self.state = self.state.unlock(cause);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_reports_scale_to_threshold() {
        let mut gate = UnlockGate::new(30.0, 15.0);
        assert_eq!(gate.report_progress(15.0), GateTransition::Progress(50.0));
        assert_eq!(gate.report_progress(0.0), GateTransition::Progress(50.0));
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn reaching_threshold_latches() {
        let mut gate = UnlockGate::new(30.0, 15.0);
        gate.report_progress(29.9);
        assert_eq!(gate.report_progress(30.0), GateTransition::Unlocked);
        assert_eq!(gate.progress_percent(), 100.0);
        assert_eq!(gate.report_progress(1.0), GateTransition::Unchanged);
        assert_eq!(
            gate.state(),
            GateState::Unlocked {
                cause: UnlockCause::Progress
            }
        );
    }

    #[test]
    fn force_unlock_is_idempotent() {
        let mut gate = UnlockGate::new(30.0, 15.0);
        assert!(gate.force_unlock(UnlockCause::Fallback));
        assert!(!gate.force_unlock(UnlockCause::Fallback));
        assert_eq!(gate.progress_percent(), 100.0);
    }

    #[test]
    fn fallback_delay_is_threshold_plus_grace() {
        assert_eq!(UnlockGate::new(30.0, 15.0).fallback_delay_ms(), 45_000);
    }

    #[test]
    fn garbage_positions_count_as_zero() {
        let mut gate = UnlockGate::new(30.0, 15.0);
        assert_eq!(gate.report_progress(f64::NAN), GateTransition::Progress(0.0));
        assert_eq!(gate.report_progress(-4.0), GateTransition::Progress(0.0));
    }
}
