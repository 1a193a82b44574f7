//! Exit-intent modal.
//!
//! Fires at most once per session: the latch moves `Armed -> Fired` and
//! never back. Closing the modal only flips visibility inside `Fired`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "latch", rename_all = "lowercase")]
pub enum ExitLatch {
    Armed,
    Fired { modal_open: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitIntent {
    latch: ExitLatch,
}

impl Default for ExitIntent {
    fn default() -> Self {
        Self {
            latch: ExitLatch::Armed,
        }
    }
}

impl ExitIntent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latch(&self) -> ExitLatch {
        self.latch
    }

    pub fn has_fired(&self) -> bool {
        matches!(self.latch, ExitLatch::Fired { .. })
    }

    pub fn is_shown(&self) -> bool {
        matches!(self.latch, ExitLatch::Fired { modal_open: true })
    }

    /// Pointer left the document at vertical coordinate `client_y`.
    /// Returns `true` if this call opened the modal.
    pub fn pointer_left(&mut self, client_y: f64, gate_unlocked: bool) -> bool {
        if client_y < 0.0 && gate_unlocked && self.latch == ExitLatch::Armed {
            self.latch = ExitLatch::Fired { modal_open: true };
            return true;
        }
        false
    }

    /// Returns `true` if the modal was open.
    pub fn close(&mut self) -> bool {
        match self.latch {
            ExitLatch::Fired { modal_open: true } => {
                self.latch = ExitLatch::Fired { modal_open: false };
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_through_top_edge() {
        let mut exit = ExitIntent::new();
        assert!(exit.pointer_left(-1.0, true));
        assert!(exit.is_shown());
        assert!(!exit.pointer_left(-5.0, true));
    }

    #[test]
    fn ignores_side_exits_and_locked_gate() {
        let mut exit = ExitIntent::new();
        assert!(!exit.pointer_left(0.0, true));
        assert!(!exit.pointer_left(120.0, true));
        assert!(!exit.pointer_left(-1.0, false));
        assert!(!exit.has_fired());
    }

    #[test]
    fn close_does_not_rearm() {
        let mut exit = ExitIntent::new();
        exit.pointer_left(-1.0, true);
        assert!(exit.close());
        assert!(!exit.close());
        assert!(!exit.pointer_left(-1.0, true));
        assert_eq!(exit.latch(), ExitLatch::Fired { modal_open: false });
    }
}
