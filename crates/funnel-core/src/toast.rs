//! Social-proof toasts.
//!
//! ## State Transitions
//!
//! ```text
//! Dormant -(wake, gate open)-> Visible -(hide)-> Waiting -(wake)-> Visible ...
//!    ^ |
//!    +-+ (wake, gate closed: re-check later)
//! ```
//!
//! There is no terminal state; the chain runs until the session is torn down.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::scarcity::Jitter;

/// Floor for every self-scheduled wake-up, so the chain always moves the
/// clock forward.
const MIN_REARM_MS: u64 = 1;

/// One canned "someone just bought" entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProof {
    pub name: String,
    pub action: String,
}

impl SocialProof {
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
        }
    }
}

/// The catalog shipped with the page.
pub fn default_catalog() -> Vec<SocialProof> {
    vec![
        SocialProof::new("Juliana de SP", "comprou o Guia"),
        SocialProof::new("Beatriz do RJ", "garantiu a vaga"),
        SocialProof::new("Camila de BH", "acessou o dossiê"),
        SocialProof::new("Larissa de POA", "comprou agora"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum ToastPhase {
    Dormant,
    Waiting,
    Visible { user: SocialProof },
}

/// Timing knobs, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastTiming {
    pub warmup_ms: u64,
    pub recheck_ms: u64,
    pub display_ms: u64,
    pub gap: Jitter,
}

impl Default for ToastTiming {
    fn default() -> Self {
        Self {
            warmup_ms: 35_000,
            recheck_ms: 5_000,
            display_ms: 4_000,
            gap: Jitter::new(10_000, 15_000),
        }
    }
}

/// What the scheduler should do after a wake-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastWake {
    /// Gate still closed (or nothing to show); wake again after `next_in_ms`.
    Recheck { next_in_ms: u64 },
    /// A toast is now visible; hide it after `hide_in_ms`.
    Shown { user: SocialProof, hide_in_ms: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToastScheduler {
    phase: ToastPhase,
    catalog: Vec<SocialProof>,
    timing: ToastTiming,
}

impl ToastScheduler {
    pub fn new(catalog: Vec<SocialProof>, timing: ToastTiming) -> Self {
        Self {
            phase: ToastPhase::Dormant,
            catalog,
            timing,
        }
    }

    pub fn phase(&self) -> &ToastPhase {
        &self.phase
    }

    pub fn timing(&self) -> &ToastTiming {
        &self.timing
    }

    pub fn visible_user(&self) -> Option<&SocialProof> {
        match &self.phase {
            ToastPhase::Visible { user } => Some(user),
            _ => None,
        }
    }

    pub fn wake<R: Rng + ?Sized>(&mut self, gate_unlocked: bool, rng: &mut R) -> ToastWake {
        if !gate_unlocked {
            return ToastWake::Recheck {
                next_in_ms: self.timing.recheck_ms.max(MIN_REARM_MS),
            };
        }
        if self.catalog.is_empty() {
            self.phase = ToastPhase::Waiting;
            return ToastWake::Recheck {
                next_in_ms: self.timing.gap.sample(rng).max(MIN_REARM_MS),
            };
        }

        let user = self.catalog[rng.gen_range(0..self.catalog.len())].clone();
        self.phase = ToastPhase::Visible { user: user.clone() };
        ToastWake::Shown {
            user,
            hide_in_ms: self.timing.display_ms,
        }
    }

    /// Hide the visible toast. Returns the delay until the next wake-up, or
    /// `None` if nothing was visible.
    pub fn hide<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<u64> {
        if !matches!(self.phase, ToastPhase::Visible { .. }) {
            return None;
        }
        self.phase = ToastPhase::Waiting;
        Some(self.timing.gap.sample(rng).max(MIN_REARM_MS))
    }
}
