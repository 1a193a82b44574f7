use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gate::UnlockCause;
use crate::generation::QueryKind;
use crate::toast::SocialProof;

/// Every observable state change in a session produces an Event.
/// Renderers consume them; nothing feeds them back.
///
/// `at_ms` is milliseconds since the session started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        started_at: DateTime<Utc>,
        at_ms: u64,
    },
    CountdownTicked {
        remaining_secs: u64,
        display: String,
        at_ms: u64,
    },
    CountdownFinished {
        at_ms: u64,
    },
    ProgressUpdated {
        progress_percent: f64,
        at_ms: u64,
    },
    GateUnlocked {
        cause: UnlockCause,
        at_ms: u64,
    },
    SpotsDecremented {
        spots_left: u32,
        at_ms: u64,
    },
    ToastShown {
        user: SocialProof,
        at_ms: u64,
    },
    ToastHidden {
        at_ms: u64,
    },
    ExitModalShown {
        at_ms: u64,
    },
    ExitModalClosed {
        at_ms: u64,
    },
    FaqToggled {
        open: Option<usize>,
        at_ms: u64,
    },
    QueryStarted {
        kind: QueryKind,
        at_ms: u64,
    },
    QueryFinished {
        kind: QueryKind,
        result: String,
        at_ms: u64,
    },
    CheckoutOpened {
        url: String,
        launched: bool,
        at_ms: u64,
    },
    SessionEnded {
        at_ms: u64,
    },
}

impl Event {
    pub fn at_ms(&self) -> u64 {
        match self {
            Event::SessionStarted { at_ms, .. }
            | Event::CountdownTicked { at_ms, .. }
            | Event::CountdownFinished { at_ms }
            | Event::ProgressUpdated { at_ms, .. }
            | Event::GateUnlocked { at_ms, .. }
            | Event::SpotsDecremented { at_ms, .. }
            | Event::ToastShown { at_ms, .. }
            | Event::ToastHidden { at_ms }
            | Event::ExitModalShown { at_ms }
            | Event::ExitModalClosed { at_ms }
            | Event::FaqToggled { at_ms, .. }
            | Event::QueryStarted { at_ms, .. }
            | Event::QueryFinished { at_ms, .. }
            | Event::CheckoutOpened { at_ms, .. }
            | Event::SessionEnded { at_ms } => *at_ms,
        }
    }
}
