//! Session controller.
//!
//! Owns every component of one page visit plus the scheduler that drives
//! them. Nothing here sleeps or spawns: the caller moves the clock with
//! `advance_to()` and feeds external signals through the command methods.
//! Each call returns the events it produced, in order.
//!
//! ## Lifecycle
//!
//! ```text
//! Created -> Running -> Ended
//! ```
//!
//! `start()` registers the four timer chains, `teardown()` cancels whatever
//! each chain currently has pending. After teardown every method is a no-op.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkout::{CheckoutLink, Launcher};
use crate::config::Config;
use crate::countdown::Countdown;
use crate::error::{GenerationError, Result, ValidationError};
use crate::events::Event;
use crate::exit_intent::ExitIntent;
use crate::faq::FaqAccordion;
use crate::gate::{GateTransition, UnlockCause, UnlockGate};
use crate::generation::{
    GenerationRequest, GenerationResponse, QueryAdapter, QueryKind, QueryState,
};
use crate::scarcity::{ScarcityCounter, ScarcityStep};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::toast::{SocialProof, ToastScheduler, ToastWake};

const TICK_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Created,
    Running,
    Ended,
}

/// Work items registered with the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    CountdownTick,
    FallbackUnlock,
    ScarcityStep,
    ToastWake,
    ToastHide,
}

/// What each chain currently has pending.
#[derive(Debug, Default, Clone)]
struct Pending {
    countdown: Option<TimerHandle>,
    fallback: Option<TimerHandle>,
    scarcity: Option<TimerHandle>,
    toast: Option<TimerHandle>,
}

impl Pending {
    fn slot(&mut self, task: Task) -> &mut Option<TimerHandle> {
        match task {
            Task::CountdownTick => &mut self.countdown,
            Task::FallbackUnlock => &mut self.fallback,
            Task::ScarcityStep => &mut self.scarcity,
            Task::ToastWake | Task::ToastHide => &mut self.toast,
        }
    }
}

/// Read model for renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
    pub remaining_secs: u64,
    pub timer_display: String,
    pub unlocked: bool,
    pub progress_percent: f64,
    pub spots_left: u32,
    pub toast: Option<SocialProof>,
    pub exit_modal_shown: bool,
    pub exit_modal_fired: bool,
    pub faq_open: Option<usize>,
    pub analyzer: QueryState,
    pub generator: QueryState,
}

pub struct Session {
    id: Uuid,
    phase: SessionPhase,
    started_at: Option<DateTime<Utc>>,
    scheduler: Scheduler<Task>,
    pending: Pending,
    rng: Mcg128Xsl64,
    countdown: Countdown,
    gate: UnlockGate,
    scarcity: ScarcityCounter,
    scarcity_initial_delay_ms: u64,
    toasts: ToastScheduler,
    exit_intent: ExitIntent,
    faq: FaqAccordion,
    analyzer: QueryAdapter,
    generator: QueryAdapter,
    checkout: CheckoutLink,
}

impl Session {
    /// Build a session from a validated configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Ok(Self {
            id: Uuid::new_v4(),
            phase: SessionPhase::Created,
            started_at: None,
            scheduler: Scheduler::new(),
            pending: Pending::default(),
            rng,
            countdown: Countdown::new(config.countdown.initial_secs),
            gate: config.unlock_gate(),
            scarcity: config.scarcity_counter(),
            scarcity_initial_delay_ms: config.scarcity_initial_delay_ms(),
            toasts: ToastScheduler::new(config.toast.catalog.clone(), config.toast_timing()),
            exit_intent: ExitIntent::new(),
            faq: FaqAccordion::new(config.faq.entries.clone()),
            analyzer: QueryAdapter::new(
                QueryKind::Analyzer,
                config.query_profile(QueryKind::Analyzer),
            ),
            generator: QueryAdapter::new(
                QueryKind::Generator,
                config.query_profile(QueryKind::Generator),
            ),
            checkout: config.checkout_link()?,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// When the next timer is due, if any.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Number of timer registrations still pending.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn gate(&self) -> &UnlockGate {
        &self.gate
    }

    pub fn scarcity(&self) -> &ScarcityCounter {
        &self.scarcity
    }

    pub fn toasts(&self) -> &ToastScheduler {
        &self.toasts
    }

    pub fn exit_intent(&self) -> &ExitIntent {
        &self.exit_intent
    }

    pub fn faq(&self) -> &FaqAccordion {
        &self.faq
    }

    pub fn checkout(&self) -> &CheckoutLink {
        &self.checkout
    }

    pub fn query(&self, kind: QueryKind) -> &QueryAdapter {
        match kind {
            QueryKind::Analyzer => &self.analyzer,
            QueryKind::Generator => &self.generator,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase,
            started_at: self.started_at,
            elapsed_ms: self.now_ms(),
            remaining_secs: self.countdown.remaining_secs(),
            timer_display: self.countdown.display(),
            unlocked: self.gate.is_unlocked(),
            progress_percent: self.gate.progress_percent(),
            spots_left: self.scarcity.spots_left(),
            toast: self.toasts.visible_user().cloned(),
            exit_modal_shown: self.exit_intent.is_shown(),
            exit_modal_fired: self.exit_intent.has_fired(),
            faq_open: self.faq.open_index(),
            analyzer: self.analyzer.state().clone(),
            generator: self.generator.state().clone(),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Register the countdown, the fallback unlock, the first scarcity step
    /// and the toast warm-up. Only the first call does anything.
    pub fn start(&mut self) -> Vec<Event> {
        if self.phase != SessionPhase::Created {
            return Vec::new();
        }
        self.phase = SessionPhase::Running;
        let started_at = Utc::now();
        self.started_at = Some(started_at);

        if self.countdown.start() {
            self.pending.countdown = Some(self.scheduler.every(TICK_MS, Task::CountdownTick));
        }
        let fallback_ms = self.gate.fallback_delay_ms();
        let scarcity_ms = self.scarcity_initial_delay_ms;
        let warmup_ms = self.toasts.timing().warmup_ms;
        self.schedule(fallback_ms, Task::FallbackUnlock);
        self.schedule(scarcity_ms, Task::ScarcityStep);
        self.schedule(warmup_ms, Task::ToastWake);

        tracing::info!(session = %self.id, fallback_ms, "session started");
        vec![Event::SessionStarted {
            session_id: self.id,
            started_at,
            at_ms: self.now_ms(),
        }]
    }

    /// Cancel everything still pending and end the session.
    pub fn teardown(&mut self) -> Vec<Event> {
        if self.phase == SessionPhase::Ended {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.pending);
        for handle in [
            pending.countdown,
            pending.fallback,
            pending.scarcity,
            pending.toast,
        ]
        .into_iter()
        .flatten()
        {
            self.scheduler.cancel(handle);
        }
        self.countdown.stop();
        self.phase = SessionPhase::Ended;
        tracing::info!(session = %self.id, at_ms = self.now_ms(), "session ended");
        vec![Event::SessionEnded {
            at_ms: self.now_ms(),
        }]
    }

    // ── Clock ────────────────────────────────────────────────────────

    /// Fire everything due up to `now_ms` (milliseconds since start).
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        if self.phase != SessionPhase::Running {
            return events;
        }
        while let Some((handle, task)) = self.scheduler.pop_due(now_ms) {
            let slot = self.pending.slot(task);
            if *slot == Some(handle) && !self.scheduler.is_pending(handle) {
                *slot = None;
            }
            self.dispatch(task, &mut events);
        }
        events
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> Vec<Event> {
        let target = self.now_ms().saturating_add(delta_ms);
        self.advance_to(target)
    }

    fn schedule(&mut self, delay_ms: u64, task: Task) {
        let handle = self.scheduler.once(delay_ms, task);
        *self.pending.slot(task) = Some(handle);
    }

    fn dispatch(&mut self, task: Task, events: &mut Vec<Event>) {
        let at_ms = self.now_ms();
        tracing::debug!(session = %self.id, ?task, at_ms, "timer fired");
        match task {
            Task::CountdownTick => match self.countdown.tick() {
                Some(tick) => {
                    events.push(Event::CountdownTicked {
                        remaining_secs: tick.remaining_secs,
                        display: tick.display,
                        at_ms,
                    });
                    if tick.finished {
                        self.cancel(Task::CountdownTick);
                        events.push(Event::CountdownFinished { at_ms });
                    }
                }
                None => self.cancel(Task::CountdownTick),
            },
            Task::FallbackUnlock => {
                if self.gate.force_unlock(UnlockCause::Fallback) {
                    self.push_unlocked(UnlockCause::Fallback, events);
                }
            }
            Task::ScarcityStep => match self.scarcity.step(&mut self.rng) {
                ScarcityStep::Decremented {
                    spots_left,
                    next_in_ms,
                } => {
                    events.push(Event::SpotsDecremented { spots_left, at_ms });
                    self.schedule(next_in_ms, Task::ScarcityStep);
                }
                ScarcityStep::Exhausted { spots_left } => {
                    tracing::debug!(session = %self.id, spots_left, "scarcity counter at floor");
                }
            },
            Task::ToastWake => {
                let unlocked = self.gate.is_unlocked();
                match self.toasts.wake(unlocked, &mut self.rng) {
                    ToastWake::Recheck { next_in_ms } => {
                        self.schedule(next_in_ms, Task::ToastWake);
                    }
                    ToastWake::Shown { user, hide_in_ms } => {
                        events.push(Event::ToastShown { user, at_ms });
                        self.schedule(hide_in_ms, Task::ToastHide);
                    }
                }
            }
            Task::ToastHide => {
                if let Some(next_in_ms) = self.toasts.hide(&mut self.rng) {
                    events.push(Event::ToastHidden { at_ms });
                    self.schedule(next_in_ms, Task::ToastWake);
                }
            }
        }
    }

    fn cancel(&mut self, task: Task) {
        if let Some(handle) = self.pending.slot(task).take() {
            self.scheduler.cancel(handle);
        }
    }

    fn push_unlocked(&mut self, cause: UnlockCause, events: &mut Vec<Event>) {
        let at_ms = self.now_ms();
        tracing::info!(session = %self.id, ?cause, at_ms, "content unlocked");
        events.push(Event::ProgressUpdated {
            progress_percent: 100.0,
            at_ms,
        });
        events.push(Event::GateUnlocked { cause, at_ms });
    }

    // ── External signals ─────────────────────────────────────────────

    /// The video reports its playback position in seconds.
    pub fn report_progress(&mut self, current_time_secs: f64) -> Vec<Event> {
        let mut events = Vec::new();
        if self.phase == SessionPhase::Ended {
            return events;
        }
        match self.gate.report_progress(current_time_secs) {
            GateTransition::Unchanged => {}
            GateTransition::Progress(progress_percent) => events.push(Event::ProgressUpdated {
                progress_percent,
                at_ms: self.now_ms(),
            }),
            GateTransition::Unlocked => {
                self.cancel(Task::FallbackUnlock);
                self.push_unlocked(UnlockCause::Progress, &mut events);
            }
        }
        events
    }

    /// The pointer left the document at vertical coordinate `client_y`.
    pub fn pointer_left(&mut self, client_y: f64) -> Option<Event> {
        if self.phase == SessionPhase::Ended {
            return None;
        }
        let unlocked = self.gate.is_unlocked();
        if self.exit_intent.pointer_left(client_y, unlocked) {
            tracing::info!(session = %self.id, "exit-intent modal shown");
            return Some(Event::ExitModalShown {
                at_ms: self.now_ms(),
            });
        }
        None
    }

    pub fn close_exit_modal(&mut self) -> Option<Event> {
        if self.phase == SessionPhase::Ended || !self.exit_intent.close() {
            return None;
        }
        Some(Event::ExitModalClosed {
            at_ms: self.now_ms(),
        })
    }

    pub fn toggle_faq(&mut self, index: usize) -> Result<Option<Event>, ValidationError> {
        if self.phase == SessionPhase::Ended {
            return Ok(None);
        }
        let open = self.faq.toggle(index)?;
        Ok(Some(Event::FaqToggled {
            open,
            at_ms: self.now_ms(),
        }))
    }

    /// Start a query. `None` when the input is blank, the adapter is busy,
    /// or the session has ended.
    pub fn begin_query(
        &mut self,
        kind: QueryKind,
        input_text: &str,
    ) -> Option<(GenerationRequest, Event)> {
        if self.phase == SessionPhase::Ended {
            return None;
        }
        let at_ms = self.now_ms();
        let request = self.query_mut(kind).begin(input_text)?;
        Some((request, Event::QueryStarted { kind, at_ms }))
    }

    /// Deliver the outcome of a query started with `begin_query`.
    pub fn finish_query(
        &mut self,
        kind: QueryKind,
        outcome: std::result::Result<GenerationResponse, GenerationError>,
    ) -> Option<Event> {
        if self.phase == SessionPhase::Ended {
            return None;
        }
        let at_ms = self.now_ms();
        let result = self.query_mut(kind).finish(outcome)?.to_string();
        Some(Event::QueryFinished {
            kind,
            result,
            at_ms,
        })
    }

    /// Open the checkout link. Launch failures are logged, never returned.
    pub fn open_checkout(&mut self, launcher: &dyn Launcher) -> Option<Event> {
        if self.phase == SessionPhase::Ended {
            return None;
        }
        let launched = self.checkout.open(launcher);
        Some(Event::CheckoutOpened {
            url: self.checkout.url().to_string(),
            launched,
            at_ms: self.now_ms(),
        })
    }

    fn query_mut(&mut self, kind: QueryKind) -> &mut QueryAdapter {
        match kind {
            QueryKind::Analyzer => &mut self.analyzer,
            QueryKind::Generator => &mut self.generator,
        }
    }
}
