//! Real-time driver for a [`Session`].
//!
//! One tokio task owns the session. It waits on three things at once: the
//! command channel, in-flight generation requests, and the session's next
//! timer deadline. Generation round trips run as separate tasks so a slow
//! request only holds up its own adapter.
//!
//! Events go out on a bounded channel. A renderer that stops reading loses
//! events once `EVENT_BUFFER` are queued; the session keeps running.
//!
//! ## Usage
//!
//! ```ignore
//! let (handle, mut events, task) = SessionRuntime::spawn(session, Arc::new(client), Arc::new(SystemLauncher));
//! handle.report_progress(12.5).await?;
//! while let Some(event) = events.recv().await { /* render */ }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{Id, JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};

use crate::checkout::Launcher;
use crate::error::{CoreError, GenerationError, Result};
use crate::events::Event;
use crate::generation::{GenerationResponse, Generator, QueryKind};
use crate::session::{Session, SessionSnapshot};

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 1024;

type Outcome = std::result::Result<GenerationResponse, GenerationError>;

#[derive(Debug)]
pub enum Command {
    ReportProgress(f64),
    PointerLeave(f64),
    CloseExitModal,
    ToggleFaq(usize),
    Submit { kind: QueryKind, input: String },
    Checkout,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<Command>,
}

impl RuntimeHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CoreError::RuntimeClosed)
    }

    pub async fn report_progress(&self, current_time_secs: f64) -> Result<()> {
        self.send(Command::ReportProgress(current_time_secs)).await
    }

    pub async fn pointer_left(&self, client_y: f64) -> Result<()> {
        self.send(Command::PointerLeave(client_y)).await
    }

    pub async fn close_exit_modal(&self) -> Result<()> {
        self.send(Command::CloseExitModal).await
    }

    pub async fn toggle_faq(&self, index: usize) -> Result<()> {
        self.send(Command::ToggleFaq(index)).await
    }

    pub async fn submit(&self, kind: QueryKind, input: impl Into<String>) -> Result<()> {
        self.send(Command::Submit {
            kind,
            input: input.into(),
        })
        .await
    }

    pub async fn checkout(&self) -> Result<()> {
        self.send(Command::Checkout).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}

pub struct SessionRuntime<G> {
    session: Session,
    generator: Arc<G>,
    launcher: Arc<dyn Launcher>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::Sender<Event>,
    in_flight: JoinSet<Outcome>,
    in_flight_kinds: HashMap<Id, QueryKind>,
    origin: Instant,
}

impl<G: Generator + 'static> SessionRuntime<G> {
    /// Start `session` on the current tokio runtime.
    ///
    /// The returned task resolves to the torn-down session once `shutdown`
    /// is sent or every handle is dropped.
    pub fn spawn(
        session: Session,
        generator: Arc<G>,
        launcher: Arc<dyn Launcher>,
    ) -> (
        RuntimeHandle,
        mpsc::Receiver<Event>,
        JoinHandle<Session>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let runtime = SessionRuntime {
            session,
            generator,
            launcher,
            commands: command_rx,
            events: event_tx,
            in_flight: JoinSet::new(),
            in_flight_kinds: HashMap::new(),
            origin: Instant::now(),
        };
        let task = tokio::spawn(runtime.run());
        (RuntimeHandle { tx: command_tx }, event_rx, task)
    }

    async fn run(mut self) -> Session {
        self.origin = Instant::now();
        let started = self.session.start();
        self.emit(started);

        loop {
            let deadline = self
                .session
                .next_deadline_ms()
                .map(|ms| self.origin + Duration::from_millis(ms));

            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    self.catch_up();
                    match command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => self.handle(command),
                    }
                }

                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    self.catch_up();
                    let (id, outcome) = match joined {
                        Ok((id, outcome)) => (id, outcome),
                        Err(e) => (e.id(), Err(GenerationError::Aborted(e.to_string()))),
                    };
                    if let Some(kind) = self.in_flight_kinds.remove(&id) {
                        let finished = self.session.finish_query(kind, outcome);
                        self.emit(finished);
                    }
                }

                _ = wait_for(deadline) => {
                    self.catch_up();
                }
            }
        }

        self.in_flight.abort_all();
        let ended = self.session.teardown();
        self.emit(ended);
        self.session
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Fire every timer due by now, so commands observe up-to-date state.
    fn catch_up(&mut self) {
        let now = self.elapsed_ms();
        let fired = self.session.advance_to(now);
        self.emit(fired);
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::ReportProgress(secs) => {
                let events = self.session.report_progress(secs);
                self.emit(events);
            }
            Command::PointerLeave(y) => {
                let event = self.session.pointer_left(y);
                self.emit(event);
            }
            Command::CloseExitModal => {
                let event = self.session.close_exit_modal();
                self.emit(event);
            }
            Command::ToggleFaq(index) => match self.session.toggle_faq(index) {
                Ok(event) => self.emit(event),
                Err(e) => tracing::warn!(error = %e, "ignoring faq toggle"),
            },
            Command::Submit { kind, input } => {
                let Some((request, started)) = self.session.begin_query(kind, &input) else {
                    tracing::debug!(query = kind.as_str(), "submission ignored");
                    return;
                };
                self.emit(Some(started));
                let generator = Arc::clone(&self.generator);
                let abort = self
                    .in_flight
                    .spawn(async move { generator.generate(request).await });
                self.in_flight_kinds.insert(abort.id(), kind);
            }
            Command::Checkout => {
                let event = self.session.open_checkout(self.launcher.as_ref());
                self.emit(event);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.session.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    fn emit(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            match self.events.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(event)) => {
                    tracing::warn!(at_ms = event.at_ms(), "event buffer full, dropping event");
                }
                // A renderer that went away is not the session's problem.
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
