//! # Funnel Core Library
//!
//! Engagement logic for a single-page sales funnel: a video gate that
//! unlocks the page after a countdown, plus the timers and gimmicks around
//! it and two thin query tools backed by a hosted text model.
//!
//! ## Architecture
//!
//! - **Scheduler**: a virtual-clock timer queue; every timer in a session
//!   registers here and is cancelled through its handle
//! - **Session**: owns all components and turns timer firings and external
//!   signals into [`Event`]s. Requires the caller to advance the clock
//! - **Runtime**: drives a session in real time on tokio
//! - **Generation**: query adapters plus the Gemini REST client
//!
//! ## Key Components
//!
//! - [`Session`]: per-visit controller
//! - [`SessionRuntime`]: async driver
//! - [`Config`]: TOML configuration
//! - [`Generator`]: seam for the hosted text model

pub mod checkout;
pub mod config;
pub mod countdown;
pub mod error;
pub mod events;
pub mod exit_intent;
pub mod faq;
pub mod gate;
pub mod generation;
pub mod runtime;
pub mod scarcity;
pub mod scheduler;
pub mod session;
pub mod toast;

pub use checkout::{CheckoutLink, Launcher, SystemLauncher};
pub use config::Config;
pub use countdown::{format_display, Countdown};
pub use error::{ConfigError, CoreError, GenerationError, ValidationError};
pub use events::Event;
pub use gate::{GateState, UnlockCause, UnlockGate};
pub use generation::{GeminiClient, Generator, QueryKind};
pub use runtime::{Command, RuntimeHandle, SessionRuntime};
pub use session::{Session, SessionPhase, SessionSnapshot};
pub use toast::SocialProof;
