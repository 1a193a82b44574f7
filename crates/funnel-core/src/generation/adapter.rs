//! One query tool on the page: input box, busy flag, result slot.
//!
//! A submission is split in two so the session can keep ticking while the
//! request is in flight: `begin` validates and marks the adapter busy,
//! `finish` stores the outcome. `submit` does both for callers that own
//! the adapter for the whole round trip.

use serde::{Deserialize, Serialize};

use super::prompts::{
    ANALYZER_EMPTY, ANALYZER_INSTRUCTION, CONNECTION_ERROR, GENERATOR_EMPTY,
    GENERATOR_INSTRUCTION,
};
use super::{GenerationRequest, GenerationResponse, Generator, QueryKind};
use crate::error::GenerationError;

/// Fixed per-tool parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryProfile {
    pub model: String,
    pub system_instruction: String,
    pub temperature: f64,
    /// Shown when the service answers without text.
    pub empty_text: String,
    /// Shown when the request fails.
    pub error_text: String,
}

impl QueryProfile {
    pub fn for_kind(kind: QueryKind, model: impl Into<String>, temperature: f64) -> Self {
        let (instruction, empty) = match kind {
            QueryKind::Analyzer => (ANALYZER_INSTRUCTION, ANALYZER_EMPTY),
            QueryKind::Generator => (GENERATOR_INSTRUCTION, GENERATOR_EMPTY),
        };
        Self {
            model: model.into(),
            system_instruction: instruction.to_string(),
            temperature,
            empty_text: empty.to_string(),
            error_text: CONNECTION_ERROR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub input_text: String,
    pub busy: bool,
    pub result_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAdapter {
    kind: QueryKind,
    profile: QueryProfile,
    state: QueryState,
}

impl QueryAdapter {
    pub fn new(kind: QueryKind, profile: QueryProfile) -> Self {
        Self {
            kind,
            profile,
            state: QueryState::default(),
        }
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn profile(&self) -> &QueryProfile {
        &self.profile
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    /// Start a request. `None` (and no state change) if the input is blank
    /// or a request is already in flight.
    pub fn begin(&mut self, input_text: &str) -> Option<GenerationRequest> {
        if self.state.busy || input_text.trim().is_empty() {
            return None;
        }
        self.state.input_text = input_text.to_string();
        self.state.busy = true;
        self.state.result_text.clear();
        Some(GenerationRequest {
            model: self.profile.model.clone(),
            input: input_text.to_string(),
            system_instruction: self.profile.system_instruction.clone(),
            temperature: self.profile.temperature,
        })
    }

    /// Store the outcome of the in-flight request. `None` if nothing was in
    /// flight.
    pub fn finish(
        &mut self,
        outcome: Result<GenerationResponse, GenerationError>,
    ) -> Option<&str> {
        if !self.state.busy {
            return None;
        }
        self.state.result_text = match outcome {
            Ok(GenerationResponse { text: Some(text) }) if !text.is_empty() => text,
            Ok(_) => self.profile.empty_text.clone(),
            Err(e) => {
                tracing::error!(query = self.kind.as_str(), error = %e, "generation request failed");
                self.profile.error_text.clone()
            }
        };
        self.state.busy = false;
        Some(&self.state.result_text)
    }

    /// Full round trip. `None` when the submission was ignored.
    pub async fn submit<G: Generator>(
        &mut self,
        generator: &G,
        input_text: &str,
    ) -> Option<&str> {
        let request = self.begin(input_text)?;
        let outcome = generator.generate(request).await;
        self.finish(outcome)
    }
}
