//! Generative-text queries.
//!
//! The hosted model is a black box: a request goes in, a text (or nothing)
//! comes back, or the call fails. [`Generator`] is the seam; [`GeminiClient`]
//! is the production implementation and tests substitute their own.

mod adapter;
mod gemini;
mod prompts;

pub use adapter::{QueryAdapter, QueryProfile, QueryState};
pub use gemini::{GeminiClient, API_KEY_ENV_VARS, DEFAULT_BASE_URL};
pub use prompts::{ANALYZER_INSTRUCTION, GENERATOR_INSTRUCTION};

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Which of the two page tools a query belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Analyses a message for manipulation tactics.
    Analyzer,
    /// Drafts non-reactive replies to a provocation.
    Generator,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Analyzer => "analyzer",
            QueryKind::Generator => "generator",
        }
    }
}

impl std::str::FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analyzer" | "analyze" => Ok(QueryKind::Analyzer),
            "generator" | "generate" => Ok(QueryKind::Generator),
            other => Err(format!("unknown query kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub input: String,
    pub system_instruction: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: Option<String>,
}

/// A hosted text model.
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<GenerationResponse, GenerationError>> + Send;
}
