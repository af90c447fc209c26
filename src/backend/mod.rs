// src/backend/mod.rs
//! Generative search backend seam: the request/response surface the pipeline
//! talks to, the Gemini implementation, and a scripted stand-in for tests.

pub mod gemini;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiBackend;

/// One generation request. `use_search` toggles live web-search grounding.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub prompt: String,
    pub use_search: bool,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Source link the backend consulted while grounding a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingSource {
    pub uri: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub text: String,
    pub grounding: Vec<GroundingSource>,
}

/// Failure modes the retry loop needs to tell apart from each other and from
/// successful-but-invalid content.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The model ran out of output budget (`finishReason: MAX_TOKENS`).
    #[error("output token limit exceeded")]
    TokenLimit,
    #[error("response blocked: {0}")]
    Blocked(String),
    #[error("unexpected response shape: {0}")]
    Malformed(String),
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn generate(&self, req: &SearchRequest) -> Result<SearchResponse, BackendError>;
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Scripted backend for tests and local dry runs: pops pre-loaded outcomes in
/// call order and records every request it saw.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<SearchResponse, BackendError>>>,
    seen: Mutex<Vec<SearchRequest>>,
}

impl ScriptedBackend {
    pub fn new(outcomes: Vec<Result<SearchResponse, BackendError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a plain-text success without grounding metadata.
    pub fn ok(text: &str) -> Result<SearchResponse, BackendError> {
        Ok(SearchResponse {
            text: text.to_string(),
            grounding: Vec::new(),
        })
    }

    /// Every request passed to `generate`, in order.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.seen.lock().expect("seen mutex poisoned").clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().expect("seen mutex poisoned").len()
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn generate(&self, req: &SearchRequest) -> Result<SearchResponse, BackendError> {
        self.seen
            .lock()
            .expect("seen mutex poisoned")
            .push(req.clone());
        self.script
            .lock()
            .expect("script mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Malformed("script exhausted".to_string())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
