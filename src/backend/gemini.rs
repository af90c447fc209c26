// src/backend/gemini.rs
//! Gemini `generateContent` client with optional Google-Search grounding.
//!
//! Grounded search calls routinely take tens of seconds, hence the generous
//! request timeout. The `finishReason` field is mapped onto the typed error
//! surface so the retry layer can treat token exhaustion specially.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{BackendError, GroundingSource, SearchBackend, SearchRequest, SearchResponse};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: String, model_override: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("ai-morning-brief/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(90))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: model_override.unwrap_or(DEFAULT_MODEL).to_string(),
        }
    }

    /// Build from `GEMINI_API_KEY` / `GEMINI_MODEL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("Missing GEMINI_API_KEY env var"))?;
        let model = std::env::var("GEMINI_MODEL").ok();
        Ok(Self::new(key, model.as_deref()))
    }
}

// --- wire format ---

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: GoogleSearch,
}

/// Serializes to `{}`; presence of the tool is what enables grounding.
#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    uri: Option<String>,
}

#[async_trait]
impl SearchBackend for GeminiBackend {
    async fn generate(&self, req: &SearchRequest) -> Result<SearchResponse, BackendError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &req.prompt }],
            }],
            tools: req.use_search.then(|| {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            }),
            generation_config: GenerationConfig {
                temperature: req.temperature,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: req.max_output_tokens,
            },
        };

        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BackendError::Status(resp.status().as_u16()));
        }
        let parsed: GenerateResponse = resp.json().await?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(BackendError::Malformed("no candidates".to_string()));
        };

        match candidate.finish_reason.as_deref() {
            Some("MAX_TOKENS") => return Err(BackendError::TokenLimit),
            Some("SAFETY") => return Err(BackendError::Blocked("safety filter".to_string())),
            Some(other) if other != "STOP" => {
                return Err(BackendError::Blocked(other.to_string()))
            }
            _ => {}
        }

        let text = candidate
            .content
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| BackendError::Malformed("no content parts".to_string()))?;

        let grounding = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.web.and_then(|w| w.uri))
            .map(|uri| GroundingSource { uri })
            .collect();

        Ok(SearchResponse { text, grounding })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
