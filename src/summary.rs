// src/summary.rs
//! Summary refinement: every accepted item ships with a usable summary.
//!
//! The search pass often returns a one-liner or nothing at all; in that case
//! a second, cheaper backend call produces one, and a synthesized sentence
//! is the last resort. This stage never fails the item.

use tracing::{debug, warn};

use crate::backend::{BackendError, SearchBackend, SearchRequest};
use crate::config::SectionConfig;
use crate::types::NewsCandidate;

/// A summary longer than this (trimmed chars) is kept straight from the
/// search pass.
const KEEP_THRESHOLD: usize = 30;
/// Floor for the final summary; anything shorter gets the fallback sentence.
const MIN_LEN: usize = 15;

const SUMMARY_TEMPERATURE: f32 = 0.7;
const SUMMARY_MAX_TOKENS: u32 = 256;

fn fallback_sentence(title: &str) -> String {
    format!("{title}에 관한 최신 뉴스입니다.")
}

/// Return the candidate's own summary when it is substantial, otherwise
/// refine via one secondary query, otherwise synthesize from the title.
pub async fn ensure_summary(
    backend: &dyn SearchBackend,
    section: &SectionConfig,
    candidate: &NewsCandidate,
) -> String {
    if let Some(s) = candidate.summary.as_deref() {
        let s = s.trim();
        if s.chars().count() > KEEP_THRESHOLD {
            return s.to_string();
        }
    }

    debug!(title = %candidate.title, "summary missing or short, refining");
    let refined = match request_summary(backend, section, &candidate.title).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, title = %candidate.title, "secondary summary failed, synthesizing");
            fallback_sentence(&candidate.title)
        }
    };

    if refined.chars().count() < MIN_LEN {
        return fallback_sentence(&candidate.title);
    }
    refined
}

async fn request_summary(
    backend: &dyn SearchBackend,
    section: &SectionConfig,
    title: &str,
) -> Result<String, BackendError> {
    let prompt = format!(
        "\"{title}\"\n\n위 뉴스를 공무원 독자를 위해 핵심만 간결하게 요약해주세요.\n\
         {context}의 관점에서 중요한 점을 강조하되, 1-2문장으로 최대 2줄 이내로만 작성해주세요.\n\n요약:",
        context = section.summary_context,
    );
    let resp = backend
        .generate(&SearchRequest {
            prompt,
            use_search: false,
            temperature: SUMMARY_TEMPERATURE,
            max_output_tokens: SUMMARY_MAX_TOKENS,
        })
        .await?;

    let text = resp.text.trim();
    // The model sometimes echoes the label back.
    let text = text.strip_prefix("요약:").map(str::trim).unwrap_or(text);
    Ok(text.to_string())
}
