// src/retry.rs
//! Retry orchestration: one fresh, valid, non-duplicate item per section.
//!
//! Each attempt widens the search window along a fixed escalation schedule.
//! Every recoverable problem (short response, parse miss, bad link, bad
//! headline, duplicate, transport error) is a soft failure that advances the
//! loop; only exhaustion surfaces to the caller.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, SearchBackend, SearchRequest, SearchResponse};
use crate::config::SectionConfig;
use crate::extract;
use crate::history::HistoryStore;
use crate::summary;
use crate::types::{Category, NewsRecord, RetryWindow};
use crate::validate;

/// Widening search-window schedule; attempts past the end reuse the last entry.
pub const ESCALATION: [RetryWindow; 5] = [
    RetryWindow { days: 2, label: "1-2 days" },
    RetryWindow { days: 3, label: "2-3 days" },
    RetryWindow { days: 5, label: "3-5 days" },
    RetryWindow { days: 7, label: "1 week" },
    RetryWindow { days: 14, label: "2 weeks" },
];

/// A response shorter than this (trimmed chars) cannot hold the five labeled
/// fields and is retried without parsing.
const MIN_RESPONSE_CHARS: usize = 50;
/// Output-token budget for the search pass; doubled once on a token-limit error.
const SEARCH_MAX_TOKENS: u32 = 2048;
const SEARCH_TEMPERATURE: f32 = 0.3;
/// Recent titles handed to the backend as a do-not-repeat list.
const EXCLUSION_LIMIT: usize = 10;

pub fn window_for_attempt(index: usize) -> RetryWindow {
    ESCALATION[index.min(ESCALATION.len() - 1)]
}

#[derive(Debug, Error)]
#[error("no acceptable news for {category} after {attempts} attempts: {last_failure}")]
pub struct RetrievalError {
    pub category: Category,
    pub attempts: usize,
    pub last_failure: String,
}

/// One-time metrics registration (facade only; exporters live elsewhere).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_attempts_total", "Acquisition attempts against the backend.");
        describe_counter!(
            "news_soft_failures_total",
            "Attempts discarded for a recoverable reason."
        );
        describe_counter!("news_duplicates_total", "Candidates rejected by the dedup window.");
        describe_counter!("news_accepted_total", "Items accepted into a section.");
    });
}

pub struct RetryController<'a> {
    backend: &'a dyn SearchBackend,
    section: &'a SectionConfig,
    history: &'a HistoryStore,
}

impl<'a> RetryController<'a> {
    pub fn new(
        backend: &'a dyn SearchBackend,
        section: &'a SectionConfig,
        history: &'a HistoryStore,
    ) -> Self {
        Self {
            backend,
            section,
            history,
        }
    }

    /// Run up to `max_attempts` acquisition attempts for `category`. The
    /// exclusion list is read once per call, not per attempt.
    pub async fn fetch_one(
        &self,
        category: Category,
        max_attempts: usize,
        now_ms: i64,
    ) -> Result<NewsRecord, RetrievalError> {
        ensure_metrics_described();
        let exclusions = self
            .history
            .recent_titles(category, now_ms, EXCLUSION_LIMIT);
        let mut last_failure = String::from("no attempts made");

        for attempt in 0..max_attempts {
            let window = window_for_attempt(attempt);
            counter!("news_attempts_total").increment(1);
            info!(
                section = %self.section.name,
                attempt = attempt + 1,
                max = max_attempts,
                window = window.label,
                "acquisition attempt"
            );

            match self.try_once(category, window, &exclusions, now_ms).await {
                Ok(record) => {
                    counter!("news_accepted_total").increment(1);
                    info!(section = %self.section.name, title = %record.title, "item accepted");
                    return Ok(record);
                }
                Err(reason) => {
                    counter!("news_soft_failures_total").increment(1);
                    warn!(
                        section = %self.section.name,
                        attempt = attempt + 1,
                        %reason,
                        "attempt failed"
                    );
                    last_failure = reason;
                }
            }
        }

        Err(RetrievalError {
            category,
            attempts: max_attempts,
            last_failure,
        })
    }

    /// One full attempt: call, extract, validate, dedup-check, refine.
    /// The Err value is the soft-failure reason.
    async fn try_once(
        &self,
        category: Category,
        window: RetryWindow,
        exclusions: &[String],
        now_ms: i64,
    ) -> Result<NewsRecord, String> {
        let prompt = build_search_prompt(self.section, window, exclusions, now_ms);
        let response = self
            .call_with_token_retry(&prompt)
            .await
            .map_err(|e| format!("backend error: {e}"))?;

        let text = response.text.trim();
        if text.chars().count() < MIN_RESPONSE_CHARS {
            return Err("empty or short response".to_string());
        }

        let candidate = extract::parse_candidate(text).map_err(|e| e.to_string())?;
        let final_url = extract::resolve_final_url(&candidate.url, &response.grounding);

        if !validate::is_valid_url(&final_url) {
            return Err(format!("invalid url: {final_url}"));
        }
        if !validate::is_valid_title(&candidate.title) {
            return Err(format!("invalid title: {}", candidate.title));
        }
        if self.history.is_duplicate(&candidate.title, &final_url, now_ms) {
            counter!("news_duplicates_total").increment(1);
            return Err("duplicate of a recent item".to_string());
        }

        let summary = summary::ensure_summary(self.backend, self.section, &candidate).await;
        Ok(NewsRecord {
            title: candidate.title,
            summary,
            url: final_url,
            category,
            accepted_at_ms: now_ms,
            failed: false,
        })
    }

    /// A token-limit error gets exactly one immediate same-window retry with
    /// a doubled output budget; any other error fails the attempt directly.
    async fn call_with_token_retry(&self, prompt: &str) -> Result<SearchResponse, BackendError> {
        let mut req = SearchRequest {
            prompt: prompt.to_string(),
            use_search: true,
            temperature: SEARCH_TEMPERATURE,
            max_output_tokens: SEARCH_MAX_TOKENS,
        };
        match self.backend.generate(&req).await {
            Err(BackendError::TokenLimit) => {
                debug!("token limit hit, retrying with a larger output budget");
                req.max_output_tokens = SEARCH_MAX_TOKENS * 2;
                self.backend.generate(&req).await
            }
            other => other,
        }
    }
}

/// Reference date embedded in the prompt: yesterday, as `M월 D일`.
fn reference_date(now_ms: i64) -> String {
    use chrono::{DateTime, Datelike, Duration, Utc};
    let yesterday = DateTime::<Utc>::from_timestamp_millis(now_ms)
        .unwrap_or_else(Utc::now)
        - Duration::days(1);
    format!("{}월 {}일", yesterday.month(), yesterday.day())
}

/// Korean search prompt asking for exactly one item in the five-line answer
/// format, with the do-not-repeat block appended when history exists.
pub fn build_search_prompt(
    section: &SectionConfig,
    window: RetryWindow,
    exclusions: &[String],
    now_ms: i64,
) -> String {
    let date_str = reference_date(now_ms);
    let mut prompt = format!(
        "{date_str} 기준 최근 {label} 이내의 \"{keywords}\" 관련 최신 뉴스를 검색해줘.\n\n\
         다음 형식으로 정확히 1개의 뉴스만 알려줘:\n\
         제목: [실제 뉴스 제목]\n\
         출처: [언론사명 또는 기관명]\n\
         날짜: [발표 날짜]\n\
         URL: [뉴스 링크]\n\
         요약: [핵심만 1-2문장으로 간결하게, 최대 2줄 이내]\n\n\
         주의사항:\n\
         - 반드시 한글 뉴스만 수집 (영문 기사 제외)\n\
         - {media_note}\n\
         - 실제 존재하는 뉴스만 알려줘\n\
         - 제목은 반드시 실제 뉴스 헤드라인이어야 함\n\
         - 요약은 짧고 간결하게 핵심만",
        label = window.label,
        keywords = section.search_keywords,
        media_note = section.media_note,
    );

    if !exclusions.is_empty() {
        prompt.push_str("\n\n최근 사용한 뉴스 (중복 금지):\n");
        for (i, title) in exclusions.iter().enumerate() {
            prompt.push_str(&format!("{}. {title}\n", i + 1));
        }
        prompt.push_str("위 뉴스들과 다른 새로운 뉴스를 찾아주세요.");
    }
    prompt
}
