// src/pipeline.rs
//! Runs the per-section retrieval and assembles the daily content object for
//! the rendering/delivery layer.

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::Serialize;
use tracing::{info, warn};

use crate::backend::SearchBackend;
use crate::config::SectionsConfig;
use crate::history::HistoryStore;
use crate::retry::{window_for_attempt, RetrievalError, RetryController};
use crate::types::{Category, NewsRecord};

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Aggregate handed to the content sink, one record per section. Placeholder
/// records carry `failed: true`; the sink decides how to render them.
#[derive(Debug, Clone, Serialize)]
pub struct DailyBrief {
    pub date: String,
    pub generated_at_ms: i64,
    pub public_sector: NewsRecord,
    pub tech_industry: NewsRecord,
}

pub struct SectionPipeline<'a> {
    backend: &'a dyn SearchBackend,
    config: &'a SectionsConfig,
}

impl<'a> SectionPipeline<'a> {
    pub fn new(backend: &'a dyn SearchBackend, config: &'a SectionsConfig) -> Self {
        Self { backend, config }
    }

    /// Retrieve both sections concurrently and append the accepted records.
    /// A section that exhausts its retries yields a flagged placeholder; it
    /// never blocks the other section.
    pub async fn build_brief(
        &self,
        history: &mut HistoryStore,
        max_attempts: usize,
        now: DateTime<Utc>,
    ) -> DailyBrief {
        let now_ms = now.timestamp_millis();

        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            info!("weekend run, fresh news may be scarce");
        }

        let store: &HistoryStore = history;
        let public = RetryController::new(self.backend, self.config.get(Category::PublicSector), store);
        let tech = RetryController::new(self.backend, self.config.get(Category::TechIndustry), store);

        let (res_public, res_tech) = tokio::join!(
            public.fetch_one(Category::PublicSector, max_attempts, now_ms),
            tech.fetch_one(Category::TechIndustry, max_attempts, now_ms),
        );

        let public_sector = settle(history, res_public, Category::PublicSector, max_attempts, now_ms);
        let tech_industry = settle(history, res_tech, Category::TechIndustry, max_attempts, now_ms);

        DailyBrief {
            date: korean_date(now),
            generated_at_ms: now_ms,
            public_sector,
            tech_industry,
        }
    }
}

/// Persist a success; turn exhaustion into the sentinel record.
fn settle(
    history: &mut HistoryStore,
    result: Result<NewsRecord, RetrievalError>,
    category: Category,
    max_attempts: usize,
    now_ms: i64,
) -> NewsRecord {
    match result {
        Ok(record) => {
            history.append(record.clone());
            record
        }
        Err(e) => {
            warn!(section = %category, error = %e, "section exhausted, emitting placeholder");
            let widest = window_for_attempt(max_attempts.saturating_sub(1));
            NewsRecord::not_found(category, widest.label, now_ms)
        }
    }
}

/// The brief's date header format: `2026년 8월 6일 (목)`.
pub fn korean_date(now: DateTime<Utc>) -> String {
    const DAYS: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];
    format!(
        "{}년 {}월 {}일 ({})",
        now.year(),
        now.month(),
        now.day(),
        DAYS[now.weekday().num_days_from_monday() as usize],
    )
}
