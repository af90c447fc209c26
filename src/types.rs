// src/types.rs
use serde::{Deserialize, Serialize};

/// Newsletter sections that each receive exactly one news item per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 공공·정부 AI 활용 사례
    PublicSector,
    /// AI 핫이슈 (AI 기술·산업)
    TechIndustry,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::PublicSector, Category::TechIndustry];

    pub fn key(self) -> &'static str {
        match self {
            Category::PublicSector => "public_sector",
            Category::TechIndustry => "tech_industry",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Candidate parsed out of one backend response. Only `title` and `url` are
/// guaranteed; everything else depends on how well the model followed the
/// answer format. Discarded after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsCandidate {
    pub title: String,
    pub source: Option<String>,
    /// Free-text date line, exactly as the backend wrote it.
    pub published: Option<String>,
    pub url: String,
    pub summary: Option<String>,
}

/// Accepted item as persisted in the history log and handed to the sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsRecord {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub category: Category,
    /// Unix millis at acceptance time.
    pub accepted_at_ms: i64,
    /// Set only on the placeholder emitted when a section exhausted its
    /// retries. Never true for persisted records.
    #[serde(default)]
    pub failed: bool,
}

impl NewsRecord {
    /// Placeholder for a section whose retrieval came up empty.
    pub fn not_found(category: Category, window_label: &str, now_ms: i64) -> Self {
        Self {
            title: "뉴스를 찾지 못했습니다".to_string(),
            summary: format!("최근 {window_label} 이내 관련 뉴스가 없습니다."),
            url: "#".to_string(),
            category,
            accepted_at_ms: now_ms,
            failed: true,
        }
    }
}

/// One step of the widening search-window schedule. Transient, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryWindow {
    pub days: u32,
    pub label: &'static str,
}
