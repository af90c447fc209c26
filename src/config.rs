// src/config.rs
//! Per-section search configuration.
//!
//! Loaded from `config/sections.toml` (or `$SECTIONS_CONFIG_PATH`); when no
//! file is present the built-in defaults apply, so the binary runs without
//! any setup. Keyword/framing text is data, not code: editors tune it
//! without touching the pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::types::Category;

pub const ENV_PATH: &str = "SECTIONS_CONFIG_PATH";
pub const DEFAULT_PATH: &str = "config/sections.toml";

/// Search settings for one newsletter section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SectionConfig {
    /// Human-readable section name for logs.
    pub name: String,
    /// Keyword soup embedded in the search prompt.
    pub search_keywords: String,
    /// Framing sentence for the secondary summary prompt.
    pub summary_context: String,
    /// Priority-media guidance appended to the search prompt.
    pub media_note: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SectionsConfig {
    pub public_sector: SectionConfig,
    pub tech_industry: SectionConfig,
}

impl SectionsConfig {
    pub fn get(&self, category: Category) -> &SectionConfig {
        match category {
            Category::PublicSector => &self.public_sector,
            Category::TechIndustry => &self.tech_industry,
        }
    }

    /// Load using env var + fallbacks:
    /// 1) $SECTIONS_CONFIG_PATH
    /// 2) config/sections.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            bail!("SECTIONS_CONFIG_PATH points to non-existent path");
        }
        let default = PathBuf::from(DEFAULT_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::builtin())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sections config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing sections config from {}", path.display()))
    }

    /// Defaults matching the shipped `config/sections.toml`.
    pub fn builtin() -> Self {
        Self {
            public_sector: SectionConfig {
                name: "공공·정부 AI 활용 사례".into(),
                search_keywords:
                    "한국 지자체 공공기관 중앙부처 정부 AI 인공지능 스마트행정 챗봇 디지털전환 활용 도입"
                        .into(),
                summary_context:
                    "지자체 또는 정부기관(중앙부처, 공공기관 포함)이 AI를 실무에 도입/활용한 사례"
                        .into(),
                media_note: "정부기관(.go.kr), 공식 언론사 기사를 우선적으로 찾아줘".into(),
            },
            tech_industry: SectionConfig {
                name: "AI 핫이슈 (AI 기술·산업)".into(),
                search_keywords:
                    "한국 AI 인공지능 신기술 LLM 생성형AI 모델 칩 산업 스타트업 오픈AI 구글 네이버 카카오"
                        .into(),
                summary_context:
                    "순수 AI 신기술, AI 모델 발표, AI 칩, AI 산업 동향, 글로벌 AI 기업 뉴스 (공공/정부 관련 제외)"
                        .into(),
                media_note:
                    "한국 IT 전문 매체(전자신문, 디지털데일리, 아이뉴스24, 지디넷코리아, AI타임스, 테크42, IT조선) 기사를 우선적으로 찾아줘"
                        .into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn shipped_config_matches_builtin_defaults() {
        let shipped: SectionsConfig =
            toml::from_str(include_str!("../config/sections.toml")).unwrap();
        assert_eq!(shipped, SectionsConfig::builtin());
    }

    #[test]
    fn get_maps_categories_to_sections() {
        let cfg = SectionsConfig::builtin();
        assert_eq!(cfg.get(Category::PublicSector).name, "공공·정부 AI 활용 사례");
        assert_eq!(cfg.get(Category::TechIndustry).name, "AI 핫이슈 (AI 기술·산업)");
    }

    #[serial_test::serial]
    #[test]
    fn env_path_wins_over_fallbacks() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sections.toml");
        let custom = r#"
[public_sector]
name = "공공 섹션"
search_keywords = "정부 AI"
summary_context = "정부기관 AI 도입 사례"
media_note = "공식 기사 우선"

[tech_industry]
name = "기술 섹션"
search_keywords = "AI 산업"
summary_context = "AI 기술/산업 동향"
media_note = "IT 매체 우선"
"#;
        std::fs::write(&path, custom).unwrap();

        env::set_var(ENV_PATH, path.display().to_string());
        let cfg = SectionsConfig::load_default().unwrap();
        env::remove_var(ENV_PATH);

        assert_eq!(cfg.public_sector.name, "공공 섹션");
        assert_eq!(cfg.tech_industry.search_keywords, "AI 산업");
    }

    #[serial_test::serial]
    #[test]
    fn dangling_env_path_is_an_error() {
        env::set_var(ENV_PATH, "/definitely/not/a/real/path.toml");
        let err = SectionsConfig::load_default();
        env::remove_var(ENV_PATH);
        assert!(err.is_err());
    }
}
