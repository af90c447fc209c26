// tests/summary_refiner.rs
// The three refinement paths: keep, re-query, synthesize.

use ai_morning_brief::backend::{BackendError, ScriptedBackend};
use ai_morning_brief::config::SectionsConfig;
use ai_morning_brief::summary::ensure_summary;
use ai_morning_brief::types::NewsCandidate;

fn candidate(summary: Option<&str>) -> NewsCandidate {
    NewsCandidate {
        title: "서울시 AI 챗봇 도입".to_string(),
        source: Some("전자신문".to_string()),
        published: None,
        url: "https://etnews.com/2024/01/01/article123".to_string(),
        summary: summary.map(str::to_string),
    }
}

#[tokio::test]
async fn substantial_summary_is_kept_without_a_backend_call() {
    let backend = ScriptedBackend::new(vec![]);
    let sections = SectionsConfig::builtin();
    let long = "서울시가 전 부서에 AI 챗봇을 도입해 민원 응답 시간을 크게 줄이고 행정 효율을 높였다.";

    let out = ensure_summary(&backend, sections.get(ai_morning_brief::Category::PublicSector), &candidate(Some(long))).await;

    assert_eq!(out, long);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn short_summary_triggers_secondary_query_and_label_strip() {
    let backend = ScriptedBackend::new(vec![ScriptedBackend::ok(
        "요약: 서울시가 민원 응대에 AI 챗봇을 전면 도입해 처리 속도를 높였다.",
    )]);
    let sections = SectionsConfig::builtin();

    let out = ensure_summary(
        &backend,
        sections.get(ai_morning_brief::Category::PublicSector),
        &candidate(Some("서울시가 AI 챗봇을 도입했다.")),
    )
    .await;

    assert_eq!(out, "서울시가 민원 응대에 AI 챗봇을 전면 도입해 처리 속도를 높였다.");
    let req = &backend.requests()[0];
    assert!(!req.use_search);
    assert_eq!(req.max_output_tokens, 256);
    assert!(req.prompt.contains("서울시 AI 챗봇 도입"));
    assert!(req.prompt.contains("1-2문장"));
}

#[tokio::test]
async fn missing_summary_also_goes_through_the_secondary_query() {
    let backend = ScriptedBackend::new(vec![ScriptedBackend::ok(
        "서울시가 민원 상담 전 단계에 생성형 AI를 적용하기로 했다.",
    )]);
    let sections = SectionsConfig::builtin();

    let out = ensure_summary(
        &backend,
        sections.get(ai_morning_brief::Category::PublicSector),
        &candidate(None),
    )
    .await;

    assert_eq!(out, "서울시가 민원 상담 전 단계에 생성형 AI를 적용하기로 했다.");
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn secondary_failure_synthesizes_from_the_title() {
    let backend = ScriptedBackend::new(vec![Err(BackendError::Status(429))]);
    let sections = SectionsConfig::builtin();

    let out = ensure_summary(
        &backend,
        sections.get(ai_morning_brief::Category::PublicSector),
        &candidate(None),
    )
    .await;

    assert_eq!(out, "서울시 AI 챗봇 도입에 관한 최신 뉴스입니다.");
}

#[tokio::test]
async fn too_short_refinement_falls_back_to_the_synthesized_sentence() {
    let backend = ScriptedBackend::new(vec![ScriptedBackend::ok("요약: 도입됨")]);
    let sections = SectionsConfig::builtin();

    let out = ensure_summary(
        &backend,
        sections.get(ai_morning_brief::Category::PublicSector),
        &candidate(None),
    )
    .await;

    assert_eq!(out, "서울시 AI 챗봇 도입에 관한 최신 뉴스입니다.");
    assert!(out.chars().count() >= 15);
}
