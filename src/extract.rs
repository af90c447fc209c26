// src/extract.rs
//! Best-effort structured decode of the backend's free-text answer.
//!
//! The search pass asks the model to answer in five labeled lines
//! (제목/출처/날짜/URL/요약). Generative output is untrusted, so parsing is a
//! fallible function over the raw text; expected malformed input never panics.

use once_cell::sync::OnceCell;
use regex::Regex;
use thiserror::Error;

use crate::backend::GroundingSource;
use crate::types::NewsCandidate;
use crate::validate;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

struct FieldPatterns {
    title: Regex,
    source: Regex,
    date: Regex,
    url: Regex,
    summary: Regex,
}

fn patterns() -> &'static FieldPatterns {
    static P: OnceCell<FieldPatterns> = OnceCell::new();
    P.get_or_init(|| FieldPatterns {
        title: Regex::new(r"제목:\s*([^\n]+)").unwrap(),
        source: Regex::new(r"출처:\s*([^\n]+)").unwrap(),
        date: Regex::new(r"날짜:\s*([^\n]+)").unwrap(),
        url: Regex::new(r"URL:\s*([^\n]+)").unwrap(),
        // The summary line may wrap onto a second line.
        summary: Regex::new(r"요약:\s*([^\n]+(?:\n[^\n]+)?)").unwrap(),
    })
}

/// Entity-decode and trim one captured field. The backend occasionally
/// echoes HTML entities inside otherwise plain lines.
fn clean_field(raw: &str) -> String {
    html_escape::decode_html_entities(raw).trim().to_string()
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|c| clean_field(&c[1]))
        .filter(|s| !s.is_empty())
}

/// Parse one backend response into a candidate. Title and URL are mandatory;
/// everything else is carried along when present.
pub fn parse_candidate(text: &str) -> Result<NewsCandidate, ExtractError> {
    let p = patterns();
    let title = capture(&p.title, text).ok_or(ExtractError::MissingField("제목"))?;
    let url = capture(&p.url, text).ok_or(ExtractError::MissingField("URL"))?;

    Ok(NewsCandidate {
        title,
        source: capture(&p.source, text),
        published: capture(&p.date, text),
        url,
        summary: capture(&p.summary, text),
    })
}

/// Prefer a redirect-gateway link from the grounding metadata over the URL
/// the model wrote out; the first gateway match wins. With no metadata or no
/// match the extracted URL is kept as-is.
pub fn resolve_final_url(extracted: &str, grounding: &[GroundingSource]) -> String {
    grounding
        .iter()
        .map(|g| g.uri.as_str())
        .find(|uri| validate::is_redirect_gateway(uri))
        .map(str::to_string)
        .unwrap_or_else(|| extracted.to_string())
}
