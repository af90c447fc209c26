// src/validate.rs
//! Structural quality gates for extracted links and headlines. Pure functions,
//! no I/O: a candidate that fails here is simply retried by the caller.

use url::Url;

/// Non-article file types the backend sometimes links to instead of a story.
const BLOCKED_EXTENSIONS: [&str; 9] = [
    ".pdf", ".hwp", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip",
];

/// Search-proxy gateway used by grounding metadata. Links through it are
/// opaque but known to resolve, so every other URL rule is waived for them.
pub const REDIRECT_GATEWAY: &str = "vertexaisearch.cloud.google.com/grounding-api-redirect/";

/// Portal landing pages that are never an article.
const PORTAL_HOMEPAGES: [&str; 6] = [
    "https://naver.com",
    "https://www.naver.com",
    "https://daum.net",
    "https://www.daum.net",
    "https://google.com",
    "https://www.google.com",
];

/// Minimum length of the parsed path component of an article URL.
const MIN_PATH_LEN: usize = 5;

pub fn is_redirect_gateway(url: &str) -> bool {
    url.contains(REDIRECT_GATEWAY)
}

pub fn is_valid_url(url: &str) -> bool {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return false;
    }
    if is_redirect_gateway(url) {
        return true;
    }
    let lower = url.to_lowercase();
    if BLOCKED_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
        return false;
    }
    if PORTAL_HOMEPAGES
        .iter()
        .any(|page| url == *page || url == format!("{page}/"))
    {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => parsed.path().len() >= MIN_PATH_LEN,
        Err(_) => false,
    }
}

pub fn is_valid_title(title: &str) -> bool {
    let trimmed = title.trim();
    if trimmed.chars().count() < 5 {
        return false;
    }
    // Bare domain names ("ebn.co.kr", "korea.kr") are source labels the
    // model mistook for a headline.
    static DOMAIN_ONLY: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = DOMAIN_ONLY
        .get_or_init(|| regex::Regex::new(r"(?i)^[a-z0-9]+\.(co\.kr|kr|com|net|org)$").unwrap());
    if re.is_match(trimmed) {
        return false;
    }
    // The 10-char floor is the authoritative length rule.
    trimmed.chars().count() >= 10
}
