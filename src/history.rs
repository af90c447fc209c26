// src/history.rs
//! Durable log of accepted news items, the source of truth for dedup and
//! for the do-not-repeat list embedded in search prompts.
//!
//! Storage is a single JSON file. A missing, unreadable or corrupt file
//! degrades to an empty history with a warning; the pipeline must keep
//! producing even when its memory is gone.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::types::{Category, NewsRecord};

/// Entries older than this are invisible to dedup/exclusion reads. They stay
/// on disk until cap eviction pushes them out.
pub const RETENTION_DAYS: i64 = 14;
/// The log keeps only this many newest entries on disk.
pub const MAX_ENTRIES: usize = 100;

const RETENTION_MS: i64 = RETENTION_DAYS * 24 * 60 * 60 * 1000;

#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<NewsRecord>,
}

impl HistoryStore {
    /// Open the log at `path`. Never fails: no file means no history, and an
    /// unreadable or corrupt file is treated the same after a warning.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<Vec<NewsRecord>>(&s) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "history file corrupt, starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "history file unreadable, starting empty");
                Vec::new()
            }
        };
        Self { path, entries }
    }

    /// Records still inside the retention window, in append order.
    pub fn previous_items(&self, now_ms: i64) -> impl Iterator<Item = &NewsRecord> {
        let cutoff = now_ms - RETENTION_MS;
        self.entries.iter().filter(move |r| r.accepted_at_ms > cutoff)
    }

    /// Up to `limit` freshest windowed titles for one section, newest first.
    pub fn recent_titles(&self, category: Category, now_ms: i64, limit: usize) -> Vec<String> {
        let mut titles: Vec<String> = self
            .previous_items(now_ms)
            .filter(|r| r.category == category)
            .map(|r| r.title.clone())
            .collect();
        titles.reverse();
        titles.truncate(limit);
        titles
    }

    /// A title match OR a url match inside the window counts as a duplicate.
    pub fn is_duplicate(&self, title: &str, url: &str, now_ms: i64) -> bool {
        self.previous_items(now_ms)
            .any(|r| r.title == title || r.url == url)
    }

    /// Append one accepted record, evict past the cap (oldest first), then
    /// persist. Write failures are logged, never propagated.
    pub fn append(&mut self, record: NewsRecord) {
        self.entries.push(record);
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(0..excess);
        }
        if let Err(e) = self.persist() {
            warn!(error = %e, path = %self.path.display(), "failed to persist history");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&self.entries).unwrap_or_else(|_| "[]".to_string());
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn record(title: &str, url: &str, at_ms: i64) -> NewsRecord {
        NewsRecord {
            title: title.to_string(),
            summary: "요약 텍스트가 충분히 길다".to_string(),
            url: url.to_string(),
            category: Category::PublicSector,
            accepted_at_ms: at_ms,
            failed: false,
        }
    }

    fn temp_store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("news_history.json"));
        (dir, store)
    }

    #[test]
    fn cap_keeps_the_newest_hundred() {
        let (_dir, mut store) = temp_store();
        for i in 0..150 {
            store.append(record(&format!("기사 {i}"), &format!("https://e.com/a/{i}"), i));
        }
        assert_eq!(store.len(), MAX_ENTRIES);
        let titles: Vec<_> = store.previous_items(100).map(|r| r.title.as_str()).collect();
        assert_eq!(titles.first(), Some(&"기사 50"));
        assert_eq!(titles.last(), Some(&"기사 149"));
    }

    #[test]
    fn retention_window_hides_old_entries_without_purging() {
        let (_dir, mut store) = temp_store();
        let now = 100 * DAY_MS;
        store.append(record("옛날 기사 제목입니다", "https://e.com/old/1", now - 20 * DAY_MS));
        store.append(record("최근 기사 제목입니다", "https://e.com/new/1", now - DAY_MS));

        let windowed: Vec<_> = store.previous_items(now).collect();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].url, "https://e.com/new/1");
        // still on disk / in memory
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn title_collision_alone_is_a_duplicate() {
        let (_dir, mut store) = temp_store();
        let now = 100 * DAY_MS;
        store.append(record("서울시 AI 챗봇 도입", "https://e.com/a/1", now - DAY_MS));

        assert!(store.is_duplicate("서울시 AI 챗봇 도입", "https://other.com/b/2", now));
        assert!(store.is_duplicate("완전히 다른 제목이다", "https://e.com/a/1", now));
        assert!(!store.is_duplicate("완전히 다른 제목이다", "https://other.com/b/2", now));
        // idempotent for an unchanged store
        assert!(store.is_duplicate("서울시 AI 챗봇 도입", "https://other.com/b/2", now));
    }

    #[test]
    fn old_duplicate_outside_window_is_ignored() {
        let (_dir, mut store) = temp_store();
        let now = 100 * DAY_MS;
        store.append(record("서울시 AI 챗봇 도입", "https://e.com/a/1", now - 15 * DAY_MS));
        assert!(!store.is_duplicate("서울시 AI 챗봇 도입", "https://e.com/a/1", now));
    }

    #[test]
    fn recent_titles_are_per_category_newest_first_and_capped() {
        let (_dir, mut store) = temp_store();
        let now = 100 * DAY_MS;
        for i in 0..15 {
            store.append(record(
                &format!("공공 기사 {i}"),
                &format!("https://e.com/pub/{i}"),
                now - DAY_MS + i,
            ));
        }
        store.append(NewsRecord {
            category: Category::TechIndustry,
            ..record("핫이슈 기사입니다", "https://e.com/hot/1", now - DAY_MS)
        });

        let titles = store.recent_titles(Category::PublicSector, now, 10);
        assert_eq!(titles.len(), 10);
        assert_eq!(titles[0], "공공 기사 14");
        assert!(!titles.contains(&"핫이슈 기사입니다".to_string()));
    }

    #[test]
    fn reopen_reads_back_persisted_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news_history.json");
        {
            let mut store = HistoryStore::open(&path);
            store.append(record("서울시 AI 챗봇 도입", "https://e.com/a/1", 1_000));
        }
        let reopened = HistoryStore::open(&path);
        assert_eq!(reopened.len(), 1);
        assert!(reopened.is_duplicate("서울시 AI 챗봇 도입", "https://x.com/y/z", 2_000));
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news_history.json");
        fs::write(&path, "{ not json [").unwrap();

        let mut store = HistoryStore::open(&path);
        assert!(store.is_empty());

        // the store stays usable and recovers the file on the next append
        store.append(record("복구된 기사 제목입니다", "https://e.com/a/1", 1_000));
        let reopened = HistoryStore::open(&path);
        assert_eq!(reopened.len(), 1);
    }
}
