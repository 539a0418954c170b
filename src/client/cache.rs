// src/client/cache.rs — Bounded local mirror of sessions + messages
//
// A JSON file holding the most recent sessions with their messages, so a
// conversation survives restarts even before (or without) a successful
// sync. Writes are atomic (temp file + rename). Reads are salvaged entry
// by entry: one corrupt record is dropped, the rest survive, and a fully
// unreadable file degrades to an empty cache instead of failing.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

use super::LocalMessage;
use crate::infra::errors::WayfarerError;
use crate::ledger::Session;

/// Entries beyond this cap are evicted, oldest insertion first.
pub const CACHE_CAP: usize = 50;

/// One cached conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub session: Session,
    pub messages: Vec<LocalMessage>,
}

pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Cache at the default data-dir location.
    pub fn at_default() -> Self {
        Self::new(crate::infra::paths::cache_path())
    }

    /// All cached entries, oldest insertion first.
    ///
    /// Degrades to empty on an unreadable or malformed backing file;
    /// the failure is logged, never propagated.
    pub fn get_all(&self) -> Vec<CacheEntry> {
        match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("session cache unreadable, starting empty: {e}");
                Vec::new()
            }
        }
    }

    /// Strict file-level read with per-entry salvage.
    fn read_entries(&self) -> Result<Vec<CacheEntry>, WayfarerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| WayfarerError::CacheCorruption(e.to_string()))?;

        let mut entries = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::debug!("dropping corrupt cache entry: {e}");
                }
            }
        }
        Ok(entries)
    }

    /// Upsert one conversation by session id, then evict down to the cap.
    pub fn save(&self, entry: CacheEntry) -> Result<(), WayfarerError> {
        let mut entries = self.get_all();

        match entries.iter_mut().find(|e| e.session.id == entry.session.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }

        if entries.len() > CACHE_CAP {
            let excess = entries.len() - CACHE_CAP;
            entries.drain(..excess);
        }

        self.write_entries(&entries)
    }

    pub fn delete(&self, session_id: &str) -> Result<(), WayfarerError> {
        let mut entries = self.get_all();
        entries.retain(|e| e.session.id != session_id);
        self.write_entries(&entries)
    }

    pub fn get_by_id(&self, session_id: &str) -> Option<CacheEntry> {
        self.get_all()
            .into_iter()
            .find(|e| e.session.id == session_id)
    }

    pub fn clear(&self) -> Result<(), WayfarerError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Atomic write: temp file + rename.
    fn write_entries(&self, entries: &[CacheEntry]) -> Result<(), WayfarerError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| WayfarerError::Other(anyhow::anyhow!("cache encode failed: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        f.flush()?;
        f.sync_all()?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::DEFAULT_TITLE;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(id: &str) -> CacheEntry {
        let now = Utc::now();
        CacheEntry {
            session: Session {
                id: id.to_string(),
                owner_id: "u-1".into(),
                title: DEFAULT_TITLE.into(),
                created_at: now,
                updated_at: now,
                message_count: 0,
                last_message_preview: None,
            },
            messages: vec![LocalMessage::user("hello")],
        }
    }

    fn cache(dir: &TempDir) -> SessionCache {
        SessionCache::new(dir.path().join("session-cache.json"))
    }

    #[test]
    fn test_save_and_get_by_id() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        cache.save(entry("s-1")).unwrap();

        let loaded = cache.get_by_id("s-1").unwrap();
        assert_eq!(loaded.session.id, "s-1");
        assert_eq!(loaded.messages.len(), 1);
        assert!(cache.get_by_id("s-2").is_none());
    }

    #[test]
    fn test_save_upserts_by_session_id() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        cache.save(entry("s-1")).unwrap();

        let mut updated = entry("s-1");
        updated.messages.push(LocalMessage::assistant("hi there"));
        cache.save(updated).unwrap();

        let all = cache.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].messages.len(), 2);
    }

    #[test]
    fn test_eviction_keeps_most_recent_50() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        for i in 0..50 {
            cache.save(entry(&format!("s-{i}"))).unwrap();
        }
        assert_eq!(cache.get_all().len(), 50);

        cache.save(entry("s-50")).unwrap();

        let all = cache.get_all();
        assert_eq!(all.len(), 50);
        // Least-recently-inserted entry is gone, newest is present
        assert!(!all.iter().any(|e| e.session.id == "s-0"));
        assert!(all.iter().any(|e| e.session.id == "s-50"));
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        cache.save(entry("s-1")).unwrap();
        cache.save(entry("s-2")).unwrap();
        cache.delete("s-1").unwrap();

        let all = cache.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].session.id, "s-2");
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);

        cache.save(entry("s-1")).unwrap();
        cache.clear().unwrap();
        assert!(cache.get_all().is_empty());
    }

    #[test]
    fn test_corrupt_entry_dropped_others_survive() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        cache.save(entry("s-1")).unwrap();

        // Inject a malformed record alongside the good one
        let content = std::fs::read_to_string(dir.path().join("session-cache.json")).unwrap();
        let mut values: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        values.push(serde_json::json!({"session": "not-an-object"}));
        std::fs::write(
            dir.path().join("session-cache.json"),
            serde_json::to_string(&values).unwrap(),
        )
        .unwrap();

        let all = cache.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].session.id, "s-1");
    }

    #[test]
    fn test_unreadable_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        std::fs::write(dir.path().join("session-cache.json"), "{{{ not json").unwrap();

        assert!(cache.get_all().is_empty());

        // And the cache is usable again after the next save
        cache.save(entry("s-1")).unwrap();
        assert_eq!(cache.get_all().len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(cache(&dir).get_all().is_empty());
    }
}
