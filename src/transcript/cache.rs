use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A cached transcript and when it was fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptCacheEntry {
    pub transcript: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// In-memory transcript cache keyed by video id.
///
/// Entries older than the TTL count as misses. The map is unbounded and lives
/// as long as the process; concurrent writers for the same id store the same
/// transcript, so the last write wins.
#[derive(Debug)]
pub struct TranscriptCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, TranscriptCacheEntry>>,
}

impl TranscriptCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached transcript, if one exists and is still fresh
    pub fn get(&self, video_id: &str) -> Option<String> {
        let now = now_millis();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(video_id)
            .filter(|entry| now.saturating_sub(entry.timestamp) < self.ttl.as_millis() as u64)
            .map(|entry| entry.transcript.clone())
    }

    /// Store a transcript stamped with the current time
    pub fn insert(&self, video_id: &str, transcript: String) {
        self.insert_entry(
            video_id,
            TranscriptCacheEntry {
                transcript,
                timestamp: now_millis(),
            },
        );
    }

    pub fn insert_entry(&self, video_id: &str, entry: TranscriptCacheEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(video_id.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_fresh_entry_hits() {
        let cache = TranscriptCache::new(HOUR);
        cache.insert("dQw4w9WgXcQ", "never gonna".to_string());
        assert_eq!(cache.get("dQw4w9WgXcQ").as_deref(), Some("never gonna"));
        assert!(cache.get("otherVideo1").is_none());
    }

    #[test]
    fn test_stale_entry_misses() {
        let cache = TranscriptCache::new(HOUR);
        cache.insert_entry(
            "dQw4w9WgXcQ",
            TranscriptCacheEntry {
                transcript: "old".to_string(),
                timestamp: now_millis() - 2 * HOUR.as_millis() as u64,
            },
        );
        assert!(cache.get("dQw4w9WgXcQ").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = TranscriptCache::new(HOUR);
        cache.insert("abcdefghijk", "first".to_string());
        cache.insert("abcdefghijk", "second".to_string());
        assert_eq!(cache.get("abcdefghijk").as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }
}
