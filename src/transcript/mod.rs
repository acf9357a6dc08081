mod cache;
mod youtube;

pub use cache::{now_millis, TranscriptCache, TranscriptCacheEntry};
pub use youtube::{extract_video_id, parse_transcript_xml, YouTubeFetcher};

use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::TranscriptConfig;
use crate::error::TranscriptError;

/// Anything that can produce a transcript for a video id
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<String, TranscriptError>;
}

/// Cached, retrying access to video transcripts
pub struct TranscriptService {
    source: Box<dyn TranscriptSource>,
    cache: TranscriptCache,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl TranscriptService {
    /// Create a service backed by the YouTube watch-page scraper
    pub fn new(config: &TranscriptConfig) -> Result<Self, TranscriptError> {
        Ok(Self::with_source(
            Box::new(YouTubeFetcher::new(config)?),
            config,
        ))
    }

    pub fn with_source(source: Box<dyn TranscriptSource>, config: &TranscriptConfig) -> Self {
        Self {
            source,
            cache: TranscriptCache::new(Duration::from_secs(config.cache_ttl_secs)),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    pub fn cache(&self) -> &TranscriptCache {
        &self.cache
    }

    /// Transcript for a video id or URL, served from cache while fresh
    pub async fn transcript(&self, video: &str) -> Result<String, TranscriptError> {
        let video_id = extract_video_id(video)?;

        if let Some(transcript) = self.cache.get(&video_id) {
            info!("Transcript cache hit for {}", video_id);
            return Ok(transcript);
        }

        let transcript = self.fetch_with_retry(&video_id).await?;
        self.cache.insert(&video_id, transcript.clone());
        Ok(transcript)
    }

    /// Fixed-delay retry; errors that cannot change between attempts fail immediately
    async fn fetch_with_retry(&self, video_id: &str) -> Result<String, TranscriptError> {
        let mut attempt = 1;
        loop {
            debug!(
                "Fetching transcript for {} (attempt {}/{})",
                video_id, attempt, self.retry_attempts
            );

            match self.source.fetch(video_id).await {
                Ok(transcript) => return Ok(transcript),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    warn!(
                        "Transcript fetch for {} failed (attempt {}/{}): {}",
                        video_id, attempt, self.retry_attempts, e
                    );
                    sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const VIDEO: &str = "dQw4w9WgXcQ";

    /// Replays scripted results and counts calls
    struct ScriptedSource {
        calls: Arc<AtomicUsize>,
        results: Mutex<Vec<Result<String, TranscriptError>>>,
    }

    #[async_trait]
    impl TranscriptSource for ScriptedSource {
        async fn fetch(&self, _video_id: &str) -> Result<String, TranscriptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Ok("fallback transcript".to_string())
            } else {
                results.remove(0)
            }
        }
    }

    fn service(
        results: Vec<Result<String, TranscriptError>>,
    ) -> (TranscriptService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = ScriptedSource {
            calls: calls.clone(),
            results: Mutex::new(results),
        };
        let config = TranscriptConfig {
            retry_delay_ms: 0,
            ..Default::default()
        };
        (TranscriptService::with_source(Box::new(source), &config), calls)
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let (service, calls) = service(vec![Ok("first".to_string())]);

        assert_eq!(service.transcript(VIDEO).await.unwrap(), "first");
        let url = format!("https://youtu.be/{}", VIDEO);
        assert_eq!(service.transcript(&url).await.unwrap(), "first");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_triggers_fetch() {
        let (service, calls) = service(vec![Ok("fresh".to_string())]);
        service.cache().insert_entry(
            VIDEO,
            TranscriptCacheEntry {
                transcript: "stale".to_string(),
                timestamp: now_millis() - 61 * 60 * 1000,
            },
        );

        assert_eq!(service.transcript(VIDEO).await.unwrap(), "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.cache().get(VIDEO).as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_transient_errors_retried() {
        let (service, calls) = service(vec![
            Err(TranscriptError::TooManyRequests),
            Err(TranscriptError::Http(502)),
            Ok("third time".to_string()),
        ]);

        assert_eq!(service.transcript(VIDEO).await.unwrap(), "third time");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_capped_at_three_attempts() {
        let (service, calls) = service(vec![
            Err(TranscriptError::Http(500)),
            Err(TranscriptError::Http(500)),
            Err(TranscriptError::Http(500)),
            Ok("too late".to_string()),
        ]);

        assert!(matches!(
            service.transcript(VIDEO).await,
            Err(TranscriptError::Http(500))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_permanent_errors_not_retried() {
        let (service, calls) = service(vec![Err(TranscriptError::TranscriptsDisabled(
            VIDEO.to_string(),
        ))]);

        assert!(matches!(
            service.transcript(VIDEO).await,
            Err(TranscriptError::TranscriptsDisabled(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_id_never_fetches() {
        let (service, calls) = service(vec![]);
        assert!(matches!(
            service.transcript("not a video").await,
            Err(TranscriptError::InvalidVideoId(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
