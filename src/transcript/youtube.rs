use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use html_escape::decode_html_entities;
use log::debug;
use regex::Regex;
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::config::TranscriptConfig;
use crate::error::TranscriptError;
use crate::transcript::TranscriptSource;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern is valid"));

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube(?:-nocookie)?\.com/(?:watch\?(?:[^#]*&)?v=|embed/|shorts/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("video url pattern is valid")
});

static TEXT_NODE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("text").expect("text selector is valid"));

/// Accept a bare video id or any common YouTube URL form and return the 11-character id
pub fn extract_video_id(input: &str) -> Result<String, TranscriptError> {
    let input = input.trim();
    if VIDEO_ID.is_match(input) {
        return Ok(input.to_string());
    }
    VIDEO_URL
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| TranscriptError::InvalidVideoId(input.to_string()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
}

/// Scrapes caption tracks from the YouTube watch page
pub struct YouTubeFetcher {
    client: Client,
    base_url: String,
    language: Option<String>,
}

impl YouTubeFetcher {
    pub fn new(config: &TranscriptConfig) -> Result<Self, TranscriptError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, TranscriptError> {
        let mut request = self.client.get(url);
        if let Some(language) = &self.language {
            request = request.header(ACCEPT_LANGUAGE, language.as_str());
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranscriptError::Http(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    fn pick_track<'a>(&self, tracks: &'a [CaptionTrack]) -> Option<&'a CaptionTrack> {
        self.language
            .as_deref()
            .and_then(|language| tracks.iter().find(|t| t.language_code == language))
            .or_else(|| tracks.first())
    }
}

#[async_trait]
impl TranscriptSource for YouTubeFetcher {
    async fn fetch(&self, video_id: &str) -> Result<String, TranscriptError> {
        let page_url = format!("{}/watch?v={}", self.base_url, video_id);
        let html = self.get_text(&page_url).await?;

        let tracks = caption_tracks(&html, video_id)?;
        let track = self
            .pick_track(&tracks)
            .ok_or_else(|| TranscriptError::NoTranscript(video_id.to_string()))?;
        let language = if track.language_code.is_empty() {
            "default"
        } else {
            track.language_code.as_str()
        };
        debug!("Using {} caption track for {}", language, video_id);

        let xml = self.get_text(&track.base_url).await?;
        let transcript = parse_transcript_xml(&xml);
        if transcript.is_empty() {
            return Err(TranscriptError::NoTranscript(video_id.to_string()));
        }
        Ok(transcript)
    }
}

/// Read the caption track list embedded in a watch page
fn caption_tracks(html: &str, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let Some((_, after)) = html.split_once("\"captions\":") else {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::TooManyRequests);
        }
        if !html.contains("\"playabilityStatus\":") {
            return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
        }
        return Err(TranscriptError::TranscriptsDisabled(video_id.to_string()));
    };

    // The captions object is followed by the rest of the player response
    let captions: Captions = serde_json::Deserializer::from_str(after)
        .into_iter::<Captions>()
        .next()
        .ok_or_else(|| TranscriptError::Parse("empty captions object".to_string()))?
        .map_err(|e| TranscriptError::Parse(e.to_string()))?;

    let renderer = captions
        .player_captions_tracklist_renderer
        .ok_or_else(|| TranscriptError::TranscriptsDisabled(video_id.to_string()))?;

    if renderer.caption_tracks.is_empty() {
        return Err(TranscriptError::NoTranscript(video_id.to_string()));
    }
    Ok(renderer.caption_tracks)
}

/// Join the `<text>` nodes of a timed-text document into one line of prose.
///
/// Caption text arrives entity-encoded twice (`&amp;#39;`); the HTML parser
/// decodes the outer layer and `decode_html_entities` the inner one.
pub fn parse_transcript_xml(xml: &str) -> String {
    let document = Html::parse_fragment(xml);
    document
        .select(&TEXT_NODE)
        .map(|node| {
            let raw = node.text().collect::<String>();
            decode_html_entities(&raw)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const VIDEO: &str = "dQw4w9WgXcQ";

    fn watch_page(captions: &str) -> String {
        format!(
            r#"<html><body><script>var ytInitialPlayerResponse = {{"playabilityStatus":{{"status":"OK"}},{},"videoDetails":{{"videoId":"{}"}}}};</script></body></html>"#,
            captions, VIDEO
        )
    }

    fn test_config(base_url: String) -> TranscriptConfig {
        TranscriptConfig {
            base_url,
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_video_id_forms() {
        let urls = [
            "dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "  https://m.youtube.com/watch?v=dQw4w9WgXcQ  ",
        ];
        for url in urls {
            assert_eq!(extract_video_id(url).unwrap(), VIDEO, "{}", url);
        }
    }

    #[test]
    fn test_extract_video_id_rejects_garbage() {
        let inputs = [
            "",
            "short",
            "https://vimeo.com/12345678901",
            "https://youtube.com/watch?v=abc",
        ];
        for input in inputs {
            assert!(matches!(
                extract_video_id(input),
                Err(TranscriptError::InvalidVideoId(_))
            ));
        }
    }

    #[test]
    fn test_parse_transcript_xml_decodes_entities() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="2.1">it&amp;#39;s a</text><text start="2.6" dur="1.0">
  test &amp;amp; more</text><text start="4" dur="1"> </text></transcript>"#;
        assert_eq!(parse_transcript_xml(xml), "it's a test & more");
    }

    #[test]
    fn test_caption_tracks_classifies_failures() {
        assert!(matches!(
            caption_tracks(r#"<div class="g-recaptcha"></div>"#, VIDEO),
            Err(TranscriptError::TooManyRequests)
        ));
        assert!(matches!(
            caption_tracks("<html>This video isn't available</html>", VIDEO),
            Err(TranscriptError::VideoUnavailable(_))
        ));
        assert!(matches!(
            caption_tracks(r#"{"playabilityStatus":{"status":"OK"}}"#, VIDEO),
            Err(TranscriptError::TranscriptsDisabled(_))
        ));
        assert!(matches!(
            caption_tracks(
                &watch_page(r#""captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[]}}"#),
                VIDEO
            ),
            Err(TranscriptError::NoTranscript(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_transcript() {
        let mut server = Server::new_async().await;
        let track_url = format!("{}/api/timedtext?v={}&lang=en", server.url(), VIDEO);
        let captions = format!(
            r#""captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{}","languageCode":"en"}}]}}}}"#,
            track_url
        );

        let page = server
            .mock("GET", Matcher::Regex("^/watch".to_string()))
            .match_query(Matcher::UrlEncoded("v".to_string(), VIDEO.to_string()))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(watch_page(&captions))
            .create_async()
            .await;
        let track = server
            .mock("GET", Matcher::Regex("^/api/timedtext".to_string()))
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(r#"<transcript><text start="0" dur="1">Hello</text><text start="1" dur="1">world</text></transcript>"#)
            .create_async()
            .await;

        let fetcher = YouTubeFetcher::new(&test_config(server.url())).unwrap();
        let transcript = fetcher.fetch(VIDEO).await.unwrap();

        assert_eq!(transcript, "Hello world");
        page.assert_async().await;
        track.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_prefers_configured_language() {
        let mut server = Server::new_async().await;
        let captions = format!(
            r#""captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{0}/en","languageCode":"en"}},{{"baseUrl":"{0}/de","languageCode":"de"}}]}}}}"#,
            server.url()
        );
        let _page = server
            .mock("GET", Matcher::Regex("^/watch".to_string()))
            .with_status(200)
            .with_body(watch_page(&captions))
            .create_async()
            .await;
        let german = server
            .mock("GET", "/de")
            .with_status(200)
            .with_body(r#"<transcript><text>Guten Tag</text></transcript>"#)
            .create_async()
            .await;

        let config = TranscriptConfig {
            language: Some("de".to_string()),
            ..test_config(server.url())
        };
        let transcript = YouTubeFetcher::new(&config).unwrap().fetch(VIDEO).await.unwrap();

        assert_eq!(transcript, "Guten Tag");
        german.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_page_error_status() {
        let mut server = Server::new_async().await;
        let _page = server
            .mock("GET", Matcher::Regex("^/watch".to_string()))
            .with_status(503)
            .create_async()
            .await;

        let fetcher = YouTubeFetcher::new(&test_config(server.url())).unwrap();
        let result = fetcher.fetch(VIDEO).await;
        assert!(matches!(result, Err(TranscriptError::Http(503))));
    }
}
