use std::fmt;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::TranscriptConfig;
use crate::error::{VidmapError, Result};

/// Identifier of a video, as taken from its URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the id from a watch URL (`...?v=<id>&...`), a short link
    /// (`youtu.be/<id>`) or a bare 11 character id.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();

        let candidate = if let Some(value) = query_value(url, "v") {
            value
        } else if let Some((_, rest)) = url.split_once("youtu.be/") {
            rest.split(['?', '&', '/', '#']).next().unwrap_or_default()
        } else if url.len() == 11 {
            url
        } else {
            ""
        };

        if candidate.is_empty() || !candidate.chars().all(is_id_char) {
            return Err(VidmapError::InvalidUrl(url.to_string()));
        }

        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn thumbnail_url(&self) -> String {
        format!("http://img.youtube.com/vi/{}/0.jpg", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Value of query parameter `key`, ignoring any `#fragment`
fn query_value<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let query = url.split_once('?').map_or(url, |(_, query)| query);
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: VideoId,
    pub language_code: String,
    pub snippets: Vec<Snippet>,
}

impl Transcript {
    /// All snippet texts joined by single spaces
    pub fn text(&self) -> String {
        self.snippets
            .iter()
            .map(|snippet| snippet.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch captions for `video_id`, preferring `languages` in order
    async fn fetch(&self, video_id: &VideoId, languages: &[String]) -> Result<Transcript>;
}

/// Reads caption tracks listed on the public watch page
pub struct YouTubeTranscriptFetcher {
    base_url: String,
    client: reqwest::Client,
    text_regex: Regex,
    entity_regex: Regex,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
}

impl YouTubeTranscriptFetcher {
    pub fn new(config: &TranscriptConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            text_regex: Regex::new(r#"(?s)<text start="([^"]*)"(?: dur="([^"]*)")?[^>]*>(.*?)</text>"#)?,
            entity_regex: Regex::new(r"&(#[0-9]+|#x[0-9a-fA-F]+|amp|lt|gt|quot|apos);")?,
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US")
            .send()
            .await
            .map_err(|e| VidmapError::Transcript(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(VidmapError::Transcript(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| VidmapError::Transcript(format!("Failed to read {}: {}", url, e)))
    }

    /// Caption tracks embedded in the watch page's player response
    fn caption_tracks(&self, page: &str) -> Result<Vec<CaptionTrack>> {
        const MARKER: &str = "\"captionTracks\":";

        let start = page
            .find(MARKER)
            .ok_or_else(|| VidmapError::Transcript("No captions available for this video".to_string()))?;

        let mut stream = serde_json::Deserializer::from_str(&page[start + MARKER.len()..]).into_iter::<Value>();
        let tracks = match stream.next() {
            Some(Ok(value)) => serde_json::from_value::<Vec<CaptionTrack>>(value)?,
            _ => return Err(VidmapError::Transcript("Malformed caption track list".to_string())),
        };

        if tracks.is_empty() {
            return Err(VidmapError::Transcript("No captions available for this video".to_string()));
        }

        Ok(tracks)
    }

    fn parse_timed_text(&self, xml: &str) -> Vec<Snippet> {
        self.text_regex
            .captures_iter(xml)
            .filter_map(|caps| {
                let text = self.decode_entities(&caps[3]).replace('\n', " ");
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                Some(Snippet {
                    text: text.to_string(),
                    start: caps[1].parse().unwrap_or(0.0),
                    duration: caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0),
                })
            })
            .collect()
    }

    /// Decode HTML entities; captions are often escaped twice (`&amp;#39;`)
    fn decode_entities(&self, text: &str) -> String {
        let mut decoded = text.to_string();
        for _ in 0..2 {
            if !self.entity_regex.is_match(&decoded) {
                break;
            }
            decoded = self
                .entity_regex
                .replace_all(&decoded, |caps: &regex::Captures| {
                    let entity = &caps[1];
                    match entity {
                        "amp" => "&".to_string(),
                        "lt" => "<".to_string(),
                        "gt" => ">".to_string(),
                        "quot" => "\"".to_string(),
                        "apos" => "'".to_string(),
                        _ => {
                            let code = match entity.strip_prefix("#x") {
                                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                                None => entity[1..].parse().ok(),
                            };
                            code.and_then(char::from_u32)
                                .map(String::from)
                                .unwrap_or_else(|| caps[0].to_string())
                        }
                    }
                })
                .into_owned();
        }
        decoded
    }

    fn absolute_url(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            url.to_string()
        }
    }
}

#[async_trait]
impl TranscriptFetcher for YouTubeTranscriptFetcher {
    async fn fetch(&self, video_id: &VideoId, languages: &[String]) -> Result<Transcript> {
        let page = self
            .get_text(&format!("{}/watch?v={}", self.base_url, video_id))
            .await?;

        let tracks = self.caption_tracks(&page)?;
        let track = languages
            .iter()
            .find_map(|lang| tracks.iter().find(|t| &t.language_code == lang))
            .unwrap_or(&tracks[0]);
        debug!("Using {} caption track for {}", track.language_code, video_id);

        // The player response escapes ampersands in URLs
        let track_url = self.absolute_url(&track.base_url.replace("\\u0026", "&"));
        let xml = self.get_text(&track_url).await?;

        let snippets = self.parse_timed_text(&xml);
        if snippets.is_empty() {
            return Err(VidmapError::Transcript(format!("Caption track for {} is empty", video_id)));
        }

        Ok(Transcript {
            video_id: video_id.clone(),
            language_code: track.language_code.clone(),
            snippets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(base_url: &str) -> YouTubeTranscriptFetcher {
        let mut config = Config::default().transcript;
        config.base_url = base_url.to_string();
        YouTubeTranscriptFetcher::new(&config).unwrap()
    }

    #[test]
    fn test_video_id_from_watch_url() {
        let id = VideoId::from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(id.thumbnail_url(), "http://img.youtube.com/vi/dQw4w9WgXcQ/0.jpg");
    }

    #[test]
    fn test_video_id_from_short_link_and_bare_id() {
        assert_eq!(VideoId::from_url("https://youtu.be/dQw4w9WgXcQ?si=abc").unwrap().as_str(), "dQw4w9WgXcQ");
        assert_eq!(VideoId::from_url("  dQw4w9WgXcQ ").unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_video_id_ignores_fragment_and_lookalike_params() {
        let id = VideoId::from_url("https://www.youtube.com/watch?v=abc#t=1").unwrap();
        assert_eq!(id.as_str(), "abc");

        let id = VideoId::from_url("https://www.youtube.com/watch?nav=1&v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_invalid_urls() {
        for url in [
            "",
            "https://example.com/video",
            "https://www.youtube.com/watch?v=&x=1",
            "https://example.com/?nav=1",
            "https://www.youtube.com/watch?v=abc%20def",
            "https://youtu.be/ab$cd",
            "not an id!",
        ] {
            assert!(matches!(VideoId::from_url(url), Err(VidmapError::InvalidUrl(_))), "{}", url);
        }
    }

    #[test]
    fn test_transcript_text_joins_with_spaces() {
        let transcript = Transcript {
            video_id: VideoId("abc".to_string()),
            language_code: "en".to_string(),
            snippets: vec![
                Snippet { text: "hello".to_string(), start: 0.0, duration: 1.0 },
                Snippet { text: "world".to_string(), start: 1.0, duration: 1.0 },
            ],
        };
        assert_eq!(transcript.text(), "hello world");
    }

    #[test]
    fn test_parse_timed_text_decodes_entities() {
        let fetcher = fetcher("http://localhost");
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.5" dur="2.1">it&amp;#39;s a
test</text><text start="2.6" dur="1">  </text><text start="3.6">Tom &amp;amp; Jerry &#x263A;</text></transcript>"#;

        let snippets = fetcher.parse_timed_text(xml);
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].text, "it's a test");
        assert_eq!(snippets[0].start, 0.5);
        assert_eq!(snippets[0].duration, 2.1);
        assert_eq!(snippets[1].text, "Tom & Jerry \u{263A}");
        assert_eq!(snippets[1].duration, 0.0);
    }

    #[test]
    fn test_missing_caption_tracks() {
        let fetcher = fetcher("http://localhost");
        assert!(matches!(
            fetcher.caption_tracks("<html>no player</html>"),
            Err(VidmapError::Transcript(_))
        ));
        assert!(fetcher.caption_tracks(r#"{"captionTracks":[],"x":1}"#).is_err());
    }

    #[tokio::test]
    async fn test_fetch_prefers_requested_language() {
        let server = MockServer::start().await;
        let page = format!(
            r#"<script>var ytInitialPlayerResponse = {{"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{uri}/api/timedtext?v=abc&lang=de","name":{{"simpleText":"German"}},"languageCode":"de"}},{{"baseUrl":"/api/timedtext?v=abc&lang=en","name":{{"simpleText":"English"}},"languageCode":"en"}}]}}}}}};</script>"#,
            uri = server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .and(query_param("lang", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<transcript><text start="0" dur="1">first line</text><text start="1" dur="1">second line</text></transcript>"#,
            ))
            .mount(&server)
            .await;

        let transcript = fetcher(&server.uri())
            .fetch(&VideoId("abc".to_string()), &["fr".to_string(), "en".to_string()])
            .await
            .unwrap();

        assert_eq!(transcript.language_code, "en");
        assert_eq!(transcript.text(), "first line second line");
    }

    #[tokio::test]
    async fn test_fetch_reports_missing_video() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher(&server.uri())
            .fetch(&VideoId("missing".to_string()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, VidmapError::Transcript(ref msg) if msg.contains("404")));
    }
}
