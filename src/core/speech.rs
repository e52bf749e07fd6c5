use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::config::SpeechConfig;
use crate::error::{VidmapError, Result};
use super::translator::Language;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// MP3 audio for `text` spoken in `language`
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>>;
}

/// Client for the Google Translate text-to-speech endpoint
pub struct GoogleSpeech {
    base_url: String,
    max_chunk_chars: usize,
    client: reqwest::Client,
}

impl GoogleSpeech {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_chunk_chars: config.max_chunk_chars.max(1),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_chunk(&self, chunk: &str, language: Language, index: usize, total: usize) -> Result<Vec<u8>> {
        let idx = index.to_string();
        let total_chunks = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(format!("{}/translate_tts", self.base_url))
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language.code()),
                ("q", chunk),
                ("idx", idx.as_str()),
                ("total", total_chunks.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| VidmapError::Speech(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VidmapError::Speech(format!(
                "TTS API error {} for chunk {}/{}",
                response.status(),
                index + 1,
                total
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VidmapError::Speech(format!("Failed to read audio: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSpeech {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let cleaned = clean_for_speech(text);
        if cleaned.is_empty() {
            return Err(VidmapError::Speech("No text to speak".to_string()));
        }

        let chunks = split_for_speech(&cleaned, self.max_chunk_chars);
        debug!("Synthesizing {} speech chunks in {}", chunks.len(), language);

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, language, index, chunks.len()).await?);
        }

        Ok(audio)
    }
}

/// Drop markdown emphasis markers and surrounding whitespace
pub fn clean_for_speech(text: &str) -> String {
    text.replace('*', "").trim().to_string()
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Breaks happen at whitespace; a single word longer than the limit is cut
/// on character boundaries.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Write `audio` into `dir` as `file_name`.
///
/// The bytes go to a temporary file first, which is removed if anything
/// fails before it is moved into place.
pub fn save_audio(audio: &[u8], dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".vidmap-audio-")
        .suffix(".mp3")
        .tempfile_in(dir)?;
    temp.write_all(audio)?;
    temp.flush()?;

    let target = dir.join(file_name);
    temp.persist(&target).map_err(|e| VidmapError::Io(e.error))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_clean_for_speech() {
        assert_eq!(clean_for_speech("  * **Key** idea*  "), "Key idea");
        assert_eq!(clean_for_speech("***"), "");
    }

    #[test]
    fn test_split_respects_limit_and_words() {
        let text = "the quick brown fox jumps over the lazy dog";
        let chunks = split_for_speech(text, 10);

        assert_eq!(chunks, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_split_hard_cuts_long_words() {
        let chunks = split_for_speech("ab abcdefgh c", 3);
        assert_eq!(chunks, vec!["ab", "abc", "def", "gh", "c"]);
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        let chunks = split_for_speech("नमस्ते दुनिया", 100);
        assert_eq!(chunks, vec!["नमस्ते दुनिया"]);
        assert!(split_for_speech("   ", 100).is_empty());
    }

    #[test]
    fn test_save_audio_leaves_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_audio(b"ID3data", dir.path(), "summary.mp3").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"ID3data");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("summary.mp3")).unwrap();

        let result = save_audio(b"ID3data", dir.path(), "summary.mp3");

        assert!(matches!(result, Err(VidmapError::Io(_))));
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["summary.mp3".to_string()]);
        assert!(dir.path().join("summary.mp3").is_dir());
    }

    #[tokio::test]
    async fn test_synthesize_concatenates_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .and(query_param("tl", "hi"))
            .and(query_param("idx", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"AAA".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .and(query_param("idx", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"BBB".to_vec()))
            .mount(&server)
            .await;

        let mut config = Config::default().speech;
        config.base_url = server.uri();
        config.max_chunk_chars = 5;
        let speech = GoogleSpeech::new(&config);

        let audio = speech.synthesize("*hello* world", Language::Hi).await.unwrap();
        assert_eq!(audio, b"AAABBB");
    }

    #[tokio::test]
    async fn test_synthesize_rejects_empty_text() {
        let speech = GoogleSpeech::new(&Config::default().speech);
        let err = speech.synthesize(" ** ", Language::En).await.unwrap_err();
        assert!(matches!(err, VidmapError::Speech(_)));
    }
}
