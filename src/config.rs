use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::Language;
use crate::error::{VidmapError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (gemini, openai)
    pub provider: String,

    /// Model name (e.g., "gemini-1.5-flash", "gpt-4o-mini")
    pub model: String,

    /// API key; falls back to GOOGLE_API_KEY / OPENAI_API_KEY
    pub api_key: Option<String>,

    /// Base URL override for the provider endpoint
    pub base_url: Option<String>,

    /// Prompt placed in front of the transcript
    pub prompt: String,

    /// Transcripts longer than this many characters are cut
    pub max_transcript_chars: usize,

    /// Maximum tokens for LLM responses
    pub max_tokens: Option<u32>,

    /// Temperature for LLM responses (0.0 to 1.0)
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Summarization settings
    pub llm: LlmConfig,

    /// Transcript fetching
    pub transcript: TranscriptConfig,

    /// Translation settings
    pub translation: TranslationConfig,

    /// Speech synthesis settings
    pub speech: SpeechConfig,

    /// Mind map presentation
    pub mindmap: MindMapConfig,

    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Video site base URL
    pub base_url: String,

    /// Caption languages in order of preference
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    pub enabled: bool,

    /// Translation endpoint base URL
    pub base_url: String,

    /// Default target language
    pub target_language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub enabled: bool,

    /// Text-to-speech endpoint base URL
    pub base_url: String,

    /// Maximum characters per synthesis request
    pub max_chunk_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindMapConfig {
    /// Label of the root node
    pub title: String,

    /// Number of leading points promoted to main points
    pub max_main_points: usize,

    /// How many following points become sub points of a main point
    pub max_sub_points: usize,

    /// Custom template file replacing the built-in page
    pub template: Option<PathBuf>,

    pub height: String,
    pub width: String,
    pub bgcolor: String,
    pub font_color: String,

    pub root_color: String,
    pub main_color: String,
    pub sub_color: String,

    pub gravitational_constant: f64,
    pub central_gravity: f64,
    pub spring_length: f64,
    pub node_distance: f64,
    pub font_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives every artifact of a run
    pub dir: PathBuf,

    /// Write mind_map.json next to the HTML page
    pub write_graph_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: "gemini".to_string(),
                model: "gemini-1.5-flash".to_string(),
                api_key: None,
                base_url: None,
                prompt: "Summarize this transcript in bullet points:\n".to_string(),
                max_transcript_chars: 3000,
                max_tokens: Some(2000),
                temperature: Some(0.3),
            },
            transcript: TranscriptConfig {
                base_url: "https://www.youtube.com".to_string(),
                languages: vec!["en".to_string()],
            },
            translation: TranslationConfig {
                enabled: true,
                base_url: "https://translate.googleapis.com".to_string(),
                target_language: Language::En,
            },
            speech: SpeechConfig {
                enabled: true,
                base_url: "https://translate.google.com".to_string(),
                max_chunk_chars: 100,
            },
            mindmap: MindMapConfig {
                title: "Video Summary".to_string(),
                max_main_points: 4,
                max_sub_points: 2,
                template: None,
                height: "500px".to_string(),
                width: "100%".to_string(),
                bgcolor: "#ffffff".to_string(),
                font_color: "black".to_string(),
                root_color: "#FF5733".to_string(),
                main_color: "#3498db".to_string(),
                sub_color: "#2ecc71".to_string(),
                gravitational_constant: -8000.0,
                central_gravity: 0.2,
                spring_length: 150.0,
                node_distance: 300.0,
                font_size: 14,
            },
            output: OutputConfig {
                dir: PathBuf::from("output"),
                write_graph_json: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| VidmapError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VidmapError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)?
                } else {
                    Self::default()
                }
            }
            None => {
                let candidates = [
                    "Vidmap.toml",
                    "vidmap.toml",
                    ".vidmap.toml",
                ];

                match candidates.iter().find(|c| Path::new(c).exists()) {
                    Some(candidate) => Self::load(candidate)?,
                    None => Self::default(),
                }
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// Fill the API key from the environment when the file leaves it out
    pub fn apply_env(&mut self) {
        if self.llm.api_key.is_some() {
            return;
        }

        let var = match self.llm.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "GOOGLE_API_KEY",
        };

        self.llm.api_key = std::env::var(var).ok().filter(|key| !key.trim().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vidmap.toml");

        let mut config = Config::default();
        config.mindmap.title = "Lecture".to_string();
        config.translation.target_language = Language::Hi;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.mindmap.title, "Lecture");
        assert_eq!(loaded.translation.target_language, Language::Hi);
        assert_eq!(loaded.llm.max_transcript_chars, 3000);
        assert_eq!(loaded.mindmap.max_main_points, 4);
    }

    #[test]
    fn test_missing_explicit_path_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "llm = [").unwrap();

        assert!(matches!(Config::load(&path), Err(VidmapError::Config(_))));
    }

    #[test]
    fn test_explicit_api_key_is_kept() {
        let mut config = Config::default();
        config.llm.api_key = Some("from-file".to_string());
        config.apply_env();
        assert_eq!(config.llm.api_key.as_deref(), Some("from-file"));
    }
}
