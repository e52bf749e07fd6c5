// src/core/engine.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn, debug};

use crate::config::Config;
use crate::error::VidmapError;
use super::{
    render, save_audio, create_summarizer, GoogleSpeech, GoogleTranslator, GraphDescription,
    Hierarchy, Language, MindMapWriter, Segmenter, SegmenterOptions, SpeechSynthesizer,
    Summarizer, Summary, SummaryRequest, Transcript, TranscriptFetcher, Translator, VideoId,
    YouTubeTranscriptFetcher,
};

/// Per-run overrides coming from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub language: Option<Language>,
    pub title: Option<String>,
    pub output: Option<PathBuf>,
    pub skip_audio: bool,
    pub skip_translation: bool,
}

/// Everything a run produced, written to `report.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub video_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub transcript_chars: usize,
    pub summary_file: Option<PathBuf>,
    pub translated_file: Option<PathBuf>,
    pub target_language: Option<Language>,
    pub audio_file: Option<PathBuf>,
    pub mind_map_html: PathBuf,
    pub mind_map_json: Option<PathBuf>,
    pub main_points: Vec<String>,
    pub nodes: usize,
    pub edges: usize,
    pub generated_at: DateTime<Utc>,
}

/// Main orchestration engine: transcript → summary → translation/audio → mind map
pub struct Engine {
    config: Config,
    segmenter: Segmenter,
    mind_map_writer: MindMapWriter,
    transcript_fetcher: Box<dyn TranscriptFetcher>,
    summarizer: Option<Box<dyn Summarizer>>,
    translator: Box<dyn Translator>,
    speech: Box<dyn SpeechSynthesizer>,
}

impl Engine {
    /// Create a new engine instance from a config file (or the defaults)
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;

        debug!("Loaded configuration: {:?}", config.mindmap);

        Self::from_config(config)
    }

    /// Build the engine with the HTTP clients described by `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let transcript_fetcher = Box::new(YouTubeTranscriptFetcher::new(&config.transcript)?);
        let translator = Box::new(GoogleTranslator::new(&config.translation));
        let speech = Box::new(GoogleSpeech::new(&config.speech));

        // Offline commands work without an API key, so a missing summarizer is not fatal here
        let summarizer = match create_summarizer(&config.llm) {
            Ok(summarizer) => {
                info!("✅ LLM integration enabled: {} ({})", summarizer.provider_name(), summarizer.model_name());
                Some(summarizer)
            }
            Err(e) => {
                warn!("⚠️ LLM summarizer unavailable: {}", e);
                None
            }
        };

        Self::with_services(config, transcript_fetcher, summarizer, translator, speech)
    }

    /// Build the engine around caller-provided service clients
    pub fn with_services(
        config: Config,
        transcript_fetcher: Box<dyn TranscriptFetcher>,
        summarizer: Option<Box<dyn Summarizer>>,
        translator: Box<dyn Translator>,
        speech: Box<dyn SpeechSynthesizer>,
    ) -> Result<Self> {
        let segmenter = Segmenter::new(SegmenterOptions {
            max_main_points: config.mindmap.max_main_points,
            max_sub_points: config.mindmap.max_sub_points,
        });
        let mind_map_writer = MindMapWriter::new(&config.mindmap)?;

        Ok(Self {
            config,
            segmenter,
            mind_map_writer,
            transcript_fetcher,
            summarizer,
            translator,
            speech,
        })
    }

    /// Full pipeline for one video link
    pub async fn run(&self, url: &str, options: RunOptions) -> Result<RunReport> {
        let output_dir = options.output.clone().unwrap_or_else(|| self.config.output.dir.clone());
        let language = options.language.unwrap_or(self.config.translation.target_language);
        let title = options.title.clone().unwrap_or_else(|| self.config.mindmap.title.clone());

        let summarizer = self.summarizer.as_deref().ok_or_else(|| {
            VidmapError::Config("No LLM summarizer configured (is GOOGLE_API_KEY set?)".to_string())
        })?;

        // Step 1: Transcript
        let video_id = VideoId::from_url(url)?;
        info!("🎥 Video {} ({})", video_id, video_id.thumbnail_url());

        let transcript: Transcript = self.transcript_fetcher
            .fetch(&video_id, &self.config.transcript.languages)
            .await
            .context("Transcript could not be extracted")?;
        let transcript_text = transcript.text();
        info!("📜 Transcript: {} snippets, {} characters", transcript.snippets.len(), transcript_text.chars().count());

        // Step 2: Summary
        info!("🧠 Summarizing with {}...", summarizer.provider_name());
        let request = SummaryRequest::from_config(&self.config.llm, &transcript_text);
        let summary: Summary = summarizer.summarize(&request).await
            .context("Failed to generate summary")?;
        info!("✅ Summary generated");

        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let summary_file = output_dir.join("summary.md");
        std::fs::write(&summary_file, format!("# {}\n\n{}\n", title, summary.text))?;

        // Step 3: Translation (a failure falls back to the original summary)
        let translated = if self.config.translation.enabled && !options.skip_translation {
            self.translate(&summary.text, language).await
        } else {
            None
        };

        let translated_file = match &translated {
            Some(text) => {
                let path = output_dir.join(format!("summary.{}.md", language));
                std::fs::write(&path, format!("# {} ({})\n\n{}\n", title, language.code().to_uppercase(), text))?;
                Some(path)
            }
            None => None,
        };

        // Step 4: Audio
        let audio_file = if self.config.speech.enabled && !options.skip_audio {
            let spoken = translated.as_deref().unwrap_or(&summary.text);
            self.speak(spoken, language, &output_dir).await
        } else {
            None
        };

        // Step 5: Mind map from the untranslated summary
        let (hierarchy, graph, files) = self.build_mind_map(&summary.text, &title, &output_dir)?;

        let report = RunReport {
            video_id: Some(video_id.to_string()),
            thumbnail_url: Some(video_id.thumbnail_url()),
            transcript_chars: transcript_text.chars().count(),
            summary_file: Some(summary_file),
            translated_file,
            target_language: translated.as_ref().map(|_| language),
            audio_file,
            mind_map_html: files.html,
            mind_map_json: files.json,
            main_points: hierarchy.main_points,
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
            generated_at: Utc::now(),
        };

        self.write_report(&report, &output_dir)?;
        info!("🎉 Done! Artifacts written to {}", output_dir.display());
        Ok(report)
    }

    /// Mind map for an existing summary, without calling any service
    pub fn mind_map(&self, summary_text: &str, title: Option<String>, output: Option<PathBuf>) -> Result<RunReport> {
        let output_dir = output.unwrap_or_else(|| self.config.output.dir.clone());
        let title = title.unwrap_or_else(|| self.config.mindmap.title.clone());

        let (hierarchy, graph, files) = self.build_mind_map(summary_text, &title, &output_dir)?;

        let report = RunReport {
            video_id: None,
            thumbnail_url: None,
            transcript_chars: 0,
            summary_file: None,
            translated_file: None,
            target_language: None,
            audio_file: None,
            mind_map_html: files.html,
            mind_map_json: files.json,
            main_points: hierarchy.main_points,
            nodes: graph.nodes.len(),
            edges: graph.edges.len(),
            generated_at: Utc::now(),
        };

        self.write_report(&report, &output_dir)?;
        info!("🧠 Mind map written to {}", report.mind_map_html.display());
        Ok(report)
    }

    /// Two-level hierarchy of a summary
    pub fn segment(&self, summary_text: &str) -> Hierarchy {
        self.segmenter.segment(summary_text)
    }

    /// Write a default configuration file into `path`
    pub fn init(&self, path: Option<PathBuf>, force: bool) -> Result<PathBuf> {
        let target_dir = match path {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let config_path = target_dir.join("vidmap.toml");
        info!("Initializing vidmap in: {}", target_dir.display());

        if config_path.exists() && !force {
            return Err(VidmapError::Config(format!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            )).into());
        }

        std::fs::create_dir_all(&target_dir)?;
        Config::default().save(&config_path)?;
        info!("📝 Wrote {}", config_path.display());
        Ok(config_path)
    }

    fn build_mind_map(&self, summary_text: &str, title: &str, output_dir: &Path) -> Result<(Hierarchy, GraphDescription, super::MindMapFiles)> {
        let hierarchy = self.segmenter.segment(summary_text);
        if hierarchy.is_empty() {
            warn!("Summary has no usable points; mind map will only contain the title");
        }

        let graph = render(title, &hierarchy);
        debug!("Mind map: {} nodes, {} edges", graph.nodes.len(), graph.edges.len());

        let files = self.mind_map_writer
            .write(&graph, output_dir, self.config.output.write_graph_json)
            .context("Failed to write mind map")?;
        Ok((hierarchy, graph, files))
    }

    async fn translate(&self, text: &str, language: Language) -> Option<String> {
        info!("🌐 Translating summary to {}...", language);
        match self.translator.translate(text, language).await {
            Ok(translated) => Some(translated),
            Err(e) => {
                warn!("⚠️ Translation failed, keeping original summary: {}", e);
                None
            }
        }
    }

    async fn speak(&self, text: &str, language: Language, output_dir: &Path) -> Option<PathBuf> {
        info!("🎧 Generating audio in {}...", language);
        let result = match self.speech.synthesize(text, language).await {
            Ok(audio) => save_audio(&audio, output_dir, "summary.mp3"),
            Err(e) => Err(e),
        };

        match result {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("⚠️ Speech generation failed: {}", e);
                None
            }
        }
    }

    fn write_report(&self, report: &RunReport, output_dir: &Path) -> Result<()> {
        let path = output_dir.join("report.json");
        std::fs::write(&path, serde_json::to_string_pretty(report)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
