mod engine;
mod segmenter;
mod renderer;
mod mind_map;
mod transcript;
mod translator;
mod speech;
mod llm;

// Text core: summary → hierarchy → graph
pub use segmenter::{Segmenter, SegmenterOptions, Hierarchy};
pub use renderer::{render, GraphDescription};
pub use mind_map::{MindMapWriter, MindMapFiles};

// External service clients
pub use transcript::{TranscriptFetcher, YouTubeTranscriptFetcher, Transcript, VideoId};
pub use translator::{Translator, GoogleTranslator, Language};
pub use speech::{SpeechSynthesizer, GoogleSpeech, save_audio};
pub use llm::{Summarizer, SummaryRequest, Summary, create_summarizer};

// Export the main engine
pub use engine::{Engine, RunOptions};
