use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::LlmConfig;
use crate::error::Result;

/// Request for the LLM to summarize a transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// Instruction placed before the transcript
    pub prompt: String,

    /// Transcript text, already cut to the configured length
    pub transcript: String,
}

impl SummaryRequest {
    /// Build a request, cutting transcripts longer than `max_chars`
    /// characters and marking the cut with `...`
    pub fn new(prompt: &str, transcript: &str, max_chars: usize) -> Self {
        let transcript = match transcript.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &transcript[..cut]),
            None => transcript.to_string(),
        };

        Self {
            prompt: prompt.to_string(),
            transcript,
        }
    }

    pub fn from_config(config: &LlmConfig, transcript: &str) -> Self {
        Self::new(&config.prompt, transcript, config.max_transcript_chars)
    }

    /// Full text sent to the model
    pub fn to_prompt(&self) -> String {
        format!("{}\n{}", self.prompt, self.transcript)
    }
}

/// Summary returned by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Trimmed response text
    pub text: String,

    /// Metadata about the call (provider, model, token usage)
    pub metadata: HashMap<String, String>,
}

/// Trait for LLM providers that can summarize transcripts
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary>;

    /// Get the provider name (e.g., "Google Gemini")
    fn provider_name(&self) -> &str;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
