use std::collections::HashMap;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{VidmapError, Result};
use crate::config::LlmConfig;
use super::summarizer::{Summarizer, SummaryRequest, Summary};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Factory function to create the appropriate summarizer based on config
pub fn create_summarizer(config: &LlmConfig) -> Result<Box<dyn Summarizer>> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        "openai" => Ok(Box::new(OpenAiProvider::new(config)?)),
        _ => Err(VidmapError::Config(
            format!("Unsupported LLM provider: {}", config.provider)
        )),
    }
}

fn require_api_key(config: &LlmConfig, var: &str) -> Result<String> {
    config.api_key.clone().ok_or_else(|| {
        VidmapError::Config(format!("API key missing: set llm.api_key or {}", var))
    })
}

async fn post_json(request: reqwest::RequestBuilder, payload: &Value, provider: &str) -> Result<Value> {
    let response = request
        .header("Content-Type", "application/json")
        .json(payload)
        .send()
        .await
        .map_err(|e| VidmapError::Llm(format!("{} API request failed: {}", provider, e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(VidmapError::Llm(
            format!("{} API error {}: {}", provider, status, error_text)
        ));
    }

    response.json().await
        .map_err(|e| VidmapError::Llm(format!("Failed to parse {} response: {}", provider, e)))
}

fn non_empty(text: String, provider: &str) -> Result<String> {
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(VidmapError::Llm(format!("{} returned an empty summary", provider)));
    }
    Ok(text)
}

/// Google Gemini via the generative-language REST API
pub struct GeminiProvider {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = require_api_key(config, "GOOGLE_API_KEY")?;

        Ok(Self {
            config: config.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(GEMINI_BASE_URL).trim_end_matches('/');
        let model = self.config.model.trim_start_matches("models/");
        format!("{}/v1beta/models/{}:generateContent", base, model)
    }
}

#[async_trait]
impl Summarizer for GeminiProvider {
    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary> {
        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": request.to_prompt() }]
                }
            ],
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens.unwrap_or(2000),
                "temperature": self.config.temperature.unwrap_or(0.3)
            }
        });

        let builder = self.client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())]);
        let response_data = post_json(builder, &payload, "Gemini").await?;

        let text: String = response_data["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|part| part["text"].as_str()).collect())
            .unwrap_or_default();

        let mut metadata = HashMap::new();
        metadata.insert("provider".to_string(), "Gemini".to_string());
        metadata.insert("model".to_string(), self.config.model.clone());
        if let Some(total) = response_data["usageMetadata"]["totalTokenCount"].as_u64() {
            metadata.insert("tokens_used".to_string(), total.to_string());
        }

        Ok(Summary {
            text: non_empty(text, "Gemini")?,
            metadata,
        })
    }

    fn provider_name(&self) -> &str {
        "Google Gemini"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// OpenAI chat completions
pub struct OpenAiProvider {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = require_api_key(config, "OPENAI_API_KEY")?;

        Ok(Self {
            config: config.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiProvider {
    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary> {
        let base = self.config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL).trim_end_matches('/');

        let payload = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You summarize video transcripts into short, factual bullet points."
                },
                {
                    "role": "user",
                    "content": request.to_prompt()
                }
            ],
            "max_tokens": self.config.max_tokens.unwrap_or(2000),
            "temperature": self.config.temperature.unwrap_or(0.3)
        });

        let builder = self.client
            .post(format!("{}/v1/chat/completions", base))
            .header("Authorization", format!("Bearer {}", self.api_key));
        let response_data = post_json(builder, &payload, "OpenAI").await?;

        let text = response_data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let mut metadata = HashMap::new();
        metadata.insert("provider".to_string(), "OpenAI".to_string());
        metadata.insert("model".to_string(), self.config.model.clone());
        if let Some(usage) = response_data.get("usage") {
            metadata.insert("tokens_used".to_string(), usage["total_tokens"].to_string());
        }

        Ok(Summary {
            text: non_empty(text, "OpenAI")?,
            metadata,
        })
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
