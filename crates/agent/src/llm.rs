use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use verse_core::config::LlmConfig;

/// Prompt in, text out. No streaming and no memory between calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| anyhow!("llm.api_key is not set"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key,
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<GenerateContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GenerateContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// A blocked prompt comes back without `candidates`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl<'a> GenerateRequest<'a> {
    fn user_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![GenerateContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

impl GenerateResponse {
    /// Joins the text parts of the first candidate.
    fn into_text(self) -> Result<String> {
        let content = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .ok_or_else(|| anyhow!("generation response contained no candidates"))?;

        let text =
            content.parts.into_iter().filter_map(|part| part.text).collect::<Vec<_>>().join("");
        if text.trim().is_empty() {
            return Err(anyhow!("generation response contained no text"));
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&GenerateRequest::user_prompt(prompt))
            .send()
            .await
            .context("generation request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("generation endpoint returned {status}"));
        }

        response
            .json::<GenerateResponse>()
            .await
            .context("failed to decode generation response")?
            .into_text()
    }
}
