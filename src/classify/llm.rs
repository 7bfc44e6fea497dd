//! LLM classifier backed by a generateContent-style HTTP API
//!
//! Requests pin temperature to 0.0 and cap output tokens so verdicts stay
//! short and deterministic. Transient failures (429, 5xx, transport errors)
//! are retried with a linearly growing delay; other HTTP errors are returned
//! to the caller immediately.

use crate::classify::{Classifier, ClassifyError};
use crate::config::ClassifierConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Classification oracle client
#[derive(Debug)]
pub struct LlmClassifier {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_output_tokens: u32,
    max_retries: u32,
    retry_delay: Duration,
}

impl LlmClassifier {
    /// Builds a classifier from configuration, reading the API key from the
    /// environment variable the config names
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ClassifyError::MissingCredential(config.api_key_env.clone()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    fn build_request(&self, instruction: &str, content: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{}\n\n{}", instruction, content),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    async fn send_once(&self, body: &GenerateRequest) -> Result<String, ClassifyError> {
        let response = self
            .client
            .post(self.request_url())
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(ClassifyError::EmptyResponse)
    }

    fn is_transient(error: &ClassifyError) -> bool {
        match error {
            ClassifyError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ClassifyError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, instruction: &str, content: &str) -> Result<String, ClassifyError> {
        let body = self.build_request(instruction, content);

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(text) => return Ok(text),
                Err(e) if Self::is_transient(&e) && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay * attempt;
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "transient classifier failure, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
