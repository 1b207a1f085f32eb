//! Client for the AI reflection service.
//!
//! The service takes `{"prompt": "..."}` and answers `{"text": "..."}`.
//! Callers that only want something to show use [`insight_or_fallback`],
//! which never fails.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::JournalEntry;
use crate::storage::InsightsConfig;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("insights are disabled")]
    Disabled,

    #[error("invalid insight endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("insight request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("insight service returned HTTP {0}")]
    Status(u16),

    #[error("insight service returned no text")]
    EmptyResponse,
}

#[derive(Deserialize)]
struct InsightResponse {
    text: String,
}

pub struct InsightClient {
    http: Client,
    endpoint: Url,
}

impl InsightClient {
    pub fn from_config(config: &InsightsConfig) -> Result<Self, InsightError> {
        if !config.enabled {
            return Err(InsightError::Disabled);
        }
        let endpoint = Url::parse(&config.endpoint)?;
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "prompt": prompt }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(InsightError::Status(status.as_u16()));
        }

        let body: InsightResponse = resp.json().await?;
        let text = body.text.trim();
        if text.is_empty() {
            return Err(InsightError::EmptyResponse);
        }
        debug!(chars = text.len(), "insight received");
        Ok(text.to_string())
    }
}

/// Ask the service for an insight, substituting the configured fallback
/// message for any failure.
pub async fn insight_or_fallback(config: &InsightsConfig, prompt: &str) -> String {
    let result = match InsightClient::from_config(config) {
        Ok(client) => client.generate(prompt).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(text) => text,
        Err(InsightError::Disabled) => config.fallback_message.clone(),
        Err(e) => {
            warn!(error = %e, "insight unavailable; using fallback");
            config.fallback_message.clone()
        }
    }
}

pub fn build_prompt(entries: &[JournalEntry]) -> String {
    let mut prompt = String::from(
        "Offer a short, encouraging reflection on these journal entries.\n",
    );
    for entry in entries {
        prompt.push('\n');
        prompt.push_str(&entry.date.to_string());
        if let Some(mood) = entry.mood {
            prompt.push_str(&format!(" (mood {mood}/5)"));
        }
        prompt.push_str(": ");
        prompt.push_str(&entry.content);
    }
    prompt
}
