use std::time::Duration;

use tracing::debug;

use super::{split_raw_tags, ProviderError, TagProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Builder for constructing `OpenAiProvider` instances.
///
/// Works against any OpenAI-compatible chat completions endpoint.
#[derive(Debug, Default)]
pub struct OpenAiProviderBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
}

impl OpenAiProviderBuilder {
    /// Creates a new `OpenAiProviderBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the API (defaults to the OpenAI endpoint, or
    /// `OPENAI_BASE_URL` if set).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API key. Falls back to `OPENAI_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model name. Falls back to `OPENAI_MODEL`, then a default.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `OpenAiProvider` with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` when no API key is available
    /// and `ProviderError::InvalidUrl` for an unparseable base URL.
    pub fn build(self) -> Result<OpenAiProvider, ProviderError> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Configuration(
                    "no OpenAI API key set (use OPENAI_API_KEY)".to_string(),
                )
            })?;

        let model = self
            .model
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        reqwest::Url::parse(&base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ProviderError::Network)?;

        Ok(OpenAiProvider {
            client,
            base_url,
            api_key,
            model,
        })
    }
}

/// Blocking HTTP backend for OpenAI-compatible chat completion APIs.
pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    /// Returns the model name configured for this provider.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TagProvider for OpenAiProvider {
    fn request_tags(&self, text: &str, prompt: &str) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt },
                { "role": "user", "content": text }
            ],
            "temperature": 0.2
        });

        debug!(model = %self.model, "requesting tags from openai-compatible endpoint");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16()));
        }

        let json: serde_json::Value = response.json().map_err(ProviderError::from_transport)?;

        let completion = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::Api {
                message: "Missing 'choices[0].message.content' in API response".to_string(),
            })?;

        Ok(split_raw_tags(completion))
    }
}
