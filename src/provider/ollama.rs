use std::time::Duration;

use tracing::debug;

use super::{split_raw_tags, ProviderError, TagProvider};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Builder for constructing `OllamaProvider` instances.
///
/// # Examples
///
/// ```
/// use notetag::provider::OllamaProviderBuilder;
///
/// let provider = OllamaProviderBuilder::new()
///     .base_url("http://localhost:11434")
///     .model("gemma3:4b")
///     .build()
///     .expect("Failed to create provider");
/// ```
#[derive(Debug, Default)]
pub struct OllamaProviderBuilder {
    base_url: Option<String>,
    model: Option<String>,
}

impl OllamaProviderBuilder {
    /// Creates a new `OllamaProviderBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Ollama API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model name (e.g. "gemma3:4b" or "deepseek-r1:8b").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `OllamaProvider` with the configured settings.
    ///
    /// If `base_url()` was not called, the `OLLAMA_HOST` environment variable
    /// is consulted, then `http://localhost:11434`. If `model()` was not
    /// called, `OLLAMA_MODEL` is consulted; a missing model is a
    /// configuration error.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Configuration` when no model is available and
    /// `ProviderError::InvalidUrl` for an unparseable base URL.
    pub fn build(self) -> Result<OllamaProvider, ProviderError> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var("OLLAMA_HOST").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = self
            .model
            .or_else(|| std::env::var("OLLAMA_MODEL").ok())
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Configuration(
                    "no Ollama model set (use --model or OLLAMA_MODEL)".to_string(),
                )
            })?;

        reqwest::Url::parse(&base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ProviderError::Network)?;

        Ok(OllamaProvider {
            client,
            base_url,
            model,
        })
    }
}

/// Blocking HTTP backend for a local Ollama server.
///
/// Sends the prompt and note text to `/api/generate` and adapts the
/// `response` field of the answer into raw tag candidates.
pub struct OllamaProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Returns the base URL configured for this provider.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name configured for this provider.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TagProvider for OllamaProvider {
    fn request_tags(&self, text: &str, prompt: &str) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let request_body = serde_json::json!({
            "model": self.model,
            "prompt": format!("{prompt}\n\nNOTE CONTENT:\n{text}\n\nTAGS:"),
            "stream": false
        });

        debug!(model = %self.model, "requesting tags from ollama");

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16()));
        }

        let json: serde_json::Value = response.json().map_err(ProviderError::from_transport)?;

        let completion = json
            .get("response")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::Api {
                message: "Missing 'response' field in API response".to_string(),
            })?;

        Ok(split_raw_tags(completion))
    }
}
