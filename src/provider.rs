//! AI backend capability.
//!
//! Each backend is an interchangeable implementation of [`TagProvider`]: it
//! receives a prompt plus (already truncated) source text and answers with a
//! sequence of raw tag strings. Provider-specific response shapes are adapted
//! to that uniform sequence here; nothing downstream knows which backend
//! produced the tags.

mod ollama;
mod openai;

pub use ollama::{OllamaProvider, OllamaProviderBuilder};
pub use openai::{OpenAiProvider, OpenAiProviderBuilder};

use clap::ValueEnum;
use thiserror::Error;

/// Errors raised by AI backends.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Required credential or setting is missing; non-retriable.
    #[error("Provider is not configured: {0}")]
    Configuration(String),

    /// Authentication or authorization failure (HTTP 401/403); non-retriable.
    #[error("Authentication failed: status {status}")]
    Auth { status: u16 },

    /// HTTP 429. Retriable by the caller (e.g. by offering manual entry and
    /// trying again later), never retried inside the generation loop.
    #[error("Rate limited by provider")]
    RateLimited,

    /// Other HTTP error status.
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout.
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Backend answered successfully but with an unusable payload.
    #[error("Provider API error: {message}")]
    Api { message: String },

    /// Invalid base URL configuration.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ProviderError {
    /// Maps a non-success HTTP status to the matching error variant.
    pub(crate) fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ProviderError::Auth { status },
            429 => ProviderError::RateLimited,
            _ => ProviderError::Http { status },
        }
    }

    /// Classifies a transport-level reqwest failure.
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ProviderError::Timeout(error)
        } else {
            ProviderError::Network(error)
        }
    }
}

/// Capability consumed by the tag generation loop.
///
/// Implementations send `prompt` and `text` to their backend and adapt the
/// response to a flat sequence of raw (unvalidated, unformatted) tag strings.
pub trait TagProvider: Send + Sync {
    /// Requests candidate tags for `text` under the given instructions.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on configuration, transport or API failures.
    /// An empty response is not an error.
    fn request_tags(&self, text: &str, prompt: &str) -> Result<Vec<String>, ProviderError>;
}

/// Which backend to instantiate; selected once at the orchestration boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProviderKind {
    #[default]
    Ollama,
    Openai,
}

/// Splits a raw completion into candidate tag strings.
///
/// Backends answer with a comma-separated list, but models routinely use
/// newlines or bullet markers instead; both are accepted. Entries are
/// trimmed and empties dropped. No validation or case formatting happens
/// here.
#[must_use]
pub(crate) fn split_raw_tags(response: &str) -> Vec<String> {
    response
        .split(|c| c == ',' || c == '\n')
        .map(|entry| entry.trim().trim_start_matches(['-', '*']).trim())
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}
