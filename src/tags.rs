//! Tag generation, validation and normalization.
//!
//! This module owns everything between a raw AI completion and a clean tag
//! set ready for the frontmatter merge:
//!
//! - [`TagValidator`] decides whether raw tags fit the word-count bound and
//!   whether a whole candidate set is unusable.
//! - [`TagFormatter`] canonicalizes a tag's surface form (case, whitespace,
//!   quotes).
//! - [`SpellingNormalizer`] maps tags between regional spelling variants and
//!   computes the comparison key used for de-duplication.
//! - [`TagGenerator`] drives the bounded request/validate/retry loop against
//!   a [`TagProvider`](crate::provider::TagProvider) backend.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use notetag::provider::OllamaProviderBuilder;
//! use notetag::settings::Settings;
//! use notetag::tags::TagGenerator;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OllamaProviderBuilder::new().model("gemma3:4b").build()?;
//! let generator = TagGenerator::new(Arc::new(provider));
//!
//! let tags = generator.generate_tags(
//!     "Learning async Rust programming with the tokio runtime",
//!     &Settings::default(),
//! )?;
//! # Ok(())
//! # }
//! ```

mod formatter;
mod generator;
mod spelling;
mod validator;

pub use formatter::TagFormatter;
pub use generator::{TagGenerator, MAX_ATTEMPTS, MAX_INPUT_CHARS};
pub use spelling::SpellingNormalizer;
pub use validator::{FilterOutcome, TagValidator};
