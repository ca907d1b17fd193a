//! Tagging operations wired end to end.
//!
//! `TaggingService` owns the read → generate → merge → write sequence for a
//! document, plus the per-path in-flight guard that keeps two tagging
//! operations from racing on the same file. The document is only ever
//! written after a complete tag set has been obtained; any failure or
//! cancellation upstream of the merge leaves the file untouched.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

use crate::extract::{ExtractError, TextExtractor};
use crate::frontmatter::{merge_tags, MergeOptions};
use crate::provider::ProviderError;
use crate::settings::Settings;
use crate::tags::TagGenerator;

/// Errors raised by a tagging operation.
#[derive(Debug, Error)]
pub enum TaggingError {
    /// Tag generation failed at the backend.
    #[error("Tag generation failed: {0}")]
    Provider(#[from] ProviderError),

    /// Source text could not be extracted.
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    /// The user dismissed the manual-entry prompt. A clean abort, not a
    /// failure.
    #[error("Tagging cancelled")]
    Cancelled,

    /// A tagging operation is already in flight for this path.
    #[error("A tagging operation is already running for {path}")]
    Busy { path: PathBuf },

    /// Reading or writing the document failed.
    #[error("Document I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Document storage capability: the only operations the core needs.
pub trait DocumentStore: Send + Sync {
    /// Reads the document at `path`.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Writes `text` to the document at `path`.
    fn write(&self, path: &Path, text: &str) -> io::Result<()>;
}

/// Filesystem-backed document store.
pub struct FsStore;

impl DocumentStore for FsStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        fs::write(path, text)
    }
}

/// Capability that asks the user to type tags by hand.
///
/// Resolves to a sequence of already comma-split, trimmed strings, or fails
/// with [`TaggingError::Cancelled`] when the prompt is dismissed.
pub trait ManualTagSource {
    /// Prompts for tags, blocking until the user answers or dismisses.
    fn prompt_tags(&self) -> Result<Vec<String>, TaggingError>;
}

/// Outcome of a tagging operation.
#[derive(Debug)]
pub struct TagReport {
    /// The document that was tagged.
    pub path: PathBuf,
    /// The validated tags fed into the merge (before de-duplication against
    /// existing frontmatter entries).
    pub tags: Vec<String>,
    /// Whether the merge changed the document text.
    pub changed: bool,
    /// The merged document text.
    pub document: String,
}

/// End-to-end tagging operations over a document store.
pub struct TaggingService {
    store: Box<dyn DocumentStore>,
    extractor: Box<dyn TextExtractor>,
    generator: TagGenerator,
    in_flight: Mutex<HashSet<PathBuf>>,
}

impl TaggingService {
    /// Creates a new service over the given collaborators.
    #[must_use]
    pub fn new(
        store: Box<dyn DocumentStore>,
        extractor: Box<dyn TextExtractor>,
        generator: TagGenerator,
    ) -> Self {
        Self {
            store,
            extractor,
            generator,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Tags the document at `path` with AI-generated tags and writes the
    /// merged result back.
    ///
    /// # Errors
    ///
    /// Returns [`TaggingError`] on extraction, generation or I/O failure;
    /// the document is left untouched in every failure case.
    pub fn tag_document(
        &self,
        path: &Path,
        settings: &Settings,
    ) -> Result<TagReport, TaggingError> {
        let _guard = self.claim(path)?;
        let tags = self.generate_for(path, settings)?;
        self.apply(path, &tags, settings, true)
    }

    /// Like [`tag_document`](Self::tag_document) but never writes; the
    /// merged text is returned in the report for preview.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`tag_document`](Self::tag_document).
    pub fn preview_document(
        &self,
        path: &Path,
        settings: &Settings,
    ) -> Result<TagReport, TaggingError> {
        let _guard = self.claim(path)?;
        let tags = self.generate_for(path, settings)?;
        self.apply(path, &tags, settings, false)
    }

    /// Tags the document with user-typed tags instead of calling a backend.
    ///
    /// This is the recovery path when extraction fails or the backend rate
    /// limits. Dismissing the prompt aborts cleanly without writing.
    ///
    /// # Errors
    ///
    /// Returns [`TaggingError::Cancelled`] on dismissal, or an I/O error.
    pub fn tag_document_manual(
        &self,
        path: &Path,
        source: &dyn ManualTagSource,
        settings: &Settings,
    ) -> Result<TagReport, TaggingError> {
        let _guard = self.claim(path)?;
        let tags = source.prompt_tags()?;
        self.apply(path, &tags, settings, true)
    }

    fn generate_for(&self, path: &Path, settings: &Settings) -> Result<Vec<String>, TaggingError> {
        let text = self.extractor.extract_text(path)?;
        let tags = self
            .generator
            .generate_tags_observed(&text, settings, |attempt| {
                info!(path = %path.display(), attempt, "generating tags");
            })?;
        Ok(tags)
    }

    fn apply(
        &self,
        path: &Path,
        tags: &[String],
        settings: &Settings,
        write: bool,
    ) -> Result<TagReport, TaggingError> {
        let document = self.store.read(path)?;

        let mut options = MergeOptions::from_settings(settings);
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            options
                .template_vars
                .push(("title".to_string(), stem.to_string()));
        }

        let merged = merge_tags(&document, tags, &options);
        let changed = merged != document;

        if write && changed {
            self.store.write(path, &merged)?;
            info!(path = %path.display(), tags = tags.len(), "frontmatter updated");
        }

        Ok(TagReport {
            path: path.to_path_buf(),
            tags: tags.to_vec(),
            changed,
            document: merged,
        })
    }

    fn claim(&self, path: &Path) -> Result<InFlightGuard<'_>, TaggingError> {
        let mut in_flight = self.in_flight.lock().expect("in-flight set lock poisoned");
        if !in_flight.insert(path.to_path_buf()) {
            return Err(TaggingError::Busy {
                path: path.to_path_buf(),
            });
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            path: path.to_path_buf(),
        })
    }
}

/// Releases the per-path claim when the operation ends, however it ends.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<PathBuf>>,
    path: PathBuf,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.path);
        }
    }
}
