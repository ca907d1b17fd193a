//! Text-extraction capability.
//!
//! Tag generation needs plain text, not file bytes. Extraction is consumed
//! through the [`TextExtractor`] trait so that hosts can plug in richer
//! engines (PDF, OCR) without the core knowing about them; the built-in
//! implementation handles plain-text formats only.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Errors raised while extracting text from a source file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file format has no extraction support.
    #[error("Unsupported file format: .{extension}")]
    UnsupportedFormat { extension: String },

    /// Reading the file failed.
    #[error("Failed to read file: {0}")]
    Io(#[from] io::Error),
}

/// Capability that turns a source file into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extracts the text content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the format is unsupported or the file
    /// cannot be read.
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Extractor for plain-text note formats (`.md`, `.markdown`, `.txt`).
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "md" | "markdown" | "txt" => Ok(fs::read_to_string(path)?),
            _ => Err(ExtractError::UnsupportedFormat { extension }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_markdown_files() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("note.md");
        fs::write(&path, "# Heading\nbody").expect("write note");

        let text = PlainTextExtractor
            .extract_text(&path)
            .expect("extract text");
        assert_eq!(text, "# Heading\nbody");
    }

    #[test]
    fn rejects_unsupported_extensions() {
        let result = PlainTextExtractor.extract_text(Path::new("scan.pdf"));
        assert!(matches!(
            result,
            Err(ExtractError::UnsupportedFormat { extension }) if extension == "pdf"
        ));
    }

    #[test]
    fn missing_file_surfaces_io_error() {
        let result = PlainTextExtractor.extract_text(Path::new("/nonexistent/note.md"));
        assert!(matches!(result, Err(ExtractError::Io(_))));
    }
}
