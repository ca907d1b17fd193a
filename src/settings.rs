//! Persisted plugin settings.
//!
//! Settings are a flat value object threaded explicitly into the core
//! functions; nothing in the merge or generation layers reads ambient state.
//! The host-facing load/save helpers persist JSON under the user's config
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default prompt sent to the AI backend on the first attempt.
///
/// `{{max_tags}}` and `{{max_words}}` are substituted before the request.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
Suggest tags for the note content below.
Return ONLY a comma-separated list of tags with no explanatory text.
Use at most {{max_tags}} tags.
Each tag must be at most {{max_words}} words long.
Use hyphens instead of spaces inside a tag (e.g. \"machine-learning\").";

/// Display case applied to tags when they are written to frontmatter.
///
/// Unknown values in a hand-edited settings file fall back to `Lowercase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum CaseFormat {
    #[default]
    Lowercase,
    Uppercase,
    Titlecase,
    Retain,
}

impl From<String> for CaseFormat {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "uppercase" => CaseFormat::Uppercase,
            "titlecase" => CaseFormat::Titlecase,
            "retain" => CaseFormat::Retain,
            // "lowercase" and anything unrecognized
            _ => CaseFormat::Lowercase,
        }
    }
}

/// Merge policy applied when a document already carries tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Keep existing tags and add only non-duplicate new ones.
    #[default]
    Append,
    /// Discard existing tags and write only the new set.
    Replace,
}

/// Preferred regional spelling for tags (UK vs. US English).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePreference {
    Uk,
    #[default]
    Us,
}

/// Flat settings object consumed read-only by the tagging core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of tags written to a document per run.
    pub max_tags: usize,
    /// Maximum words per tag (hyphens count as word separators).
    pub max_words_per_tag: usize,
    /// Display case for tags written to frontmatter.
    pub case_format: CaseFormat,
    /// Regional spelling preference for tag normalization.
    pub language: LanguagePreference,
    /// Append vs. replace policy for documents that already have tags.
    pub merge_mode: MergeMode,
    /// Template for newly created frontmatter blocks. Must contain `{{tags}}`;
    /// other `{{placeholder}}` keys are filled from template vars. `None`
    /// falls back to a minimal `---\ntags:\n...\n---` block.
    pub frontmatter_template: Option<String>,
    /// Prompt template for the first generation attempt.
    pub prompt_template: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_tags: 5,
            max_words_per_tag: 2,
            case_format: CaseFormat::default(),
            language: LanguagePreference::default(),
            merge_mode: MergeMode::default(),
            frontmatter_template: None,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl Settings {
    /// Gets the cross-platform settings file path.
    ///
    /// Returns the path as `{config_dir}/notetag/settings.json` where
    /// `config_dir` is:
    /// - Linux: `~/.config`
    /// - macOS: `~/Library/Application Support`
    /// - Windows: `C:\Users\<user>\AppData\Roaming`
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine config directory"))?;

        Ok(config_dir.join("notetag").join("settings.json"))
    }

    /// Loads settings from the given path, or returns defaults if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Saves settings as pretty-printed JSON, creating parent directories as
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file I/O fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let raw = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))?;
        Ok(())
    }
}
