use std::collections::HashSet;

use tracing::debug;

use crate::settings::{CaseFormat, LanguagePreference, MergeMode, Settings};
use crate::tags::{SpellingNormalizer, TagFormatter};

use super::field::{find_tags_field, line_end_after, serialize_tags};

/// Fallback block when no frontmatter template is configured.
const DEFAULT_TEMPLATE: &str = "---\n{{tags}}---\n";

/// Byte length of the opening `---\n` delimiter.
const OPEN_DELIMITER_LEN: usize = 4;

/// Inputs to a merge, decoupled from the full settings object.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Display case for serialized tags.
    pub case_format: CaseFormat,
    /// Append vs. replace policy.
    pub mode: MergeMode,
    /// Regional spelling preference applied to both sides of the merge.
    pub language: LanguagePreference,
    /// Template for a freshly created block; must contain `{{tags}}`.
    pub template: Option<String>,
    /// `{{placeholder}}` substitutions applied to the template.
    pub template_vars: Vec<(String, String)>,
}

impl MergeOptions {
    /// Creates options with no template (the minimal default block is used
    /// when a fresh one is needed).
    #[must_use]
    pub fn new(case_format: CaseFormat, mode: MergeMode, language: LanguagePreference) -> Self {
        Self {
            case_format,
            mode,
            language,
            template: None,
            template_vars: Vec::new(),
        }
    }

    /// Derives merge options from the persisted settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            case_format: settings.case_format,
            mode: settings.merge_mode,
            language: settings.language,
            template: settings.frontmatter_template.clone(),
            template_vars: Vec::new(),
        }
    }
}

/// Merges `new_tags` into the document's frontmatter and returns the updated
/// document text.
///
/// This function is total: it never fails for any syntactically-plausible
/// input. Malformed frontmatter (an opening `---` with no closing delimiter)
/// degrades to "absent" and a fresh block is prepended with the original
/// content, stray delimiter included, preserved verbatim below it. An empty
/// `new_tags` set is a legal no-op that never creates a fresh block and
/// changes the document only where case/spelling normalization alters
/// existing entries.
///
/// The canonical YAML-list shape always wins on rewrite, whatever shape the
/// existing field used.
#[must_use]
pub fn merge_tags(document: &str, new_tags: &[String], options: &MergeOptions) -> String {
    let prepared = prepare_new_tags(new_tags, options);

    let Some(close_start) = closing_delimiter_offset(document) else {
        return prepend_fresh_block(document, &prepared, options);
    };

    let block = &document[OPEN_DELIMITER_LEN..close_start];
    let Some(field) = find_tags_field(block) else {
        if prepared.is_empty() {
            return document.to_string();
        }
        // Insert a new field immediately before the closing delimiter.
        debug!("frontmatter has no tags field, inserting one");
        let serialized = serialize_tags(&prepared, options.case_format);
        let mut out = String::with_capacity(document.len() + serialized.len());
        out.push_str(&document[..close_start]);
        out.push_str(&serialized);
        out.push_str(&document[close_start..]);
        return out;
    };

    // Existing tags converge on the preferred spelling over repeated runs.
    let existing: Vec<String> = field
        .values
        .iter()
        .map(|tag| SpellingNormalizer::preferred_spelling(tag, options.language))
        .collect();

    let merged = match options.mode {
        MergeMode::Replace if !prepared.is_empty() => prepared,
        _ => {
            // Append: existing (normalized) first, then non-duplicate new
            // tags in generation order. An empty new set re-normalizes only.
            let mut result = dedup_by_key(existing);
            let mut seen: HashSet<String> = result
                .iter()
                .map(|tag| SpellingNormalizer::comparison_key(tag))
                .collect();
            for tag in prepared {
                if seen.insert(SpellingNormalizer::comparison_key(&tag)) {
                    result.push(tag);
                }
            }
            result
        }
    };

    let serialized = serialize_tags(&merged, options.case_format);
    let start = OPEN_DELIMITER_LEN + field.start;
    let end = OPEN_DELIMITER_LEN + field.end;
    let mut out = String::with_capacity(document.len() + serialized.len());
    out.push_str(&document[..start]);
    out.push_str(&serialized);
    out.push_str(&document[end..]);
    out
}

/// Byte offset of the line holding the closing `---` delimiter, or `None`
/// when the document has no (well-formed) frontmatter block.
fn closing_delimiter_offset(document: &str) -> Option<usize> {
    if !document.starts_with("---\n") {
        return None;
    }

    let mut pos = OPEN_DELIMITER_LEN;
    while pos < document.len() {
        let line_end = line_end_after(document, pos);
        if document[pos..line_end].trim_end_matches(['\n', '\r']) == "---" {
            return Some(pos);
        }
        pos = line_end;
    }
    None
}

/// Spelling-normalizes, case-formats and de-duplicates the incoming tag set.
fn prepare_new_tags(new_tags: &[String], options: &MergeOptions) -> Vec<String> {
    let prepared = new_tags
        .iter()
        .map(|tag| {
            let spelled = SpellingNormalizer::preferred_spelling(tag, options.language);
            TagFormatter::format_tag(&spelled, options.case_format)
        })
        .filter(|tag| !tag.is_empty())
        .collect();
    dedup_by_key(prepared)
}

/// Keeps the first occurrence of each comparison key, preserving order.
fn dedup_by_key(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(SpellingNormalizer::comparison_key(tag)))
        .collect()
}

/// Builds a fresh frontmatter block from the template and prepends it to the
/// (possibly already frontmatter-free) document body.
fn prepend_fresh_block(document: &str, prepared: &[String], options: &MergeOptions) -> String {
    if prepared.is_empty() {
        return document.to_string();
    }

    let serialized = serialize_tags(prepared, options.case_format);
    let mut block = options
        .template
        .as_deref()
        .unwrap_or(DEFAULT_TEMPLATE)
        .to_string();
    for (key, value) in &options.template_vars {
        block = block.replace(&format!("{{{{{key}}}}}"), value);
    }
    block = block.replace("{{tags}}", &serialized);
    if !block.ends_with('\n') {
        block.push('\n');
    }

    let mut out = String::with_capacity(block.len() + document.len());
    out.push_str(&block);
    out.push_str(document);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| (*t).to_string()).collect()
    }

    fn options(mode: MergeMode) -> MergeOptions {
        MergeOptions::new(CaseFormat::Lowercase, mode, LanguagePreference::Us)
    }

    #[test]
    fn replace_overwrites_existing_field_and_preserves_neighbors() {
        let doc = "---\ntitle: X\ntags:\n- old\n---\nbody\n";
        let merged = merge_tags(doc, &owned(&["Cat", "Dog"]), &options(MergeMode::Replace));
        assert_eq!(merged, "---\ntitle: X\ntags:\n- cat\n- dog\n---\nbody\n");
    }

    #[test]
    fn replace_is_idempotent() {
        let doc = "---\ntags:\n- old\n---\nbody\n";
        let new_tags = owned(&["Cat", "Dog"]);
        let once = merge_tags(doc, &new_tags, &options(MergeMode::Replace));
        let twice = merge_tags(&once, &new_tags, &options(MergeMode::Replace));
        assert_eq!(once, twice);
    }

    #[test]
    fn append_adds_only_non_duplicates_keeping_order() {
        let doc = "---\ntags:\n- cat\n---\nbody\n";
        let merged = merge_tags(doc, &owned(&["Dog", "CAT", "dog"]), &options(MergeMode::Append));
        assert_eq!(merged, "---\ntags:\n- cat\n- dog\n---\nbody\n");
    }

    #[test]
    fn append_recognizes_regional_spelling_duplicates() {
        let doc = "---\ntags:\n- cat\n- colour-theory\n---\nbody\n";
        let mut opts = options(MergeMode::Append);
        opts.language = LanguagePreference::Uk;
        let merged = merge_tags(doc, &owned(&["Color-Theory"]), &opts);
        assert_eq!(merged, "---\ntags:\n- cat\n- colour-theory\n---\nbody\n");
    }

    #[test]
    fn existing_spellings_converge_on_preference() {
        let doc = "---\ntags:\n- color-theory\n---\nbody\n";
        let mut opts = options(MergeMode::Append);
        opts.language = LanguagePreference::Uk;
        let merged = merge_tags(doc, &owned(&["gouache"]), &opts);
        assert_eq!(merged, "---\ntags:\n- colour-theory\n- gouache\n---\nbody\n");
    }

    #[test]
    fn inline_array_is_rewritten_in_canonical_list_form() {
        let doc = "---\ntags: [alpha, beta]\n---\nbody\n";
        let merged = merge_tags(doc, &owned(&["gamma"]), &options(MergeMode::Append));
        assert_eq!(merged, "---\ntags:\n- alpha\n- beta\n- gamma\n---\nbody\n");
    }

    #[test]
    fn single_scalar_is_rewritten_in_canonical_list_form() {
        let doc = "---\ntags: solo\n---\nbody\n";
        let merged = merge_tags(doc, &owned(&["extra"]), &options(MergeMode::Append));
        assert_eq!(merged, "---\ntags:\n- solo\n- extra\n---\nbody\n");
    }

    #[test]
    fn missing_field_is_inserted_before_closing_delimiter() {
        let doc = "---\ntitle: X\n---\nbody\n";
        let merged = merge_tags(doc, &owned(&["Cat", "Dog"]), &options(MergeMode::Replace));
        assert_eq!(merged, "---\ntitle: X\ntags:\n- cat\n- dog\n---\nbody\n");
    }

    #[test]
    fn absent_frontmatter_gets_a_fresh_default_block() {
        let doc = "just a body\n";
        let merged = merge_tags(doc, &owned(&["cat"]), &options(MergeMode::Append));
        assert_eq!(merged, "---\ntags:\n- cat\n---\njust a body\n");
    }

    #[test]
    fn malformed_frontmatter_is_treated_as_absent() {
        let doc = "---\ntitle: never closed\nbody\n";
        let merged = merge_tags(doc, &owned(&["cat"]), &options(MergeMode::Append));
        assert_eq!(merged, "---\ntags:\n- cat\n---\n---\ntitle: never closed\nbody\n");
    }

    #[test]
    fn fresh_block_uses_template_and_vars() {
        let mut opts = options(MergeMode::Append);
        opts.template = Some("---\ntitle: {{title}}\n{{tags}}---\n".to_string());
        opts.template_vars = vec![("title".to_string(), "My Note".to_string())];
        let merged = merge_tags("body\n", &owned(&["cat"]), &opts);
        assert_eq!(merged, "---\ntitle: My Note\ntags:\n- cat\n---\nbody\n");
    }

    #[test]
    fn empty_new_tags_never_creates_a_block() {
        assert_eq!(merge_tags("body\n", &[], &options(MergeMode::Append)), "body\n");
        assert_eq!(
            merge_tags("---\ntitle: X\n---\nbody\n", &[], &options(MergeMode::Replace)),
            "---\ntitle: X\n---\nbody\n"
        );
    }

    #[test]
    fn empty_new_tags_does_not_discard_existing_in_replace_mode() {
        let doc = "---\ntags:\n- cat\n---\nbody\n";
        let merged = merge_tags(doc, &[], &options(MergeMode::Replace));
        assert_eq!(merged, "---\ntags:\n- cat\n---\nbody\n");
    }

    #[test]
    fn append_is_monotonic_and_duplicate_free() {
        let doc = "---\ntags:\n- one\n- two\n---\nbody\n";
        let new_tags = owned(&["two", "three", "THREE", "four"]);
        let merged = merge_tags(doc, &new_tags, &options(MergeMode::Append));

        let block = merged
            .strip_prefix("---\n")
            .and_then(|rest| rest.split("---\n").next())
            .expect("block present");
        let values: Vec<&str> = block
            .lines()
            .filter_map(|line| line.strip_prefix("- "))
            .collect();

        assert_eq!(values, vec!["one", "two", "three", "four"]);
        let keys: std::collections::HashSet<String> = values
            .iter()
            .map(|v| SpellingNormalizer::comparison_key(v))
            .collect();
        assert_eq!(keys.len(), values.len());
    }

    #[test]
    fn repeated_append_runs_are_stable() {
        let doc = "---\ntags:\n- cat\n---\nbody\n";
        let new_tags = owned(&["dog"]);
        let once = merge_tags(doc, &new_tags, &options(MergeMode::Append));
        let twice = merge_tags(&once, &new_tags, &options(MergeMode::Append));
        assert_eq!(once, twice);
    }

    #[test]
    fn titlecase_formatting_applies_to_both_sides() {
        let doc = "---\ntags:\n- deep learning\n---\nbody\n";
        let mut opts = options(MergeMode::Append);
        opts.case_format = CaseFormat::Titlecase;
        let merged = merge_tags(doc, &owned(&["rust lang"]), &opts);
        assert_eq!(merged, "---\ntags:\n- Deep-Learning\n- Rust-Lang\n---\nbody\n");
    }

    #[test]
    fn new_tags_are_deduplicated_among_themselves_in_replace_mode() {
        let doc = "---\ntags:\n- old\n---\nbody\n";
        let merged = merge_tags(doc, &owned(&["Cat", "cat", "CAT"]), &options(MergeMode::Replace));
        assert_eq!(merged, "---\ntags:\n- cat\n---\nbody\n");
    }

    #[test]
    fn body_containing_delimiters_is_untouched() {
        let doc = "---\ntags:\n- cat\n---\nbody\n---\nnot frontmatter\n---\n";
        let merged = merge_tags(doc, &owned(&["dog"]), &options(MergeMode::Append));
        assert_eq!(
            merged,
            "---\ntags:\n- cat\n- dog\n---\nbody\n---\nnot frontmatter\n---\n"
        );
    }

    #[test]
    fn closing_delimiter_without_trailing_newline_is_recognized() {
        let doc = "---\ntitle: X\n---";
        let merged = merge_tags(doc, &owned(&["cat"]), &options(MergeMode::Append));
        assert_eq!(merged, "---\ntitle: X\ntags:\n- cat\n---");
    }
}
