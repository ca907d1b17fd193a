/// Result of filtering a candidate tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Tags that passed validation, in their original order.
    pub valid_tags: Vec<String>,
    /// True only when *zero* tags survived filtering.
    ///
    /// This all-or-none threshold is deliberate: partial success is preferred
    /// over forcing a retry merely because some tags were too long. It
    /// directly controls how often the generation loop retries.
    pub has_erroneous_tags: bool,
}

/// Decides whether raw AI output tags are acceptable.
pub struct TagValidator;

impl TagValidator {
    /// Returns true if `tag` fits within the word-count bound.
    ///
    /// Word count splits on whitespace and on internal hyphens/underscores,
    /// since hyphens are the tag-internal word separator the formatter
    /// produces. When `max_words_per_tag` is 1, tags of up to 2 words are
    /// still accepted: backends reliably over-generate by one word at the
    /// 1-word setting, and rejecting those wastes a retry.
    ///
    /// # Examples
    ///
    /// ```
    /// use notetag::tags::TagValidator;
    ///
    /// assert!(TagValidator::is_valid_tag("two-words", 1));
    /// assert!(!TagValidator::is_valid_tag("three-word-tag", 1));
    /// assert!(TagValidator::is_valid_tag("three word tag", 3));
    /// ```
    #[must_use]
    pub fn is_valid_tag(tag: &str, max_words_per_tag: usize) -> bool {
        let words = word_count(tag);
        if words == 0 {
            return false;
        }

        let limit = if max_words_per_tag == 1 {
            2
        } else {
            max_words_per_tag
        };
        words <= limit
    }

    /// Filters a candidate set, reporting whether the whole set was unusable.
    #[must_use]
    pub fn filter_erroneous(tags: &[String], max_words_per_tag: usize) -> FilterOutcome {
        let valid_tags: Vec<String> = tags
            .iter()
            .filter(|tag| Self::is_valid_tag(tag, max_words_per_tag))
            .cloned()
            .collect();
        let has_erroneous_tags = valid_tags.is_empty();

        FilterOutcome {
            valid_tags,
            has_erroneous_tags,
        }
    }
}

fn word_count(tag: &str) -> usize {
    tag.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|word| !word.is_empty())
        .count()
}
