use crate::settings::CaseFormat;

/// Canonicalizes the surface form of a tag before it is written to
/// frontmatter.
///
/// Formatting strips double quotes, joins whitespace-separated words with
/// hyphens, and applies the configured display case. It is a pure function of
/// its inputs and never touches the de-duplication comparison key.
pub struct TagFormatter;

impl TagFormatter {
    /// Formats a single tag for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use notetag::settings::CaseFormat;
    /// use notetag::tags::TagFormatter;
    ///
    /// assert_eq!(TagFormatter::format_tag("Deep Learning", CaseFormat::Lowercase), "deep-learning");
    /// assert_eq!(TagFormatter::format_tag("deep learning", CaseFormat::Titlecase), "Deep-Learning");
    /// assert_eq!(TagFormatter::format_tag("\"quoted\"", CaseFormat::Retain), "quoted");
    /// ```
    #[must_use]
    pub fn format_tag(tag: &str, case_format: CaseFormat) -> String {
        let stripped: String = tag.chars().filter(|c| *c != '"').collect();
        let hyphenated = stripped.split_whitespace().collect::<Vec<_>>().join("-");

        match case_format {
            CaseFormat::Lowercase => hyphenated.to_lowercase(),
            CaseFormat::Uppercase => hyphenated.to_uppercase(),
            CaseFormat::Titlecase => hyphenated
                .split('-')
                .map(capitalize_word)
                .collect::<Vec<_>>()
                .join("-"),
            CaseFormat::Retain => hyphenated,
        }
    }
}

/// Uppercases the first character of a word and lowercases the rest.
pub(crate) fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
