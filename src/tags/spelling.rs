use crate::settings::LanguagePreference;

use super::formatter::capitalize_word;

/// Bidirectional table of common UK/US spelling variant pairs, `(uk, us)`.
///
/// This is data, not logic: the table only needs to cover spellings likely to
/// show up as tags, not the whole dictionary.
const VARIANT_PAIRS: &[(&str, &str)] = &[
    ("aeroplane", "airplane"),
    ("ageing", "aging"),
    ("aluminium", "aluminum"),
    ("analyse", "analyze"),
    ("apologise", "apologize"),
    ("armour", "armor"),
    ("artefact", "artifact"),
    ("behaviour", "behavior"),
    ("cancelled", "canceled"),
    ("catalogue", "catalog"),
    ("centre", "center"),
    ("colour", "color"),
    ("counselling", "counseling"),
    ("customise", "customize"),
    ("defence", "defense"),
    ("dialogue", "dialog"),
    ("encyclopaedia", "encyclopedia"),
    ("favourite", "favorite"),
    ("fibre", "fiber"),
    ("flavour", "flavor"),
    ("grey", "gray"),
    ("harbour", "harbor"),
    ("honour", "honor"),
    ("humour", "humor"),
    ("jewellery", "jewelry"),
    ("labour", "labor"),
    ("licence", "license"),
    ("litre", "liter"),
    ("manoeuvre", "maneuver"),
    ("metre", "meter"),
    ("modelling", "modeling"),
    ("mould", "mold"),
    ("neighbour", "neighbor"),
    ("optimise", "optimize"),
    ("organisation", "organization"),
    ("organise", "organize"),
    ("realise", "realize"),
    ("recognise", "recognize"),
    ("rumour", "rumor"),
    ("savour", "savor"),
    ("splendour", "splendor"),
    ("summarise", "summarize"),
    ("theatre", "theater"),
    ("travelling", "traveling"),
    ("vapour", "vapor"),
];

/// Maps tags between regional spelling variants and produces the comparison
/// key used for de-duplication.
pub struct SpellingNormalizer;

impl SpellingNormalizer {
    /// Rewrites each word of `tag` to the spelling preferred by `language`.
    ///
    /// Words are the hyphen/whitespace-separated segments of the tag. A word
    /// whose lowercase form matches either side of a known variant pair is
    /// replaced by the side matching `language`, preserving the original
    /// leading-capitalization pattern; unmatched words are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use notetag::settings::LanguagePreference;
    /// use notetag::tags::SpellingNormalizer;
    ///
    /// assert_eq!(
    ///     SpellingNormalizer::preferred_spelling("color-theory", LanguagePreference::Uk),
    ///     "colour-theory"
    /// );
    /// assert_eq!(
    ///     SpellingNormalizer::preferred_spelling("Colour", LanguagePreference::Us),
    ///     "Color"
    /// );
    /// ```
    #[must_use]
    pub fn preferred_spelling(tag: &str, language: LanguagePreference) -> String {
        let mut out = String::with_capacity(tag.len());
        let mut word = String::new();

        for c in tag.chars() {
            if c == '-' || c.is_whitespace() {
                out.push_str(&preferred_word(&word, language));
                word.clear();
                out.push(c);
            } else {
                word.push(c);
            }
        }
        out.push_str(&preferred_word(&word, language));
        out
    }

    /// Computes the comparison key used exclusively for de-duplication.
    ///
    /// The key is lowercase with everything that is not a letter, digit,
    /// whitespace or hyphen stripped, and whitespace/hyphen runs collapsed to
    /// a single hyphen. It is idempotent and insensitive to the configured
    /// display case; it does not itself map between regional spellings (the
    /// merge step normalizes both sides to the same preference first).
    ///
    /// # Examples
    ///
    /// ```
    /// use notetag::tags::SpellingNormalizer;
    ///
    /// assert_eq!(SpellingNormalizer::comparison_key("Deep  Learning"), "deep-learning");
    /// assert_eq!(SpellingNormalizer::comparison_key("node.js"), "nodejs");
    /// assert_eq!(SpellingNormalizer::comparison_key("--rust--"), "rust");
    /// ```
    #[must_use]
    pub fn comparison_key(tag: &str) -> String {
        let mut key = String::with_capacity(tag.len());
        let mut pending_separator = false;

        for c in tag.to_lowercase().chars() {
            if c.is_alphanumeric() {
                if pending_separator && !key.is_empty() {
                    key.push('-');
                }
                pending_separator = false;
                key.push(c);
            } else if c.is_whitespace() || c == '-' {
                pending_separator = true;
            }
            // All other punctuation is stripped without acting as a separator.
        }

        key
    }
}

fn preferred_word(word: &str, language: LanguagePreference) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    let Some(&(uk, us)) = VARIANT_PAIRS
        .iter()
        .find(|(uk, us)| *uk == lower || *us == lower)
    else {
        return word.to_string();
    };

    let preferred = match language {
        LanguagePreference::Uk => uk,
        LanguagePreference::Us => us,
    };

    if word.chars().next().is_some_and(char::is_uppercase) {
        capitalize_word(preferred)
    } else {
        preferred.to_string()
    }
}
