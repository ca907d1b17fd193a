use std::sync::Arc;

use tracing::{debug, warn};

use crate::provider::{ProviderError, TagProvider};
use crate::settings::Settings;

use super::validator::TagValidator;

/// Maximum number of generation attempts before accepting whatever survived.
pub const MAX_ATTEMPTS: u32 = 2;

/// Character budget for the note text sent to a backend.
pub const MAX_INPUT_CHARS: usize = 4000;

/// Prompt used for retry attempts: same constraints as the user prompt, but
/// enumerated unambiguously for models that ignored them the first time.
const STRICT_PROMPT_TEMPLATE: &str = "\
You previously returned unusable tags. Follow these rules EXACTLY:
1. Return ONLY a comma-separated list of tags. No numbering, no prose.
2. Return at most {{max_tags}} tags.
3. Each tag has at most {{max_words}} words.
4. Join the words of a tag with hyphens, e.g. \"machine-learning\".
5. Do not quote tags and do not use any other punctuation.";

/// Drives the bounded generate/validate/retry protocol.
///
/// The generator never hard-fails because tags were imperfect: after the
/// attempt budget is spent it returns whatever valid tags the last attempt
/// produced, possibly none. It fails only on transport or configuration
/// errors raised by the backend.
pub struct TagGenerator {
    provider: Arc<dyn TagProvider>,
}

impl TagGenerator {
    /// Creates a new `TagGenerator` backed by the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn TagProvider>) -> Self {
        Self { provider }
    }

    /// Generates a validated tag set for `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the backend is misconfigured or a
    /// request fails. Exhausting the retry budget is not an error.
    pub fn generate_tags(
        &self,
        text: &str,
        settings: &Settings,
    ) -> Result<Vec<String>, ProviderError> {
        self.generate_tags_observed(text, settings, |_| {})
    }

    /// Like [`generate_tags`](Self::generate_tags), invoking `on_attempt`
    /// with the attempt index at the start of each network attempt. Hosts use
    /// this to surface transient "generating tags..." status.
    pub fn generate_tags_observed(
        &self,
        text: &str,
        settings: &Settings,
        mut on_attempt: impl FnMut(u32),
    ) -> Result<Vec<String>, ProviderError> {
        let excerpt = truncate_chars(text, MAX_INPUT_CHARS);
        let mut survivors = Vec::new();

        for attempt in 0..MAX_ATTEMPTS {
            on_attempt(attempt);

            let template = if attempt == 0 {
                settings.prompt_template.as_str()
            } else {
                STRICT_PROMPT_TEMPLATE
            };
            let prompt = render_prompt(template, settings);

            let raw = self.provider.request_tags(excerpt, &prompt)?;
            debug!(attempt, candidates = raw.len(), "received tag candidates");

            let outcome = TagValidator::filter_erroneous(&raw, settings.max_words_per_tag);
            survivors = outcome.valid_tags;
            if !outcome.has_erroneous_tags {
                break;
            }
            warn!(attempt, "no usable tags in response");
        }

        // Truncation happens once, after the loop, keeping backend order.
        survivors.truncate(settings.max_tags);
        Ok(survivors)
    }
}

fn render_prompt(template: &str, settings: &Settings) -> String {
    template
        .replace("{{max_tags}}", &settings.max_tags.to_string())
        .replace("{{max_words}}", &settings.max_words_per_tag.to_string())
}

/// Truncates to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock provider that replays canned responses, one per attempt, and
    /// records the prompts and text it was given.
    struct ScriptedProvider {
        responses: Mutex<Vec<Result<Vec<String>, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
        texts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<Vec<String>, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
                texts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TagProvider for ScriptedProvider {
        fn request_tags(&self, text: &str, prompt: &str) -> Result<Vec<String>, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.texts.lock().unwrap().push(text.to_string());
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn owned(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn first_attempt_success_returns_immediately() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(owned(&["rust", "async"]))]));
        let generator = TagGenerator::new(provider.clone());

        let tags = generator
            .generate_tags("note text", &Settings::default())
            .expect("generate");
        assert_eq!(tags, vec!["rust", "async"]);
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn retry_uses_stricter_prompt() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(owned(&["a tag that is far too long to pass"])),
            Ok(owned(&["rust"])),
        ]));
        let generator = TagGenerator::new(provider.clone());

        let tags = generator
            .generate_tags("note text", &Settings::default())
            .expect("generate");
        assert_eq!(tags, vec!["rust"]);

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Suggest tags"));
        assert!(prompts[1].contains("EXACTLY"));
    }

    #[test]
    fn prompt_placeholders_are_substituted() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(owned(&["rust"]))]));
        let generator = TagGenerator::new(provider.clone());

        let mut settings = Settings::default();
        settings.max_tags = 7;
        settings.max_words_per_tag = 3;
        generator.generate_tags("note", &settings).expect("generate");

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("at most 7 tags"));
        assert!(prompts[0].contains("at most 3 words"));
        assert!(!prompts[0].contains("{{max_tags}}"));
    }

    #[test]
    fn exhausted_attempts_yield_empty_set_not_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(owned(&["way too many words in this tag"])),
            Ok(owned(&["still way too many words here"])),
        ]));
        let generator = TagGenerator::new(provider.clone());

        let mut settings = Settings::default();
        settings.max_words_per_tag = 2;
        let tags = generator.generate_tags("note", &settings).expect("generate");
        assert!(tags.is_empty());
        assert_eq!(provider.prompts.lock().unwrap().len(), MAX_ATTEMPTS as usize);
    }

    #[test]
    fn partial_success_does_not_retry() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(owned(&[
            "a tag with far too many words",
            "ok",
        ]))]));
        let generator = TagGenerator::new(provider.clone());

        let tags = generator
            .generate_tags("note", &Settings::default())
            .expect("generate");
        assert_eq!(tags, vec!["ok"]);
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn transport_errors_abort_the_loop() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Http {
            status: 500,
        })]));
        let generator = TagGenerator::new(provider);

        let result = generator.generate_tags("note", &Settings::default());
        assert!(matches!(result, Err(ProviderError::Http { status: 500 })));
    }

    #[test]
    fn truncation_to_max_tags_preserves_backend_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(owned(&[
            "zulu", "alpha", "mike", "echo",
        ]))]));
        let generator = TagGenerator::new(provider);

        let mut settings = Settings::default();
        settings.max_tags = 2;
        let tags = generator.generate_tags("note", &settings).expect("generate");
        assert_eq!(tags, vec!["zulu", "alpha"]);
    }

    #[test]
    fn input_text_is_capped_at_character_budget() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(owned(&["rust"]))]));
        let generator = TagGenerator::new(provider.clone());

        let long_text = "x".repeat(MAX_INPUT_CHARS + 500);
        generator
            .generate_tags(&long_text, &Settings::default())
            .expect("generate");

        let texts = provider.texts.lock().unwrap();
        assert_eq!(texts[0].chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn truncate_chars_respects_multibyte_boundaries() {
        let text = "日本語のメモ".repeat(1000);
        let truncated = truncate_chars(&text, MAX_INPUT_CHARS);
        assert_eq!(truncated.chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn attempt_events_are_observable() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(owned(&["far too many words in this one"])),
            Ok(owned(&["rust"])),
        ]));
        let generator = TagGenerator::new(provider);

        let mut attempts = Vec::new();
        generator
            .generate_tags_observed("note", &Settings::default(), |attempt| {
                attempts.push(attempt);
            })
            .expect("generate");
        assert_eq!(attempts, vec![0, 1]);
    }
}
