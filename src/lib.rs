pub mod extract;
pub mod frontmatter;
pub mod provider;
pub mod service;
pub mod settings;
pub mod tags;

pub use extract::{ExtractError, PlainTextExtractor, TextExtractor};
pub use frontmatter::{merge_tags, serialize_tags, MergeOptions};
pub use provider::{ProviderError, ProviderKind, TagProvider};
pub use service::{
    DocumentStore, FsStore, ManualTagSource, TagReport, TaggingError, TaggingService,
};
pub use settings::{CaseFormat, LanguagePreference, MergeMode, Settings};
pub use tags::{SpellingNormalizer, TagFormatter, TagGenerator, TagValidator};
