//! Frontmatter tag-merge engine.
//!
//! The merge is the heart of the plugin: it parses whatever metadata block a
//! document already carries (absent, malformed, YAML-list, inline-array or
//! single-scalar tag field), reconciles it against a freshly generated tag
//! set under the configured append/replace policy, de-duplicates case- and
//! regional-spelling-insensitively, and re-serializes a byte-for-byte
//! predictable result. It degrades rather than fails: malformed input is
//! treated as absent, never as an error.
//!
//! # Examples
//!
//! ```
//! use notetag::frontmatter::{merge_tags, MergeOptions};
//! use notetag::settings::{CaseFormat, LanguagePreference, MergeMode};
//!
//! let options = MergeOptions::new(
//!     CaseFormat::Lowercase,
//!     MergeMode::Append,
//!     LanguagePreference::Us,
//! );
//! let merged = merge_tags(
//!     "---\ntitle: X\n---\nbody\n",
//!     &["Cat".to_string(), "Dog".to_string()],
//!     &options,
//! );
//! assert_eq!(merged, "---\ntitle: X\ntags:\n- cat\n- dog\n---\nbody\n");
//! ```

mod field;
mod merger;

pub use field::serialize_tags;
pub use merger::{merge_tags, MergeOptions};
