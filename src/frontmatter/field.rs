use crate::settings::CaseFormat;
use crate::tags::TagFormatter;

/// The textual extent of a tags field inside a frontmatter block, plus the
/// values parsed from it.
///
/// `start..end` are byte offsets relative to the block text. `end` always
/// sits on a line boundary (past the trailing newline of the last field
/// line, or at the end of the block), so splicing a serialized replacement
/// into the range keeps the block line-aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagsField {
    pub start: usize,
    pub end: usize,
    pub values: Vec<String>,
}

/// Locates and parses the `tags:` field within a frontmatter block.
///
/// Tries the three shapes the system produces or commonly meets in
/// hand-edited files, in order:
///
/// 1. YAML list: a bare `tags:` line followed by `- value` lines
/// 2. Inline array: `tags: [a, b]`
/// 3. Single scalar: `tags: v`
///
/// The field's extent is bounded by a line scanner, not a single-line match:
/// in list form, continuation lines are consumed until a non-list line (a new
/// `key:` line or the end of the block). Returns `None` when the block has no
/// `tags:` key.
pub(crate) fn find_tags_field(block: &str) -> Option<TagsField> {
    let mut pos = 0;

    while pos < block.len() {
        let line_end = line_end_after(block, pos);
        let line = block[pos..line_end].trim_end_matches(['\n', '\r']);

        let Some(rest) = line.strip_prefix("tags:") else {
            pos = line_end;
            continue;
        };
        let rest = rest.trim();

        if rest.is_empty() {
            // List form: consume `- value` continuation lines.
            let mut values = Vec::new();
            let mut end = line_end;
            let mut cursor = line_end;
            while cursor < block.len() {
                let next_end = line_end_after(block, cursor);
                let next = block[cursor..next_end].trim();
                let Some(item) = next.strip_prefix('-') else {
                    break;
                };
                let value = unquote(item);
                if !value.is_empty() {
                    values.push(value.to_string());
                }
                end = next_end;
                cursor = next_end;
            }
            return Some(TagsField {
                start: pos,
                end,
                values,
            });
        }

        let values = if rest.starts_with('[') && rest.ends_with(']') {
            // Inline-array form.
            rest[1..rest.len() - 1]
                .split(',')
                .map(unquote)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect()
        } else {
            // Single-scalar form.
            vec![unquote(rest).to_string()]
        };

        return Some(TagsField {
            start: pos,
            end: line_end,
            values,
        });
    }

    None
}

/// Serializes a tag set in the canonical YAML-list form, one `- value` line
/// per tag, ending with a newline.
///
/// Values are formatted per `case_format` and only quoted when YAML would
/// otherwise misread them: a contained colon, a leading dash, or the literal
/// scalars `null`/`true`/`false`.
#[must_use]
pub fn serialize_tags(tags: &[String], case_format: CaseFormat) -> String {
    let mut out = String::from("tags:\n");
    for tag in tags {
        let value = TagFormatter::format_tag(tag, case_format);
        if value.is_empty() {
            continue;
        }
        if needs_quoting(&value) {
            out.push_str("- \"");
            out.push_str(&value);
            out.push_str("\"\n");
        } else {
            out.push_str("- ");
            out.push_str(&value);
            out.push('\n');
        }
    }
    out
}

fn needs_quoting(value: &str) -> bool {
    value.contains(':')
        || value.starts_with('-')
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("false")
}

/// End offset of the line starting at `pos`, past its newline if present.
pub(crate) fn line_end_after(text: &str, pos: usize) -> usize {
    match text[pos..].find('\n') {
        Some(i) => pos + i + 1,
        None => text.len(),
    }
}

/// Trims a scalar value and strips one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    let v = value.trim();
    let bytes = v.as_bytes();
    if v.len() >= 2 {
        let (first, last) = (bytes[0], bytes[v.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return v[1..v.len() - 1].trim();
        }
    }
    v
}
