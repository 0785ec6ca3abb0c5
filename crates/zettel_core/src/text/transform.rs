//! Tag-line, title and cross-reference transforms.
//!
//! Bodies are treated line by line after trailing whitespace is dropped, so a
//! body saved with a final newline behaves like the same body without it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Maximum title length in characters used by listings.
pub const DEFAULT_TITLE_LENGTH: usize = 40;

/// Link scheme emitted for `#<digits>` references and resolved by the renderer.
pub const NOTE_REF_SCHEME: &str = "note-ref:";

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("valid token regex"));
static CROSS_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9]+)$").expect("valid cross-reference regex"));

/// Extracts tag names from the trailing tag line of `body`.
///
/// Only the last line of a multi-line body is inspected. Each
/// whitespace-delimited token starting with `#` yields its name without the
/// prefix, in line order. Single-line bodies never carry tags.
pub fn extract_tags(body: &str) -> Vec<String> {
    let lines = body_lines(body);
    let Some((last, rest)) = lines.split_last() else {
        return Vec::new();
    };
    if rest.is_empty() {
        return Vec::new();
    }

    last.split_whitespace()
        .filter_map(|token| token.strip_prefix('#'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the tag set written to storage: extracted, sorted, de-duplicated.
///
/// Names are compared byte-wise, so `Work` and `work` stay distinct.
pub fn persisted_tags(body: &str) -> Vec<String> {
    extract_tags(body)
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Computes a plain-text display title of at most `max_len` characters.
///
/// The title is the first line when it ends within `max_len` characters,
/// otherwise the first `max_len` characters. Markdown heading markers at the
/// start and every `[`/`]` are removed, then surrounding whitespace trimmed.
pub fn compute_title(body: &str, max_len: usize) -> String {
    let head: String = body.chars().take(max_len).collect();
    let first_line = match head.find('\n') {
        Some(index) => &head[..index],
        None => head.as_str(),
    };

    first_line
        .trim_start()
        .trim_start_matches('#')
        .replace(['[', ']'], "")
        .trim()
        .to_string()
}

/// [`compute_title`] with [`DEFAULT_TITLE_LENGTH`].
pub fn title(body: &str) -> String {
    compute_title(body, DEFAULT_TITLE_LENGTH)
}

/// Drops the trailing tag line when the body has more than one line and its
/// last line starts with `#`.
pub fn strip_tag_line(body: &str) -> Cow<'_, str> {
    let lines = body_lines(body);
    match lines.split_last() {
        Some((last, rest)) if !rest.is_empty() && last.starts_with('#') => {
            Cow::Owned(rest.join("\n"))
        }
        _ => Cow::Borrowed(body),
    }
}

/// Rewrites whitespace-bounded `#<digits>` tokens into markdown links
/// targeting [`NOTE_REF_SCHEME`].
///
/// Callers pass only non-final lines; see [`prepare_for_render`].
pub fn rewrite_cross_references(text: &str) -> String {
    TOKEN_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let token = &caps[0];
            match CROSS_REF_RE.captures(token) {
                Some(reference) => {
                    let id = &reference[1];
                    format!("[{id}]({NOTE_REF_SCHEME}{id})")
                }
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// Read pipeline before markdown: tag line removed, cross-references linked.
///
/// The final line of a multi-line body belongs to tags, so it is never
/// rewritten even when it is kept for display.
pub fn prepare_for_render(body: &str) -> String {
    let lines = body_lines(body);
    match lines.split_last() {
        Some((last, rest)) if !rest.is_empty() => {
            let prose = rewrite_cross_references(&rest.join("\n"));
            if last.starts_with('#') {
                prose
            } else {
                format!("{prose}\n{last}")
            }
        }
        _ => rewrite_cross_references(body),
    }
}

fn body_lines(body: &str) -> Vec<&str> {
    body.trim_end().lines().collect()
}

#[cfg(test)]
mod tests {
    use super::{
        compute_title, extract_tags, persisted_tags, prepare_for_render,
        rewrite_cross_references, strip_tag_line, title,
    };

    #[test]
    fn extract_tags_reads_only_last_line() {
        assert_eq!(extract_tags("body #inline\n#a #b"), vec!["a", "b"]);
        assert_eq!(
            extract_tags("first\nsecond\nwords #x more #y"),
            vec!["x", "y"]
        );
    }

    #[test]
    fn extract_tags_ignores_single_line_bodies() {
        assert!(extract_tags("#a #b").is_empty());
        assert!(extract_tags("").is_empty());
        assert!(extract_tags("#a\n\n  ").is_empty());
    }

    #[test]
    fn extract_tags_keeps_case_order_and_numeric_names() {
        assert_eq!(
            extract_tags("title\n#Work #work #123"),
            vec!["Work", "work", "123"]
        );
    }

    #[test]
    fn extract_tags_skips_bare_hash_and_ignores_trailing_newline() {
        assert_eq!(extract_tags("title\n# #a\n"), vec!["a"]);
        assert_eq!(extract_tags("title\r\n#a #b\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn persisted_tags_sorts_and_dedups() {
        assert_eq!(
            persisted_tags("Buy milk\n#home #errand #home"),
            vec!["errand", "home"]
        );
    }

    #[test]
    fn title_strips_heading_marker_and_whitespace() {
        assert_eq!(compute_title("# Hello\nworld", 40), "Hello");
        assert_eq!(title("## [Link] text  \nrest"), "Link text");
        assert_eq!(title("Buy milk\n#errand #home"), "Buy milk");
    }

    #[test]
    fn title_truncates_by_characters() {
        let body = "é".repeat(50);
        assert_eq!(title(&body).chars().count(), 40);
        assert_eq!(compute_title("abcdef\nghi", 3), "abc");
        assert_eq!(title(""), "");
    }

    #[test]
    fn strip_tag_line_removes_trailing_tag_line() {
        assert_eq!(strip_tag_line("line one\nline two\n#a #b"), "line one\nline two");
        assert_eq!(strip_tag_line("line one\n#a\n\n"), "line one");
    }

    #[test]
    fn strip_tag_line_keeps_single_line_and_prose_endings() {
        assert_eq!(strip_tag_line("#only"), "#only");
        assert_eq!(strip_tag_line("one\ntwo #a"), "one\ntwo #a");
    }

    #[test]
    fn cross_references_become_note_links() {
        assert_eq!(
            rewrite_cross_references("see #42 for details\n#tag"),
            "see [42](note-ref:42) for details\n#tag"
        );
        assert_eq!(
            rewrite_cross_references("#7\tand #8x and (#9)"),
            "[7](note-ref:7)\tand #8x and (#9)"
        );
    }

    #[test]
    fn numeric_tag_on_last_line_is_not_linked() {
        let prepared = prepare_for_render("see #42\n#123");
        assert_eq!(prepared, "see [42](note-ref:42)");
        assert_eq!(extract_tags("see #42\n#123"), vec!["123"]);
    }

    #[test]
    fn final_prose_line_keeps_its_tags_unlinked() {
        let body = "see #42\nrelated #7";
        assert_eq!(prepare_for_render(body), "see [42](note-ref:42)\nrelated #7");
        assert_eq!(extract_tags(body), vec!["7"]);
    }

    #[test]
    fn single_line_body_is_all_prose() {
        assert_eq!(prepare_for_render("see #42"), "see [42](note-ref:42)");
    }
}
