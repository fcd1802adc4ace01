//! Escaping of text which would otherwise be read back as markdown syntax.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static MD_CHARS_MATCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\\\[\]\(\)])").unwrap());

static MD_CHARS_MATCHER_ALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([`\*_{}\[\]\(\)#!])").unwrap());

// The trailing group stands in for a lookahead and is put back unchanged.
static MD_DOT_MATCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(\s*\d+)(\.)(\s)").unwrap());

static MD_PLUS_MATCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(\s*)(\+)(\s)").unwrap());

static MD_DASH_MATCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(\s*)(-)(\s|-)").unwrap());

/// Characters which make a preceding backslash significant.
const MD_BACKSLASH_FOLLOWERS: &str = "\\`*_{}[]()#+-.!";

/// Absolute URLs, as accepted for autolinks.
pub(crate) static ABSOLUTE_URL_MATCHER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z+]+://").unwrap());

/// Escape the characters which are never safe inside link text or targets.
pub fn escape_md(text: &str) -> String {
    MD_CHARS_MATCHER.replace_all(text, r"\${1}").into_owned()
}

/// Escape a run of document text.
///
/// Backslashes that would combine with the following character are doubled
/// first, so the escapes inserted afterwards are not themselves escaped. With
/// `snob` set every markdown-special character is escaped; otherwise only
/// line starts which would read as list items are.
pub fn escape_md_section(text: &str, snob: bool) -> String {
    let mut text = escape_backslashes(text);
    if snob {
        text = Cow::Owned(MD_CHARS_MATCHER_ALL.replace_all(&text, r"\${1}").into_owned());
    }
    let text = MD_DOT_MATCHER.replace_all(&text, r"${1}\${2}${3}");
    let text = MD_PLUS_MATCHER.replace_all(&text, r"${1}\${2}${3}");
    let text = MD_DASH_MATCHER.replace_all(&text, r"${1}\${2}${3}");
    text.into_owned()
}

fn escape_backslashes(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    let mut result = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        result.push(c);
        if c == '\\' && chars.peek().is_some_and(|next| MD_BACKSLASH_FOLLOWERS.contains(*next)) {
            result.push('\\');
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backslashes(s: &str) -> usize {
        s.matches('\\').count()
    }

    #[test]
    fn test_escape_md() {
        assert_eq!(escape_md("http://x/(a)[b]"), r"http://x/\(a\)\[b\]");
        assert_eq!(escape_md(r"a\b"), r"a\\b");
        assert_eq!(escape_md("*plain_"), "*plain_");
    }

    #[test]
    fn test_list_like_lines() {
        assert_eq!(escape_md_section("1. one", false), r"1\. one");
        assert_eq!(escape_md_section("  12. twelve", false), r"  12\. twelve");
        assert_eq!(escape_md_section("+ plus", false), r"\+ plus");
        assert_eq!(escape_md_section("- dash", false), r"\- dash");
        assert_eq!(escape_md_section("--", false), r"\--");
        assert_eq!(escape_md_section("a\n- b\n2. c", false), "a\n\\- b\n2\\. c");
        // Not at the start of a line.
        assert_eq!(escape_md_section("x 1. y - z", false), "x 1. y - z");
        assert_eq!(escape_md_section("1.5", false), "1.5");
    }

    #[test]
    fn test_backslashes() {
        assert_eq!(escape_md_section(r"a\*b", false), r"a\\*b");
        assert_eq!(escape_md_section(r"a\b", false), r"a\b");
        assert_eq!(escape_md_section(r"\\", false), r"\\\");
    }

    #[test]
    fn test_snob() {
        assert_eq!(escape_md_section("*a* _b_ `c` #d", true), r"\*a\* \_b\_ \`c\` \#d");
        assert_eq!(escape_md_section("*a*", false), "*a*");
    }

    #[test]
    fn test_no_runaway_escaping() {
        for text in ["1. one\n- two\n+ three", "plain text", "-- x\n 3. y", "- - -"] {
            let once = escape_md_section(text, false);
            let twice = escape_md_section(&once, false);
            let added_first = backslashes(&once) - backslashes(text);
            let added_second = backslashes(&twice) - backslashes(&once);
            assert!(added_second <= added_first, "{:?}: {} > {}", text, added_second, added_first);
        }
    }
}
