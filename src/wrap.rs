//! Optional paragraph wrapping of the rendered text.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

static ORDERED_LIST_MATCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s").unwrap());
static UNORDERED_LIST_MATCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-\*\+]\s").unwrap());

/// Whether a line must be left alone: code blocks and list items.
fn skipwrap(para: &str) -> bool {
    if para.starts_with("    ") || para.starts_with('\t') {
        return true;
    }
    let stripped = para.trim_start();
    // A leading `--` is an em-dash, and is wrapped.
    if stripped.starts_with("--") && stripped.len() > 2 && !stripped[2..].starts_with('-') {
        return false;
    }
    if stripped.starts_with('-') || stripped.starts_with('*') {
        return true;
    }
    ORDERED_LIST_MATCHER.is_match(stripped) || UNORDERED_LIST_MATCHER.is_match(stripped)
}

/// Byte offset of the longest prefix of `word` no wider than `room`.
fn split_at_width(word: &str, room: usize) -> usize {
    let mut width = 0;
    for (idx, c) in word.char_indices() {
        width += c.width().unwrap_or(0);
        if width > room {
            return idx;
        }
    }
    word.len()
}

/// Greedily fill lines of at most `width` columns, keeping the leading
/// indent and splitting words which can't fit on a line of their own.
fn wrap_paragraph(para: &str, width: usize) -> Vec<String> {
    let body = para.trim_start();
    let mut lines = Vec::new();
    let mut line = para[..para.len() - body.len()].to_string();
    let mut line_width = line.width();
    let mut has_words = false;

    for word in body.split_whitespace() {
        let mut word = word;
        let mut word_width = word.width();
        if has_words {
            if line_width + 1 + word_width <= width {
                line.push(' ');
                line_width += 1;
            } else {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
                has_words = false;
            }
        }
        while line_width + word_width > width {
            let mut split = split_at_width(word, width.saturating_sub(line_width));
            if split == 0 {
                if line_width > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_width = 0;
                    continue;
                }
                // Not even one character fits; take it anyway.
                split = word.chars().next().map_or(word.len(), char::len_utf8);
            }
            let (head, tail) = word.split_at(split);
            line.push_str(head);
            lines.push(std::mem::take(&mut line));
            line_width = 0;
            word = tail;
            word_width = word.width();
        }
        if !word.is_empty() {
            line.push_str(word);
            line_width += word_width;
            has_words = true;
        }
    }
    if !line.trim().is_empty() {
        lines.push(line);
    }
    lines
}

/// Wrap all paragraphs in `text` to `width` columns.
///
/// Each non-empty line is a paragraph. Wrapped paragraphs are followed by a
/// blank line unless they end in a hard break (two spaces); runs of blank
/// lines are limited to one. Lines containing only whitespace are dropped.
pub fn optwrap(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    let mut result = String::with_capacity(text.len() + text.len() / width.max(1));
    let mut newlines = 0;
    for para in text.split('\n') {
        if para.is_empty() {
            if newlines < 2 {
                result.push('\n');
                newlines += 1;
            }
        } else if para.trim().is_empty() {
            continue;
        } else if !skipwrap(para) {
            result.push_str(&wrap_paragraph(para, width).join("\n"));
            if para.ends_with("  ") {
                result.push_str("  \n");
                newlines = 1;
            } else {
                result.push_str("\n\n");
                newlines = 2;
            }
        } else {
            result.push_str(para);
            result.push('\n');
            newlines = 1;
        }
    }
    result
}
