//! A tolerant, streaming tag-soup tokenizer.
//!
//! The tokenizer doesn't build a tree: it reports start tags, end tags,
//! text and references to a [`TokenSink`] in document order, and never
//! fails. Anything which isn't recognisable markup is passed on as text.
//!
//! The bodies of `<script>` and `<style>` are raw text and are reported
//! verbatim up to the matching end tag.

use memchr::{memchr, memchr2};

use crate::entities;

/// An escaped end-of-script marker which shows up in inline scripts
/// (`"</' + 'script>"`). It's rewritten before tokenizing so that it can't
/// close the script early.
const SCRIPT_END_MARKER: &str = "</' + 'script>";
const SCRIPT_END_REPLACEMENT: &str = "</ignore>";

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

/// Receiver for tokenizer events.
pub trait TokenSink {
    /// An opening tag. The name is lower case.
    fn handle_starttag(&mut self, name: &str, attrs: Attributes);
    /// A closing tag. The name is lower case.
    fn handle_endtag(&mut self, name: &str);
    /// Character data, with references still in place.
    fn handle_data(&mut self, data: &str);
    /// A numeric reference; `name` is the part after `&#`, e.g. `65` or `x41`.
    fn handle_charref(&mut self, name: &str);
    /// A named reference, without the `&` and `;`.
    fn handle_entityref(&mut self, name: &str);
    /// A comment.
    fn handle_comment(&mut self, _data: &str) {}
    /// A `<!...>` declaration or CDATA section.
    fn unknown_decl(&mut self, _data: &str) {}
}

/// The attributes of a start tag.
///
/// The ones the renderer looks at have their own fields; everything else is
/// kept in `other`. A repeated attribute keeps its last value. An attribute
/// given without a value is `None`, the same as an absent one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    /// `href`, for links.
    pub href: Option<String>,
    /// `title`, for links.
    pub title: Option<String>,
    /// `src`, for images.
    pub src: Option<String>,
    /// `alt`, for images.
    pub alt: Option<String>,
    /// `width`, for images.
    pub width: Option<String>,
    /// `height`, for images.
    pub height: Option<String>,
    /// `start`, for ordered lists.
    pub start: Option<String>,
    /// `class`.
    pub class: Option<String>,
    /// The inline `style`.
    pub style: Option<String>,
    /// Any other attributes, in document order.
    pub other: Vec<(String, Option<String>)>,
}

impl Attributes {
    /// Set an attribute by (lower case) name.
    pub fn set(&mut self, name: &str, value: Option<String>) {
        let slot = match name {
            "href" => &mut self.href,
            "title" => &mut self.title,
            "src" => &mut self.src,
            "alt" => &mut self.alt,
            "width" => &mut self.width,
            "height" => &mut self.height,
            "start" => &mut self.start,
            "class" => &mut self.class,
            "style" => &mut self.style,
            _ => {
                match self.other.iter_mut().find(|(n, _)| n == name) {
                    Some(entry) => entry.1 = value,
                    None => self.other.push((name.to_string(), value)),
                }
                return;
            }
        };
        *slot = value;
    }

    /// Look up an attribute by (lower case) name.
    pub fn get(&self, name: &str) -> Option<&str> {
        let slot = match name {
            "href" => &self.href,
            "title" => &self.title,
            "src" => &self.src,
            "alt" => &self.alt,
            "width" => &self.width,
            "height" => &self.height,
            "start" => &self.start,
            "class" => &self.class,
            "style" => &self.style,
            _ => {
                return self
                    .other
                    .iter()
                    .find(|(n, _)| n == name)
                    .and_then(|(_, v)| v.as_deref())
            }
        };
        slot.as_deref()
    }
}

enum Step {
    /// The construct was handled; skip this many bytes.
    Consumed(usize),
    /// Not markup after all; pass this many bytes on as text.
    Literal(usize),
    /// The construct is cut off at the end of the buffer.
    NeedMore,
}

/// Streaming tokenizer state.
///
/// Feed input in as many pieces as convenient with [`feed`](Tokenizer::feed),
/// then call [`close`](Tokenizer::close). A construct which is cut off at the
/// end of a piece is held back until more input arrives; at `close` it is
/// passed on as text.
#[derive(Debug, Default)]
pub struct Tokenizer {
    pending: String,
    raw_text: Option<String>,
}

impl Tokenizer {
    /// Create a tokenizer.
    pub fn new() -> Tokenizer {
        Default::default()
    }

    /// Tokenize another piece of input.
    pub fn feed<S: TokenSink + ?Sized>(&mut self, chunk: &str, sink: &mut S) {
        self.pending.push_str(chunk);
        self.run(sink, false);
    }

    /// Flush whatever input is left.
    pub fn close<S: TokenSink + ?Sized>(&mut self, sink: &mut S) {
        self.run(sink, true);
    }

    fn run<S: TokenSink + ?Sized>(&mut self, sink: &mut S, eof: bool) {
        let buf = std::mem::take(&mut self.pending).replace(SCRIPT_END_MARKER, SCRIPT_END_REPLACEMENT);
        let mut pos = 0;
        while pos < buf.len() {
            let rest = &buf[pos..];
            if let Some(tag) = &self.raw_text {
                match find_raw_text_end(rest, tag) {
                    Some(0) => self.raw_text = None,
                    Some(end) => {
                        sink.handle_data(&rest[..end]);
                        pos += end;
                        self.raw_text = None;
                    }
                    None if eof => {
                        sink.handle_data(rest);
                        pos = buf.len();
                    }
                    None => {
                        // Hold back a possible partial end tag.
                        let safe = rest.rfind('<').unwrap_or(rest.len());
                        if safe > 0 {
                            sink.handle_data(&rest[..safe]);
                        }
                        pos += safe;
                        break;
                    }
                }
                continue;
            }

            let next = memchr2(b'<', b'&', rest.as_bytes()).unwrap_or(rest.len());
            if next > 0 {
                sink.handle_data(&rest[..next]);
                pos += next;
                continue;
            }
            let step = if rest.starts_with('<') {
                self.markup(rest, sink, eof)
            } else {
                reference(rest, sink, eof)
            };
            match step {
                Step::Consumed(len) => pos += len,
                Step::Literal(len) => {
                    sink.handle_data(&rest[..len]);
                    pos += len;
                }
                Step::NeedMore => break,
            }
        }
        self.pending = buf[pos..].to_string();
    }

    fn markup<S: TokenSink + ?Sized>(&mut self, rest: &str, sink: &mut S, eof: bool) -> Step {
        let bytes = rest.as_bytes();
        if bytes.len() < 2 {
            return if eof { Step::Literal(1) } else { Step::NeedMore };
        }
        if rest.starts_with(COMMENT_START) {
            let body = &rest[COMMENT_START.len()..];
            return match body.find(COMMENT_END) {
                Some(end) => {
                    sink.handle_comment(&body[..end]);
                    Step::Consumed(COMMENT_START.len() + end + COMMENT_END.len())
                }
                None if eof => {
                    sink.handle_comment(body);
                    Step::Consumed(rest.len())
                }
                None => Step::NeedMore,
            };
        }
        if rest.starts_with(CDATA_START) {
            let body = &rest[CDATA_START.len()..];
            return match body.find(CDATA_END) {
                Some(end) => {
                    sink.unknown_decl(&body[..end]);
                    Step::Consumed(CDATA_START.len() + end + CDATA_END.len())
                }
                None if eof => {
                    sink.unknown_decl(body);
                    Step::Consumed(rest.len())
                }
                None => Step::NeedMore,
            };
        }
        match bytes[1] {
            b'!' | b'?' => match memchr(b'>', bytes) {
                Some(end) => {
                    if bytes[1] == b'!' {
                        sink.unknown_decl(&rest[2..end]);
                    }
                    Step::Consumed(end + 1)
                }
                None if eof => Step::Consumed(rest.len()),
                None => Step::NeedMore,
            },
            b'/' => end_tag(rest, sink, eof),
            c if c.is_ascii_alphabetic() => match parse_start_tag(rest) {
                Some((tag, len)) => {
                    html_trace_quiet!("start tag <{}> {:?}", tag.name, tag.attrs);
                    let name = tag.name;
                    sink.handle_starttag(&name, tag.attrs);
                    if tag.self_closing {
                        sink.handle_endtag(&name);
                    } else if name == "script" || name == "style" {
                        self.raw_text = Some(name);
                    }
                    Step::Consumed(len)
                }
                None if eof => Step::Literal(rest.len()),
                None => Step::NeedMore,
            },
            _ => Step::Literal(1),
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

fn end_tag<S: TokenSink + ?Sized>(rest: &str, sink: &mut S, eof: bool) -> Step {
    let bytes = rest.as_bytes();
    let close = memchr(b'>', bytes);
    match (bytes.get(2), close) {
        (None, _) => {
            if eof {
                Step::Literal(rest.len())
            } else {
                Step::NeedMore
            }
        }
        (Some(b'>'), _) => Step::Consumed(3),
        (Some(c), Some(end)) if c.is_ascii_alphabetic() => {
            let name_len = bytes[2..end].iter().take_while(|b| is_name_byte(**b)).count();
            let name = rest[2..2 + name_len].to_ascii_lowercase();
            html_trace_quiet!("end tag </{}>", name);
            sink.handle_endtag(&name);
            Step::Consumed(end + 1)
        }
        (Some(c), None) if c.is_ascii_alphabetic() => {
            if eof {
                Step::Literal(rest.len())
            } else {
                Step::NeedMore
            }
        }
        // `</` followed by junk is a bogus comment.
        (Some(_), Some(end)) => {
            sink.handle_comment(&rest[2..end]);
            Step::Consumed(end + 1)
        }
        (Some(_), None) => {
            if eof {
                sink.handle_comment(&rest[2..]);
                Step::Consumed(rest.len())
            } else {
                Step::NeedMore
            }
        }
    }
}

struct StartTag {
    name: String,
    attrs: Attributes,
    self_closing: bool,
}

/// Parse a start tag at the beginning of `text`, returning it and its
/// length, or `None` if the input ends first.
fn parse_start_tag(text: &str) -> Option<(StartTag, usize)> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut i = 1;
    while i < len && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = text[1..i].to_ascii_lowercase();
    let mut attrs = Attributes::default();

    let skip_whitespace = |i: &mut usize| {
        while *i < len && bytes[*i].is_ascii_whitespace() {
            *i += 1;
        }
    };

    loop {
        skip_whitespace(&mut i);
        match bytes.get(i)? {
            b'>' => {
                let tag = StartTag {
                    name,
                    attrs,
                    self_closing: false,
                };
                return Some((tag, i + 1));
            }
            b'/' => {
                if *bytes.get(i + 1)? == b'>' {
                    let tag = StartTag {
                        name,
                        attrs,
                        self_closing: true,
                    };
                    return Some((tag, i + 2));
                }
                i += 1;
                continue;
            }
            b'=' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let start = i;
        while i < len && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'>' | b'/') {
            i += 1;
        }
        let attr_name = text[start..i].to_ascii_lowercase();
        skip_whitespace(&mut i);
        if *bytes.get(i)? != b'=' {
            attrs.set(&attr_name, None);
            continue;
        }
        i += 1;
        skip_whitespace(&mut i);
        let value = match *bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                let close = memchr(quote, &bytes[i + 1..])?;
                let value = &text[i + 1..i + 1 + close];
                i += close + 2;
                value
            }
            _ => {
                let start = i;
                while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                if i == len {
                    return None;
                }
                &text[start..i]
            }
        };
        attrs.set(&attr_name, Some(entities::unescape(value, true)));
    }
}

/// Find the end tag closing a raw text element, as an offset into `text`.
fn find_raw_text_end(text: &str, tag: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let tag = tag.as_bytes();
    let mut i = 0;
    while let Some(rel) = memchr(b'<', &bytes[i..]) {
        i += rel;
        let name_start = i + 2;
        let name_end = name_start + tag.len();
        if bytes.get(i + 1) == Some(&b'/')
            && bytes.len() > name_end
            && bytes[name_start..name_end].eq_ignore_ascii_case(tag)
            && (bytes[name_end].is_ascii_whitespace() || matches!(bytes[name_end], b'/' | b'>'))
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn reference<S: TokenSink + ?Sized>(rest: &str, sink: &mut S, eof: bool) -> Step {
    let bytes = rest.as_bytes();
    let len = bytes.len();
    let incomplete = |eof: bool| if eof { Step::Literal(1) } else { Step::NeedMore };

    if len == 1 {
        return incomplete(eof);
    }
    if bytes[1] == b'#' {
        let (digits, hex) = match bytes.get(2) {
            Some(b'x' | b'X') => (3, true),
            Some(_) => (2, false),
            None => return incomplete(eof),
        };
        let mut i = digits;
        while i < len && (if hex { bytes[i].is_ascii_hexdigit() } else { bytes[i].is_ascii_digit() }) {
            i += 1;
        }
        if i == len && !eof {
            return Step::NeedMore;
        }
        if i == digits {
            return Step::Literal(1);
        }
        sink.handle_charref(&rest[2..i]);
        if bytes.get(i) == Some(&b';') {
            i += 1;
        }
        return Step::Consumed(i);
    }

    let mut i = 1;
    while i < len && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == len && !eof {
        return Step::NeedMore;
    }
    if i == 1 {
        return Step::Literal(1);
    }
    let name = &rest[1..i];
    if bytes.get(i) == Some(&b';') {
        sink.handle_entityref(name);
        Step::Consumed(i + 1)
    } else if entities::name_to_codepoint(name).is_some() {
        sink.handle_entityref(name);
        Step::Consumed(i)
    } else {
        Step::Literal(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TokenSink for Recorder {
        fn handle_starttag(&mut self, name: &str, attrs: Attributes) {
            let mut event = format!("<{}", name);
            for key in ["href", "title", "src", "alt", "class", "style"] {
                if let Some(value) = attrs.get(key) {
                    event.push_str(&format!(" {}={:?}", key, value));
                }
            }
            for (key, value) in &attrs.other {
                event.push_str(&format!(" {}={:?}", key, value));
            }
            event.push('>');
            self.events.push(event);
        }
        fn handle_endtag(&mut self, name: &str) {
            self.events.push(format!("</{}>", name));
        }
        fn handle_data(&mut self, data: &str) {
            // Merge adjacent text to keep expectations independent of chunking.
            match self.events.last_mut() {
                Some(last) if last.starts_with('"') => {
                    last.pop();
                    last.push_str(data);
                    last.push('"');
                }
                _ => self.events.push(format!("\"{}\"", data)),
            }
        }
        fn handle_charref(&mut self, name: &str) {
            self.events.push(format!("&#{}", name));
        }
        fn handle_entityref(&mut self, name: &str) {
            self.events.push(format!("&{}", name));
        }
        fn handle_comment(&mut self, data: &str) {
            self.events.push(format!("<!--{}-->", data));
        }
    }

    fn tokenize_chunks(chunks: &[&str]) -> Vec<String> {
        let mut tokenizer = Tokenizer::new();
        let mut sink = Recorder::default();
        for chunk in chunks {
            tokenizer.feed(chunk, &mut sink);
        }
        tokenizer.close(&mut sink);
        sink.events
    }

    fn tokenize(html: &str) -> Vec<String> {
        tokenize_chunks(&[html])
    }

    #[test]
    fn test_tags_and_text() {
        assert_eq!(
            tokenize(r#"<P Class="x">Hi <B>there</b></p>"#),
            vec![r#"<p class="x">"#, "\"Hi \"", "<b>", "\"there\"", "</b>", "</p>"]
        );
    }

    #[test]
    fn test_attributes() {
        assert_eq!(
            tokenize(r#"<a href='/x?a=1&amp;b=2' title=t data-n=3 hidden>"#),
            vec![r#"<a href="/x?a=1&b=2" title="t" data-n=Some("3") hidden=None>"#]
        );
        // Last one wins.
        assert_eq!(tokenize(r#"<img src="a" src="b">"#), vec![r#"<img src="b">"#]);
    }

    #[test]
    fn test_self_closing() {
        assert_eq!(tokenize("<br/><hr />"), vec!["<br>", "</br>", "<hr>", "</hr>"]);
    }

    #[test]
    fn test_references() {
        assert_eq!(
            tokenize("a&amp;b&#65;&#x42;c&copy d&bogus e& f"),
            vec!["\"a\"", "&amp", "\"b\"", "&#65", "&#x42", "\"c\"", "&copy", "\" d&bogus e& f\""]
        );
        assert_eq!(tokenize("&#;"), vec!["\"&#;\""]);
    }

    #[test]
    fn test_raw_text() {
        assert_eq!(
            tokenize("<script>if (a<b) { x = '</p>'; }</SCRIPT >after"),
            vec!["<script>", "\"if (a<b) { x = '</p>'; }\"", "</script>", "\"after\""]
        );
        assert_eq!(
            tokenize("<script>document.write('</' + 'script>');</script>"),
            vec!["<script>", "\"document.write('</ignore>');\"", "</script>"]
        );
    }

    #[test]
    fn test_comments_and_declarations() {
        assert_eq!(
            tokenize("<!DOCTYPE html><!-- c -->x<?php ?>y</ 3>"),
            vec!["<!-- c -->", "\"xy\"", "<!-- 3-->"]
        );
        assert_eq!(tokenize("a</>b"), vec!["\"ab\""]);
    }

    #[test]
    fn test_not_markup() {
        assert_eq!(tokenize("1 < 2 <3"), vec!["\"1 < 2 <3\""]);
        assert_eq!(tokenize(r#"x <a href="y"#), vec![r#""x <a href="y""#]);
        assert_eq!(tokenize("x</b"), vec!["\"x</b\""]);
    }

    #[test]
    fn test_chunked_input() {
        let whole = tokenize(r#"<p class="a">x &amp; y<script>s</script></p>"#);
        let pieces = tokenize_chunks(&["<p cla", r#"ss="a">x &a"#, "mp; y<scr", "ipt>s</scri", "pt></p>"]);
        assert_eq!(whole, pieces);
    }
}
