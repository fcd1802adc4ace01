//! Implementations of the `TextRenderer` state machine, which turns the
//! tokenizer's events into markdown-ish text, and the decorators which
//! supply its emphasis marks.

use std::borrow::Cow;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::RenderOptions;
use crate::css::{ComputedStyle, StyleSheet};
use crate::entities::{self, NBSP_PLACEHOLDER};
use crate::escape::{escape_md, escape_md_section, ABSOLUTE_URL_MATCHER};
use crate::parser::{Attributes, TokenSink};
use crate::render::{is_void, TagKind};
use crate::wrap::optwrap;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Allow decorating/styling text.
///
/// Each method returns the string to insert where the corresponding region
/// starts or ends.
pub trait TextDecorator {
    /// Return the prefix for emphasised text.
    fn decorate_em_start(&mut self) -> String;

    /// Return the suffix for emphasised text.
    fn decorate_em_end(&mut self) -> String;

    /// Return the prefix for strong text.
    fn decorate_strong_start(&mut self) -> String;

    /// Return the suffix for strong text.
    fn decorate_strong_end(&mut self) -> String;

    /// Return the prefix for a spoiler.
    fn decorate_spoiler_start(&mut self) -> String;

    /// Return the suffix for a spoiler.
    fn decorate_spoiler_end(&mut self) -> String;

    /// Return the prefix for quoted text (a `>` line, or a reply link).
    fn decorate_quote_start(&mut self) -> String;

    /// Return the suffix for quoted text.
    fn decorate_quote_end(&mut self) -> String;
}

/// A decorator for use with `TextRenderer` which outputs markdown marks.
#[derive(Clone, Debug, Default)]
pub struct PlainDecorator {}

impl PlainDecorator {
    /// Create a new `PlainDecorator`.
    pub fn new() -> PlainDecorator {
        PlainDecorator {}
    }
}

impl TextDecorator for PlainDecorator {
    fn decorate_em_start(&mut self) -> String {
        "_".to_string()
    }

    fn decorate_em_end(&mut self) -> String {
        "_".to_string()
    }

    fn decorate_strong_start(&mut self) -> String {
        "**".to_string()
    }

    fn decorate_strong_end(&mut self) -> String {
        "**".to_string()
    }

    fn decorate_spoiler_start(&mut self) -> String {
        "%%".to_string()
    }

    fn decorate_spoiler_end(&mut self) -> String {
        "%%".to_string()
    }

    fn decorate_quote_start(&mut self) -> String {
        String::new()
    }

    fn decorate_quote_end(&mut self) -> String {
        String::new()
    }
}

/// A decorator which adds no marks at all.
#[derive(Clone, Debug, Default)]
pub struct TrivialDecorator {}

impl TrivialDecorator {
    /// Create a new `TrivialDecorator`.
    pub fn new() -> TrivialDecorator {
        TrivialDecorator {}
    }
}

impl TextDecorator for TrivialDecorator {
    fn decorate_em_start(&mut self) -> String {
        String::new()
    }
    fn decorate_em_end(&mut self) -> String {
        String::new()
    }
    fn decorate_strong_start(&mut self) -> String {
        String::new()
    }
    fn decorate_strong_end(&mut self) -> String {
        String::new()
    }
    fn decorate_spoiler_start(&mut self) -> String {
        String::new()
    }
    fn decorate_spoiler_end(&mut self) -> String {
        String::new()
    }
    fn decorate_quote_start(&mut self) -> String {
        String::new()
    }
    fn decorate_quote_end(&mut self) -> String {
        String::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Emphasis,
    Strong,
    Strikeout(&'static str),
    Code,
    Spoiler,
    Quote,
    Link,
}

/// An opened mark. Its start string is only written once some visible text
/// follows, so that empty pairs vanish.
#[derive(Debug)]
struct OpenMark {
    mark: Mark,
    emitted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Force {
    No,
    /// Finishing the document: flush footers too.
    End,
}

#[derive(Debug)]
struct ListContext {
    ordered: bool,
    counter: i64,
}

#[derive(Debug, Default)]
struct TableContext {
    columns: usize,
    split_next_cell: bool,
    header_pending: bool,
}

#[derive(Debug)]
struct Anchor {
    href: String,
    title: Option<String>,
    autolinked: bool,
}

#[derive(Debug)]
struct LinkRef {
    href: String,
    title: Option<String>,
    number: usize,
    outcount: usize,
}

#[derive(Debug)]
struct OpenElement {
    name: String,
    kind: TagKind,
    style: ComputedStyle,
}

/// The renderer state machine.
///
/// Feed it events through [`TokenSink`] and call [`finish`](TextRenderer::finish)
/// to get the text. Invariants between events:
///
/// * `pending_breaks` is 0, 1 or 2, and `break_depth <= blockquote` whenever
///   breaks are pending;
/// * `quiet` counts the open elements hiding their content;
/// * every mark in `marks` belongs to an element in `tag_stack` (or an
///   anchor in `anchors`), and a mark's end string is only ever written if
///   its start string was.
pub struct TextRenderer<D: TextDecorator> {
    options: RenderOptions,
    decorator: D,
    base_url: String,

    out: Vec<String>,
    at_line_start: bool,
    start: bool,
    quiet: usize,
    style: usize,
    pending_breaks: usize,
    break_depth: usize,
    soft_break: bool,
    space: bool,
    outcount: usize,

    marks: Vec<OpenMark>,
    emphasis: usize,
    blockquote: usize,
    pre: bool,
    start_pre: bool,
    in_header: bool,
    last_was_list: bool,

    lists: Vec<ListContext>,
    tables: Vec<TableContext>,

    anchors: Vec<Option<Anchor>>,
    pending_autolink: Option<String>,
    links: Vec<LinkRef>,
    link_count: usize,

    abbr_title: Option<String>,
    abbr_data: Option<String>,
    abbreviations: IndexMap<String, String>,

    styles: StyleSheet,
    tag_stack: Vec<OpenElement>,
}

impl<D: TextDecorator> TextRenderer<D> {
    /// Create a renderer. `base_url` is used to resolve the targets listed
    /// in reference link footers.
    ///
    /// Panics if both `single_line_break` and wrapping are requested.
    pub fn new(options: RenderOptions, decorator: D, base_url: &str) -> TextRenderer<D> {
        assert!(
            !(options.single_line_break && options.body_width > 0),
            "single_line_break requires body_width to be 0"
        );
        TextRenderer {
            options,
            decorator,
            base_url: base_url.to_string(),
            out: Vec::new(),
            at_line_start: true,
            start: true,
            quiet: 0,
            style: 0,
            pending_breaks: 0,
            break_depth: 0,
            soft_break: false,
            space: false,
            outcount: 0,
            marks: Vec::new(),
            emphasis: 0,
            blockquote: 0,
            pre: false,
            start_pre: false,
            in_header: false,
            last_was_list: false,
            lists: Vec::new(),
            tables: Vec::new(),
            anchors: Vec::new(),
            pending_autolink: None,
            links: Vec::new(),
            link_count: 0,
            abbr_title: None,
            abbr_data: None,
            abbreviations: IndexMap::new(),
            styles: StyleSheet::default(),
            tag_stack: Vec::new(),
        }
    }

    /// Close everything still open and return the finished text.
    pub fn finish(mut self) -> String {
        while let Some(element) = self.tag_stack.pop() {
            let parent = self.parent_style();
            self.close_element(element, &parent);
        }
        while let Some(open) = self.marks.pop() {
            if open.emitted && open.mark != Mark::Link {
                let end = self.mark_end(open.mark);
                self.push_raw(&end);
            }
        }
        self.quiet = 0;
        self.pbr();
        self.output("", false, Force::End);

        let text = self
            .out
            .concat()
            .replace(NBSP_PLACEHOLDER, entities::nbsp_text(self.options.unicode_snob));
        if self.options.body_width > 0 {
            optwrap(&text, self.options.body_width)
        } else {
            text
        }
    }

    fn parent_style(&self) -> ComputedStyle {
        self.tag_stack
            .last()
            .map(|element| element.style.clone())
            .unwrap_or_default()
    }

    fn code(&self) -> bool {
        self.marks.iter().any(|m| m.mark == Mark::Code)
    }

    fn push_raw(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.at_line_start = s.ends_with('\n');
        self.out.push(s.to_string());
    }

    // Block separation.

    fn request_breaks(&mut self, count: usize) {
        if self.pending_breaks == 0 {
            self.break_depth = self.blockquote;
        } else {
            self.break_depth = self.break_depth.min(self.blockquote);
        }
        self.pending_breaks = self.pending_breaks.max(count);
    }

    fn pbr(&mut self) {
        if self.pending_breaks == 0 {
            self.request_breaks(1);
        }
    }

    fn p(&mut self) {
        self.request_breaks(if self.options.single_line_break { 1 } else { 2 });
    }

    fn soft_br(&mut self) {
        self.pbr();
        self.soft_break = true;
    }

    fn flush_breaks(&mut self) {
        if !self.at_line_start {
            if self.soft_break {
                self.push_raw("  ");
            }
            self.push_raw("\n");
        }
        let quote = ">".repeat(self.break_depth.min(self.blockquote));
        for _ in 1..self.pending_breaks {
            self.push_raw(&format!("{}\n", quote));
        }
        self.soft_break = false;
    }

    // Marks.

    fn mark_start(&mut self, mark: Mark) -> String {
        match mark {
            Mark::Emphasis => self.decorator.decorate_em_start(),
            Mark::Strong => self.decorator.decorate_strong_start(),
            Mark::Spoiler => self.decorator.decorate_spoiler_start(),
            Mark::Quote => self.decorator.decorate_quote_start(),
            Mark::Strikeout(tag) => format!("<{}>", tag),
            Mark::Code => "`".to_string(),
            Mark::Link => "[".to_string(),
        }
    }

    fn mark_end(&mut self, mark: Mark) -> String {
        match mark {
            Mark::Emphasis => self.decorator.decorate_em_end(),
            Mark::Strong => self.decorator.decorate_strong_end(),
            Mark::Spoiler => self.decorator.decorate_spoiler_end(),
            Mark::Quote => self.decorator.decorate_quote_end(),
            Mark::Strikeout(tag) => format!("</{}>", tag),
            Mark::Code => "`".to_string(),
            Mark::Link => String::new(),
        }
    }

    fn open_mark(&mut self, mark: Mark) {
        self.marks.push(OpenMark {
            mark,
            emitted: false,
        });
    }

    /// Close the innermost open `mark`, writing its end string if its start
    /// was written. Returns whether it was, or `None` if it wasn't open.
    fn close_mark(&mut self, mark: Mark) -> Option<bool> {
        let pos = self.marks.iter().rposition(|m| m.mark == mark)?;
        let open = self.marks.remove(pos);
        if open.emitted && mark != Mark::Link {
            let end = self.mark_end(mark);
            self.push_raw(&end);
        }
        Some(open.emitted)
    }

    fn flush_marks(&mut self) {
        for i in 0..self.marks.len() {
            if !self.marks[i].emitted {
                self.marks[i].emitted = true;
                let start = self.mark_start(self.marks[i].mark);
                self.push_raw(&start);
            }
        }
    }

    // Output.

    fn line_prefix(&self, line: &str) -> String {
        let mut prefix = ">".repeat(self.blockquote);
        if self.blockquote > 0 && (self.pre || !line.starts_with('>')) {
            prefix.push(' ');
        }
        if self.pre {
            prefix.push_str(&"    ".repeat(self.lists.len().max(1)));
        }
        prefix
    }

    fn write_content(&mut self, data: &str) {
        if self.space {
            if !self.at_line_start {
                self.push_raw(" ");
            }
            self.space = false;
        }
        let mut lines = data.split('\n').peekable();
        let mut first = true;
        while let Some(line) = lines.next() {
            if !first {
                self.push_raw("\n");
            }
            first = false;
            if line.is_empty() {
                if lines.peek().is_some() && self.at_line_start && self.blockquote > 0 {
                    let quote = ">".repeat(self.blockquote);
                    self.push_raw(&quote);
                }
                continue;
            }
            if self.at_line_start {
                let prefix = self.line_prefix(line);
                self.push_raw(&prefix);
            }
            if line.chars().any(|c| !c.is_whitespace()) {
                self.flush_marks();
            }
            self.push_raw(line);
        }
        self.pending_autolink = None;
    }

    /// Add text to the output.
    ///
    /// `pure` text is document text: outside `<pre>` its whitespace is
    /// collapsed, and leading or trailing whitespace becomes a single
    /// deferred space.
    fn output(&mut self, data: &str, pure: bool, force: Force) {
        if let Some(abbr) = self.abbr_data.as_mut() {
            abbr.push_str(data);
        }
        if self.quiet > 0 {
            return;
        }

        let mut data = Cow::Borrowed(data);
        let mut trailing_space = false;
        if pure && !self.pre {
            let collapsed = WHITESPACE_RUN.replace_all(&data, " ").into_owned();
            let mut text = collapsed.as_str();
            if let Some(rest) = text.strip_prefix(' ') {
                self.space = true;
                text = rest;
            }
            if let Some(rest) = text.strip_suffix(' ') {
                trailing_space = true;
                text = rest;
            }
            data = Cow::Owned(text.to_string());
        }
        if data.is_empty() && force == Force::No {
            if trailing_space {
                self.space = true;
            }
            return;
        }

        if self.start_pre {
            self.start_pre = false;
            data = if self.lists.is_empty() {
                match data.strip_prefix('\n') {
                    Some(rest) => Cow::Owned(rest.to_string()),
                    None => data,
                }
            } else {
                Cow::Owned(data.trim_start_matches('\n').to_string())
            };
        }

        if self.start {
            self.space = false;
            self.pending_breaks = 0;
            self.soft_break = false;
            self.start = false;
        }

        if force == Force::End {
            self.pending_breaks = 0;
            self.push_raw("\n");
            self.space = false;
        }

        let breaks = self.pending_breaks;
        if breaks > 0 {
            self.flush_breaks();
            self.space = false;
        }

        if !self.links.is_empty()
            && ((breaks == 2 && self.options.links_each_paragraph) || force == Force::End)
        {
            self.write_link_footer(force == Force::End);
        }

        if force == Force::End {
            let definitions: Vec<String> = self
                .abbreviations
                .iter()
                .map(|(abbr, definition)| format!("  *[{}]: {}\n", abbr, definition))
                .collect();
            for line in definitions {
                self.push_raw(&line);
            }
        }

        self.pending_breaks = 0;
        if !data.is_empty() {
            self.write_content(&data);
        }
        if trailing_space {
            self.space = true;
        }
        self.outcount += 1;
    }

    fn write_link_footer(&mut self, end: bool) {
        if end {
            self.push_raw("\n");
        }
        let outcount = self.outcount;
        let (done, waiting): (Vec<LinkRef>, Vec<LinkRef>) = std::mem::take(&mut self.links)
            .into_iter()
            .partition(|link| outcount > link.outcount);
        for link in &done {
            let mut line = format!("   [{}]: {}", link.number, self.resolve_url(&link.href));
            if let Some(title) = &link.title {
                line.push_str(&format!(" ({})", title));
            }
            line.push('\n');
            self.push_raw(&line);
        }
        if !done.is_empty() {
            self.push_raw("\n");
        }
        self.links = waiting;
    }

    fn resolve_url(&self, href: &str) -> String {
        if href.starts_with('<') {
            return href.to_string();
        }
        Url::parse(&self.base_url)
            .and_then(|base| base.join(href))
            .map(String::from)
            .unwrap_or_else(|_| href.to_string())
    }

    /// Number a reference link, reusing the number of an identical one.
    fn register_link(&mut self, href: String, title: Option<String>) -> usize {
        if let Some(link) = self.links.iter().find(|l| l.href == href && l.title == title) {
            return link.number;
        }
        self.link_count += 1;
        self.links.push(LinkRef {
            href,
            title,
            number: self.link_count,
            outcount: self.outcount,
        });
        self.link_count
    }

    /// Turn the current (still unwritten) link into an autolink.
    fn make_autolink(&mut self, text: &str) {
        self.close_mark(Mark::Link);
        if let Some(Some(anchor)) = self.anchors.last_mut() {
            anchor.autolinked = true;
        }
        self.output(&format!("<{}>", text), false, Force::No);
    }

    // Tags.

    fn start_element(&mut self, name: &str, attrs: Attributes) {
        let parent = self.parent_style();
        let style = self.styles.resolve(&attrs, &parent);
        let kind = TagKind::of(name);
        let void = is_void(name);
        html_trace!("start_element {} {:?}", name, kind);
        if !void {
            self.tag_stack.push(OpenElement {
                name: name.to_string(),
                kind,
                style: style.clone(),
            });
        }
        self.handle_kind(kind, Some(&attrs), &style);
        if !void && !self.in_header {
            self.handle_emphasis(true, &style, &parent);
        }
    }

    fn end_element(&mut self, name: &str) {
        let Some(pos) = self.tag_stack.iter().rposition(|e| e.name == name) else {
            html_trace!("end_element: no open <{}>", name);
            return;
        };
        while self.tag_stack.len() > pos {
            let Some(element) = self.tag_stack.pop() else {
                break;
            };
            let parent = self.parent_style();
            self.close_element(element, &parent);
        }
    }

    fn close_element(&mut self, element: OpenElement, parent: &ComputedStyle) {
        html_trace!("close_element {} {:?}", element.name, element.kind);
        if !self.in_header {
            self.handle_emphasis(false, &element.style, parent);
        }
        self.handle_kind(element.kind, None, &element.style);
    }

    /// Open or close the marks signalled by the style, where they differ
    /// from the parent's.
    fn handle_emphasis(&mut self, start: bool, style: &ComputedStyle, parent: &ComputedStyle) {
        let tag_emphasis = style.emphasis();
        let parent_emphasis = parent.emphasis();

        let strikethrough = tag_emphasis.line_through && self.options.hide_strikethrough;
        let bold = tag_emphasis.bold && !parent_emphasis.bold;
        let italic = tag_emphasis.italic && !parent_emphasis.italic;
        let fixed = style.fixed_width_font() && !parent.fixed_width_font() && !self.pre;
        let spoiler = tag_emphasis.spoiler && !parent_emphasis.spoiler;
        let quote = tag_emphasis.quote && !parent_emphasis.quote;

        if start {
            if bold || italic || fixed {
                self.emphasis += 1;
            }
            if strikethrough {
                self.quiet += 1;
            }
            if italic {
                self.open_mark(Mark::Emphasis);
            }
            if bold {
                self.open_mark(Mark::Strong);
            }
            if fixed {
                self.open_mark(Mark::Code);
            }
            if spoiler {
                self.open_mark(Mark::Spoiler);
            }
            if quote {
                self.open_mark(Mark::Quote);
            }
        } else {
            if bold || italic || fixed {
                self.emphasis = self.emphasis.saturating_sub(1);
            }
            if quote {
                self.close_mark(Mark::Quote);
            }
            if spoiler {
                self.close_mark(Mark::Spoiler);
            }
            if fixed {
                self.close_mark(Mark::Code);
            }
            if bold {
                self.close_mark(Mark::Strong);
            }
            if italic {
                self.close_mark(Mark::Emphasis);
            }
            // Only once all emphasis is closed may a space follow.
            if (bold || italic) && self.emphasis == 0 {
                self.space = true;
            }
            if strikethrough {
                self.quiet = self.quiet.saturating_sub(1);
            }
        }
    }

    /// The tag specific part of starting (`attrs` is `Some`) or ending an
    /// element.
    fn handle_kind(&mut self, kind: TagKind, attrs: Option<&Attributes>, style: &ComputedStyle) {
        let start = attrs.is_some();
        match kind {
            TagKind::Heading(level) => {
                self.p();
                if start {
                    self.in_header = true;
                    self.output(&format!("{} ", "#".repeat(level)), false, Force::No);
                } else {
                    self.in_header = false;
                }
            }
            TagKind::Paragraph => {
                if self.options.google_doc {
                    if start && style.has_height() {
                        self.p();
                    } else {
                        self.soft_br();
                    }
                } else {
                    self.p();
                }
            }
            TagKind::LineBreak => {
                if start {
                    self.output("  \n", false, Force::No);
                }
            }
            TagKind::Rule => {
                if start {
                    self.p();
                    self.output("* * *", false, Force::No);
                    self.p();
                }
            }
            TagKind::Head | TagKind::Style => {
                if start {
                    self.quiet += 1;
                } else {
                    self.quiet = self.quiet.saturating_sub(1);
                }
                if kind == TagKind::Style {
                    if start {
                        self.style += 1;
                    } else {
                        self.style = self.style.saturating_sub(1);
                    }
                }
            }
            // Sites never closing <head> are common.
            TagKind::Body => self.quiet = 0,
            TagKind::Blockquote => {
                if start {
                    self.p();
                    self.blockquote += 1;
                } else {
                    self.blockquote = self.blockquote.saturating_sub(1);
                    self.p();
                }
            }
            TagKind::Emphasis | TagKind::Strong => {
                if !self.options.ignore_emphasis {
                    let mark = if kind == TagKind::Strong {
                        Mark::Strong
                    } else {
                        Mark::Emphasis
                    };
                    if start {
                        self.open_mark(mark);
                    } else {
                        self.close_mark(mark);
                    }
                }
            }
            TagKind::Strikeout(tag) => {
                if start {
                    self.open_mark(Mark::Strikeout(tag));
                } else {
                    self.close_mark(Mark::Strikeout(tag));
                }
            }
            TagKind::Code => {
                if !self.pre {
                    if start {
                        self.open_mark(Mark::Code);
                    } else {
                        self.close_mark(Mark::Code);
                    }
                }
            }
            TagKind::Abbr => match attrs {
                Some(attrs) => {
                    self.abbr_title = attrs.title.clone();
                    self.abbr_data = Some(String::new());
                }
                None => {
                    let data = self.abbr_data.take().unwrap_or_default();
                    if let Some(title) = self.abbr_title.take() {
                        self.abbreviations.insert(data, title);
                    }
                }
            },
            TagKind::Anchor => {
                if !self.options.ignore_links {
                    match attrs {
                        Some(attrs) => self.start_anchor(attrs),
                        None => self.end_anchor(),
                    }
                }
            }
            TagKind::Image => {
                if let Some(attrs) = attrs {
                    if !self.options.ignore_images {
                        self.image(attrs);
                    }
                }
            }
            TagKind::DefinitionList => {
                if start {
                    self.p();
                }
            }
            TagKind::DefinitionTerm => {
                if !start {
                    self.pbr();
                }
            }
            TagKind::DefinitionData => {
                if start {
                    self.output("    ", false, Force::No);
                } else {
                    self.pbr();
                }
            }
            TagKind::List { ordered } => {
                if self.lists.is_empty() && !self.last_was_list {
                    self.p();
                }
                match attrs {
                    Some(attrs) => {
                        let ordered = if self.options.google_doc {
                            style.list_is_ordered().unwrap_or(ordered)
                        } else {
                            ordered
                        };
                        let counter = attrs
                            .start
                            .as_deref()
                            .and_then(|start| start.trim().parse::<i64>().ok())
                            .map_or(0, |start| start.checked_sub(1).unwrap_or(0));
                        self.lists.push(ListContext { ordered, counter });
                    }
                    None => {
                        self.lists.pop();
                    }
                }
            }
            TagKind::ListItem => {
                self.pbr();
                if start {
                    let nest = if self.options.google_doc {
                        style.nest_count(self.options.google_list_indent)
                    } else {
                        self.lists.len().saturating_sub(1)
                    };
                    let mut prefix = "  ".repeat(nest);
                    match self.lists.last_mut() {
                        Some(list) if list.ordered => {
                            list.counter = list.counter.saturating_add(1);
                            prefix.push_str(&format!("{}. ", list.counter));
                        }
                        _ => {
                            prefix.push_str(&self.options.ul_item_mark);
                            prefix.push(' ');
                        }
                    }
                    self.output(&prefix, false, Force::No);
                    self.start = true;
                }
            }
            TagKind::Table | TagKind::TableRow | TagKind::TableCell(_) => {
                if self.options.bypass_tables {
                    self.bypass_table_tag(kind, start);
                } else {
                    self.table_tag(kind, start);
                }
            }
            TagKind::Pre => {
                if start {
                    self.start_pre = true;
                    self.pre = true;
                } else {
                    self.pre = false;
                }
                self.p();
            }
            TagKind::Other => {}
        }
        self.last_was_list = matches!(kind, TagKind::List { .. });
    }

    fn start_anchor(&mut self, attrs: &Attributes) {
        match attrs.href.as_deref() {
            Some(href) if !(self.options.skip_internal_links && href.starts_with('#')) => {
                self.pending_autolink = Some(href.to_string());
                let href = if self.options.protect_links {
                    format!("<{}>", href)
                } else {
                    href.to_string()
                };
                self.anchors.push(Some(Anchor {
                    href,
                    title: attrs.title.clone(),
                    autolinked: false,
                }));
                self.open_mark(Mark::Link);
            }
            _ => self.anchors.push(None),
        }
    }

    fn end_anchor(&mut self) {
        self.pending_autolink = None;
        let Some(anchor) = self.anchors.pop().flatten() else {
            return;
        };
        if anchor.autolinked {
            return;
        }
        if self.close_mark(Mark::Link) == Some(false) {
            self.output("[", false, Force::No);
        }
        let suffix = if self.options.inline_links {
            format!("]({})", escape_md(&anchor.href))
        } else {
            let number = self.register_link(anchor.href, anchor.title);
            format!("][{}]", number)
        };
        self.output(&suffix, false, Force::No);
    }

    fn image(&mut self, attrs: &Attributes) {
        let Some(src) = attrs.src.clone() else {
            return;
        };
        let alt = attrs.alt.clone().unwrap_or_default();

        // Markdown can't express the size, so fall back to a raw tag.
        if self.options.images_with_size {
            if let (Some(width), Some(height)) = (&attrs.width, &attrs.height) {
                let mut tag = format!("<img src='{}' width='{}' height='{}' ", src, width, height);
                if !alt.is_empty() {
                    tag.push_str(&format!("alt='{}' ", alt));
                }
                tag.push_str("/>");
                self.output(&tag, false, Force::No);
                return;
            }
        }

        if let Some(href) = self.pending_autolink.take() {
            let alt = escape_md(&alt);
            if self.options.images_to_alt && alt == href && ABSOLUTE_URL_MATCHER.is_match(&href) {
                self.make_autolink(&alt);
                return;
            }
        }

        if self.options.images_to_alt {
            self.output(&escape_md(&alt), false, Force::No);
        } else {
            let target = if self.options.inline_links {
                format!("({})", escape_md(&src))
            } else {
                format!("[{}]", self.register_link(src, attrs.title.clone()))
            };
            self.output(&format!("![{}]{}", escape_md(&alt), target), false, Force::No);
        }
    }

    fn current_table(&mut self) -> &mut TableContext {
        if self.tables.is_empty() {
            self.tables.push(TableContext {
                header_pending: true,
                ..Default::default()
            });
        }
        let last = self.tables.len() - 1;
        &mut self.tables[last]
    }

    fn table_tag(&mut self, kind: TagKind, start: bool) {
        match kind {
            TagKind::Table => {
                if start {
                    self.tables.push(TableContext {
                        header_pending: true,
                        ..Default::default()
                    });
                } else {
                    self.tables.pop();
                }
            }
            TagKind::TableRow => {
                if start {
                    self.current_table().columns = 0;
                } else {
                    let table = self.current_table();
                    table.split_next_cell = false;
                    let underline = if table.header_pending {
                        table.header_pending = false;
                        Some(vec!["---"; table.columns].join("|"))
                    } else {
                        None
                    };
                    self.soft_br();
                    if let Some(underline) = underline {
                        self.output(&underline, false, Force::No);
                        self.soft_br();
                    }
                }
            }
            TagKind::TableCell(_) => {
                if start {
                    let table = self.current_table();
                    let split = table.split_next_cell;
                    table.split_next_cell = true;
                    table.columns += 1;
                    if split {
                        self.output("| ", false, Force::No);
                    }
                }
            }
            _ => {}
        }
    }

    fn bypass_table_tag(&mut self, kind: TagKind, start: bool) {
        if start {
            self.soft_br();
        }
        let text = match (kind, start) {
            (TagKind::TableCell(tag), true) => format!("<{}>\n\n", tag),
            (TagKind::TableCell(tag), false) => format!("\n</{}>", tag),
            (TagKind::TableRow, true) => "<tr>".to_string(),
            (TagKind::TableRow, false) => "</tr>".to_string(),
            (_, true) => "<table>".to_string(),
            (_, false) => "</table>".to_string(),
        };
        self.output(&text, false, Force::No);
    }
}

impl<D: TextDecorator> TokenSink for TextRenderer<D> {
    fn handle_starttag(&mut self, name: &str, attrs: Attributes) {
        self.start_element(name, attrs);
    }

    fn handle_endtag(&mut self, name: &str) {
        self.end_element(name);
    }

    fn handle_data(&mut self, data: &str) {
        if self.style > 0 {
            self.styles.add_css(data);
        }

        if let Some(href) = self.pending_autolink.take() {
            if href == data && ABSOLUTE_URL_MATCHER.is_match(&href) {
                self.make_autolink(data);
                return;
            }
        }

        let text = if self.code() || self.pre {
            Cow::Borrowed(data)
        } else {
            Cow::Owned(escape_md_section(data, self.options.escape_snob))
        };
        self.output(&text, true, Force::No);
    }

    fn handle_charref(&mut self, name: &str) {
        let text = entities::charref(name, self.options.unicode_snob);
        self.output(&text, true, Force::No);
    }

    fn handle_entityref(&mut self, name: &str) {
        let text = entities::entityref(name, self.options.unicode_snob);
        self.output(&text, true, Force::No);
    }
}
