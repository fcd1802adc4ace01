//! Module containing the tag classification used when rendering, and the
//! text renderer itself.

pub mod text_renderer;

/// The categories of tag which the renderer knows about.
///
/// Anything else is `Other` and only contributes its text and its style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<h1>` to `<h9>`, with the level.
    Heading(usize),
    /// `<p>` and `<div>`.
    Paragraph,
    /// `<br>`
    LineBreak,
    /// `<hr>`
    Rule,
    /// `<head>` and `<script>`, whose content is never shown.
    Head,
    /// `<style>`, which is hidden and feeds the style sheet.
    Style,
    /// `<body>`
    Body,
    /// `<blockquote>`
    Blockquote,
    /// `<em>`, `<i>` and `<u>`.
    Emphasis,
    /// `<strong>` and `<b>`.
    Strong,
    /// `<del>`, `<strike>` and `<s>`, with the tag name.
    Strikeout(&'static str),
    /// `<code>` and `<tt>`.
    Code,
    /// `<abbr>`
    Abbr,
    /// `<a>`
    Anchor,
    /// `<img>`
    Image,
    /// `<dl>`
    DefinitionList,
    /// `<dt>`
    DefinitionTerm,
    /// `<dd>`
    DefinitionData,
    /// `<ol>` or `<ul>`.
    List {
        /// Whether this is an `<ol>`.
        ordered: bool,
    },
    /// `<li>`
    ListItem,
    /// `<table>`
    Table,
    /// `<tr>`
    TableRow,
    /// `<td>` or `<th>`, with the tag name.
    TableCell(&'static str),
    /// `<pre>`
    Pre,
    /// Any other tag.
    Other,
}

impl TagKind {
    /// Classify a lower case tag name.
    pub fn of(name: &str) -> TagKind {
        use TagKind::*;
        match name {
            "h1" => Heading(1),
            "h2" => Heading(2),
            "h3" => Heading(3),
            "h4" => Heading(4),
            "h5" => Heading(5),
            "h6" => Heading(6),
            "h7" => Heading(7),
            "h8" => Heading(8),
            "h9" => Heading(9),
            "p" | "div" => Paragraph,
            "br" => LineBreak,
            "hr" => Rule,
            "head" | "script" => Head,
            "style" => Style,
            "body" => Body,
            "blockquote" => Blockquote,
            "em" | "i" | "u" => Emphasis,
            "strong" | "b" => Strong,
            "del" => Strikeout("del"),
            "strike" => Strikeout("strike"),
            "s" => Strikeout("s"),
            "code" | "tt" => Code,
            "abbr" => Abbr,
            "a" => Anchor,
            "img" => Image,
            "dl" => DefinitionList,
            "dt" => DefinitionTerm,
            "dd" => DefinitionData,
            "ol" => List { ordered: true },
            "ul" => List { ordered: false },
            "li" => ListItem,
            "table" => Table,
            "tr" => TableRow,
            "td" => TableCell("td"),
            "th" => TableCell("th"),
            "pre" => Pre,
            _ => Other,
        }
    }
}

/// Whether an element never has content (and so never gets an end tag).
pub fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
