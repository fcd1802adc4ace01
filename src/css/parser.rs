//! Parsing for the subset of CSS found in `<style>` blocks and `style`
//! attributes.
//!
//! This is deliberately dumb: selectors are kept as opaque strings and
//! values are not interpreted at all.

use nom::{
    branch::alt,
    bytes::complete::take_till,
    character::complete::char,
    combinator::{all_consuming, map},
    multi::{many0, separated_list0},
    sequence::{separated_pair, terminated},
    IResult, Parser,
};

/// A `property: value` pair, both trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The property name.
    pub name: String,
    /// The property value.
    pub value: String,
}

/// A selector and the declarations in its block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// The selector text.
    pub selector: String,
    /// The declarations in the block.
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, PartialEq)]
enum Block<'a> {
    Rule(&'a str, &'a str),
    Junk,
}

fn declaration(text: &str) -> IResult<&str, Option<Declaration>> {
    let (rest, item) = take_till(|c| c == ';').parse(text)?;
    let decl = item.split_once(':').map(|(name, value)| Declaration {
        name: name.trim().to_string(),
        value: value.trim().to_string(),
    });
    Ok((rest, decl))
}

/// Parse `;`-separated declarations; pieces without a `:` are skipped.
pub fn parse_rules(text: &str) -> IResult<&str, Vec<Declaration>> {
    separated_list0(char(';'), declaration)
        .parse(text)
        .map(|(rest, v)| (rest, v.into_iter().flatten().collect()))
}

fn till_brace(text: &str) -> IResult<&str, &str> {
    take_till(|c| c == '{' || c == '}').parse(text)
}

fn closed_block(text: &str) -> IResult<&str, Block<'_>> {
    map(
        terminated(separated_pair(till_brace, char('{'), till_brace), char('}')),
        |(selector, body)| Block::Rule(selector, body),
    )
    .parse(text)
}

fn junk(text: &str) -> IResult<&str, Block<'_>> {
    map(terminated(till_brace, char('}')), |_| Block::Junk).parse(text)
}

// The last block may be missing its closing brace.
fn open_block(text: &str) -> IResult<&str, Block<'_>> {
    map(
        all_consuming(separated_pair(till_brace, char('{'), till_brace)),
        |(selector, body)| Block::Rule(selector, body),
    )
    .parse(text)
}

/// Parse a style sheet into rule sets.
///
/// Anything the parser can't make sense of (a block containing another `{`,
/// say) is left in the returned remainder.
pub fn parse_stylesheet(text: &str) -> IResult<&str, Vec<RuleSet>> {
    let (rest, blocks) = many0(alt((closed_block, junk, open_block))).parse(text)?;
    let rules = blocks
        .into_iter()
        .filter_map(|block| match block {
            Block::Rule(selector, body) => Some(RuleSet {
                selector: selector.trim().to_string(),
                declarations: parse_rules(body).map(|(_, decls)| decls).unwrap_or_default(),
            }),
            Block::Junk => None,
        })
        .collect();
    Ok((rest, rules))
}

/// Remove `@import ...;` statements.
pub fn strip_imports(text: &str) -> String {
    let mut text = format!("{};", text);
    while let Some(start) = text.find("@import") {
        let end = text[start..].find(';').map_or(text.len(), |semi| start + semi + 1);
        text.replace_range(start..end, "");
    }
    text
}
