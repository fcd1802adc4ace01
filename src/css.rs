//! Effective style resolution.
//!
//! Only a handful of properties matter for rendering: the emphasis family
//! (`font-weight`, `font-style`, `text-decoration`), the fixed-width font
//! check, Google Docs list hints, and the synthetic `quote`/`spoiler`
//! properties which the board's CSS classes are mapped to.

use std::collections::{BTreeMap, HashMap};

use crate::parser::Attributes;

pub mod parser;

/// The fully inherited set of properties applying to one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedStyle(BTreeMap<String, String>);

/// Which emphasis signals a style carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Emphasis {
    /// `font-weight: bold`.
    pub bold: bool,
    /// `font-style: italic`.
    pub italic: bool,
    /// `text-decoration: line-through`.
    pub line_through: bool,
    /// Inside a spoiler.
    pub spoiler: bool,
    /// Inside a quote or a reply link.
    pub quote: bool,
}

/// Deepest list nesting `nest_count` reports.
pub const MAX_NEST_COUNT: usize = 16;

impl ComputedStyle {
    /// Build a style from `(property, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> ComputedStyle
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ComputedStyle(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Look up a property.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn overlay(&mut self, other: &ComputedStyle) {
        self.0.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    fn overlay_declarations(&mut self, decls: Vec<parser::Declaration>) {
        self.0.extend(decls.into_iter().map(|d| (d.name, d.value)));
    }

    /// Emphasis values, taken word by word from the relevant properties.
    pub fn emphasis(&self) -> Emphasis {
        let mut result = Emphasis::default();
        let props = ["text-decoration", "font-style", "font-weight", "spoiler", "quote"];
        for word in props
            .iter()
            .filter_map(|p| self.get(p))
            .flat_map(str::split_whitespace)
        {
            match word {
                "bold" => result.bold = true,
                "italic" => result.italic = true,
                "line-through" => result.line_through = true,
                "spoiler" => result.spoiler = true,
                "quote" => result.quote = true,
                _ => (),
            }
        }
        result
    }

    /// Whether the font family is one of the fixed-width fonts Google Docs uses.
    pub fn fixed_width_font(&self) -> bool {
        self.get("font-family").is_some_and(|families| {
            families
                .split(',')
                .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
                .any(|f| f == "Courier New" || f == "Consolas")
        })
    }

    /// Whether a `height` is set explicitly.
    pub fn has_height(&self) -> bool {
        self.0.contains_key("height")
    }

    /// List kind as Google Docs exports it, if the style says: bullet styles
    /// are unordered and anything else is ordered.
    pub fn list_is_ordered(&self) -> Option<bool> {
        self.get("list-style-type")
            .map(|kind| !matches!(kind, "disc" | "circle" | "square" | "none"))
    }

    /// List nesting level derived from the left margin, `indent` pixels per
    /// level, at most `MAX_NEST_COUNT`.
    pub fn nest_count(&self, indent: usize) -> usize {
        if indent == 0 {
            return 0;
        }
        self.get("margin-left")
            .and_then(|margin| margin.trim().strip_suffix("px"))
            .and_then(|px| px.trim().parse::<f64>().ok())
            .filter(|px| px.is_finite() && *px >= 0.0)
            .map_or(0, |px| {
                ((px / indent as f64).floor() as usize).min(MAX_NEST_COUNT)
            })
    }
}

/// Selector to style table used to resolve `class` attributes.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    rules: HashMap<String, ComputedStyle>,
}

impl Default for StyleSheet {
    /// The board's own classes.
    fn default() -> StyleSheet {
        let quote = || ComputedStyle::from_pairs([("quote", "quote")]);
        let rules = [
            (".post-reply-link", quote()),
            (".unkfunc", quote()),
            (".o", ComputedStyle::default()),
            (".u", ComputedStyle::default()),
            (".s", ComputedStyle::default()),
            (".spoiler", ComputedStyle::from_pairs([("spoiler", "spoiler")])),
        ];
        StyleSheet {
            rules: rules.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }
}

impl StyleSheet {
    /// A style sheet with no rules.
    pub fn empty() -> StyleSheet {
        StyleSheet {
            rules: HashMap::new(),
        }
    }

    /// Look up the rule for a selector.
    pub fn rule(&self, selector: &str) -> Option<&ComputedStyle> {
        self.rules.get(selector)
    }

    /// Merge in the rules from a `<style>` block.
    ///
    /// A rule replaces any earlier one with the same selector. A block which
    /// doesn't parse adds nothing.
    pub fn add_css(&mut self, css: &str) {
        let css = parser::strip_imports(css);
        match parser::parse_stylesheet(&css) {
            Ok((rest, rules)) if !rest.contains('{') => {
                for rule in rules {
                    let mut style = ComputedStyle::default();
                    style.overlay_declarations(rule.declarations);
                    self.rules.insert(rule.selector, style);
                }
            }
            _ => {
                html_trace_quiet!("ignoring malformed style block");
            }
        }
    }

    /// Compute the effective style of an element.
    ///
    /// Everything is inherited from `parent`; class rules are applied in
    /// token order and the inline `style` attribute goes last. Classes with
    /// no rule are ignored.
    pub fn resolve(&self, attrs: &Attributes, parent: &ComputedStyle) -> ComputedStyle {
        let mut style = parent.clone();
        if let Some(classes) = attrs.class.as_deref() {
            for class in classes.split_whitespace() {
                if let Some(rule) = self.rules.get(&format!(".{}", class)) {
                    style.overlay(rule);
                }
            }
        }
        if let Some(inline) = attrs.style.as_deref() {
            if let Ok((_, decls)) = parser::parse_rules(inline) {
                style.overlay_declarations(decls);
            }
        }
        style
    }
}
