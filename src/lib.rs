//! A command line client for the 2ch.hk imageboard, and the HTML to text
//! converter it renders posts with.
//!
//! The converter turns (often malformed) HTML fragments into readable
//! markdown-ish text in a single streaming pass: a tag-soup tokenizer feeds
//! a renderer state machine which tracks emphasis, lists, tables, quotes
//! and links, and escapes any text which would otherwise read as markdown.
//!
//! # Examples
//!
//! ```rust
//! let html = r#"
//!        <ol start="3">
//!          <li>Item three</li>
//!          <li>Item <b>four</b></li>
//!        </ol>"#;
//! assert_eq!(sosuch::config::plain().string_from_str(html, ""),
//!            "\
//! 3. Item three
//! 4. Item **four**
//! ");
//! ```
//!
//! Board posts are rendered with [`html2text`], which ignores link targets
//! and recognises the board's quote and spoiler classes.
//!
//! A small demonstration program converting HTML on stdin is included as
//! `html2md`:
//!
//! ```sh
//! $ cargo run --example html2md < foo.html
//! [...]
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod board;
pub mod captcha;
pub mod css;
pub mod draft;
pub mod entities;
pub mod escape;
pub mod parser;
pub mod render;
pub mod wrap;

#[cfg(feature = "ansi_colours")]
mod ansi_colours;

#[cfg(feature = "ansi_colours")]
pub use ansi_colours::RichDecorator;

pub use entities::unescape;

use thiserror::Error;

/// The board's address.
pub const BASE_URL: &str = "https://2ch.hk";

/// Errors from the board client. The converter itself never fails on its
/// input.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a file, or running a program, failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The board answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),
    /// The board's answer wasn't the expected JSON.
    #[error("bad JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A URL couldn't be built.
    #[error("bad URL: {0}")]
    Url(#[from] url::ParseError),
    /// A draft's header couldn't be decoded.
    #[error("bad draft header: {0}")]
    Toml(#[from] toml::de::Error),
    /// A draft is malformed or incomplete.
    #[error("{0}")]
    Draft(String),
    /// A draft isn't marked as ready to post.
    #[error("Post is not ready")]
    NotReady,
    /// The CAPTCHA couldn't be fetched or solved.
    #[error("CAPTCHA: {0}")]
    Captcha(String),
    /// The board refused the post.
    #[error("Error: {code} {reason}")]
    Rejected {
        /// The board's error code.
        code: i64,
        /// The board's explanation.
        reason: String,
    },
}

/// A `Result` with this crate's `Error`.
pub type Result<T> = std::result::Result<T, Error>;

pub mod config {
    //! Configure the HTML to text translation using the `Config` type, which can be
    //! constructed using one of the functions in this module.

    use crate::parser::Tokenizer;
    #[cfg(feature = "ansi_colours")]
    use crate::RichDecorator;
    use crate::render::text_renderer::{PlainDecorator, TextDecorator, TextRenderer};

    /// The rendering toggles.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RenderOptions {
        /// Use Unicode characters rather than ASCII approximations for
        /// references.
        pub unicode_snob: bool,
        /// Escape every markdown special character, not just the ones at
        /// the start of a line.
        pub escape_snob: bool,
        /// List reference links after each paragraph rather than at the end.
        pub links_each_paragraph: bool,
        /// Wrap paragraphs to this many columns; 0 to leave lines alone.
        pub body_width: usize,
        /// Render links as `[text](href)` rather than `[text][N]`.
        pub inline_links: bool,
        /// Surround link targets with angle brackets.
        pub protect_links: bool,
        /// Drop links to `#fragment`s.
        pub skip_internal_links: bool,
        /// Drop all link targets, keeping only the text.
        pub ignore_links: bool,
        /// Drop images.
        pub ignore_images: bool,
        /// Render images as their alt text.
        pub images_to_alt: bool,
        /// Render images with a width and a height as raw `<img>` tags.
        pub images_with_size: bool,
        /// Drop the marks for `<em>`, `<strong>` and friends.
        pub ignore_emphasis: bool,
        /// Render tables as their raw tags.
        pub bypass_tables: bool,
        /// Separate blocks by one line break rather than two.
        pub single_line_break: bool,
        /// Hide text styled `text-decoration: line-through`.
        pub hide_strikethrough: bool,
        /// Apply the heuristics for Google Docs exports: list kinds and
        /// nesting from the style, and soft breaks between paragraphs.
        pub google_doc: bool,
        /// Pixels of left margin per list level in Google Docs exports.
        pub google_list_indent: usize,
        /// The bullet for unordered list items.
        pub ul_item_mark: String,
    }

    impl Default for RenderOptions {
        fn default() -> RenderOptions {
            RenderOptions {
                unicode_snob: true,
                escape_snob: false,
                links_each_paragraph: false,
                body_width: 0,
                inline_links: true,
                protect_links: false,
                skip_internal_links: true,
                ignore_links: false,
                ignore_images: false,
                images_to_alt: false,
                images_with_size: false,
                ignore_emphasis: false,
                bypass_tables: false,
                single_line_break: false,
                hide_strikethrough: false,
                google_doc: false,
                google_list_indent: 36,
                ul_item_mark: "*".to_string(),
            }
        }
    }

    /// Configure the HTML processing.
    pub struct Config<D: TextDecorator> {
        decorator: D,
        options: RenderOptions,
    }

    macro_rules! toggle {
        ($(#[$doc:meta])* $name:ident: $ty:ty) => {
            $(#[$doc])*
            pub fn $name(mut self, value: $ty) -> Self {
                self.options.$name = value;
                self
            }
        };
    }

    impl<D: TextDecorator> Config<D> {
        toggle!(
            /// Use Unicode rather than ASCII approximations.
            unicode_snob: bool
        );
        toggle!(
            /// Escape all markdown special characters.
            escape_snob: bool
        );
        toggle!(
            /// List reference links after each paragraph.
            links_each_paragraph: bool
        );
        toggle!(
            /// Wrap to this many columns (0 disables wrapping).
            body_width: usize
        );
        toggle!(
            /// Use inline rather than reference links.
            inline_links: bool
        );
        toggle!(
            /// Put angle brackets around link targets.
            protect_links: bool
        );
        toggle!(
            /// Drop `#fragment` links.
            skip_internal_links: bool
        );
        toggle!(
            /// Drop all link targets.
            ignore_links: bool
        );
        toggle!(
            /// Drop images.
            ignore_images: bool
        );
        toggle!(
            /// Render images as alt text.
            images_to_alt: bool
        );
        toggle!(
            /// Render sized images as raw tags.
            images_with_size: bool
        );
        toggle!(
            /// Drop emphasis marks from tags.
            ignore_emphasis: bool
        );
        toggle!(
            /// Render tables as raw tags.
            bypass_tables: bool
        );
        toggle!(
            /// Separate blocks with single line breaks.
            single_line_break: bool
        );
        toggle!(
            /// Hide line-through text.
            hide_strikethrough: bool
        );
        toggle!(
            /// Use the Google Docs heuristics.
            google_doc: bool
        );
        toggle!(
            /// Pixels per list level for the Google Docs heuristics.
            google_list_indent: usize
        );

        /// Set the unordered list bullet.
        pub fn ul_item_mark(mut self, mark: &str) -> Self {
            self.options.ul_item_mark = mark.to_string();
            self
        }

        /// The current toggles.
        pub fn options(&self) -> &RenderOptions {
            &self.options
        }

        /// Render `html`, resolving reference link targets against `base_url`.
        ///
        /// Panics if single line breaks are combined with wrapping.
        pub fn string_from_str(self, html: &str, base_url: &str) -> String {
            let mut renderer = TextRenderer::new(self.options, self.decorator, base_url);
            let mut tokenizer = Tokenizer::new();
            tokenizer.feed(html, &mut renderer);
            tokenizer.close(&mut renderer);
            renderer.finish()
        }

        /// Reads HTML from `input` and renders it. Invalid UTF-8 is replaced.
        pub fn string_from_read<R: std::io::Read>(self, mut input: R, base_url: &str) -> crate::Result<String> {
            let mut bytes = Vec::new();
            input.read_to_end(&mut bytes)?;
            Ok(self.string_from_str(&String::from_utf8_lossy(&bytes), base_url))
        }
    }

    /// Return a Config initialized with a `RichDecorator`.
    #[cfg(feature = "ansi_colours")]
    pub fn rich() -> Config<RichDecorator> {
        with_decorator(RichDecorator::new())
    }

    /// Return a Config initialized with a `PlainDecorator`.
    pub fn plain() -> Config<PlainDecorator> {
        with_decorator(PlainDecorator::new())
    }

    /// Return a Config initialized with a custom decorator.
    pub fn with_decorator<D: TextDecorator>(decorator: D) -> Config<D> {
        Config {
            decorator,
            options: RenderOptions::default(),
        }
    }

    /// The configuration posts are rendered with: link targets dropped and
    /// the Google Docs heuristics on.
    pub fn board<D: TextDecorator>(decorator: D) -> Config<D> {
        with_decorator(decorator).ignore_links(true).google_doc(true)
    }
}

/// Render a post's HTML as markdown-ish text, the way the client shows it.
pub fn html2text(html: &str, base_url: &str) -> String {
    config::board(render::text_renderer::PlainDecorator::new()).string_from_str(html, base_url)
}

#[cfg(test)]
mod tests;
