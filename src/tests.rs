use crate::config::{Config, RenderOptions};
use crate::parser::Tokenizer;
use crate::render::text_renderer::{PlainDecorator, TextDecorator, TextRenderer, TrivialDecorator};
use crate::{config, html2text, BASE_URL};

/// Like assert_eq!(), but prints out the results normally as well
macro_rules! assert_eq_str {
    ($a:expr, $b:expr) => {
        if $a != $b {
            println!("<<<\n{}===\n{}>>>", $a, $b);
            assert_eq!($a, $b);
        }
    };
}
#[track_caller]
fn test_html(input: &[u8], expected: &str) {
    let output = config::plain().string_from_read(input, "").unwrap();
    assert_eq_str!(output, expected);
}
#[track_caller]
fn test_html_conf<F>(input: &[u8], expected: &str, conf: F)
where
    F: Fn(Config<PlainDecorator>) -> Config<PlainDecorator>,
{
    let result = conf(config::plain()).string_from_read(input, "").unwrap();
    assert_eq_str!(result, expected);
}
#[track_caller]
fn test_html_conf_dec<D: TextDecorator, F>(decorator: D, input: &[u8], expected: &str, conf: F)
where
    F: Fn(Config<D>) -> Config<D>,
{
    let result = conf(config::with_decorator(decorator))
        .string_from_read(input, "")
        .unwrap();
    assert_eq_str!(result, expected);
}
#[track_caller]
fn test_board(input: &str, expected: &str) {
    let result = html2text(input, BASE_URL);
    assert_eq_str!(result, expected);
}

/// Marks every kind of emphasis with braces, to count them.
#[derive(Clone, Debug, Default)]
struct BraceDecorator {}

impl TextDecorator for BraceDecorator {
    fn decorate_em_start(&mut self) -> String {
        "{".to_string()
    }
    fn decorate_em_end(&mut self) -> String {
        "}".to_string()
    }
    fn decorate_strong_start(&mut self) -> String {
        "{".to_string()
    }
    fn decorate_strong_end(&mut self) -> String {
        "}".to_string()
    }
    fn decorate_spoiler_start(&mut self) -> String {
        "{".to_string()
    }
    fn decorate_spoiler_end(&mut self) -> String {
        "}".to_string()
    }
    fn decorate_quote_start(&mut self) -> String {
        "{".to_string()
    }
    fn decorate_quote_end(&mut self) -> String {
        "}".to_string()
    }
}

#[test]
fn test_empty() {
    test_html(b"", "\n");
}

#[test]
fn test_paragraph() {
    test_html(br#"<p>Hello</p>"#, "Hello\n");
    test_html(br#"<p>Hello</p><p>world</p>"#, "Hello\n\nworld\n");
}

#[test]
fn test_whitespace_collapse() {
    test_html(b"<p>a   \n  b</p>", "a b\n");
    test_html(b"  leading and   trailing  ", "leading and trailing\n");
}

#[test]
fn test_br() {
    test_html(b"a<br>b", "a  \nb\n");
    test_html(b"a<br/>b", "a  \nb\n");
}

#[test]
fn test_hr() {
    test_html(b"<p>a</p><hr><p>b</p>", "a\n\n* * *\n\nb\n");
}

#[test]
fn test_headings() {
    test_html(b"<h1>Title</h1><p>Body</p>", "# Title\n\nBody\n");
    test_html(b"<h3>Third</h3>", "### Third\n");
    test_html(b"<h8>Deep</h8>", "######## Deep\n");
}

#[test]
fn test_ordered_list_start() {
    test_html(
        br#"<ol start="5"><li>a</li><li>b</li></ol>"#,
        "5. a\n6. b\n",
    );
}

#[test]
fn test_ordered_list_bad_start() {
    test_html(br#"<ol start="x"><li>a</li></ol>"#, "1. a\n");
    test_html(
        br#"<ol start="-9223372036854775808"><li>a</li></ol>"#,
        "1. a\n",
    );
    test_html(
        br#"<ol start="9223372036854775807"><li>a</li><li>b</li></ol>"#,
        "9223372036854775807. a\n9223372036854775807. b\n",
    );
}

#[test]
fn test_nested_lists() {
    test_html(
        b"<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>",
        "* a\n  * b\n* c\n",
    );
}

#[test]
fn test_ul_item_mark() {
    test_html_conf(b"<ul><li>x</li></ul>", "- x\n", |conf| conf.ul_item_mark("-"));
}

#[test]
fn test_definition_list() {
    test_html(b"<dl><dt>term</dt><dd>def</dd></dl>", "term\n    def\n");
}

#[test]
fn test_nested_blockquote() {
    test_html(
        b"<blockquote><blockquote>text</blockquote></blockquote>",
        ">> text\n",
    );
}

#[test]
fn test_blockquote_breaks() {
    test_html(
        b"<p>before</p><blockquote><p>quoted</p><blockquote>deeper</blockquote></blockquote><p>after</p>",
        "before\n\n> quoted\n>\n>> deeper\n\nafter\n",
    );
}

#[test]
fn test_blockquote_pre() {
    test_html(
        b"<blockquote><pre>a\nb</pre></blockquote>",
        ">     a\n>     b\n",
    );
}

#[test]
fn test_pre() {
    test_html(
        b"<pre>\nline1\n  line2\n</pre>",
        "    line1\n      line2\n\n",
    );
}

#[test]
fn test_table() {
    test_html(
        b"<table><tr><th>a</th><th>b</th><th>c</th></tr>\
          <tr><td>1</td><td>2</td><td>3</td></tr>\
          <tr><td>4</td><td>5</td><td>6</td></tr></table>",
        "a| b| c  \n---|---|---  \n1| 2| 3  \n4| 5| 6\n",
    );
}

#[test]
fn test_table_underline_once() {
    let text = config::plain().string_from_str(
        "<table><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td><td>e</td><td>f</td></tr></table>",
        "",
    );
    assert_eq!(text.matches("---|---|---").count(), 1);
}

#[test]
fn test_bypass_tables() {
    test_html_conf(
        b"<table><tr><td>a</td></tr></table>",
        "<table>  \n<tr>  \n<td>\n\na\n</td></tr></table>\n",
        |conf| conf.bypass_tables(true),
    );
}

#[test]
fn test_autolink() {
    test_html(
        br#"<a href="https://x.test/">https://x.test/</a>"#,
        "<https://x.test/>\n",
    );
}

#[test]
fn test_inline_link() {
    test_html(
        br#"<a href="http://x.test/page">the page</a>"#,
        "[the page](http://x.test/page)\n",
    );
    test_html(
        br#"<a href="http://x.test/(1)">p</a>"#,
        "[p](http://x.test/\\(1\\))\n",
    );
    test_html(
        br#"<a href="http://x.test/?a=1&amp;b=2">q</a>"#,
        "[q](http://x.test/?a=1&b=2)\n",
    );
}

#[test]
fn test_empty_link() {
    test_html(br#"<a href="http://x.test/"></a>"#, "[](http://x.test/)\n");
}

#[test]
fn test_reference_links() {
    let text = config::plain()
        .inline_links(false)
        .string_from_str(
            r#"<p>See <a href="/a">one</a> and <a href="/a">again</a>.</p>"#,
            "http://x.test/",
        );
    assert_eq_str!(text, "See [one][1] and [again][1].\n\n   [1]: http://x.test/a\n\n");
}

#[test]
fn test_reference_link_titles() {
    let text = config::plain().inline_links(false).string_from_str(
        r#"<a href="/a" title="T">x</a> <a href="/a">y</a>"#,
        "http://x.test/",
    );
    assert_eq_str!(
        text,
        "[x][1] [y][2]\n\n   [1]: http://x.test/a (T)\n   [2]: http://x.test/a\n\n"
    );
}

#[test]
fn test_links_each_paragraph() {
    test_html_conf(
        br#"<p><a href="http://x.test/1">one</a></p><p>two</p>"#,
        "[one][1]\n\n   [1]: http://x.test/1\n\ntwo\n",
        |conf| conf.inline_links(false).links_each_paragraph(true),
    );
}

#[test]
fn test_link_options() {
    test_html(br##"<a href="#top">top</a>"##, "top\n");
    test_html_conf(br##"<a href="#top">top</a>"##, "[top](#top)\n", |conf| {
        conf.skip_internal_links(false)
    });
    test_html_conf(
        br#"<a href="http://x.test/">x</a>"#,
        "[x](<http://x.test/>)\n",
        |conf| conf.protect_links(true),
    );
    test_html_conf(br#"<a href="http://x.test/">x</a>"#, "x\n", |conf| {
        conf.ignore_links(true)
    });
}

#[test]
fn test_images() {
    test_html(
        br#"<img src="/cat.png" alt="a [cat]">"#,
        "![a \\[cat\\]](/cat.png)\n",
    );
    test_html(b"<IMG SRC=pic.png ALT=pic>", "![pic](pic.png)\n");
    test_html_conf(
        br#"<img src="x.png" width="10" height="20" alt="x">"#,
        "<img src='x.png' width='10' height='20' alt='x' />\n",
        |conf| conf.images_with_size(true),
    );
    test_html_conf(
        br#"<img src="x.png" width="10" alt="x">"#,
        "![x](x.png)\n",
        |conf| conf.images_with_size(true),
    );
    test_html_conf(br#"<img src="x.png" alt="a cat">"#, "a cat\n", |conf| {
        conf.images_to_alt(true)
    });
    test_html_conf(br#"<p>before<img src="x.png">after</p>"#, "beforeafter\n", |conf| {
        conf.ignore_images(true)
    });
}

#[test]
fn test_emphasis() {
    test_html(b"<b>bold</b> <em>it</em>", "**bold** _it_\n");
    test_html(b"<p>a<b> bold </b>c</p>", "a **bold** c\n");
    test_html_conf(b"<b>bold</b> <em>it</em>", "bold it\n", |conf| {
        conf.ignore_emphasis(true)
    });
}

#[test]
fn test_empty_emphasis() {
    test_html(b"<p>x<b></b>y<em> </em>z</p>", "xy z\n");
}

#[test]
fn test_unclosed_emphasis() {
    test_html(b"<b>unclosed <i>nested", "**unclosed _nested_**\n");
}

#[test]
fn test_balanced_emphasis() {
    let inputs = [
        "<b>a<i>b</b>c</i>",
        "<b><i></b></i>x",
        "<em>unclosed",
        "</b>x<b>",
        "<span class=spoiler><b>s</span>t</b>",
        "<span class=unkfunc>&gt;q<b>",
        "<p><strong> </strong></p><i>\n</i>",
    ];
    for input in inputs {
        let text = config::with_decorator(BraceDecorator::default()).string_from_str(input, "");
        assert_eq!(
            text.matches('{').count(),
            text.matches('}').count(),
            "unbalanced: {:?} -> {:?}",
            input,
            text
        );
        let mut depth: i32 = 0;
        for c in text.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => (),
            }
            assert!(depth >= 0, "{:?} -> {:?}", input, text);
        }
    }
}

#[test]
fn test_strikeout() {
    test_html(b"<del>gone</del>", "<del>gone</del>\n");
    test_html(
        br#"<span style="text-decoration: line-through">x</span>y"#,
        "xy\n",
    );
    test_html_conf(
        br#"<span style="text-decoration: line-through">x</span>y"#,
        "y\n",
        |conf| conf.hide_strikethrough(true),
    );
}

#[test]
fn test_code() {
    test_html(b"<code>a*b</code>", "`a*b`\n");
}

#[test]
fn test_abbr() {
    test_html(
        br#"<p><abbr title="HyperText Markup Language">HTML</abbr> rocks</p>"#,
        "HTML rocks\n  *[HTML]: HyperText Markup Language\n",
    );
}

#[test]
fn test_entities() {
    test_html(
        b"<p>&lt;tag&gt; &amp; &#65;&#x42; &copy; &bogus; &nbsp;x</p>",
        "<tag> & AB \u{a9} &bogus; \u{a0}x\n",
    );
    test_html_conf(
        b"<p>it&rsquo;s &mdash; ok&nbsp;x</p>",
        "it's -- ok x\n",
        |conf| conf.unicode_snob(false),
    );
}

#[test]
fn test_literal_markup_chars() {
    test_html(b"<p>1 < 2</p>", "1 < 2\n");
    test_html(b"<p>fish & chips</p>", "fish & chips\n");
}

#[test]
fn test_escaping() {
    test_html(b"<p>1. not a list</p>", "1\\. not a list\n");
    test_html(b"<p>- dash</p>", "\\- dash\n");
    test_html(b"<p>*stars*</p>", "*stars*\n");
    test_html_conf(b"<p>*stars*</p>", "\\*stars\\*\n", |conf| conf.escape_snob(true));
}

#[test]
fn test_hidden_content() {
    test_html(
        br#"<!DOCTYPE html><html><head><title>T</title><style>.x{}</style></head><body><!-- hidden --><p>shown</p><script>var a = "<p>no</p>";</script></body></html>"#,
        "shown\n",
    );
}

#[test]
fn test_document_style() {
    test_html(
        b"<style>.big { font-weight: bold }</style><span class=\"big\">x</span>",
        "**x**\n",
    );
    test_html(
        b"<style>@import url(x.css); .i { font-style: italic }</style><span class=\"i\">x</span>",
        "_x_\n",
    );
}

#[test]
fn test_malformed_end_tags() {
    test_html(b"<p>a</b>b</div>c</p>", "abc\n");
    test_html(b"<div><b>bold<i>both</div>after", "**bold_both_**\n\nafter\n");
}

#[test]
fn test_single_line_break() {
    test_html_conf(b"<p>a</p><p>b</p>", "a\nb\n", |conf| conf.single_line_break(true));
}

#[test]
fn test_google_doc_huge_margin() {
    let expected = format!("{}* x\n", "  ".repeat(crate::css::MAX_NEST_COUNT));
    test_html_conf(
        br#"<ul><li style="margin-left:1e300px">x</li></ul>"#,
        &expected,
        |conf| conf.google_doc(true),
    );
    let board = crate::html2text(
        r#"<ul><li style="margin-left:1e300px">x</li></ul>"#,
        crate::BASE_URL,
    );
    assert!(board.contains("* x"));
}

#[test]
fn test_google_doc() {
    test_html_conf(b"<p>a</p><p>b</p>", "a  \nb\n", |conf| conf.google_doc(true));
    test_html_conf(
        br#"<ul><li style="margin-left:72px">deep</li></ul>"#,
        "    * deep\n",
        |conf| conf.google_doc(true),
    );
    test_html_conf(
        br#"<ul style="list-style-type:decimal"><li>x</li></ul>"#,
        "1. x\n",
        |conf| conf.google_doc(true),
    );
    test_html_conf(
        br#"<ol style="list-style-type:disc"><li>x</li></ol>"#,
        "* x\n",
        |conf| conf.google_doc(true),
    );
}

#[test]
fn test_wrapping() {
    test_html_conf(
        b"<p>The quick brown fox jumps over the lazy dog</p>",
        "The quick brown fox\njumps over the lazy\ndog\n\n",
        |conf| conf.body_width(20),
    );
}

#[test]
#[should_panic]
fn test_single_line_break_with_wrapping() {
    let _ = config::plain()
        .single_line_break(true)
        .body_width(20)
        .string_from_str("<p>x</p>", "");
}

#[test]
fn test_trivial_decorator() {
    test_html_conf_dec(TrivialDecorator::new(), b"<b>x</b> <i>y</i>", "x y\n", |conf| conf);
}

#[test]
fn test_invalid_utf8() {
    test_html(b"<p>caf\xe9</p>", "caf\u{fffd}\n");
}

#[test]
fn test_chunked_input() {
    let html = "<p>Some <b>bold</b> &amp; <a href=\"http://x.test/\">linked</a> text</p><ol><li>one</li></ol>";
    let whole = config::plain().string_from_str(html, "");
    for size in [1, 2, 3, 7, 16] {
        let mut renderer = TextRenderer::new(RenderOptions::default(), PlainDecorator::new(), "");
        let mut tokenizer = Tokenizer::new();
        let chars: Vec<char> = html.chars().collect();
        for chunk in chars.chunks(size) {
            let chunk: String = chunk.iter().collect();
            tokenizer.feed(&chunk, &mut renderer);
        }
        tokenizer.close(&mut renderer);
        let rendered = renderer.finish();
        assert_eq_str!(rendered, whole);
    }
}

#[test]
fn test_board_quotes() {
    test_board(
        r#"<a href="/b/res/100.html#101" class="post-reply-link" data-thread="100" data-num="101">&gt;&gt;101</a><br>Привет, <strong>анон</strong>!<br><span class="unkfunc">&gt;цитата</span>"#,
        ">>101  \nПривет, **анон**!  \n>цитата\n",
    );
}

#[test]
fn test_board_spoiler() {
    test_board(
        r#"<span class="unkfunc">&gt;quoted</span><br><span class="spoiler">secret</span>"#,
        ">quoted  \n%%secret%%\n",
    );
}

#[test]
fn test_board_links_dropped() {
    test_board(r#"see <a href="https://example.test/x">this</a>"#, "see this\n");
}
