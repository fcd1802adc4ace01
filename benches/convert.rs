#![feature(test)]
extern crate sosuch;
extern crate test;

use ::test::Bencher;

use sosuch::config;

fn make_html(content: &str) -> String {
    String::from("<html><body>") + content + "</body></html>"
}

fn make_tab(cell: &str, rows: usize, cols: usize) -> String {
    let mut result = String::from("<table>");
    for _ in 0..rows {
        result.push_str("<tr>");
        for _ in 0..cols {
            result.push_str("<td>");
            result.push_str(cell);
            result.push_str("</td>");
        }
        result.push_str("</tr>");
    }
    result
}

fn make_post(paragraphs: usize) -> String {
    let mut result = String::new();
    for i in 0..paragraphs {
        result.push_str(&format!(
            "<a href=\"/b/res/1.html#{n}\" class=\"post-reply-link\">&gt;&gt;{n}</a><br>\
             <span class=\"unkfunc\">&gt;quoted text</span><br>\
             Some <strong>bold</strong> and <em>italic</em> text, a \
             <span class=\"spoiler\">spoiler</span> and * stars *.<br>",
            n = 1000 + i
        ));
    }
    result
}

fn convert(html: &str) -> String {
    config::plain().string_from_str(html, "https://2ch.hk")
}

#[bench]
fn bench_empty(b: &mut Bencher) {
    let html = make_html("");
    b.iter(|| convert(&html));
}

#[bench]
fn bench_tab_4_4(b: &mut Bencher) {
    let html = make_html(&make_tab("cell", 4, 4));
    b.iter(|| convert(&html));
}

#[bench]
fn bench_tab_20_20(b: &mut Bencher) {
    let html = make_html(&make_tab("cell", 20, 20));
    b.iter(|| convert(&html));
}

#[bench]
fn bench_post_10(b: &mut Bencher) {
    let html = make_post(10);
    b.iter(|| sosuch::html2text(&html, sosuch::BASE_URL));
}

#[bench]
fn bench_post_500(b: &mut Bencher) {
    let html = make_post(500);
    b.iter(|| sosuch::html2text(&html, sosuch::BASE_URL));
}

#[bench]
fn bench_wrapped_post(b: &mut Bencher) {
    let html = make_post(50);
    b.iter(|| config::plain().body_width(60).string_from_str(&html, ""));
}
