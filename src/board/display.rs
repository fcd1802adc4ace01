//! Formatting posts for the terminal.

use super::Post;
use crate::entities::unescape;

/// The rule printed after each post.
pub const RULE: &str =
    "--------------------------------------------------------------------------------";

/// The strings put around each part of a post's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    /// Post numbers.
    pub num: String,
    /// Subjects.
    pub subject: String,
    /// Author names.
    pub name: String,
    /// Author emails.
    pub email: String,
    /// Dates.
    pub date: String,
    /// The `[banned]` flag.
    pub banned: String,
    /// The `[sticky]` flag.
    pub sticky: String,
    /// The `[closed]` flag.
    pub closed: String,
    /// Attachment links.
    pub files: String,
    /// The catalog summary line.
    pub summary: String,
    /// Ends each part.
    pub reset: String,
}

impl Palette {
    /// No colours at all.
    pub fn plain() -> Palette {
        Palette::default()
    }

    /// Terminal colours.
    #[cfg(feature = "ansi_colours")]
    pub fn coloured() -> Palette {
        crate::ansi_colours::coloured_palette()
    }

    fn paint(&self, colour: &str, text: &str) -> String {
        format!("{}{}{}", colour, text, self.reset)
    }
}

fn flag(set: bool, label: &str) -> &str {
    if set {
        label
    } else {
        ""
    }
}

/// Format `post` from `board`, with file links below `base_url`. HTML
/// fields are turned into text with `render`.
pub fn format_post<F>(post: &Post, board: &str, base_url: &str, palette: &Palette, render: F) -> String
where
    F: Fn(&str) -> String,
{
    let subject = if post.subject.is_empty() {
        String::new()
    } else {
        format!("{} ", render(&post.subject).trim_end())
    };
    let email = if post.email.is_empty() {
        String::new()
    } else {
        format!("<{}> ", post.email)
    };

    let mut out = format!(
        "{}{}{}{} {} {}{}{}\n",
        palette.paint(&palette.subject, &subject),
        palette.paint(&palette.name, &format!("{} ", unescape(&post.name, true))),
        palette.paint(&palette.email, &email),
        palette.paint(&palette.date, &post.date),
        palette.paint(&palette.num, &format!(">>{}", post.num)),
        palette.paint(&palette.banned, flag(post.banned, "[banned]")),
        palette.paint(&palette.sticky, flag(post.sticky, "[sticky]")),
        palette.paint(&palette.closed, flag(post.closed, "[closed]")),
    );
    for file in post.files.iter().flatten() {
        let path = file.path.trim_start_matches('/');
        let path = path
            .strip_prefix(board)
            .and_then(|p| p.strip_prefix('/'))
            .unwrap_or(path);
        out.push_str(&palette.paint(&palette.files, &format!("{}/{}/{}", base_url, board, path)));
        out.push('\n');
    }
    out.push_str(render(&post.comment).trim_end());
    out.push('\n');
    out
}

/// The catalog's line about the replies a thread has; empty without
/// replies.
pub fn format_summary(post: &Post, palette: &Palette) -> String {
    if post.posts_count == 0 {
        return String::new();
    }
    palette.paint(
        &palette.summary,
        &format!(
            "Пропущено постов {} из них {} с картинками",
            post.posts_count, post.files_count
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::{format_post, format_summary, Palette};
    use crate::board::{Post, PostFile, PostNumber};
    use crate::{html2text, BASE_URL};

    fn render(html: &str) -> String {
        html2text(html, BASE_URL)
    }

    fn sample() -> Post {
        Post {
            num: PostNumber::Int(1234),
            subject: "Re: <b>news</b>".to_string(),
            name: "Anon &amp; co".to_string(),
            email: "sage".to_string(),
            date: "01/02/23 Втр 12:34:56".to_string(),
            comment: "Hello<br>world".to_string(),
            sticky: true,
            files: Some(vec![PostFile {
                path: "/b/src/1234/1.png".to_string(),
                displayname: None,
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_post() {
        let text = format_post(&sample(), "b", BASE_URL, &Palette::plain(), render);
        assert_eq!(
            text,
            "Re: **news** Anon & co <sage> 01/02/23 Втр 12:34:56 >>1234 [sticky]\n\
             https://2ch.hk/b/src/1234/1.png\n\
             Hello  \nworld\n"
        );
    }

    #[test]
    fn test_format_bare_post() {
        let post = Post {
            num: PostNumber::Text("7".to_string()),
            name: "Аноним".to_string(),
            date: "today".to_string(),
            comment: "hi".to_string(),
            ..Default::default()
        };
        assert_eq!(
            format_post(&post, "b", BASE_URL, &Palette::plain(), render),
            "Аноним today >>7 \nhi\n"
        );
    }

    #[test]
    fn test_paint() {
        let palette = Palette {
            num: "<".to_string(),
            reset: ">".to_string(),
            ..Default::default()
        };
        let text = format_post(&sample(), "b", BASE_URL, &palette, render);
        assert!(text.contains("<>>1234>"));
    }

    #[test]
    fn test_summary() {
        let mut post = sample();
        assert_eq!(format_summary(&post, &Palette::plain()), "");
        post.posts_count = 10;
        post.files_count = 2;
        assert_eq!(
            format_summary(&post, &Palette::plain()),
            "Пропущено постов 10 из них 2 с картинками"
        );
    }
}
