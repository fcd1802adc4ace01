//! Reply drafts, edited as text files.
//!
//! A draft starts with a TOML header between `+++` lines, and the rest of
//! the file is the comment:
//!
//! ```text
//! +++
//! postready = true
//! name = ""
//! subject = ""
//! email = "sage"
//! images = ["cat.jpg"]
//! +++
//! >>12345
//! Nice cat.
//! ```

use crate::board::{Attachment, Reply, MAX_IMAGES};
use crate::{Error, Result};
use log::warn;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const FENCE: &str = "+++";

/// The text a new draft starts with.
pub const TEMPLATE: &str = "\
+++
# Set to true when the reply should be posted.
postready = false
name = \"\"
subject = \"\"
email = \"\"
# Up to four files to attach.
images = []
+++
";

/// A new draft, optionally replying to post `quote`.
pub fn template(quote: Option<&str>) -> String {
    match quote {
        Some(num) => format!("{}>>{}\n", TEMPLATE, num),
        None => TEMPLATE.to_string(),
    }
}

/// The settings at the top of a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DraftHeader {
    /// `false` holds the draft back; missing counts as ready.
    pub postready: Option<bool>,
    /// The author's name.
    pub name: String,
    /// The subject.
    pub subject: String,
    /// The author's email.
    pub email: String,
    /// Files to attach.
    pub images: Vec<PathBuf>,
}

/// A parsed draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// The header settings.
    pub header: DraftHeader,
    /// The comment text.
    pub comment: String,
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl Draft {
    /// Load the attachments and build the reply. Files beyond the
    /// board's limit are left out.
    pub fn into_reply(self) -> Result<Reply> {
        let DraftHeader {
            name,
            subject,
            email,
            images,
            ..
        } = self.header;
        if images.len() > MAX_IMAGES {
            warn!("only the first {} of {} images are attached", MAX_IMAGES, images.len());
        }
        let images = images
            .iter()
            .take(MAX_IMAGES)
            .map(Attachment::from_path)
            .collect::<Result<Vec<_>>>()?;
        Ok(Reply {
            comment: self.comment,
            name: non_empty(name),
            subject: non_empty(subject),
            email: non_empty(email),
            images,
        })
    }
}

/// Parse the text of a draft.
///
/// Fails with `Error::NotReady` when the header says `postready = false`,
/// and with `Error::Draft` when the header is missing or the draft has
/// neither a comment nor images.
pub fn parse_draft(text: &str) -> Result<Draft> {
    let mut lines = text.split_inclusive('\n');
    if lines.next().map(str::trim) != Some(FENCE) {
        return Err(Error::Draft("the draft doesn't start with a +++ header".to_string()));
    }
    let mut header = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == FENCE {
            closed = true;
            break;
        }
        header.push_str(line);
    }
    if !closed {
        return Err(Error::Draft("the draft's +++ header isn't closed".to_string()));
    }
    let comment: String = lines.collect();
    let comment = comment.trim_start_matches(['\r', '\n']).trim_end().to_string();

    let header: DraftHeader = toml::from_str(&header)?;
    if header.postready == Some(false) {
        return Err(Error::NotReady);
    }
    if comment.trim().is_empty() && header.images.is_empty() {
        return Err(Error::Draft("Empty post".to_string()));
    }
    Ok(Draft { header, comment })
}

/// Create a new file in the temporary directory, named with `prefix` and
/// `suffix`, and open it for writing.
pub fn create_temp_file(prefix: &str, suffix: &str) -> Result<(PathBuf, File)> {
    let dir = std::env::temp_dir();
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let mut attempt: u32 = 0;
    loop {
        let name = format!(
            "{}-{}-{:08x}{}",
            prefix,
            std::process::id(),
            seed.wrapping_add(attempt),
            suffix
        );
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < 100 => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{create_temp_file, parse_draft, template, DraftHeader, TEMPLATE};
    use crate::Error;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_parse_draft() {
        let draft = parse_draft(
            "+++\n\
             postready = true\n\
             name = \"Anon\"\n\
             email = \"sage\"\n\
             images = [\"a.png\", \"b.jpg\"]\n\
             +++\n\
             >>123\n\
             Hello there\n\n",
        )
        .unwrap();
        assert_eq!(
            draft.header,
            DraftHeader {
                postready: Some(true),
                name: "Anon".to_string(),
                subject: String::new(),
                email: "sage".to_string(),
                images: vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")],
            }
        );
        assert_eq!(draft.comment, ">>123\nHello there");
    }

    #[test]
    fn test_missing_postready() {
        let draft = parse_draft("+++\n+++\ntext\n").unwrap();
        assert_eq!(draft.header.postready, None);
        assert_eq!(draft.comment, "text");
    }

    #[test]
    fn test_template_not_ready() {
        match parse_draft(&template(Some("42"))) {
            Err(Error::NotReady) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(template(Some("42")).ends_with("+++\n>>42\n"));
        assert_eq!(template(None), TEMPLATE);
    }

    #[test]
    fn test_bad_drafts() {
        match parse_draft("just a comment\n") {
            Err(Error::Draft(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
        match parse_draft("+++\npostready = true\ncomment\n") {
            Err(Error::Draft(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
        match parse_draft("+++\npostready = true\n+++\n  \n") {
            Err(Error::Draft(msg)) => assert_eq!(msg, "Empty post"),
            other => panic!("unexpected {:?}", other),
        }
        match parse_draft("+++\npostready = yes\n+++\ntext\n") {
            Err(Error::Toml(_)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_into_reply() {
        let (path, mut file) = create_temp_file("sosuch-test", ".png").unwrap();
        file.write_all(b"PNG").unwrap();
        drop(file);

        let text = format!(
            "+++\npostready = true\nsubject = \"Hi\"\nimages = [{:?}]\n+++\n",
            path.to_string_lossy()
        );
        let reply = parse_draft(&text).unwrap().into_reply().unwrap();
        assert_eq!(reply.comment, "");
        assert_eq!(reply.subject.as_deref(), Some("Hi"));
        assert_eq!(reply.name, None);
        assert_eq!(reply.images.len(), 1);
        assert_eq!(reply.images[0].data, b"PNG");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_create_temp_file() {
        let (a, _) = create_temp_file("sosuch-test", ".md").unwrap();
        let (b, _) = create_temp_file("sosuch-test", ".md").unwrap();
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with(".md"));
        std::fs::remove_file(a).unwrap();
        std::fs::remove_file(b).unwrap();
    }
}
