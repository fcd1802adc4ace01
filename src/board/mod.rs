//! A blocking client for the board's JSON API: catalogs, threads, CAPTCHAs
//! and posting.

pub mod display;

use crate::{Error, Result};
use log::debug;
use reqwest::blocking::{multipart, Client, Response};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use url::Url;

/// The most files one post may carry.
pub const MAX_IMAGES: usize = 4;

/// A post number. The API gives these as numbers or as strings, depending
/// on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PostNumber {
    /// A numeric post number.
    Int(u64),
    /// A post number given as a string.
    Text(String),
}

impl Default for PostNumber {
    fn default() -> PostNumber {
        PostNumber::Int(0)
    }
}

impl fmt::Display for PostNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PostNumber::Int(n) => write!(f, "{}", n),
            PostNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Flags are `0`/`1` in most answers, and occasionally booleans.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }
    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n == 1,
        Some(Flag::Text(s)) => s == "1",
        None => false,
    })
}

/// A file attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostFile {
    /// The path of the file below the board.
    pub path: String,
    /// The file's display name.
    pub displayname: Option<String>,
}

/// One post, as the catalog and thread answers give it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Post {
    /// The post number.
    pub num: PostNumber,
    /// The subject, as HTML.
    pub subject: String,
    /// The author's name, with entities.
    pub name: String,
    /// The author's email, if any.
    pub email: String,
    /// The date, preformatted by the board.
    pub date: String,
    /// The comment, as HTML.
    pub comment: String,
    /// Whether the author was banned for this post.
    #[serde(deserialize_with = "flag")]
    pub banned: bool,
    /// Whether the thread is pinned.
    #[serde(deserialize_with = "flag")]
    pub sticky: bool,
    /// Whether the thread is closed.
    #[serde(deserialize_with = "flag")]
    pub closed: bool,
    /// Attached files.
    pub files: Option<Vec<PostFile>>,
    /// Replies in the thread (catalog only).
    pub posts_count: u64,
    /// Files in the thread (catalog only).
    pub files_count: u64,
}

/// The answer for `catalog.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// The opening post of each thread.
    pub threads: Vec<Post>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ThreadPosts {
    posts: Vec<Post>,
}

/// The answer for `res/{num}.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreadPage {
    threads: Vec<ThreadPosts>,
}

impl ThreadPage {
    /// The posts of the thread, oldest first.
    pub fn into_posts(self) -> Vec<Post> {
        self.threads
            .into_iter()
            .next()
            .map(|t| t.posts)
            .unwrap_or_default()
    }
}

/// The board's answer to a post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostingReply {
    /// `OK` or `Redirect` on success.
    #[serde(rename = "Status")]
    pub status: Option<String>,
    /// The new post's number (for `OK`).
    #[serde(rename = "Num")]
    pub num: Option<PostNumber>,
    /// The new thread's number (for `Redirect`).
    #[serde(rename = "Target")]
    pub target: Option<PostNumber>,
    /// The error code on failure.
    #[serde(rename = "Error")]
    pub error: Option<i64>,
    /// The explanation on failure.
    #[serde(rename = "Reason")]
    pub reason: Option<String>,
}

impl PostingReply {
    /// The number of the new post, or the board's complaint.
    pub fn into_result(self) -> Result<PostNumber> {
        match self.status.as_deref() {
            Some("OK") | Some("Redirect") => Ok(self.num.or(self.target).unwrap_or_default()),
            _ => Err(Error::Rejected {
                code: self.error.unwrap_or_default(),
                reason: self.reason.unwrap_or_default(),
            }),
        }
    }
}

/// A file to upload with a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The name the board sees.
    pub file_name: String,
    /// The file contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Read the file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Attachment> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Attachment { file_name, data })
    }
}

/// A reply to submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// The comment text.
    pub comment: String,
    /// The author's name.
    pub name: Option<String>,
    /// The subject.
    pub subject: Option<String>,
    /// The author's email (`sage` by convention to not bump).
    pub email: Option<String>,
    /// Attached files; only the first `MAX_IMAGES` are sent.
    pub images: Vec<Attachment>,
}

impl Reply {
    /// A reply with only a comment.
    pub fn new(comment: &str) -> Reply {
        Reply {
            comment: comment.to_string(),
            ..Default::default()
        }
    }

    /// Prefix the comment with a reference to post `num`.
    pub fn quoting(mut self, num: &str) -> Reply {
        self.comment = format!(">>{}\n{}", num, self.comment);
        self
    }

    fn form(&self) -> multipart::Form {
        let mut form = multipart::Form::new().text("comment", self.comment.clone());
        let optional = [
            ("name", &self.name),
            ("subject", &self.subject),
            ("email", &self.email),
        ];
        for (field, value) in optional {
            if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                form = form.text(field, value.clone());
            }
        }
        for (i, image) in self.images.iter().take(MAX_IMAGES).enumerate() {
            let part = multipart::Part::bytes(image.data.clone()).file_name(image.file_name.clone());
            form = form.part(format!("image{}", i), part);
        }
        form
    }
}

/// The client for one board site.
#[derive(Debug, Clone)]
pub struct BoardClient {
    http: Client,
    base: String,
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Status(status.as_u16()))
    }
}

impl BoardClient {
    /// Create a client for the site at `base_url`.
    pub fn new(base_url: &str) -> Result<BoardClient> {
        Url::parse(base_url)?;
        let http = Client::builder()
            .user_agent(concat!("sosuch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(BoardClient {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The site's address.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}/{}", self.base, path))?)
    }

    fn get_text(&self, url: Url) -> Result<String> {
        debug!("GET {}", url);
        let response = check_status(self.http.get(url).send()?)?;
        Ok(response.text()?)
    }

    /// The opening posts of every thread on `board`.
    pub fn catalog(&self, board: &str) -> Result<Vec<Post>> {
        let body = self.get_text(self.endpoint(&format!("{}/catalog.json", board))?)?;
        let catalog: Catalog = serde_json::from_str(&body)?;
        Ok(catalog.threads)
    }

    /// All posts of thread `num` on `board`.
    pub fn thread(&self, board: &str, num: &str) -> Result<Vec<Post>> {
        let body = self.get_text(self.endpoint(&format!("{}/res/{}.json", board, num))?)?;
        let page: ThreadPage = serde_json::from_str(&body)?;
        Ok(page.into_posts())
    }

    fn captcha_url(&self, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.endpoint("makaba/captcha.fcgi")?;
        url.query_pairs_mut()
            .append_pair("type", "2chaptcha")
            .extend_pairs(params);
        Ok(url)
    }

    /// Ask for a new CAPTCHA, returning the raw answer.
    pub fn captcha_request(&self) -> Result<String> {
        self.get_text(self.captcha_url(&[("action", "thread")])?)
    }

    /// Download the image for CAPTCHA `id`.
    pub fn captcha_image(&self, id: &str) -> Result<Vec<u8>> {
        let url = self.captcha_url(&[("action", "image"), ("id", id)])?;
        debug!("GET {}", url);
        let response = check_status(self.http.get(url).send()?)?;
        Ok(response.bytes()?.to_vec())
    }

    /// Post `reply` to thread `thread` on `board`, returning the new post's
    /// number.
    pub fn submit(
        &self,
        board: &str,
        thread: &str,
        reply: &Reply,
        captcha: &crate::captcha::CaptchaAnswer,
    ) -> Result<PostNumber> {
        let mut url = self.endpoint("makaba/posting.fcgi")?;
        url.query_pairs_mut()
            .append_pair("json", "1")
            .append_pair("task", "post")
            .append_pair("captcha_type", "2chaptcha")
            .append_pair("board", board)
            .append_pair("thread", thread)
            .append_pair("2chaptcha_id", &captcha.id)
            .append_pair("2chaptcha_value", &captcha.value);
        debug!("POST {} ({} files)", url, reply.images.len().min(MAX_IMAGES));
        let response = check_status(self.http.post(url).multipart(reply.form()).send()?)?;
        let answer: PostingReply = serde_json::from_str(&response.text()?)?;
        answer.into_result()
    }
}
