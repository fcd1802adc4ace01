//! Solving the board's CAPTCHA with an external resolver program.
//!
//! The board hands out a CAPTCHA id, then the image for it. The image is
//! saved to a temporary file and the resolver is run as
//! `RESOLVER ID IMAGE_PATH`; whatever it prints is the answer.

use crate::board::BoardClient;
use crate::draft::create_temp_file;
use crate::{Error, Result};
use log::{debug, warn};
use std::io::Write;
use std::process::Command;

/// The resolver run when none is configured.
pub const DEFAULT_RESOLVER: &str = "2chaptcha_resolve.py";

/// The environment variable naming the resolver.
pub const RESOLVER_ENV: &str = "SOSUCH_CAPTCHA_RESOLVER";

/// A solved CAPTCHA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaAnswer {
    /// The id the board gave out.
    pub id: String,
    /// The solution.
    pub value: String,
}

/// The resolver to run: `explicit` if given, then the environment, then
/// `DEFAULT_RESOLVER`.
pub fn resolver_program(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(RESOLVER_ENV).ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| DEFAULT_RESOLVER.to_string())
}

/// The CAPTCHA id from the board's answer: its last non-empty line.
pub fn parse_captcha_id(body: &str) -> Result<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
        .ok_or_else(|| Error::Captcha("no CAPTCHA id in the answer".to_string()))
}

/// Run `resolver` on the image at `image`, returning its trimmed output.
pub fn run_resolver(resolver: &str, id: &str, image: &std::path::Path) -> Result<String> {
    debug!("running {} {} {}", resolver, id, image.display());
    let output = Command::new(resolver)
        .arg(id)
        .arg(image)
        .output()
        .map_err(|e| Error::Captcha(format!("can't run {}: {}", resolver, e)))?;
    if !output.status.success() {
        return Err(Error::Captcha(format!("{} failed: {}", resolver, output.status)));
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() {
        return Err(Error::Captcha(format!("{} gave no answer", resolver)));
    }
    Ok(value)
}

/// Fetch a CAPTCHA from the board and solve it with `resolver`.
pub fn resolve(client: &BoardClient, resolver: &str) -> Result<CaptchaAnswer> {
    let id = parse_captcha_id(&client.captcha_request()?)?;
    debug!("CAPTCHA id {}", id);
    let image = client.captcha_image(&id)?;

    let (path, mut file) = create_temp_file("sosuch-captcha", ".png")?;
    let written = file.write_all(&image).and_then(|_| file.flush());
    drop(file);
    let value = written
        .map_err(Error::from)
        .and_then(|_| run_resolver(resolver, &id, &path));
    if let Err(e) = std::fs::remove_file(&path) {
        warn!("couldn't remove {}: {}", path.display(), e);
    }
    Ok(CaptchaAnswer { id, value: value? })
}
