extern crate argparse;
extern crate env_logger;
extern crate sosuch;

use argparse::{ArgumentParser, Collect, List, Store, StoreOption};
use log::{debug, warn};
use sosuch::board::display::{format_post, format_summary, Palette, RULE};
use sosuch::board::{Attachment, BoardClient, Post, Reply, MAX_IMAGES};
use sosuch::captcha;
use sosuch::config;
use sosuch::draft::{create_temp_file, parse_draft, template};
use sosuch::render::text_renderer::PlainDecorator;
use std::io::{self, stderr, stdout, Write};
use std::path::Path;
use std::process::{exit, Command};

/// What every command needs.
struct Session {
    client: BoardClient,
    board: String,
    resolver: String,
    palette: Palette,
    colour: bool,
}

impl Session {
    fn render(&self, html: &str) -> String {
        #[cfg(feature = "ansi_colours")]
        {
            if self.colour {
                return config::board(sosuch::RichDecorator::new())
                    .string_from_str(html, self.client.base_url());
            }
        }
        config::board(PlainDecorator::new()).string_from_str(html, self.client.base_url())
    }

    fn print_post(&self, post: &Post) {
        print!(
            "{}",
            format_post(post, &self.board, self.client.base_url(), &self.palette, |html| {
                self.render(html)
            })
        );
    }

    fn submit(&self, thread: &str, reply: &Reply) -> sosuch::Result<()> {
        let answer = captcha::resolve(&self.client, &self.resolver)?;
        let num = self.client.submit(&self.board, thread, reply, &answer)?;
        println!("OK: {}", num);
        Ok(())
    }
}

fn parse_or_exit(ap: &ArgumentParser, args: Vec<String>) {
    if let Err(code) = ap.parse(args, &mut stdout(), &mut stderr()) {
        exit(code);
    }
}

fn fail(err: sosuch::Error) -> ! {
    eprintln!("{}", err);
    exit(1);
}

fn show_catalog(session: &Session) -> sosuch::Result<()> {
    for post in session.client.catalog(&session.board)? {
        session.print_post(&post);
        let summary = format_summary(&post, &session.palette);
        if !summary.is_empty() {
            println!("{}", summary);
        }
        println!("{}", RULE);
    }
    Ok(())
}

fn show_thread(session: &Session, thread: &str) -> sosuch::Result<()> {
    for post in session.client.thread(&session.board, thread)? {
        session.print_post(&post);
        println!("{}", RULE);
    }
    Ok(())
}

fn post_command(session: &Session, thread: &str, args: Vec<String>) {
    let mut comment = String::new();
    let mut name: Option<String> = None;
    let mut subject: Option<String> = None;
    let mut email: Option<String> = None;
    let mut images: Vec<String> = Vec::new();
    let mut quote: Option<String> = None;
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Post a reply to the thread");
        ap.refer(&mut comment)
            .required()
            .add_option(&["-c", "--comment"], Store, "Comment text");
        ap.refer(&mut name)
            .add_option(&["-n", "--name"], StoreOption, "Author name");
        ap.refer(&mut subject)
            .add_option(&["-s", "--subject"], StoreOption, "Subject");
        ap.refer(&mut email)
            .add_option(&["-m", "--email"], StoreOption, "Email (sage)");
        ap.refer(&mut images).add_option(
            &["-i", "--image"],
            Collect,
            "File to attach (up to four, may be repeated)",
        );
        ap.refer(&mut quote)
            .add_option(&["-q", "--quote"], StoreOption, "Post number to reply to");
        parse_or_exit(&ap, args);
    }

    if images.len() > MAX_IMAGES {
        warn!("only the first {} of {} images are attached", MAX_IMAGES, images.len());
    }
    let attachments = images
        .iter()
        .take(MAX_IMAGES)
        .map(Attachment::from_path)
        .collect::<sosuch::Result<Vec<_>>>()
        .unwrap_or_else(|e| fail(e));
    let mut reply = Reply {
        comment,
        name,
        subject,
        email,
        images: attachments,
    };
    if let Some(num) = quote {
        reply = reply.quoting(&num);
    }
    if let Err(e) = session.submit(thread, &reply) {
        fail(e);
    }
}

fn submit_draft(session: &Session, thread: &str, path: &Path) -> sosuch::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let reply = parse_draft(&text)?.into_reply()?;
    session.submit(thread, &reply)
}

fn file_command(session: &Session, thread: &str, args: Vec<String>) {
    let mut path = String::new();
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Post a reply from a draft file");
        ap.refer(&mut path)
            .required()
            .add_argument("path", Store, "The draft file");
        parse_or_exit(&ap, args);
    }
    if let Err(e) = submit_draft(session, thread, Path::new(&path)) {
        fail(e);
    }
}

fn editor_command(session: &Session, thread: &str, args: Vec<String>) {
    let mut quote: Option<String> = None;
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Write a reply in $EDITOR and post it");
        ap.refer(&mut quote)
            .add_option(&["-q", "--quote"], StoreOption, "Post number to reply to");
        parse_or_exit(&ap, args);
    }

    let (path, mut file) = create_temp_file("sosuch", ".md").unwrap_or_else(|e| fail(e));
    if let Err(e) = file.write_all(template(quote.as_deref()).as_bytes()) {
        fail(e.into());
    }
    drop(file);

    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "vim".to_string());
    debug!("running {} {}", editor, path.display());
    match Command::new(&editor).arg(&path).status() {
        Ok(status) if status.success() => {}
        Ok(status) => {
            eprintln!("{} exited with {}; the draft is kept in {}", editor, status, path.display());
            exit(1);
        }
        Err(e) => {
            eprintln!("can't run {}: {}; the draft is kept in {}", editor, e, path.display());
            exit(1);
        }
    }

    match submit_draft(session, thread, &path) {
        Ok(()) => {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("couldn't remove {}: {}", path.display(), e);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("The draft is kept in {}", path.display());
            exit(1);
        }
    }
}

fn thread_command(session: &Session, args: Vec<String>) {
    let mut thread = String::new();
    let mut command: Option<String> = None;
    let mut rest: Vec<String> = Vec::new();
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Show a thread, or reply to it");
        ap.refer(&mut thread)
            .required()
            .add_argument("num", Store, "Thread number");
        ap.refer(&mut command).add_argument(
            "command",
            StoreOption,
            r#"What to do: "post", "file" or "editor" (default: show the thread)"#,
        );
        ap.refer(&mut rest)
            .add_argument("arguments", List, "Arguments for the command");
        ap.stop_on_first_argument(true);
        parse_or_exit(&ap, args);
    }

    match command.as_deref() {
        None => {
            if let Err(e) = show_thread(session, &thread) {
                fail(e);
            }
        }
        Some(cmd) => {
            rest.insert(0, format!("thread {} {}", thread, cmd));
            match cmd {
                "post" => post_command(session, &thread, rest),
                "file" => file_command(session, &thread, rest),
                "editor" => editor_command(session, &thread, rest),
                other => {
                    eprintln!("Unknown command {:?}; try post, file or editor", other);
                    exit(2);
                }
            }
        }
    }
}

fn main() {
    env_logger::init();

    let mut base_url = sosuch::BASE_URL.to_string();
    let mut resolver: Option<String> = None;
    let mut board = String::new();
    let mut args: Vec<String> = Vec::new();
    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Read and post to 2ch.hk from the terminal");
        ap.refer(&mut base_url)
            .add_option(&["--base-url"], Store, "The board site (default https://2ch.hk)");
        ap.refer(&mut resolver).add_option(
            &["--captcha-resolver"],
            StoreOption,
            "Program which solves CAPTCHA images (default $SOSUCH_CAPTCHA_RESOLVER or 2chaptcha_resolve.py)",
        );
        ap.refer(&mut board)
            .required()
            .add_argument("board", Store, "Board name, e.g. b");
        ap.refer(&mut args)
            .add_argument("arguments", List, r#"Optionally "thread NUM [post|file|editor ...]""#);
        ap.stop_on_first_argument(true);
        ap.parse_args_or_exit();
    }

    let client = BoardClient::new(&base_url).unwrap_or_else(|e| fail(e));
    #[cfg(feature = "ansi_colours")]
    let (colour, palette) = if termion::is_tty(&io::stdout()) {
        (true, Palette::coloured())
    } else {
        (false, Palette::plain())
    };
    #[cfg(not(feature = "ansi_colours"))]
    let (colour, palette) = (false, Palette::plain());
    let session = Session {
        client,
        board,
        resolver: captcha::resolver_program(resolver.as_deref()),
        palette,
        colour,
    };

    match args.first().map(String::as_str) {
        None => {
            if let Err(e) = show_catalog(&session) {
                fail(e);
            }
        }
        Some("thread") => thread_command(&session, args),
        Some(other) => {
            eprintln!("Unknown command {:?}; try thread", other);
            exit(2);
        }
    }
    let _ = io::stdout().flush();
}
