extern crate argparse;
extern crate sosuch;
use argparse::{ArgumentParser, Store, StoreOption, StoreTrue};
use sosuch::config::{self, Config};
use sosuch::render::text_renderer::{TextDecorator, TrivialDecorator};
use std::io;
use std::io::Write;

struct Options {
    width: usize,
    base_url: String,
    board: bool,
    reference_links: bool,
    ignore_images: bool,
    escape_all: bool,
}

fn apply<D: TextDecorator>(conf: Config<D>, options: &Options) -> Config<D> {
    let conf = if options.board {
        conf.ignore_links(true).google_doc(true)
    } else {
        conf
    };
    conf.body_width(options.width)
        .inline_links(!options.reference_links)
        .ignore_images(options.ignore_images)
        .escape_snob(options.escape_all)
}

fn translate<R>(input: R, options: &Options, literal: bool, _use_colour: bool) -> sosuch::Result<String>
where
    R: io::Read,
{
    #[cfg(feature = "ansi_colours")]
    {
        if _use_colour {
            return apply(config::rich(), options).string_from_read(input, &options.base_url);
        };
    }
    if literal {
        apply(config::with_decorator(TrivialDecorator::new()), options)
            .string_from_read(input, &options.base_url)
    } else {
        apply(config::plain(), options).string_from_read(input, &options.base_url)
    }
}

fn main() {
    let mut infile: Option<String> = None;
    let mut outfile: Option<String> = None;
    let mut literal: bool = false;
    #[allow(unused)]
    let mut use_colour = false;
    let mut options = Options {
        width: 0,
        base_url: String::new(),
        board: false,
        reference_links: false,
        ignore_images: false,
        escape_all: false,
    };

    {
        let mut ap = ArgumentParser::new();
        ap.refer(&mut infile).add_argument(
            "infile",
            StoreOption,
            "Input HTML file (default is standard input)",
        );
        ap.refer(&mut options.width).add_option(
            &["-w", "--width"],
            Store,
            "Column width to wrap paragraphs to (default is 0, no wrapping)",
        );
        ap.refer(&mut outfile).add_option(
            &["-o", "--output"],
            StoreOption,
            "Output file (default is standard output)",
        );
        ap.refer(&mut options.base_url).add_option(
            &["-b", "--base-url"],
            Store,
            "URL which relative links are resolved against",
        );
        ap.refer(&mut options.board).add_option(
            &["--board"],
            StoreTrue,
            "Render the way board posts are shown",
        );
        ap.refer(&mut options.reference_links).add_option(
            &["-r", "--reference-links"],
            StoreTrue,
            "List link targets at the end rather than inline",
        );
        ap.refer(&mut options.ignore_images).add_option(
            &["--ignore-images"],
            StoreTrue,
            "Leave images out",
        );
        ap.refer(&mut options.escape_all).add_option(
            &["--escape-all"],
            StoreTrue,
            "Escape every markdown special character",
        );
        ap.refer(&mut literal).add_option(
            &["-L", "--literal"],
            StoreTrue,
            "Output only literal text (no decorations)",
        );
        #[cfg(feature = "ansi_colours")]
        ap.refer(&mut use_colour)
            .add_option(&["--colour"], StoreTrue, "Use ANSI terminal colours");
        ap.parse_args_or_exit();
    }

    let data = match infile {
        None => {
            let stdin = io::stdin();
            translate(&mut stdin.lock(), &options, literal, use_colour)
        }
        Some(name) => {
            let mut file = std::fs::File::open(name).expect("Tried to open file");
            translate(&mut file, &options, literal, use_colour)
        }
    }
    .expect("Failed to read input");

    match outfile {
        None => {
            print!("{}", data);
        }
        Some(name) => {
            let mut file = std::fs::File::create(name).expect("Tried to create file");
            write!(file, "{}", data).unwrap();
        }
    };
}
