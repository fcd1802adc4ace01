//! Terminal colours for the rendered posts.
//!
//! The `RichDecorator` replaces the markdown marks with ANSI escape
//! sequences, and the coloured palette highlights the post metadata the
//! way the client prints it.

use crate::board::display::Palette;
use crate::render::text_renderer::TextDecorator;
use termion::{color, style};

/// A decorator which colours emphasis, spoilers and quotes using ANSI
/// escape sequences instead of markdown marks.
#[derive(Clone, Debug, Default)]
pub struct RichDecorator {}

impl RichDecorator {
    /// Create a new `RichDecorator`.
    pub fn new() -> RichDecorator {
        RichDecorator {}
    }
}

fn reset() -> String {
    format!("{}", style::Reset)
}

impl TextDecorator for RichDecorator {
    fn decorate_em_start(&mut self) -> String {
        format!("{}", color::Fg(color::LightGreen))
    }

    fn decorate_em_end(&mut self) -> String {
        reset()
    }

    fn decorate_strong_start(&mut self) -> String {
        format!("{}{}", color::Fg(color::LightCyan), style::Bold)
    }

    fn decorate_strong_end(&mut self) -> String {
        reset()
    }

    fn decorate_spoiler_start(&mut self) -> String {
        // Readable only when selected.
        format!(
            "{}{}{}",
            color::Fg(color::White),
            color::Bg(color::White),
            style::Faint
        )
    }

    fn decorate_spoiler_end(&mut self) -> String {
        reset()
    }

    fn decorate_quote_start(&mut self) -> String {
        format!("{}{}", color::Fg(color::Green), style::Faint)
    }

    fn decorate_quote_end(&mut self) -> String {
        reset()
    }
}

/// The colours for post numbers, subjects, names and the rest.
pub(crate) fn coloured_palette() -> Palette {
    Palette {
        num: format!("{}", color::Fg(color::Cyan)),
        subject: format!("{}{}", color::Fg(color::White), style::Bold),
        name: format!("{}{}", color::Fg(color::Blue), style::Faint),
        email: format!("{}{}", color::Fg(color::LightBlue), style::Bold),
        date: format!("{}", color::Fg(color::Cyan)),
        banned: format!("{}", color::Fg(color::Red)),
        sticky: format!("{}", color::Fg(color::Yellow)),
        closed: format!("{}", color::Fg(color::Green)),
        files: format!("{}", color::Fg(color::Magenta)),
        summary: format!("{}{}", style::Faint, color::Fg(color::Green)),
        reset: reset(),
    }
}
