//! The 16x3 display drawn in a terminal with `crossterm`, and the keyboard
//! mapped onto the keypad.
//!
//! Layout is a fixed frame: a border tinted with the backlight colour, the
//! three rows, and a graph line underneath. Rows are repainted every redraw
//! tick so scrolling text keeps moving.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::app::Console;
use crate::cli::signals::ShutdownSignal;
use crate::display::{
    Backlight, GlyphSet, OptionRow, ROW_COUNT, ROW_WIDTH, Renderer, Rgb, TextDisplay,
};
use crate::input::InputEvent;

// ──────────────────── key mapping ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Input(InputEvent),
    Quit,
    Ignore,
}

/// Arrows navigate, Enter/Space select, Esc/Backspace cancel, `q` or
/// Ctrl-C quit.
#[must_use]
pub fn map_key(key: KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') => KeyAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => KeyAction::Input(InputEvent::Up),
        KeyCode::Down | KeyCode::Char('j') => KeyAction::Input(InputEvent::Down),
        KeyCode::Left | KeyCode::Char('h') => KeyAction::Input(InputEvent::Left),
        KeyCode::Right | KeyCode::Char('l') => KeyAction::Input(InputEvent::Right),
        KeyCode::Enter | KeyCode::Char(' ') => KeyAction::Input(InputEvent::Select),
        KeyCode::Esc | KeyCode::Backspace => KeyAction::Input(InputEvent::Cancel),
        _ => KeyAction::Ignore,
    }
}

// ──────────────────── display ────────────────────

const GRAPH_CELLS: usize = ROW_WIDTH;

/// [`TextDisplay`] that paints itself to a terminal writer.
pub struct TerminalDisplay<W: Write> {
    text: TextDisplay,
    out: W,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            text: TextDisplay::new(),
            out,
        }
    }

    #[must_use]
    pub const fn text(&self) -> &TextDisplay {
        &self.text
    }

    /// Draw the frame as of `now`.
    pub fn present(&mut self, now: Instant) -> io::Result<()> {
        let border = to_color(self.text.colour());
        let edge = format!("+{}+", "-".repeat(ROW_WIDTH));
        queue!(
            self.out,
            MoveTo(0, 0),
            SetForegroundColor(border),
            Print(&edge)
        )?;
        for row in 0..ROW_COUNT {
            let visible = self.text.visible_row(row, now);
            queue!(
                self.out,
                MoveTo(0, row as u16 + 1),
                SetForegroundColor(border),
                Print("|"),
                SetForegroundColor(Color::White),
                Print(visible),
                SetForegroundColor(border),
                Print("|")
            )?;
        }
        queue!(
            self.out,
            MoveTo(0, ROW_COUNT as u16 + 1),
            Print(&edge),
            MoveTo(0, ROW_COUNT as u16 + 2),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::DarkGrey),
            Print(format!(" {}", graph_line(self.text.graph()))),
            SetAttribute(Attribute::Reset)
        )?;
        self.out.flush()
    }

    fn present_quietly(&mut self) {
        if let Err(e) = self.present(Instant::now()) {
            log::debug!("terminal paint failed: {e}");
        }
    }
}

impl<W: Write> Renderer for TerminalDisplay<W> {
    fn write_row(&mut self, row: usize, text: &str) {
        self.text.write_row(row, text);
    }

    fn write_option(&mut self, row: usize, option: &OptionRow<'_>) {
        self.text.write_option(row, option);
    }

    fn clear_row(&mut self, row: usize) {
        self.text.clear_row(row);
    }

    fn load_glyphs(&mut self, glyphs: &GlyphSet) {
        self.text.load_glyphs(glyphs);
    }
}

impl<W: Write> Backlight for TerminalDisplay<W> {
    // The progress poller drives the graph once per tick while the
    // foreground blocks, so paint here too.
    fn set_graph(&mut self, ratio: f64) {
        self.text.set_graph(ratio);
        self.present_quietly();
    }

    fn set_rgb(&mut self, colour: Rgb) {
        self.text.set_rgb(colour);
    }
}

const fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// Backlight graph as a bar of [`GRAPH_CELLS`] cells.
fn graph_line(ratio: f64) -> String {
    let lit = ((GRAPH_CELLS as f64) * ratio.clamp(0.0, 1.0)).round() as usize;
    format!("{}{}", "█".repeat(lit), "·".repeat(GRAPH_CELLS - lit))
}

// ──────────────────── console loop ────────────────────

/// Run `console` in the alternate screen until quit or a shutdown signal.
pub fn run_console(
    console: &mut Console,
    shutdown: &ShutdownSignal,
    redraw_tick: Duration,
) -> io::Result<()> {
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

    let mut display = TerminalDisplay::new(io::stdout());
    let result = run_inner(console, &mut display, shutdown, redraw_tick);

    // Always restore terminal state.
    let _ = execute!(stdout, Show, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run_inner<W: Write>(
    console: &mut Console,
    display: &mut TerminalDisplay<W>,
    shutdown: &ShutdownSignal,
    redraw_tick: Duration,
) -> io::Result<()> {
    loop {
        if shutdown.should_shutdown() {
            log::info!("shutdown requested");
            return Ok(());
        }
        if event::poll(redraw_tick)?
            && let Event::Key(key) = event::read()?
        {
            match map_key(key) {
                KeyAction::Quit if !console.is_progressing() => return Ok(()),
                KeyAction::Input(input) => {
                    let handled = console.handle_input(input, display);
                    log::trace!("{input} handled={handled}");
                }
                KeyAction::Quit | KeyAction::Ignore => {}
            }
        }
        console.redraw(display);
        display.present(Instant::now())?;
    }
}
