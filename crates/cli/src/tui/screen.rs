//! ratatui rendering and crossterm input
//!
//! The interface is drawn on the controlling terminal (`/dev/tty`, or stderr
//! where there is none) so that stdout stays free for the selected path and
//! stderr can be redirected.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::panic;
use std::sync::Once;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Position};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use pick_core::{Error, Key, Result, Screen, View};

type Output = Box<dyn Write + Send>;

fn terminal_error(e: io::Error) -> Error {
    Error::Terminal(e.to_string())
}

/// Handle on the controlling terminal
fn tty() -> Output {
    match OpenOptions::new().write(true).open("/dev/tty") {
        Ok(file) => Box::new(file),
        Err(_) => Box::new(io::stderr()),
    }
}

static PANIC_HOOK: Once = Once::new();

/// Leave raw mode and the alternate screen before a panic message is printed
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            restore();
            previous(info);
        }));
    });
}

/// Full-screen terminal session; raw mode and the alternate screen are left on drop
pub struct CrosstermScreen {
    terminal: Terminal<CrosstermBackend<Output>>,
}

impl CrosstermScreen {
    pub fn open() -> Result<Self> {
        install_panic_hook();
        enable_raw_mode().map_err(terminal_error)?;
        let mut out = tty();
        if let Err(e) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(terminal_error(e));
        }
        match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                restore();
                Err(terminal_error(e))
            }
        }
    }
}

fn restore() {
    let _ = disable_raw_mode();
    let mut out = tty();
    let _ = execute!(out, LeaveAlternateScreen);
}

impl Drop for CrosstermScreen {
    fn drop(&mut self) {
        restore();
        let _ = self.terminal.show_cursor();
    }
}

impl Screen for CrosstermScreen {
    fn draw(&mut self, view: &View<'_>) -> Result<()> {
        self.terminal
            .draw(|frame| render(frame, view))
            .map_err(terminal_error)?;
        Ok(())
    }

    fn next_key(&mut self) -> Result<Key> {
        loop {
            match event::read().map_err(terminal_error)? {
                Event::Key(key) if key.kind == KeyEventKind::Press => return Ok(map_key(key)),
                // redraw at the new size
                Event::Resize(..) => return Ok(Key::Other),
                _ => {}
            }
        }
    }
}

/// Translate a crossterm key event
pub fn map_key(event: KeyEvent) -> Key {
    match event.code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Key::Ctrl(c.to_ascii_lowercase())
        }
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    }
}

/// Replace control characters that would corrupt the screen
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' => '\n',
            '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect()
}

/// A label on one line, with line breaks shown as `?`
fn single_line(text: &str) -> String {
    printable(text).replace('\n', "?")
}

fn render(frame: &mut Frame, view: &View<'_>) {
    let [header, prompt, body, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());
    let [list_area, preview_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);

    frame.render_widget(Paragraph::new(single_line(view.title)).bold(), header);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::from("> ").cyan(),
            Span::raw(printable(view.query)),
        ])),
        prompt,
    );

    let items: Vec<ListItem> = view
        .items
        .iter()
        .map(|item| {
            if item.container {
                ListItem::new(format!("{}/", single_line(item.label))).blue()
            } else {
                ListItem::new(single_line(item.label))
            }
        })
        .collect();
    let count = format!(" {} ", view.items.len());
    let list = List::new(items)
        .block(Block::bordered().title(count))
        .highlight_style(Style::new().reversed())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(view.highlighted);
    frame.render_stateful_widget(list, list_area, &mut state);

    frame.render_widget(
        Paragraph::new(printable(view.preview))
            .block(Block::bordered().title(" preview "))
            .wrap(Wrap { trim: false }),
        preview_area,
    );

    if let Some(message) = view.status {
        frame.render_widget(Paragraph::new(printable(message)).yellow(), status);
    }

    let typed = u16::try_from(view.query.chars().count()).unwrap_or(u16::MAX);
    frame.set_cursor_position(Position::new(
        prompt.x.saturating_add(2).saturating_add(typed),
        prompt.y,
    ));
}
