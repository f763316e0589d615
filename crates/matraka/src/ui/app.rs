//! Application loop for the TUI.

use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::app::chat::{Bubble, format_as_chat};
use crate::app::copy::{Copier, CopyOptions, CopyPlan, finalize, plan_copy};
use crate::app::library::MacroLibrary;
use crate::app::tags::tokenize;
use crate::domain::model::MacroCategory;
use crate::infra::config::Config;
use crate::ui::components::chat_view::ChatView;
use crate::ui::components::detail::DetailPanel;
use crate::ui::components::macro_list::{MacroList, MacroListState};
use crate::ui::components::variable_form::{VariableForm, VariableFormState};

const TICK_RATE: Duration = Duration::from_millis(120);

/// Primary entry point for running the interactive macro browser.
pub struct UiApp {
    config: Config,
    library: MacroLibrary,
    list_state: MacroListState,
    list: MacroList,
    chat: ChatView,
    detail: DetailPanel,
    form_state: VariableFormState,
    form: VariableForm,
    copier: Copier,
    copy_options: CopyOptions,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl UiApp {
    /// Build the application state from configuration and the library rooted
    /// at the given directory.
    pub fn new(config: Config, root: impl Into<PathBuf>) -> Result<Self> {
        let library = MacroLibrary::open(root)?;
        let copy_options = CopyOptions::from_config(&config);

        let mut list_state = MacroListState::default();
        list_state.set_category(parse_start_category(&config.defaults.category));

        let mut app = Self {
            config,
            library,
            list_state,
            list: MacroList,
            chat: ChatView,
            detail: DetailPanel,
            form_state: VariableFormState::default(),
            form: VariableForm,
            copier: Copier::new(),
            copy_options,
            status: None,
            should_quit: false,
        };
        app.rebuild_list();
        Ok(app)
    }

    fn rebuild_list(&mut self) {
        let entries: Vec<_> = self
            .library
            .macros()
            .iter()
            .filter(|entry| self.config.defaults.show_private || entry.is_public())
            .cloned()
            .collect();
        self.list_state.rebuild(&entries);
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;
        terminal.hide_cursor().ok();

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            self.tick();

            if self.should_quit {
                break;
            }

            if event::poll(TICK_RATE)? {
                let ev = event::read()?;
                self.handle_event(ev)?;
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(size);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(34),
                Constraint::Min(40),
                Constraint::Length(32),
            ])
            .split(layout[0]);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(4)])
            .split(main_chunks[2]);

        let list_focus = !self.form_state.is_open();
        self.list
            .render(frame, main_chunks[0], &self.list_state, list_focus);

        let selected = self
            .list_state
            .selected_entry()
            .and_then(|entry| self.library.get(entry.id))
            .cloned();

        let (title, bubbles): (&str, Vec<Bubble>) = match &selected {
            Some(entry) => (&entry.title, format_as_chat(&tokenize(&entry.raw_text))),
            None => ("no selection", Vec::new()),
        };
        self.chat
            .render(frame, main_chunks[1], title, &bubbles, false);

        self.detail
            .render(frame, right_chunks[0], selected.as_ref());

        let hints = Paragraph::new(Line::from(vec![
            Span::styled("j/k", Style::default().fg(Color::Cyan)),
            Span::raw(" move · "),
            Span::styled("↵", Style::default().fg(Color::Cyan)),
            Span::raw(" copy · "),
            Span::styled("tab", Style::default().fg(Color::Cyan)),
            Span::raw(" category · "),
            Span::styled("/", Style::default().fg(Color::Cyan)),
            Span::raw(" filter · "),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::raw(" quit"),
        ]))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Gray));
        frame.render_widget(hints, right_chunks[1]);

        self.render_status(frame, layout[1]);
        self.form.render(frame, size, &self.form_state);
    }

    fn render_status(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let message = self.status.as_ref().map(|status| {
            let style = match status.level {
                StatusLevel::Info => Style::default().fg(Color::Gray),
                StatusLevel::Success => Style::default().fg(Color::Green),
                StatusLevel::Error => Style::default().fg(Color::Red),
            };
            Line::styled(status.text.clone(), style)
        });

        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let line = message.unwrap_or_else(|| {
            Line::styled(
                format!("Ready · {} macros", self.list_state.visible_len()),
                Style::default().fg(Color::DarkGray),
            )
        });
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn tick(&mut self) {
        if let Some(status) = &self.status
            && status.is_expired()
        {
            self.status = None;
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key_event(key)?,
            Event::Resize(..) => {}
            Event::Mouse(_) => {}
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.form_state.is_open() {
            return self.handle_form_key(key);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.should_quit = true;
            return Ok(());
        }

        if self.list_state.is_filter_active() {
            return self.handle_filter_input(key);
        }

        let bindings = self.config.keybindings.clone();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Down => {
                self.list_state.select_next();
            }
            KeyCode::Up => {
                self.list_state.select_previous();
            }
            KeyCode::Tab => {
                self.list_state.cycle_category();
            }
            KeyCode::Char('c') => {
                self.start_copy();
            }
            _ if binding_matches(&bindings.down, &key) => {
                self.list_state.select_next();
            }
            _ if binding_matches(&bindings.up, &key) => {
                self.list_state.select_previous();
            }
            _ if binding_matches(&bindings.copy, &key) => {
                self.start_copy();
            }
            _ if binding_matches(&bindings.filter, &key) => {
                self.list_state.begin_filter();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_filter_input(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.list_state.clear_filter();
            }
            KeyCode::Enter => {
                self.list_state.end_filter();
            }
            KeyCode::Backspace => {
                self.list_state.pop_filter_char();
            }
            KeyCode::Char(ch) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.list_state.push_filter_char(ch);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.form_state.close();
                self.set_status(StatusLevel::Info, "Copy cancelled");
            }
            KeyCode::Enter => {
                self.confirm_form();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.form_state.next_field();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form_state.previous_field();
            }
            KeyCode::Backspace => {
                self.form_state.pop_char();
            }
            KeyCode::Char(ch) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && ch == 'c' {
                    self.should_quit = true;
                } else if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.form_state.push_char(ch);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Kick off the copy flow for the highlighted macro. Macros with input
    /// variables open the form; everything else copies immediately.
    fn start_copy(&mut self) {
        let Some(id) = self.list_state.selected_entry().map(|entry| entry.id) else {
            return;
        };
        let Some(entry) = self.library.get(id) else {
            return;
        };

        match plan_copy(&entry.raw_text, &self.copy_options) {
            CopyPlan::Direct(payload) => match self.copier.copy_payload(&payload) {
                Ok(()) => self.set_status(StatusLevel::Success, "MACRO COPIED"),
                Err(err) => self.set_status(StatusLevel::Error, err.to_string()),
            },
            CopyPlan::AwaitInput(names) => {
                self.form_state.open(id, names);
            }
        }
    }

    /// Copy failures keep the form open so the typed values survive a retry.
    fn confirm_form(&mut self) {
        let Some(id) = self.form_state.macro_id() else {
            self.form_state.close();
            return;
        };
        let Some(entry) = self.library.get(id) else {
            self.form_state.close();
            return;
        };

        let bindings = self.form_state.bindings();
        let payload = finalize(&entry.raw_text, &bindings, &self.copy_options);
        match self.copier.copy_payload(&payload) {
            Ok(()) => {
                self.form_state.close();
                self.set_status(StatusLevel::Success, "MACRO COPIED");
            }
            Err(err) => {
                self.set_status(StatusLevel::Error, err.to_string());
            }
        }
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S) {
        self.status = Some(StatusMessage::new(level, message.into()));
    }
}

/// A keybinding string matches either a named key or a single character.
fn binding_matches(binding: &str, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => binding.eq_ignore_ascii_case("enter"),
        KeyCode::Char(ch) => {
            let mut chars = binding.chars();
            chars.next() == Some(ch) && chars.next().is_none()
        }
        _ => false,
    }
}

fn parse_start_category(value: &str) -> Option<MacroCategory> {
    if value.eq_ignore_ascii_case("all") {
        return None;
    }
    MacroCategory::from_str(value).ok()
}

#[derive(Debug)]
struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn new(level: StatusLevel, text: String) -> Self {
        Self {
            level,
            text,
            expires_at: Instant::now() + Duration::from_secs(4),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusLevel {
    Info,
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_category_parses_identifiers_and_all() {
        assert_eq!(parse_start_category("all"), None);
        assert_eq!(parse_start_category("ai"), Some(MacroCategory::Ai));
        assert_eq!(parse_start_category("nonsense"), None);
    }

    #[test]
    fn bindings_match_named_and_single_char_keys() {
        let enter = KeyEvent::from(KeyCode::Enter);
        let j = KeyEvent::from(KeyCode::Char('j'));
        assert!(binding_matches("enter", &enter));
        assert!(binding_matches("j", &j));
        assert!(!binding_matches("jj", &j));
        assert!(!binding_matches("j", &enter));
    }
}
