//! Variable input form overlay: one field per `[input:...]` variable.

use std::collections::HashMap;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// One input field with its variable name and the value typed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableField {
    pub name: String,
    pub value: String,
}

/// Interactive state backing the variable form overlay.
#[derive(Debug, Default, Clone)]
pub struct VariableFormState {
    visible: bool,
    macro_id: Option<u64>,
    fields: Vec<VariableField>,
    active: usize,
}

impl VariableFormState {
    /// Open the form for a macro with the given variables, first field
    /// focused, all values empty.
    pub fn open(&mut self, macro_id: u64, variables: Vec<String>) {
        self.visible = true;
        self.macro_id = Some(macro_id);
        self.fields = variables
            .into_iter()
            .map(|name| VariableField {
                name,
                value: String::new(),
            })
            .collect();
        self.active = 0;
    }

    /// Dismiss the form, discarding all typed values.
    pub fn close(&mut self) {
        self.visible = false;
        self.macro_id = None;
        self.fields.clear();
        self.active = 0;
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn macro_id(&self) -> Option<u64> {
        self.macro_id
    }

    pub fn fields(&self) -> &[VariableField] {
        &self.fields
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.pop();
        }
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + 1) % self.fields.len();
        }
    }

    pub fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            self.active = (self.active + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Current values as bindings. Every field is present, so unfilled
    /// variables map to the empty string.
    pub fn bindings(&self) -> HashMap<String, String> {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), field.value.clone()))
            .collect()
    }
}

/// Visual component that renders the variable form overlay.
#[derive(Debug, Default)]
pub struct VariableForm;

impl VariableForm {
    /// Draw the form if it is visible.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &VariableFormState) {
        if !state.is_open() {
            return;
        }

        let width = area.width.saturating_sub(8).min(60);
        let height = (state.fields.len() as u16 * 2 + 4).min(area.height);
        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        };

        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title("INPUT REQUIRED")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut constraints: Vec<Constraint> =
            state.fields.iter().map(|_| Constraint::Length(2)).collect();
        constraints.push(Constraint::Min(1));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (index, field) in state.fields.iter().enumerate() {
            let active = index == state.active;
            let label_style = if active {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let cursor = if active { "▏" } else { "" };
            let lines = vec![
                Line::styled(field.name.to_uppercase(), label_style),
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        format!("{}{cursor}", field.value),
                        Style::default().fg(Color::White),
                    ),
                ]),
            ];
            frame.render_widget(Paragraph::new(lines), rows[index]);
        }

        let hint = Paragraph::new("enter copy · tab next field · esc cancel")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
        frame.render_widget(hint, rows[state.fields.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_form(variables: &[&str]) -> VariableFormState {
        let mut state = VariableFormState::default();
        state.open(9, variables.iter().map(|name| name.to_string()).collect());
        state
    }

    #[test]
    fn open_focuses_first_field_with_empty_values() {
        let state = open_form(&["Name", "Code"]);
        assert!(state.is_open());
        assert_eq!(state.macro_id(), Some(9));
        assert_eq!(state.active_index(), 0);
        assert!(state.fields().iter().all(|field| field.value.is_empty()));
    }

    #[test]
    fn typing_targets_the_active_field_only() {
        let mut state = open_form(&["Name", "Code"]);
        for ch in "Ana".chars() {
            state.push_char(ch);
        }
        state.next_field();
        state.push_char('4');
        state.push_char('3');
        state.pop_char();
        state.push_char('2');

        let bindings = state.bindings();
        assert_eq!(bindings["Name"], "Ana");
        assert_eq!(bindings["Code"], "42");
    }

    #[test]
    fn field_navigation_wraps_around() {
        let mut state = open_form(&["A", "B"]);
        state.previous_field();
        assert_eq!(state.active_index(), 1);
        state.next_field();
        assert_eq!(state.active_index(), 0);
    }

    #[test]
    fn unfilled_fields_bind_to_empty_strings() {
        let state = open_form(&["Left", "Blank"]);
        let bindings = state.bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings["Blank"], "");
    }

    #[test]
    fn close_discards_bindings() {
        let mut state = open_form(&["Name"]);
        state.push_char('x');
        state.close();
        assert!(!state.is_open());
        assert!(state.bindings().is_empty());
        assert_eq!(state.macro_id(), None);
    }
}
