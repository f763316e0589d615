//! Macro list component and state management.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};

use crate::domain::model::{Macro, MacroCategory};

/// Display snapshot of one library entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroEntry {
    pub id: u64,
    pub title: String,
    pub raw_text: String,
    pub category: MacroCategory,
    pub shortcut: Option<String>,
    pub public: bool,
}

/// Maintains the navigable state of the macro list.
#[derive(Debug, Default, Clone)]
pub struct MacroListState {
    entries: Vec<MacroEntry>,
    visible: Vec<usize>,
    selected: usize,
    filter: String,
    filter_active: bool,
    category: Option<MacroCategory>,
}

impl MacroListState {
    /// Rebuild entries from the library contents, preserving the selection
    /// where possible.
    pub fn rebuild(&mut self, macros: &[Macro]) {
        let previous = self.selected_entry().map(|entry| entry.id);
        self.entries = macros
            .iter()
            .map(|entry| MacroEntry {
                id: entry.id,
                title: entry.title.clone(),
                raw_text: entry.raw_text.clone(),
                category: entry.category,
                shortcut: entry.shortcut.clone(),
                public: entry.is_public(),
            })
            .collect();
        self.refresh_visible();
        if let Some(id) = previous {
            self.focus_id(id);
        }
    }

    pub fn selected_entry(&self) -> Option<&MacroEntry> {
        self.visible
            .get(self.selected)
            .and_then(|idx| self.entries.get(*idx))
    }

    /// Move the highlight to the entry with the given id if it is visible.
    pub fn focus_id(&mut self, id: u64) {
        if let Some(pos) = self
            .visible
            .iter()
            .position(|idx| self.entries[*idx].id == id)
        {
            self.selected = pos;
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Cycle the category filter: all → text → ai → code → all.
    pub fn cycle_category(&mut self) {
        self.category = match self.category {
            None => Some(MacroCategory::Text),
            Some(MacroCategory::Text) => Some(MacroCategory::Ai),
            Some(MacroCategory::Ai) => Some(MacroCategory::Code),
            Some(MacroCategory::Code) => None,
        };
        self.refresh_visible();
    }

    pub fn set_category(&mut self, category: Option<MacroCategory>) {
        self.category = category;
        self.refresh_visible();
    }

    pub fn category(&self) -> Option<MacroCategory> {
        self.category
    }

    pub fn begin_filter(&mut self) {
        self.filter_active = true;
    }

    pub fn end_filter(&mut self) {
        self.filter_active = false;
    }

    pub fn is_filter_active(&self) -> bool {
        self.filter_active
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn push_filter_char(&mut self, ch: char) {
        self.filter.push(ch);
        self.refresh_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
        self.refresh_visible();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.filter_active = false;
        self.refresh_visible();
    }

    fn refresh_visible(&mut self) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                self.category.is_none_or(|wanted| entry.category == wanted)
            })
            .filter(|(_, entry)| {
                needle.is_empty()
                    || entry.title.to_lowercase().contains(&needle)
                    || entry.raw_text.to_lowercase().contains(&needle)
                    || entry
                        .shortcut
                        .as_ref()
                        .is_some_and(|shortcut| shortcut.to_lowercase().contains(&needle))
            })
            .map(|(idx, _)| idx)
            .collect();
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
    }
}

/// Visual component that renders the macro list pane.
#[derive(Debug, Default)]
pub struct MacroList;

impl MacroList {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        state: &MacroListState,
        has_focus: bool,
    ) {
        let category_label = state
            .category
            .map(|category| category.label())
            .unwrap_or("ALL");
        let title = format!("Macros · {} ({})", category_label, state.visible.len());
        let border_color = if has_focus {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut items: Vec<ListItem<'_>> = Vec::with_capacity(state.visible.len() + 1);
        for (pos, idx) in state.visible.iter().enumerate() {
            let entry = &state.entries[*idx];
            let highlighted = pos == state.selected;
            items.push(ListItem::new(entry_line(entry, highlighted)));
        }

        if items.is_empty() {
            items.push(ListItem::new(Line::styled(
                "no macros match",
                Style::default().fg(Color::DarkGray),
            )));
        }

        if state.filter_active || !state.filter.is_empty() {
            items.push(ListItem::new(Line::styled(
                format!("/{}", state.filter),
                Style::default().fg(Color::Yellow),
            )));
        }

        frame.render_widget(List::new(items), inner);
    }
}

fn entry_line(entry: &MacroEntry, highlighted: bool) -> Line<'static> {
    let marker = if highlighted { "› " } else { "  " };
    let title_style = if highlighted {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut spans = vec![
        Span::styled(marker.to_owned(), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("[{}] ", entry.category.label()),
            Style::default().fg(category_color(entry.category)),
        ),
        Span::styled(entry.title.clone(), title_style),
    ];
    if let Some(shortcut) = &entry.shortcut {
        spans.push(Span::styled(
            format!(" ·{shortcut}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if entry.public {
        spans.push(Span::styled(" ◆", Style::default().fg(Color::Green)));
    }
    Line::from(spans)
}

fn category_color(category: MacroCategory) -> Color {
    match category {
        MacroCategory::Text => Color::Cyan,
        MacroCategory::Ai => Color::Magenta,
        MacroCategory::Code => Color::Yellow,
    }
}
