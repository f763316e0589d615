//! Detail pane showing metadata for the selected macro.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use time::format_description::well_known::Rfc3339;

use crate::app::variables::extract_variables;
use crate::domain::model::Macro;

/// Visual component that renders metadata for one macro.
#[derive(Debug, Default)]
pub struct DetailPanel;

impl DetailPanel {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, entry: Option<&Macro>) {
        let block = Block::default()
            .title("Detail")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(entry) = entry else {
            let empty = Paragraph::new("select a macro")
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true });
            frame.render_widget(empty, inner);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                entry.title.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            field("category", entry.category.label()),
            field(
                "shortcut",
                entry.shortcut.as_deref().unwrap_or("(none)"),
            ),
            field(
                "visibility",
                if entry.is_public() { "public" } else { "private" },
            ),
        ];

        let variables = extract_variables(&entry.raw_text);
        if !variables.is_empty() {
            lines.push(Line::default());
            lines.push(Line::styled(
                "variables",
                Style::default().fg(Color::Magenta),
            ));
            for name in variables {
                lines.push(Line::from(Span::raw(format!("  {name}"))));
            }
        }

        if let Ok(updated) = entry.updated_at.format(&Rfc3339) {
            lines.push(Line::default());
            lines.push(field("updated", &updated));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }
}

fn field(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Cyan)),
        Span::raw(value.to_owned()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use time::OffsetDateTime;

    use crate::domain::model::{MacroCategory, Visibility};

    fn draw(entry: Option<&Macro>) {
        let backend = TestBackend::new(40, 16);
        let mut terminal = Terminal::new(backend).unwrap();
        let panel = DetailPanel;
        terminal
            .draw(|frame| {
                let area = frame.size();
                panel.render(frame, area, entry);
            })
            .unwrap();
    }

    #[test]
    fn renders_macro_with_variables() {
        let entry = Macro {
            id: 1,
            title: "Greeting".into(),
            raw_text: "Hello [input:Name], code [input:Code]".into(),
            shortcut: Some("hi".into()),
            category: MacroCategory::Text,
            visibility: Visibility::Public,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        draw(Some(&entry));
    }

    #[test]
    fn renders_empty_state() {
        draw(None);
    }
}
