//! Chat preview component rendering macro bubbles and tag badges.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::chat::{Accent, Bubble, Fragment};

/// Ratatui component that displays the chat-style macro preview.
#[derive(Debug, Default)]
pub struct ChatView;

impl ChatView {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        title: &str,
        bubbles: &[Bubble],
        has_focus: bool,
    ) {
        let border_color = if has_focus {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .title(format!("Preview · {title}"))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line<'_>> = Vec::new();
        for (index, bubble) in bubbles.iter().enumerate() {
            if index > 0 {
                lines.push(Line::default());
            }
            lines.push(Line::styled(
                format!("╭ message {}", index + 1),
                Style::default().fg(Color::DarkGray),
            ));
            lines.extend(bubble_lines(bubble));
        }

        if lines.is_empty() {
            lines.push(Line::styled(
                "(empty macro)",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }
}

fn bubble_lines(bubble: &Bubble) -> Vec<Line<'static>> {
    let bar = Span::styled("│ ", Style::default().fg(Color::DarkGray));
    let mut lines = Vec::new();
    let mut spans = vec![bar.clone()];

    for fragment in &bubble.fragments {
        match fragment {
            Fragment::Text(text) => spans.push(Span::raw(text.clone())),
            Fragment::LineBreak => {
                lines.push(Line::from(std::mem::replace(&mut spans, vec![bar.clone()])));
            }
            Fragment::Badge(badge) => spans.push(Span::styled(
                format!(" {} ", badge.label),
                Style::default()
                    .fg(Color::Black)
                    .bg(accent_color(badge.accent))
                    .add_modifier(Modifier::BOLD),
            )),
        }
    }

    lines.push(Line::from(spans));
    lines
}

fn accent_color(accent: Accent) -> Color {
    match accent {
        Accent::Cyan => Color::Cyan,
        Accent::Pink => Color::Magenta,
        Accent::Amber => Color::Yellow,
        Accent::Green => Color::Green,
        Accent::Violet => Color::LightMagenta,
        Accent::Gray => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::app::chat::format_as_chat;
    use crate::app::tags::tokenize;

    fn draw(bubbles: &[Bubble]) {
        let backend = TestBackend::new(50, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        let view = ChatView;
        terminal
            .draw(|frame| {
                let area = frame.size();
                view.render(frame, area, "sample", bubbles, true);
            })
            .unwrap();
    }

    #[test]
    fn renders_bubbles_with_badges() {
        let bubbles = format_as_chat(&tokenize(
            "Hello [input:Name]\nsecond line[key:enter][wait:2]done",
        ));
        draw(&bubbles);
    }

    #[test]
    fn renders_empty_state() {
        draw(&[]);
        draw(&format_as_chat(&tokenize("")));
    }
}
