//! Chat-style preview built from the token stream.
//!
//! A pure function of the token sequence: same tokens, same bubbles. The view
//! layer decides colors and borders; this module only fixes the structure and
//! the badge labels.

use crate::app::tags::{Tag, TagKind, Token};

/// Cosmetic accent assigned to a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Cyan,
    Pink,
    Amber,
    Green,
    Violet,
    Gray,
}

/// A tag rendered as a labelled badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub accent: Accent,
    pub kind: TagKind,
}

/// One display unit inside a bubble. Real newlines in literal text become
/// explicit [`Fragment::LineBreak`] markers for the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    LineBreak,
    Badge(Badge),
}

/// A chat message bubble: a maximal run of fragments between enter tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bubble {
    pub fragments: Vec<Fragment>,
}

impl Bubble {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Plain-text rendition: literal text with newlines restored and badges
    /// shown as `[LABEL]`. Used by the CLI preview.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(text) => out.push_str(text),
                Fragment::LineBreak => out.push('\n'),
                Fragment::Badge(badge) => {
                    out.push('[');
                    out.push_str(&badge.label);
                    out.push(']');
                }
            }
        }
        out
    }
}

/// Group tokens into message bubbles, splitting on `[key:enter]`.
///
/// The enter tag is a separator, not content: it closes the current bubble
/// and leaves an `ENTER` indicator on the bubble it terminated. A trailing
/// empty bubble is discarded, so the bubble count is always (non-terminal
/// enter tags) + 1; fully-empty input produces the single empty bubble the
/// view renders as its empty state.
pub fn format_as_chat(tokens: &[Token]) -> Vec<Bubble> {
    let mut bubbles = Vec::new();
    let mut current = Bubble::default();
    let mut ended_on_enter = false;

    for token in tokens {
        ended_on_enter = false;
        match token {
            Token::Literal(text) => push_text(&mut current, text),
            Token::Tag(tag) if tag.kind.is_enter() => {
                current.fragments.push(Fragment::Badge(enter_badge()));
                bubbles.push(std::mem::take(&mut current));
                ended_on_enter = true;
            }
            Token::Tag(tag) => current.fragments.push(Fragment::Badge(badge_for(tag))),
        }
    }

    if !current.is_empty() || (bubbles.is_empty() && !ended_on_enter) {
        bubbles.push(current);
    }
    bubbles
}

/// Badge label and accent for a recognized tag.
pub fn badge_for(tag: &Tag) -> Badge {
    let (label, accent) = match &tag.kind {
        TagKind::Cursor => ("CURSOR".to_owned(), Accent::Cyan),
        TagKind::Paste => ("CTRL+V".to_owned(), Accent::Green),
        TagKind::Agent => ("AGENTE".to_owned(), Accent::Violet),
        TagKind::Input(name) => (format!("INPUT:{name}"), Accent::Pink),
        TagKind::Dom(selector) => (format!("DOM:{selector}"), Accent::Amber),
        TagKind::Key(key) => (format!("KEYPRESS: {}", key.to_uppercase()), Accent::Gray),
        TagKind::Wait(seconds) => (format!("WAIT {seconds}s"), Accent::Amber),
        TagKind::Selection => ("SELECTION".to_owned(), Accent::Violet),
    };
    Badge {
        label,
        accent,
        kind: tag.kind.clone(),
    }
}

fn enter_badge() -> Badge {
    Badge {
        label: "ENTER".to_owned(),
        accent: Accent::Gray,
        kind: TagKind::Key("enter".to_owned()),
    }
}

fn push_text(bubble: &mut Bubble, text: &str) {
    for (idx, part) in text.split('\n').enumerate() {
        if idx > 0 {
            bubble.fragments.push(Fragment::LineBreak);
        }
        if !part.is_empty() {
            bubble.fragments.push(Fragment::Text(part.to_owned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tags::tokenize;

    fn chat(text: &str) -> Vec<Bubble> {
        format_as_chat(&tokenize(text))
    }

    #[test]
    fn plain_text_round_trips_through_one_bubble() {
        let text = "hello\nworld";
        let bubbles = chat(text);
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].plain_text(), text);
    }

    #[test]
    fn empty_input_renders_single_empty_bubble() {
        let bubbles = chat("");
        assert_eq!(bubbles.len(), 1);
        assert!(bubbles[0].is_empty());
    }

    #[test]
    fn enter_tag_splits_messages_and_marks_the_preceding_one() {
        let bubbles = chat("first[key:enter]second");
        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].plain_text(), "first[ENTER]");
        assert_eq!(bubbles[1].plain_text(), "second");
    }

    #[test]
    fn trailing_enter_does_not_emit_empty_bubble() {
        let bubbles = chat("only message[key:enter]");
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].plain_text(), "only message[ENTER]");
    }

    #[test]
    fn bubble_count_matches_non_terminal_enters_plus_one() {
        assert_eq!(chat("no enters at all").len(), 1);
        assert_eq!(chat("a[key:enter]b[key:enter]c").len(), 3);
        assert_eq!(chat("a[key:enter]b[key:enter]").len(), 2);
        assert_eq!(chat("[key:enter]after").len(), 2);
    }

    #[test]
    fn leading_enter_bubble_keeps_its_indicator() {
        let bubbles = chat("[key:enter]after");
        assert_eq!(bubbles[0].plain_text(), "[ENTER]");
    }

    #[test]
    fn badges_carry_labels_and_kinds() {
        let bubbles = chat("wait [wait:5] then [key:tab] for [input:Name]");
        let labels: Vec<_> = bubbles[0]
            .fragments
            .iter()
            .filter_map(|fragment| match fragment {
                Fragment::Badge(badge) => Some(badge.label.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["WAIT 5s", "KEYPRESS: TAB", "INPUT:Name"]);
    }

    #[test]
    fn renderer_is_deterministic() {
        let tokens = tokenize("a[cursor]b[key:enter]c");
        assert_eq!(format_as_chat(&tokens), format_as_chat(&tokens));
    }
}
